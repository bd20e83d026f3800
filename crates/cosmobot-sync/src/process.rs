//! Process group isolation and termination for sync jobs.
//!
//! Every sync job leads its own process group. The sync tool spawns helper
//! processes of its own, and signalling the group reaches all of them at
//! once; signalling only the direct child would leave them running.

use std::time::Duration;
use tokio::process::{Child, Command};

/// How often group liveness is re-checked while waiting for it to exit.
#[cfg(unix)]
const TERMINATION_POLL: Duration = Duration::from_millis(20);

/// Makes the spawned process the leader of a new process group.
///
/// This also keeps a terminal Ctrl-C, which is delivered to the foreground
/// group, from reaching the sync job.
#[cfg(unix)]
pub(crate) fn isolate(command: &mut Command) {
    command.process_group(0);
}

/// Spawns the process in a new process group on Windows.
#[cfg(windows)]
pub(crate) fn isolate(command: &mut Command) {
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x00000200;
    command.creation_flags(CREATE_NEW_PROCESS_GROUP);
}

/// No process group support on other platforms.
#[cfg(not(any(unix, windows)))]
pub(crate) fn isolate(_command: &mut Command) {}

/// Terminates the process group led by `child` and reaps the leader.
///
/// Sends `SIGTERM` to the group, waits up to `grace` for every member to
/// exit, then sends `SIGKILL` to whatever is left.
#[cfg(unix)]
pub(crate) async fn terminate_group(
    child: &mut Child,
    pgid: u32,
    grace: Duration,
) -> std::io::Result<()> {
    use nix::sys::signal::Signal;
    use nix::unistd::Pid;

    let pgid = i32::try_from(pgid)
        .ok()
        .filter(|&pgid| pgid > 1)
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("refusing to signal process group {pgid}"),
            )
        })?;
    let group = Pid::from_raw(pgid);

    signal_group(group, Signal::SIGTERM)?;

    let deadline = tokio::time::Instant::now() + grace;
    loop {
        // A leader that exited but was not reaped keeps the group alive.
        child.try_wait()?;
        if !group_alive(group) {
            break;
        }
        if tokio::time::Instant::now() >= deadline {
            tracing::debug!(pgid, "Sync job ignored SIGTERM, sending SIGKILL");
            signal_group(group, Signal::SIGKILL)?;
            break;
        }
        tokio::time::sleep(TERMINATION_POLL).await;
    }

    child.wait().await?;
    Ok(())
}

/// Kills the child directly where process groups are unavailable.
#[cfg(not(unix))]
pub(crate) async fn terminate_group(
    child: &mut Child,
    _pgid: u32,
    _grace: Duration,
) -> std::io::Result<()> {
    if child.try_wait()?.is_none() {
        child.start_kill()?;
    }
    child.wait().await?;
    Ok(())
}

/// Sends `signal` to every process in `group`. An empty group is not an error.
#[cfg(unix)]
fn signal_group(group: nix::unistd::Pid, signal: nix::sys::signal::Signal) -> std::io::Result<()> {
    use nix::errno::Errno;

    match nix::sys::signal::killpg(group, signal) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Returns true while any process in `group` exists.
#[cfg(unix)]
pub(crate) fn group_alive(group: nix::unistd::Pid) -> bool {
    !matches!(
        nix::sys::signal::killpg(group, None::<nix::sys::signal::Signal>),
        Err(nix::errno::Errno::ESRCH)
    )
}
