//! How an experiment run ended.

/// Why an experiment run stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    /// The configured duration elapsed.
    Completed,
    /// There was no room on disk for another capture.
    InsufficientSpace,
    /// The operator interrupted the run.
    Cancelled,
    /// A collaborator failed; holds the rendered error chain.
    Failed(String),
}

impl EndReason {
    /// Returns true if this reason should produce a failing exit status.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        !matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "Experiment completed successfully!"),
            Self::InsufficientSpace => write!(f, "Insufficient space to save the image. Quitting."),
            Self::Cancelled => write!(f, "Interrupted, attempting final sync"),
            Self::Failed(error) => write!(f, "Experiment failed: {error}"),
        }
    }
}

/// Result of the final blocking sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalSync {
    /// Sync was disabled for this run.
    Skipped,
    /// Everything was uploaded.
    Succeeded,
    /// The sync could not be started, exited non-zero, or timed out.
    Failed(String),
}

/// Final result of an experiment run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Why the run stopped.
    pub reason: EndReason,
    /// What happened to the final sync.
    pub final_sync: FinalSync,
    /// Error while erasing the local directory after upload, if any.
    pub cleanup_error: Option<String>,
}

impl Outcome {
    /// Returns true if the run should exit with a failing status.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.reason.is_error()
            || matches!(self.final_sync, FinalSync::Failed(_))
            || self.cleanup_error.is_some()
    }

    /// Process exit code: `0` on success, `1` otherwise.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        if self.is_error() { 1 } else { 0 }
    }
}
