//! Capture variant definitions.

use crate::VariantParseError;
use std::str::FromStr;

/// Default exposure time, in seconds.
pub const DEFAULT_EXPOSURE_TIME: f64 = 0.8;

/// Default ISO.
pub const DEFAULT_ISO: u32 = 100;

/// Default camera warm-up time, in seconds.
pub const DEFAULT_WARM_UP_TIME: f64 = 2.0;

/// Camera warm-up time used by variants parsed from a `--variant` string.
pub const VARIANT_WARM_UP_TIME: f64 = 5.0;

/// One set of capture settings applied once per batch.
///
/// The scheduler never interprets these settings; they are handed to the
/// capture collaborator and used to label captures.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    /// Exposure time in seconds.
    pub exposure_time: f64,
    /// ISO (used as analog gain by the camera binding).
    pub iso: u32,
    /// Time to let the sensor settle before exposure, in seconds.
    pub camera_warm_up: f64,
    /// Raw parameters passed through to the capture command.
    pub additional_capture_params: String,
}

impl Default for Variant {
    fn default() -> Self {
        Self {
            exposure_time: DEFAULT_EXPOSURE_TIME,
            iso: DEFAULT_ISO,
            camera_warm_up: DEFAULT_WARM_UP_TIME,
            additional_capture_params: String::new(),
        }
    }
}

impl Variant {
    /// Creates a variant with the given exposure and ISO and default warm-up.
    #[must_use]
    pub const fn new(exposure_time: f64, iso: u32) -> Self {
        Self {
            exposure_time,
            iso,
            camera_warm_up: DEFAULT_WARM_UP_TIME,
            additional_capture_params: String::new(),
        }
    }

    /// Expands exposure and ISO lists into their cross product.
    ///
    /// A missing list falls back to the single default value. Exposures are
    /// the outer loop.
    #[must_use]
    pub fn grid(exposures: &[f64], isos: &[u32]) -> Vec<Self> {
        let exposures = if exposures.is_empty() {
            &[DEFAULT_EXPOSURE_TIME][..]
        } else {
            exposures
        };
        let isos = if isos.is_empty() { &[DEFAULT_ISO][..] } else { isos };

        exposures
            .iter()
            .flat_map(|&exposure| isos.iter().map(move |&iso| Self::new(exposure, iso)))
            .collect()
    }

    /// Identity of this variant, safe to embed in a file name.
    ///
    /// Each setting is rendered as `key_value`, with `-` stripped and spaces
    /// replaced by `_`.
    #[must_use]
    pub fn label(&self) -> String {
        [
            ("exposure_time", self.exposure_time.to_string()),
            ("iso", self.iso.to_string()),
            ("camera_warm_up", self.camera_warm_up.to_string()),
            (
                "additional_capture_params",
                self.additional_capture_params.clone(),
            ),
        ]
        .iter()
        .map(|(key, value)| format!("{}_{}", for_filename(key), for_filename(value)))
        .collect::<Vec<_>>()
        .join("_")
    }
}

fn for_filename(param: &str) -> String {
    param.replace('-', "").replace(' ', "_")
}

fn parse_value<T: FromStr>(flag: &str, value: Option<&str>) -> Result<T, VariantParseError> {
    let value = value.ok_or_else(|| VariantParseError::MissingValue {
        flag: flag.to_string(),
    })?;
    value.parse().map_err(|_| VariantParseError::InvalidValue {
        flag: flag.to_string(),
        value: value.to_string(),
    })
}

impl FromStr for Variant {
    type Err = VariantParseError;

    /// Parses a variant parameter string such as
    /// `"-ISO 100 --exposure-time 0.5 --camera-warm-up 1"`.
    ///
    /// Unrecognised tokens are kept, in order, as additional capture
    /// parameters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut variant = Self {
            camera_warm_up: VARIANT_WARM_UP_TIME,
            ..Self::default()
        };
        let mut passthrough = Vec::new();
        let mut tokens = s.split_whitespace();

        while let Some(token) = tokens.next() {
            let (flag, inline) = match token.split_once('=') {
                Some((flag, value)) if flag.starts_with("--") => (flag, Some(value)),
                _ => (token, None),
            };

            match flag {
                "-ex" | "--exposure-time" => {
                    variant.exposure_time = parse_value(flag, inline.or_else(|| tokens.next()))?;
                }
                "-i" | "-ISO" | "--iso" => {
                    variant.iso = parse_value(flag, inline.or_else(|| tokens.next()))?;
                }
                "--camera-warm-up" => {
                    variant.camera_warm_up = parse_value(flag, inline.or_else(|| tokens.next()))?;
                }
                // Deprecated: the LED is driven by the capture command itself.
                "--led-on" => {}
                "-ss" => return Err(VariantParseError::ShutterSpeed),
                "--timeout" => return Err(VariantParseError::Timeout),
                _ => passthrough.push(token),
            }
        }

        variant.additional_capture_params = passthrough.join(" ");
        Ok(variant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_long_flags() {
        let variant: Variant = "--iso 200 --exposure-time 0.5 --camera-warm-up 1"
            .parse()
            .unwrap();

        assert_eq!(variant.iso, 200);
        assert!((variant.exposure_time - 0.5).abs() < f64::EPSILON);
        assert!((variant.camera_warm_up - 1.0).abs() < f64::EPSILON);
        assert_eq!(variant.additional_capture_params, "");
    }

    #[test]
    fn test_parse_short_flags_and_passthrough() {
        let variant: Variant = "-ISO 100 -ex 0.2 -w 640 -h 480".parse().unwrap();

        assert_eq!(variant.iso, 100);
        assert!((variant.exposure_time - 0.2).abs() < f64::EPSILON);
        assert!((variant.camera_warm_up - VARIANT_WARM_UP_TIME).abs() < f64::EPSILON);
        assert_eq!(variant.additional_capture_params, "-w 640 -h 480");
    }

    #[test]
    fn test_parse_inline_value() {
        let variant: Variant = "--iso=400".parse().unwrap();
        assert_eq!(variant.iso, 400);
    }

    #[test]
    fn test_parse_led_on_is_ignored() {
        let variant: Variant = "--led-on -i 300".parse().unwrap();
        assert_eq!(variant.iso, 300);
        assert_eq!(variant.additional_capture_params, "");
    }

    #[test]
    fn test_parse_rejects_shutter_speed() {
        let result = "-ss 100000".parse::<Variant>();
        assert_eq!(result, Err(VariantParseError::ShutterSpeed));
    }

    #[test]
    fn test_parse_rejects_timeout() {
        let result = "-i 100 --timeout 5000".parse::<Variant>();
        assert_eq!(result, Err(VariantParseError::Timeout));
    }

    #[test]
    fn test_parse_missing_value() {
        let result = "--iso".parse::<Variant>();
        assert!(matches!(result, Err(VariantParseError::MissingValue { .. })));
    }

    #[test]
    fn test_parse_invalid_value() {
        let result = "--exposure-time fast".parse::<Variant>();
        assert!(matches!(
            result,
            Err(VariantParseError::InvalidValue { ref value, .. }) if value == "fast"
        ));
    }

    #[test]
    fn test_grid_cross_product() {
        let variants = Variant::grid(&[0.1, 1.0], &[100, 200]);
        let pairs: Vec<_> = variants.iter().map(|v| (v.exposure_time, v.iso)).collect();

        assert_eq!(pairs, vec![(0.1, 100), (0.1, 200), (1.0, 100), (1.0, 200)]);
    }

    #[test]
    fn test_grid_defaults_missing_list() {
        let variants = Variant::grid(&[], &[200, 400]);

        assert_eq!(variants.len(), 2);
        assert!(variants.iter().all(|v| v.exposure_time == DEFAULT_EXPOSURE_TIME));
    }

    #[test]
    fn test_label() {
        let variant = Variant {
            exposure_time: 0.5,
            iso: 100,
            camera_warm_up: 2.0,
            additional_capture_params: "-w 640".to_string(),
        };

        assert_eq!(
            variant.label(),
            "exposure_time_0.5_iso_100_camera_warm_up_2_additional_capture_params_w_640"
        );
    }
}
