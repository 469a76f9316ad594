//! Exit codes for the CLI

use depalign_core::AlignError;

/// Success
pub const SUCCESS: i32 = 0;

/// Error findings remain, or the run failed for another reason
pub const UNSATISFIED: i32 = 1;

/// Configuration error, including invalid manifests
pub const CONFIG_ERROR: i32 = 2;

/// No profile matched, or the profiles themselves are broken
pub const RESOLUTION_ERROR: i32 = 3;

/// User cancelled
pub const CANCELLED: i32 = 130;

/// Exit code for a failed package
pub fn for_error(error: &AlignError) -> i32 {
    match error {
        AlignError::Config(_) | AlignError::Manifest(_) | AlignError::Range(_) | AlignError::Json(_) => {
            CONFIG_ERROR
        }
        AlignError::NotFound { .. }
        | AlignError::CyclicCapability { .. }
        | AlignError::NoMatchingVersion { .. } => RESOLUTION_ERROR,
        AlignError::Io(_) => UNSATISFIED,
    }
}

/// Combine the codes of several packages; the worst one wins
pub fn worst(a: i32, b: i32) -> i32 {
    a.max(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use depalign_core::ConfigError;

    #[test]
    fn test_error_codes() {
        let config = AlignError::Config(ConfigError::NotFound("x".into()));
        assert_eq!(for_error(&config), CONFIG_ERROR);

        let resolution = AlignError::NoMatchingVersion {
            requirements: vec!["react-native@0.10".to_string()],
        };
        assert_eq!(for_error(&resolution), RESOLUTION_ERROR);
    }

    #[test]
    fn test_worst_code() {
        assert_eq!(worst(SUCCESS, UNSATISFIED), UNSATISFIED);
        assert_eq!(worst(RESOLUTION_ERROR, CONFIG_ERROR), RESOLUTION_ERROR);
        assert_eq!(worst(SUCCESS, SUCCESS), SUCCESS);
    }
}
