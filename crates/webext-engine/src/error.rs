//! Engine error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Source failed: {0}")]
    SourceFailed(String),

    #[error("Target failed: {0}")]
    TargetFailed(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Engine error: {0}")]
    Other(String),
}

impl EngineError {
    /// The transfer broke on the remote side (DNS, connection, HTTP status).
    pub fn because_source_failed(&self) -> bool {
        matches!(self, EngineError::SourceFailed(_))
    }

    /// Writing the local file failed.
    pub fn because_target_failed(&self) -> bool {
        matches!(self, EngineError::TargetFailed(_) | EngineError::Io(_))
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_side() {
        assert!(EngineError::SourceFailed("503".into()).because_source_failed());
        assert!(!EngineError::SourceFailed("503".into()).because_target_failed());
        assert!(EngineError::TargetFailed("disk full".into()).because_target_failed());

        let io: EngineError = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "ro").into();
        assert!(io.because_target_failed());

        let other = EngineError::Other("boom".into());
        assert!(!other.because_source_failed());
        assert!(!other.because_target_failed());
    }
}
