pub type PlateResult<T> = Result<T, PlateError>;

#[derive(thiserror::Error, Debug)]
pub enum PlateError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("upstream generation failure: {0}")]
    UpstreamGeneration(String),

    #[error("upstream transform unavailable: {0}")]
    TransformUnavailable(String),

    #[error("font error: {0}")]
    Font(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlateError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn upstream_generation(msg: impl Into<String>) -> Self {
        Self::UpstreamGeneration(msg.into())
    }

    pub fn transform_unavailable(msg: impl Into<String>) -> Self {
        Self::TransformUnavailable(msg.into())
    }

    pub fn font(msg: impl Into<String>) -> Self {
        Self::Font(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Upstream failures are expected during normal operation; a batch keeps going past them.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UpstreamGeneration(_) | Self::TransformUnavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            PlateError::invalid_argument("x")
                .to_string()
                .contains("invalid argument:")
        );
        assert!(
            PlateError::upstream_generation("x")
                .to_string()
                .contains("upstream generation failure:")
        );
        assert!(
            PlateError::transform_unavailable("x")
                .to_string()
                .contains("upstream transform unavailable:")
        );
        assert!(PlateError::font("x").to_string().contains("font error:"));
        assert!(PlateError::config("x").to_string().contains("config error:"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = PlateError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn only_upstream_failures_are_recoverable() {
        assert!(PlateError::upstream_generation("no image").is_recoverable());
        assert!(PlateError::transform_unavailable("missing").is_recoverable());
        assert!(!PlateError::invalid_argument("zero width").is_recoverable());
        assert!(!PlateError::font("bad").is_recoverable());
    }
}
