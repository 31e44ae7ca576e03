/// Errors that cross the ingestion boundary
///
/// Only a structurally wrong payload is an error. Individual malformed rows
/// are dropped by the normalizer and counted in its report instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("unrecognized payload shape")]
    UnrecognizedShape,

    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),
}

impl From<serde_json::Error> for FormatError {
    fn from(err: serde_json::Error) -> Self {
        FormatError::InvalidJson(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages() {
        assert_eq!(
            FormatError::UnrecognizedShape.to_string(),
            "unrecognized payload shape"
        );

        let err: FormatError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(err.to_string().starts_with("payload is not valid JSON"));
    }
}
