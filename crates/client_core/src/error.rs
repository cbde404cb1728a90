use thiserror::Error;

/// Message shown for every failure that is neither a validation error nor a
/// server-reported one.
pub const NO_RESULT_MESSAGE: &str = "No result was received from the conversion server";

/// Input problems caught before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Text to convert is empty")]
    EmptyInput,
    #[error("Regular expression in GROK format is not set")]
    MissingExpression,
    #[error("GROK patterns are malformed: {0}")]
    MalformedPatterns(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("request timed out")]
    Timeout,
    #[error("response body is not a conversion envelope: {0}")]
    InvalidBody(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::InvalidBody(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Server,
    Transport,
}

/// Everything a conversion attempt can end with besides a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Server(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("response carried neither a result nor an error")]
    NoResult,
}

impl ConvertError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConvertError::Validation(_) => ErrorCategory::Validation,
            ConvertError::Server(_) => ErrorCategory::Server,
            ConvertError::Transport(_) | ConvertError::NoResult => ErrorCategory::Transport,
        }
    }

    /// Text for the alert. Server errors are passed through untouched;
    /// transport and contract failures collapse into one generic message.
    pub fn user_message(&self) -> String {
        match self {
            ConvertError::Validation(err) => err.to_string(),
            ConvertError::Server(message) => message.clone(),
            ConvertError::Transport(_) | ConvertError::NoResult => NO_RESULT_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_shown_verbatim() {
        let err = ConvertError::Server("Your daily request limit has been reached".into());
        assert_eq!(err.category(), ErrorCategory::Server);
        assert_eq!(err.user_message(), "Your daily request limit has been reached");
    }

    #[test]
    fn transport_failures_share_the_generic_message() {
        let timeout = ConvertError::from(TransportError::Timeout);
        let invalid = ConvertError::from(TransportError::InvalidBody("expected value".into()));
        assert_eq!(timeout.category(), ErrorCategory::Transport);
        assert_eq!(timeout.user_message(), NO_RESULT_MESSAGE);
        assert_eq!(invalid.user_message(), NO_RESULT_MESSAGE);
        assert_eq!(ConvertError::NoResult.user_message(), NO_RESULT_MESSAGE);
    }

    #[test]
    fn validation_errors_describe_the_input() {
        let err = ConvertError::from(ValidationError::MissingExpression);
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(
            err.user_message(),
            "Regular expression in GROK format is not set"
        );
    }
}
