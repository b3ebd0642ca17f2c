//! Error types for the Meta Graph client

use std::fmt;

#[derive(Debug)]
pub enum MetaGraphError {
    Http(reqwest::Error),
    /// Non-2xx platform response, with the message from the error body
    Api { status: u16, message: String },
    /// A field the contract requires was absent from the response
    MissingField(&'static str),
}

impl fmt::Display for MetaGraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaGraphError::Http(err) => write!(f, "HTTP error: {}", err),
            MetaGraphError::Api { status, message } => {
                write!(f, "Platform API error ({}): {}", status, message)
            }
            MetaGraphError::MissingField(field) => {
                write!(f, "Platform response missing field: {}", field)
            }
        }
    }
}

impl std::error::Error for MetaGraphError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MetaGraphError::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for MetaGraphError {
    fn from(err: reqwest::Error) -> Self {
        MetaGraphError::Http(err)
    }
}

pub type Result<T> = std::result::Result<T, MetaGraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = MetaGraphError::Api {
            status: 400,
            message: "Invalid OAuth access token".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Platform API error (400): Invalid OAuth access token"
        );
    }

    #[test]
    fn test_missing_field_display() {
        let err = MetaGraphError::MissingField("user_id");
        assert!(format!("{}", err).contains("user_id"));
    }
}
