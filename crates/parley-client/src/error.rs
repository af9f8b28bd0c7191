use serde::Deserialize;
use thiserror::Error;

/// Server error taxonomy as seen from the client, plus transport failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("{0}")]
    InvalidInput(String),
    
    #[error("{0}")]
    Conflict(String),
    
    #[error("{0}")]
    Unauthorized(String),
    
    #[error("{0}")]
    NotFound(String),
    
    #[error("{0}")]
    UpstreamFailure(String),
    
    #[error("{0}")]
    Server(String),
    
    #[error("Network error: {0}")]
    Network(String),
    
    #[error("Unexpected response: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// `{ "error", "code" }` body returned by the API
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

impl ClientError {
    /// Rebuild the error from a non-2xx response. `code` wins over status.
    pub fn from_response(status: u16, body: Option<ErrorBody>) -> Self {
        let ErrorBody { error, code } = body.unwrap_or_default();
        let message = if error.is_empty() {
            format!("Request failed with status {}", status)
        } else {
            error
        };
        
        match (code.as_str(), status) {
            ("invalid_input", _) | ("", 400) => Self::InvalidInput(message),
            ("conflict", _) | ("", 409) => Self::Conflict(message),
            ("unauthorized", _) | ("", 401) => Self::Unauthorized(message),
            ("not_found", _) | ("", 404) => Self::NotFound(message),
            ("upstream_failure", _) => Self::UpstreamFailure(message),
            _ => Self::Server(message),
        }
    }
    
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
    
    /// Short text for the user
    pub fn notice(&self) -> String {
        match self {
            Self::InvalidInput(message) => message.clone(),
            Self::Conflict(_) => "That username is already taken.".to_string(),
            Self::Unauthorized(_) => "Please log in to continue.".to_string(),
            Self::NotFound(_) => "That conversation no longer exists.".to_string(),
            Self::UpstreamFailure(_) => "The assistant could not reply. Please try again.".to_string(),
            Self::Server(_) => "Something went wrong on the server.".to_string(),
            Self::Network(_) => "Could not reach the server.".to_string(),
            Self::Decode(_) => "Received an unexpected response from the server.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(error: &str, code: &str) -> Option<ErrorBody> {
        Some(ErrorBody {
            error: error.to_string(),
            code: code.to_string(),
        })
    }

    #[test]
    fn test_code_drives_mapping() {
        assert_eq!(
            ClientError::from_response(500, body("Failed", "upstream_failure")),
            ClientError::UpstreamFailure("Failed".to_string())
        );
        assert_eq!(
            ClientError::from_response(500, body("Internal server error", "internal")),
            ClientError::Server("Internal server error".to_string())
        );
        assert_eq!(
            ClientError::from_response(409, body("Username already exists", "conflict")),
            ClientError::Conflict("Username already exists".to_string())
        );
    }

    #[test]
    fn test_status_is_the_fallback() {
        assert!(matches!(ClientError::from_response(401, None), ClientError::Unauthorized(_)));
        assert!(matches!(ClientError::from_response(404, None), ClientError::NotFound(_)));
        assert!(matches!(ClientError::from_response(400, None), ClientError::InvalidInput(_)));
        assert!(matches!(ClientError::from_response(408, None), ClientError::Server(_)));
    }

    #[test]
    fn test_notice_never_leaks_server_detail() {
        let err = ClientError::Server("stack trace here".to_string());
        assert!(!err.notice().contains("stack"));
        assert_eq!(
            ClientError::InvalidInput("Message is required".to_string()).notice(),
            "Message is required"
        );
    }
}
