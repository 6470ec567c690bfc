use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Session expired or missing, please log in again")]
    Unauthorized,

    #[error("Permission denied: {message}")]
    Forbidden { message: String },

    #[error("API returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid stage: {message}")]
    InvalidStage { message: String },

    #[error("Invalid date '{value}': {message}")]
    InvalidDate { value: String, message: String },

    #[error("No plan found for animal {animal_id}")]
    PlanNotFound { animal_id: String },

    #[error("Quantity out of range: {message}")]
    QuantityOverflow { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Authentication,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FeedError {
    /// Maps a non-success HTTP status to an error, extracting a message from
    /// the response body when one is present.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = extract_message(body).unwrap_or_else(|| {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("unknown error")
                .to_string()
        });

        match status {
            401 => FeedError::Unauthorized,
            403 => FeedError::Forbidden { message },
            _ => FeedError::ApiError { status, message },
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            FeedError::HttpError(_) | FeedError::ApiError { .. } => ErrorCategory::Network,
            FeedError::Unauthorized | FeedError::Forbidden { .. } => ErrorCategory::Authentication,
            FeedError::CsvError(_)
            | FeedError::SerializationError(_)
            | FeedError::InvalidStage { .. }
            | FeedError::InvalidDate { .. }
            | FeedError::PlanNotFound { .. }
            | FeedError::QuantityOverflow { .. } => ErrorCategory::Data,
            FeedError::ConfigValidationError { .. }
            | FeedError::MissingConfigError { .. }
            | FeedError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            FeedError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FeedError::PlanNotFound { .. }
            | FeedError::HttpError(_)
            | FeedError::ApiError { .. } => ErrorSeverity::Medium,
            FeedError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            FeedError::HttpError(e) if e.is_timeout() => {
                "The server took too long to answer".to_string()
            }
            FeedError::HttpError(_) => "Could not reach the farm server".to_string(),
            FeedError::Unauthorized => "Your session has expired".to_string(),
            FeedError::Forbidden { .. } => {
                "You do not have permission to perform this action".to_string()
            }
            FeedError::ApiError { status, message } => {
                format!("The server rejected the request ({status}): {message}")
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check the API base_url and your network connection",
            ErrorCategory::Authentication => match self {
                FeedError::Unauthorized => "Run `feedplan login` to start a new session",
                _ => "Ask an administrator to grant you access",
            },
            ErrorCategory::Data => "Review the plan stages and lot data on the server",
            ErrorCategory::Configuration => "Fix the configuration file and try again",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

fn extract_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error", "detail"] {
            match map.get(key) {
                Some(serde_json::Value::String(s)) if !s.is_empty() => return Some(s.clone()),
                Some(serde_json::Value::Array(items)) if !items.is_empty() => {
                    let joined = items
                        .iter()
                        .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                        .collect::<Vec<_>>()
                        .join("; ");
                    return Some(joined);
                }
                _ => {}
            }
        }
        return None;
    }

    Some(body.to_string())
}

pub type Result<T> = std::result::Result<T, FeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(FeedError::from_status(401, ""), FeedError::Unauthorized));
        assert!(matches!(
            FeedError::from_status(403, r#"{"message":"admins only"}"#),
            FeedError::Forbidden { message } if message == "admins only"
        ));
        assert!(matches!(
            FeedError::from_status(500, ""),
            FeedError::ApiError { status: 500, message } if message == "Internal Server Error"
        ));
    }

    #[test]
    fn test_message_extraction() {
        assert_eq!(
            extract_message(r#"{"error":"dayEnd must be >= dayStart"}"#).as_deref(),
            Some("dayEnd must be >= dayStart")
        );
        assert_eq!(
            extract_message(r#"{"message":["a","b"]}"#).as_deref(),
            Some("a; b")
        );
        assert_eq!(extract_message("plain failure").as_deref(), Some("plain failure"));
        assert_eq!(extract_message(r#"{"code":7}"#), None);
        assert_eq!(extract_message("   "), None);
    }

    #[test]
    fn test_category_and_severity() {
        let e = FeedError::Unauthorized;
        assert_eq!(e.category(), ErrorCategory::Authentication);
        assert_eq!(e.severity(), ErrorSeverity::High);
        assert!(e.recovery_suggestion().contains("login"));

        let e = FeedError::PlanNotFound {
            animal_id: "7".to_string(),
        };
        assert_eq!(e.category(), ErrorCategory::Data);
        assert_eq!(e.severity(), ErrorSeverity::Medium);
        assert!(e.severity() > ErrorSeverity::Low);

        let e = FeedError::QuantityOverflow {
            message: "cost of Maiz".to_string(),
        };
        assert_eq!(e.category(), ErrorCategory::Data);
        assert_eq!(e.severity(), ErrorSeverity::High);
    }
}
