//! Error types for agentflow
//!
//! `FlowError` covers everything that can stop an operation from starting:
//! configuration problems, invalid input, storage failures. Failures of an
//! individual pipeline step are not errors at this level; they are recorded on
//! the step itself (see `engine::executor`).

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Main error type for agentflow operations
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl FlowError {
    /// Create configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the error means a run could not start because of setup problems
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::Config(_))
    }

    /// Message safe to show in logs and on the terminal
    pub fn display_message(&self) -> String {
        sanitize_error_message(&self.to_string())
    }
}

fn secret_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(password|token|key|secret)[=:]\s*\S+").expect("secret pattern is valid")
    })
}

fn sensitive_path_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"/[a-zA-Z0-9._/-]+/(secrets?|\.ssh|\.aws|\.config)/[a-zA-Z0-9._/-]+")
            .expect("path pattern is valid")
    })
}

const MAX_SANITIZED_LEN: usize = 500;

/// Redact credentials and sensitive paths, and cap the length at 500 bytes
pub fn sanitize_error_message(message: &str) -> String {
    let mut sanitized = secret_pattern()
        .replace_all(message, "${1}=***")
        .to_string();

    sanitized = sensitive_path_pattern()
        .replace_all(&sanitized, "/***REDACTED***/")
        .to_string();

    if sanitized.len() > MAX_SANITIZED_LEN {
        let truncate_suffix = "...[truncated]";
        let mut cut = MAX_SANITIZED_LEN - truncate_suffix.len();
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized = format!("{}{}", &sanitized[..cut], truncate_suffix);
    }

    sanitized
}

/// Result type for agentflow operations
pub type FlowResult<T> = Result<T, FlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_constructor() {
        let error = FlowError::invalid_input("missing description");
        assert!(matches!(error, FlowError::InvalidInput { .. }));
        assert_eq!(error.to_string(), "Invalid input: missing description");
    }

    #[test]
    fn test_configuration_constructor() {
        let error = FlowError::configuration("API_KEY not set");
        assert!(error.is_configuration());
        assert_eq!(error.to_string(), "Configuration error: API_KEY not set");
    }

    #[test]
    fn test_config_error_conversion_is_configuration() {
        let error: FlowError =
            crate::config::ConfigError::EnvVarNotFound("API_KEY".to_string()).into();
        assert!(error.is_configuration());
        assert!(error.to_string().contains("API_KEY"));
    }

    #[test]
    fn test_not_found_errors_are_not_configuration() {
        assert!(!FlowError::AgentNotFound("agent-9".to_string()).is_configuration());
        assert!(!FlowError::TaskNotFound("t-1".to_string()).is_configuration());
        assert!(!FlowError::internal("boom").is_configuration());
    }

    #[test]
    fn test_display_message_is_sanitized() {
        let error = FlowError::configuration("bad request: key=abc123");
        let message = error.display_message();
        assert!(!message.contains("abc123"));
        assert!(message.contains("key=***"));
    }

    #[test]
    fn test_sanitize_multiple_secrets() {
        let message = "Auth failed: password=pass1 api_key=key123 secret=hidden token=tok456";
        let sanitized = sanitize_error_message(message);

        assert!(!sanitized.contains("pass1"));
        assert!(!sanitized.contains("key123"));
        assert!(!sanitized.contains("hidden"));
        assert!(!sanitized.contains("tok456"));
        assert!(sanitized.contains("password=***"));
    }

    #[test]
    fn test_sanitize_with_colons() {
        let sanitized = sanitize_error_message("password: secret123 token: abc456");
        assert!(!sanitized.contains("secret123"));
        assert!(!sanitized.contains("abc456"));
    }

    #[test]
    fn test_file_path_redaction() {
        let sanitized = sanitize_error_message("Failed to read /home/user/.ssh/id_rsa");
        assert!(sanitized.contains("/***REDACTED***/"));
        assert!(!sanitized.contains("/home/user/.ssh/id_rsa"));
    }

    #[test]
    fn test_long_message_truncation() {
        let sanitized = sanitize_error_message(&"x".repeat(600));
        assert!(sanitized.len() <= 500);
        assert!(sanitized.ends_with("...[truncated]"));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let sanitized = sanitize_error_message(&"错".repeat(300));
        assert!(sanitized.len() <= 500);
        assert!(sanitized.ends_with("...[truncated]"));
    }

    #[test]
    fn test_sanitize_exactly_500_chars() {
        let sanitized = sanitize_error_message(&"x".repeat(500));
        assert_eq!(sanitized.len(), 500);
        assert!(!sanitized.contains("truncated"));
    }

    #[test]
    fn test_sanitize_empty_message() {
        assert_eq!(sanitize_error_message(""), "");
    }
}
