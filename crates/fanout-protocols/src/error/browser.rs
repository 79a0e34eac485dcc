//! Tab driver errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Browser not connected")]
    NotConnected,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Tab not found: {0}")]
    TabNotFound(String),

    #[error("Activation failed: {0}")]
    ActivationFailed(String),

    #[error("Script injection failed: {0}")]
    InjectionFailed(String),

    #[error("Scraper script not found: {0}")]
    ScriptNotFound(String),

    #[error("Message delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Browser error: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_not_found_error() {
        let err = BrowserError::TabNotFound("ABC123".to_string());
        let display = err.to_string();
        assert!(display.contains("not found"));
        assert!(display.contains("ABC123"));
    }

    #[test]
    fn test_injection_failed_error() {
        let err = BrowserError::InjectionFailed("permission denied".to_string());
        assert_eq!(err.to_string(), "Script injection failed: permission denied");
    }

    #[test]
    fn test_script_not_found_error() {
        let err = BrowserError::ScriptNotFound("content_kimi.js".to_string());
        assert!(err.to_string().contains("content_kimi.js"));
    }

    #[test]
    fn test_all_error_variants() {
        let errors: Vec<BrowserError> = vec![
            BrowserError::NotConnected,
            BrowserError::ConnectionFailed("a".to_string()),
            BrowserError::TabNotFound("b".to_string()),
            BrowserError::ActivationFailed("c".to_string()),
            BrowserError::InjectionFailed("d".to_string()),
            BrowserError::ScriptNotFound("e".to_string()),
            BrowserError::DeliveryFailed("f".to_string()),
            BrowserError::Other("g".to_string()),
        ];

        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }
}
