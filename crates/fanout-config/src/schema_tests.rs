use super::*;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8765);
    assert_eq!(config.browser.debug_port, 9222);
    assert_eq!(config.platforms.enabled, vec!["chatgpt", "gemini"]);
    assert!(config.platforms.custom.is_empty());
}

#[test]
fn test_coordinator_defaults() {
    let config = CoordinatorConfig::default();
    assert_eq!(config.settle_delay(), Duration::from_millis(300));
    assert_eq!(config.result_delay(), Duration::from_secs(2));
    assert_eq!(config.restore_delay(), Duration::from_secs(2));
    assert_eq!(config.query_timeout(), Duration::from_secs(45));
    assert_eq!(config.event_capacity, 256);
}

#[test]
fn test_browser_endpoint_from_port() {
    let config = BrowserConfig {
        debug_port: 9333,
        ..Default::default()
    };
    assert_eq!(config.endpoint(), "http://localhost:9333");
}

#[test]
fn test_browser_endpoint_override() {
    let config = BrowserConfig {
        endpoint: Some("http://10.0.0.2:9222".to_string()),
        ..Default::default()
    };
    assert_eq!(config.endpoint(), "http://10.0.0.2:9222");
}

#[test]
fn test_custom_platform_defaults() {
    let custom = CustomPlatformConfig {
        id: "claude".to_string(),
        name: None,
        url_pattern: "https://claude.ai/*".to_string(),
        script: None,
    };
    assert_eq!(custom.display_name(), "claude");
    assert_eq!(custom.script_path(), "content_claude.js");
}

#[test]
fn test_logging_dir_default() {
    let logging = LoggingConfig::default();
    assert!(logging.log_dir().ends_with(".fanout/logs"));
}

#[test]
fn test_partial_coordinator_section() {
    let config: Config = toml::from_str(
        r#"
        [coordinator]
        result_delay_ms = 0
        "#,
    )
    .unwrap();
    assert_eq!(config.coordinator.result_delay_ms, 0);
    assert_eq!(config.coordinator.settle_delay_ms, 300);
}
