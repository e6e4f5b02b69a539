use super::*;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.browser.debug_port, 9222);
    assert!(!config.browser.headless);
    assert!(config.browser.persist_profile);
    assert!(config.providers.is_empty());
}

#[test]
fn test_engine_defaults() {
    let engine = EngineConfig::default();
    assert_eq!(engine.locator_timeout(), Duration::from_secs(5));
    assert_eq!(engine.poll_interval(), Duration::from_millis(100));
    assert_eq!(engine.auth_timeout(), Duration::from_secs(60));
    assert!(!engine.dry_run);
    assert!(engine.capture_snapshots);
}

#[test]
fn test_profile_dir_default() {
    let browser = BrowserConfig::default();
    assert!(
        browser
            .resolved_profile_dir()
            .ends_with("mailhands-chrome-profile")
    );

    let custom = BrowserConfig {
        profile_dir: Some(PathBuf::from("/tmp/profile")),
        ..Default::default()
    };
    assert_eq!(custom.resolved_profile_dir(), PathBuf::from("/tmp/profile"));
}

#[test]
fn test_diagnostics_dir_default() {
    let engine = EngineConfig::default();
    assert!(
        engine
            .resolved_diagnostics_dir()
            .ends_with("mailhands-diagnostics")
    );
}

#[test]
fn test_partial_engine_section_keeps_defaults() {
    let engine: EngineConfig = toml::from_str("auth_timeout_secs = 5").unwrap();
    assert_eq!(engine.auth_timeout_secs, 5);
    assert_eq!(engine.locator_timeout_ms, 5_000);
    assert!(engine.capture_snapshots);
}

#[test]
fn test_provider_override_deserialize() {
    let content = r#"
        base_url = "https://mail.google.com/mail/u/1"
        [locators]
        compose = ["css:div[gh='cm']", "label:Compose"]
    "#;
    let over: ProviderOverride = toml::from_str(content).unwrap();
    assert_eq!(
        over.base_url.as_deref(),
        Some("https://mail.google.com/mail/u/1")
    );
    assert_eq!(over.locators["compose"].len(), 2);
}

#[test]
fn test_config_serialize_skips_unset_paths() {
    let json = serde_json::to_string(&Config::default()).unwrap();
    assert!(!json.contains("profile_dir"));
    assert!(!json.contains("diagnostics_dir"));
    assert!(json.contains("debug_port"));
}
