//! Configuration loading and validation tests
//!
//! Tests focus on BEHAVIOR of configuration loading, validation, and error handling.
//! We test observable outcomes, not implementation details of TOML parsing.

use agentflow::config::{AppConfig, ConfigError, FontSize, Theme};
use agentflow::engine::{GenerationClient, ProviderGenerationClient};
use agentflow::llm::{LlmProvider, LlmProviderFactory};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

#[test]
fn test_config_loads_successfully_from_valid_toml() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[llm]
provider = "gemini"
model = "gemini-2.5-flash"
api_key_env = "GEMINI_API_KEY"
temperature = 0.3

[storage]
data_dir = "/var/lib/agentflow"

[settings]
theme = "dark"
font_size = "small"
max_history = 25
"#
    )
    .unwrap();

    let config = AppConfig::load_from_file(temp_file.path()).unwrap();

    assert_eq!(config.llm.provider, "gemini");
    assert_eq!(config.llm.model, "gemini-2.5-flash");
    assert_eq!(config.llm.api_key_env, "GEMINI_API_KEY");
    assert_eq!(config.llm.temperature, 0.3);
    assert_eq!(config.storage.data_dir, Path::new("/var/lib/agentflow"));
    assert_eq!(config.settings.theme, Theme::Dark);
    assert_eq!(config.settings.font_size, FontSize::Small);
    assert_eq!(config.settings.max_history, 25);
    // unspecified fields keep their defaults
    assert_eq!(config.llm.top_p, 0.95);
    assert!(config.settings.auto_fold_history);
}

#[test]
fn test_config_applies_defaults_for_missing_sections() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "[llm]\nmodel = \"gemini-3-pro-preview\"\n").unwrap();

    let config = AppConfig::load_from_file(temp_file.path()).unwrap();

    assert_eq!(config.llm.provider, "gemini");
    assert_eq!(config.llm.model, "gemini-3-pro-preview");
    assert_eq!(config.storage.max_log_entries, 100);
    assert_eq!(config.settings.max_history, 100);
}

#[test]
fn test_config_fails_when_file_is_missing() {
    let result = AppConfig::load_from_file(Path::new("/nonexistent/agentflow.toml"));
    assert!(matches!(result, Err(ConfigError::FileRead(_))));
}

#[test]
fn test_config_fails_on_malformed_toml() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "[llm\nprovider = ").unwrap();

    let result = AppConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_config_rejects_unknown_theme() {
    let result = AppConfig::from_toml_str("[settings]\ntheme = \"neon\"\n");
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_config_rejects_out_of_range_top_p() {
    let result = AppConfig::from_toml_str("[llm]\ntop_p = 1.5\n");
    assert!(matches!(result, Err(ConfigError::InvalidConfig(m)) if m.contains("top_p")));
}

#[test]
fn test_config_rejects_blank_model() {
    let result = AppConfig::from_toml_str("[llm]\nmodel = \"  \"\n");
    assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
}

#[test]
fn test_factory_reports_missing_api_key() {
    let mut config = AppConfig::default();
    config.llm.api_key_env = "AGENTFLOW_FACTORY_TEST_UNSET_KEY".to_string();

    let result = LlmProviderFactory::create_provider(&config);
    assert!(matches!(result, Err(ConfigError::EnvVarNotFound(v)) if v == "AGENTFLOW_FACTORY_TEST_UNSET_KEY"));
}

#[test]
fn test_factory_builds_configured_provider() {
    std::env::set_var("AGENTFLOW_FACTORY_TEST_OPENAI_KEY", "sk-test");

    let mut config = AppConfig::default();
    config.llm.provider = "openai".to_string();
    config.llm.model = "gpt-4o-mini".to_string();
    config.llm.api_key_env = "AGENTFLOW_FACTORY_TEST_OPENAI_KEY".to_string();

    let provider = LlmProviderFactory::create_provider(&config).unwrap();
    assert_eq!(provider.name(), "openai");
}

#[test]
fn test_generation_client_without_key_refuses_to_run() {
    let mut config = AppConfig::default();
    config.llm.api_key_env = "AGENTFLOW_CLIENT_TEST_UNSET_KEY".to_string();

    let client = ProviderGenerationClient::from_config(&config).unwrap();
    assert!(client.provider_name().is_none());

    let err = client.check_ready().unwrap_err();
    assert_eq!(
        err.message,
        "未检测到 AGENTFLOW_CLIENT_TEST_UNSET_KEY 环境变量，请确保环境配置正确。"
    );
}

#[test]
fn test_generation_client_with_key_is_ready() {
    std::env::set_var("AGENTFLOW_CLIENT_TEST_GEMINI_KEY", "test-key");

    let mut config = AppConfig::default();
    config.llm.api_key_env = "AGENTFLOW_CLIENT_TEST_GEMINI_KEY".to_string();

    let client = ProviderGenerationClient::from_config(&config).unwrap();
    assert_eq!(client.provider_name(), Some("gemini"));
    assert!(client.check_ready().is_ok());
}
