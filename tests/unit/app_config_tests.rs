/*!
 * Unit tests for configuration loading and validation
 */

use std::io::Write;

use yatsai::app_config::{Config, LogLevel};
use yatsai::errors::ConfigError;
use yatsai::transcript_processor::CuePolicy;

#[test]
fn test_default_config_should_validate() {
    let config = Config::default();
    assert!(config.validate().is_ok());
}

#[test]
fn test_default_config_should_use_ollama_defaults() {
    let config = Config::default();
    assert_eq!(config.provider.endpoint, "http://localhost:11434");
    assert_eq!(config.provider.model, "llama3");
    assert_eq!(config.provider.max_concurrent_requests, 3);
    assert_eq!(config.summarization.chunk_token_budget, 2000);
    assert_eq!(config.summarization.overlap_token_budget, 200);
    assert_eq!(config.summarization.cue_policy, CuePolicy::DocumentOrder);
    assert_eq!(config.log_level, LogLevel::Info);
}

#[test]
fn test_zero_chunk_budget_should_fail_validation() {
    let mut config = Config::default();
    config.summarization.chunk_token_budget = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::NotPositive { .. })
    ));
}

#[test]
fn test_overlap_not_below_chunk_budget_should_fail_validation() {
    let mut config = Config::default();
    config.summarization.chunk_token_budget = 100;
    config.summarization.overlap_token_budget = 100;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::BudgetOverlap { .. })
    ));
}

#[test]
fn test_overlap_not_below_reduction_budget_should_fail_validation() {
    let mut config = Config::default();
    config.summarization.reduction_token_budget = 150;
    config.summarization.overlap_token_budget = 200;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::BudgetOverlap { .. })
    ));
}

#[test]
fn test_zero_concurrency_should_fail_validation() {
    let mut config = Config::default();
    config.provider.max_concurrent_requests = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_zero_timeout_should_fail_validation() {
    let mut config = Config::default();
    config.provider.timeout_secs = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_out_of_range_temperature_should_fail_validation() {
    let mut config = Config::default();
    config.provider.temperature = 2.5;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::TemperatureOutOfRange(_))
    ));

    config.provider.temperature = -0.1;
    assert!(config.validate().is_err());
}

#[test]
fn test_empty_model_should_fail_validation() {
    let mut config = Config::default();
    config.provider.model = "  ".to_string();
    assert!(matches!(config.validate(), Err(ConfigError::MissingModel)));
}

#[test]
fn test_from_file_should_load_partial_config_with_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "provider": {{ "model": "mistral" }},
            "summarization": {{ "chunk_token_budget": 1500 }}
        }}"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.provider.model, "mistral");
    assert_eq!(config.summarization.chunk_token_budget, 1500);
    // Unspecified fields fall back to defaults
    assert_eq!(config.summarization.overlap_token_budget, 200);
    assert_eq!(config.provider.endpoint, "http://localhost:11434");
}

#[test]
fn test_from_file_should_reject_malformed_json() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "not json at all").unwrap();

    assert!(matches!(
        Config::from_file(file.path()),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_from_file_should_report_missing_file() {
    assert!(matches!(
        Config::from_file("/nonexistent/conf.json"),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn test_config_should_round_trip_through_json() {
    let mut config = Config::default();
    config.summarization.cue_policy = CuePolicy::SortByStart;
    config.summarization.allow_partial = true;

    let json = serde_json::to_string(&config).unwrap();
    let loaded: Config = serde_json::from_str(&json).unwrap();

    assert_eq!(loaded.summarization.cue_policy, CuePolicy::SortByStart);
    assert!(loaded.summarization.allow_partial);
    assert_eq!(loaded.provider.model, config.provider.model);
}
