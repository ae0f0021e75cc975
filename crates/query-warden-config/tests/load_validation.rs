//! Config load validation tests for query-warden-config.
// crates/query-warden-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding, parse).
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;

use query_warden_config::ConfigError;
use query_warden_config::WardenConfig;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<WardenConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

/// Minimal valid config body used as the baseline for mutations.
const VALID_CONFIG: &str = r#"
[llm]
endpoint = "https://llm.example/v1/chat/completions"
model = "gpt-4o-mini"
api_key_env = "WARDEN_LLM_KEY"

[catalog]
endpoint = "https://shop.example/admin/api/graphql.json"
token_env = "WARDEN_CATALOG_TOKEN"
"#;

fn write_config(content: &str) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content.as_bytes()).map_err(|err| err.to_string())?;
    Ok(file)
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    let path = Path::new(&long_path);
    assert_invalid(WardenConfig::load(Some(path)), "path exceeds max length")?;
    Ok(())
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    let path = Path::new(&long_component);
    assert_invalid(WardenConfig::load(Some(path)), "path component exceeds max length")?;
    Ok(())
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let payload = vec![b'a'; 1_048_577];
    file.write_all(&payload).map_err(|err| err.to_string())?;
    assert_invalid(WardenConfig::load(Some(file.path())), "config file exceeds size limit")?;
    Ok(())
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(WardenConfig::load(Some(file.path())), "config file must be utf-8")?;
    Ok(())
}

#[test]
fn load_rejects_malformed_toml() -> TestResult {
    let file = write_config("[llm\nendpoint = ")?;
    assert_invalid(WardenConfig::load(Some(file.path())), "config parse error")?;
    Ok(())
}

#[test]
fn load_accepts_minimal_valid_config() -> TestResult {
    let file = write_config(VALID_CONFIG)?;
    let config = WardenConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    // Section defaults are applied.
    if config.bot.handle != "warden" {
        return Err(format!("unexpected default handle {}", config.bot.handle));
    }
    if config.limits.max_requests != 10 || config.limits.window_ms != 60_000 {
        return Err("unexpected default limits".to_string());
    }
    if !config.access.allowed_users.is_empty() || config.access.allow_updates {
        return Err("unexpected default access config".to_string());
    }
    Ok(())
}

#[test]
fn load_rejects_missing_required_section() -> TestResult {
    let file = write_config("[llm]\nendpoint = \"https://llm.example\"\nmodel = \"m\"\napi_key_env = \"K\"\n")?;
    assert_invalid(WardenConfig::load(Some(file.path())), "config parse error")?;
    Ok(())
}
