use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const APP_NAME: &str = "lnpay-demo";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub lnurl: LnurlConfig,
    #[serde(default)]
    pub scroll: ScrollSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_kind")]
    pub kind: String, // "mock" | "none"
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
    /// Whether the mock wallet reports itself as already enabled.
    #[serde(default)]
    pub auto_enable: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_provider_kind(),
            latency_ms: default_latency_ms(),
            auto_enable: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_ledger_path")]
    pub path: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LnurlConfig {
    /// `https` everywhere except local test services.
    #[serde(default = "default_scheme")]
    pub scheme: String,
}

impl Default for LnurlConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollSettings {
    #[serde(default = "default_section_count")]
    pub section_count: u32,
    #[serde(default = "default_sats_per_section")]
    pub sats_per_section: u64,
    #[serde(default = "default_destination")]
    pub destination: String,
    #[serde(default = "default_test_mode_delay_ms")]
    pub test_mode_delay_ms: u64,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            section_count: default_section_count(),
            sats_per_section: default_sats_per_section(),
            destination: default_destination(),
            test_mode_delay_ms: default_test_mode_delay_ms(),
        }
    }
}

fn default_provider_kind() -> String {
    "mock".to_string()
}

fn default_latency_ms() -> u64 {
    200
}

fn default_ledger_path() -> String {
    ".lnpay_ledger".to_string()
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_section_count() -> u32 {
    5
}

fn default_sats_per_section() -> u64 {
    1
}

fn default_destination() -> String {
    "023d70f2f76d283c6c4e58109ee3ad2031b727fdd507a8d6059ef8c779c5d357aa".to_string()
}

fn default_test_mode_delay_ms() -> u64 {
    1_000
}

pub fn load() -> Result<AppConfig> {
    let cfg: AppConfig = confy::load(APP_NAME, None).context("Failed to load app config")?;
    Ok(cfg)
}

pub fn store(cfg: &AppConfig) -> Result<()> {
    confy::store(APP_NAME, None, cfg).context("Failed to store app config")?;
    Ok(())
}

/// Loads from an explicit file, creating it with defaults if missing.
pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig> {
    let path = path.as_ref();
    let cfg: AppConfig = confy::load_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lnpay.toml");
        std::fs::write(
            &path,
            "[server]\nbind = \"0.0.0.0:8080\"\n\n[scroll]\nsats_per_section = 3\n",
        )
        .unwrap();

        let cfg = load_from(&path).unwrap();
        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
        assert_eq!(cfg.scroll.sats_per_section, 3);
        assert_eq!(cfg.scroll.section_count, 5);
        assert_eq!(cfg.provider.kind, "mock");
        assert_eq!(cfg.ledger.path, ".lnpay_ledger");
        assert_eq!(cfg.lnurl.scheme, "https");
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.toml");

        let cfg = load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.display.currency, "USD");
        assert_eq!(cfg.scroll.test_mode_delay_ms, 1_000);
    }
}
