use serde::Deserialize;
use std::{fs, path::Path, time::Duration};

use crate::domain::arbitrage::FundingArbSettings;
use crate::domain::execution::ExecutionSettings;
use crate::domain::farming::FarmingSettings;
use crate::shared::errors::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct AppCfg {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HyperliquidCfg {
    #[serde(default = "enabled")]
    pub enabled: bool,
    #[serde(default = "default_hyperliquid_url")]
    pub base_url: String,
    #[serde(default)]
    pub wallet_address: String,
    #[serde(default)]
    pub private_key: String,
}

impl Default for HyperliquidCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_hyperliquid_url(),
            wallet_address: String::new(),
            private_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LighterCfg {
    #[serde(default = "enabled")]
    pub enabled: bool,
    #[serde(default = "default_lighter_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub private_key: String,
}

impl Default for LighterCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_lighter_url(),
            api_key: String::new(),
            private_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EdgeXCfg {
    #[serde(default = "enabled")]
    pub enabled: bool,
    #[serde(default = "default_edgex_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub stark_private_key: String,
    #[serde(default = "default_edgex_ws_url")]
    pub ws_url: String,
}

impl Default for EdgeXCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_edgex_url(),
            api_key: String::new(),
            secret_key: String::new(),
            account_id: String::new(),
            stark_private_key: String::new(),
            ws_url: default_edgex_ws_url(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExchangesCfg {
    #[serde(default)]
    pub hyperliquid: HyperliquidCfg,
    #[serde(default)]
    pub lighter: LighterCfg,
    #[serde(default)]
    pub edgex: EdgeXCfg,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FundingArbCfg {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_pairs")]
    pub pairs: Vec<String>,
    #[serde(default = "default_min_funding_diff")]
    pub min_funding_diff: f64,
    /// Parsed for completeness; orders are sized by `trade_size` only.
    #[serde(default = "default_leverage")]
    pub leverage: f64,
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
    #[serde(default)]
    pub execute_trades: bool,
    #[serde(default = "default_trade_size")]
    pub trade_size: f64,
    #[serde(default = "default_slippage_buffer")]
    pub slippage_buffer: f64,
}

impl Default for FundingArbCfg {
    fn default() -> Self {
        Self {
            enabled: false,
            pairs: default_pairs(),
            min_funding_diff: default_min_funding_diff(),
            leverage: default_leverage(),
            check_interval_ms: default_check_interval_ms(),
            execute_trades: false,
            trade_size: default_trade_size(),
            slippage_buffer: default_slippage_buffer(),
        }
    }
}

impl FundingArbCfg {
    pub fn engine_settings(&self) -> FundingArbSettings {
        FundingArbSettings {
            pairs: self.pairs.iter().map(|p| p.as_str().into()).collect(),
            min_funding_diff: self.min_funding_diff,
            check_interval: Duration::from_millis(self.check_interval_ms),
            execute_trades: self.execute_trades,
        }
    }

    pub fn execution_settings(&self) -> ExecutionSettings {
        ExecutionSettings {
            trade_size: self.trade_size,
            slippage_buffer: self.slippage_buffer,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct XpFarmingCfg {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub target_volume_daily: f64,
    #[serde(default = "default_max_slippage")]
    pub max_slippage: f64,
    #[serde(default = "default_farming_venue")]
    pub venue: String,
    #[serde(default = "default_farming_symbol")]
    pub symbol: String,
    #[serde(default = "default_trade_size")]
    pub trade_size: f64,
    #[serde(default = "default_min_interval_secs")]
    pub min_interval_secs: u64,
    #[serde(default = "default_max_interval_secs")]
    pub max_interval_secs: u64,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for XpFarmingCfg {
    fn default() -> Self {
        Self {
            enabled: false,
            target_volume_daily: 0.0,
            max_slippage: default_max_slippage(),
            venue: default_farming_venue(),
            symbol: default_farming_symbol(),
            trade_size: default_trade_size(),
            min_interval_secs: default_min_interval_secs(),
            max_interval_secs: default_max_interval_secs(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl XpFarmingCfg {
    pub fn farming_settings(&self) -> FarmingSettings {
        FarmingSettings {
            venue: self.venue.as_str().into(),
            symbol: self.symbol.as_str().into(),
            trade_size: self.trade_size,
            max_slippage: self.max_slippage,
            min_interval: Duration::from_secs(self.min_interval_secs),
            max_interval: Duration::from_secs(self.max_interval_secs),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            target_volume_daily: self.target_volume_daily,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrategiesCfg {
    #[serde(default)]
    pub funding_arb: FundingArbCfg,
    #[serde(default)]
    pub xp_farming: XpFarmingCfg,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppCfg,
    #[serde(default)]
    pub exchanges: ExchangesCfg,
    #[serde(default)]
    pub strategies: StrategiesCfg,
}

/// Command-line values that win over the file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub execute_trades: Option<bool>,
    pub log_level: Option<String>,
}

impl Config {
    /// Reads the file, applies credential overrides from the environment and validates.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let s = fs::read_to_string(path.as_ref())?;
        let mut cfg = Self::from_toml_str(&s)?;
        cfg.apply_env_overrides(|key| std::env::var(key).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Credentials come from `EXCHANGES_<VENUE>_<FIELD>` when set and non-empty.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let ex = &mut self.exchanges;
        let fields: [(&str, &mut String); 8] = [
            ("EXCHANGES_HYPERLIQUID_WALLET_ADDRESS", &mut ex.hyperliquid.wallet_address),
            ("EXCHANGES_HYPERLIQUID_PRIVATE_KEY", &mut ex.hyperliquid.private_key),
            ("EXCHANGES_LIGHTER_API_KEY", &mut ex.lighter.api_key),
            ("EXCHANGES_LIGHTER_PRIVATE_KEY", &mut ex.lighter.private_key),
            ("EXCHANGES_EDGEX_API_KEY", &mut ex.edgex.api_key),
            ("EXCHANGES_EDGEX_SECRET_KEY", &mut ex.edgex.secret_key),
            ("EXCHANGES_EDGEX_ACCOUNT_ID", &mut ex.edgex.account_id),
            ("EXCHANGES_EDGEX_STARK_PRIVATE_KEY", &mut ex.edgex.stark_private_key),
        ];
        for (key, field) in fields {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *field = value;
            }
        }
    }

    pub fn apply_cli(&mut self, overrides: &CliOverrides) {
        if let Some(execute) = overrides.execute_trades {
            self.strategies.funding_arb.execute_trades = execute;
        }
        if let Some(level) = &overrides.log_level {
            self.app.log_level = level.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let arb = &self.strategies.funding_arb;
        if arb.check_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "strategies.funding_arb.check_interval_ms must be at least 1".into(),
            ));
        }
        non_negative("strategies.funding_arb.min_funding_diff", arb.min_funding_diff)?;
        non_negative("strategies.funding_arb.trade_size", arb.trade_size)?;
        non_negative("strategies.funding_arb.slippage_buffer", arb.slippage_buffer)?;
        non_negative("strategies.funding_arb.leverage", arb.leverage)?;

        let farm = &self.strategies.xp_farming;
        non_negative("strategies.xp_farming.max_slippage", farm.max_slippage)?;
        non_negative("strategies.xp_farming.trade_size", farm.trade_size)?;
        non_negative("strategies.xp_farming.target_volume_daily", farm.target_volume_daily)?;
        if farm.min_interval_secs > farm.max_interval_secs {
            return Err(ConfigError::Invalid(format!(
                "strategies.xp_farming.min_interval_secs ({}) exceeds max_interval_secs ({})",
                farm.min_interval_secs, farm.max_interval_secs
            )));
        }
        Ok(())
    }
}

fn non_negative(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{} must be a non-negative number, got {}", name, value)))
    }
}

fn enabled() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_hyperliquid_url() -> String {
    "https://api.hyperliquid.xyz".to_string()
}

fn default_lighter_url() -> String {
    "https://mainnet.zklighter.elliot.ai".to_string()
}

fn default_edgex_url() -> String {
    "https://pro.edgex.exchange".to_string()
}

fn default_edgex_ws_url() -> String {
    "wss://quote.edgex.exchange/api/v1/public/ws".to_string()
}

fn default_pairs() -> Vec<String> {
    vec!["ETH-USD".to_string(), "BTC-USD".to_string()]
}

fn default_min_funding_diff() -> f64 {
    0.0001
}

fn default_leverage() -> f64 {
    1.0
}

fn default_check_interval_ms() -> u64 {
    60_000
}

fn default_trade_size() -> f64 {
    0.01
}

fn default_slippage_buffer() -> f64 {
    0.01
}

fn default_max_slippage() -> f64 {
    0.001
}

fn default_farming_venue() -> String {
    "hyperliquid".to_string()
}

fn default_farming_symbol() -> String {
    "ETH".to_string()
}

fn default_min_interval_secs() -> u64 {
    30
}

fn default_max_interval_secs() -> u64 {
    120
}

fn default_settle_delay_ms() -> u64 {
    2_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
[app]
log_level = "debug"

[exchanges.hyperliquid]
base_url = "https://api.hyperliquid-testnet.xyz"
private_key = "from-file"

[exchanges.lighter]
enabled = false

[strategies.funding_arb]
enabled = true
pairs = ["ETH-USD", "SOL-USD"]
min_funding_diff = 0.0005
check_interval_ms = 5000
execute_trades = true

[strategies.xp_farming]
enabled = true
max_slippage = 0.002
min_interval_secs = 10
max_interval_secs = 20
"#;

    #[test]
    fn test_parses_sample_and_fills_defaults() {
        let cfg = Config::from_toml_str(SAMPLE).unwrap();
        cfg.validate().unwrap();

        assert_eq!(cfg.app.log_level, "debug");
        assert_eq!(cfg.exchanges.hyperliquid.base_url, "https://api.hyperliquid-testnet.xyz");
        assert!(cfg.exchanges.hyperliquid.enabled);
        assert!(!cfg.exchanges.lighter.enabled);
        assert_eq!(cfg.exchanges.edgex.ws_url, "wss://quote.edgex.exchange/api/v1/public/ws");

        let engine = cfg.strategies.funding_arb.engine_settings();
        assert_eq!(engine.pairs.len(), 2);
        assert_eq!(engine.pairs[1].as_str(), "SOL-USD");
        assert_eq!(engine.check_interval, Duration::from_secs(5));
        assert!(engine.execute_trades);

        let exec = cfg.strategies.funding_arb.execution_settings();
        assert_eq!(exec, ExecutionSettings::default());

        let farming = cfg.strategies.xp_farming.farming_settings();
        assert_eq!(farming.venue.as_str(), "hyperliquid");
        assert_eq!(farming.symbol.as_str(), "ETH");
        assert_eq!(farming.min_interval, Duration::from_secs(10));
        assert_eq!(farming.settle_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_example_config_is_valid() {
        let cfg = Config::from_toml_str(include_str!("../Config.example.toml")).unwrap();
        cfg.validate().unwrap();
        assert!(cfg.strategies.funding_arb.enabled);
        assert!(!cfg.strategies.funding_arb.execute_trades);
    }

    #[test]
    fn test_empty_file_is_valid() {
        let cfg = Config::from_toml_str("").unwrap();
        cfg.validate().unwrap();
        assert!(!cfg.strategies.funding_arb.enabled);
        assert_eq!(cfg.strategies.funding_arb.check_interval_ms, 60_000);
    }

    #[test]
    fn test_zero_check_interval_rejected() {
        let cfg = Config::from_toml_str("[strategies.funding_arb]\ncheck_interval_ms = 0\n").unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let cfg = Config::from_toml_str("[strategies.funding_arb]\nmin_funding_diff = -0.1\n").unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_inverted_farming_interval_rejected() {
        let cfg = Config::from_toml_str("[strategies.xp_farming]\nmin_interval_secs = 60\nmax_interval_secs = 30\n")
            .unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_env_overrides_credentials() {
        let mut cfg = Config::from_toml_str(SAMPLE).unwrap();
        let env: HashMap<&str, &str> = [
            ("EXCHANGES_HYPERLIQUID_PRIVATE_KEY", "from-env"),
            ("EXCHANGES_EDGEX_ACCOUNT_ID", "42"),
            ("EXCHANGES_LIGHTER_API_KEY", ""),
        ]
        .into_iter()
        .collect();

        cfg.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(cfg.exchanges.hyperliquid.private_key, "from-env");
        assert_eq!(cfg.exchanges.edgex.account_id, "42");
        assert_eq!(cfg.exchanges.lighter.api_key, "");
    }

    #[test]
    fn test_cli_overrides_win() {
        let mut cfg = Config::from_toml_str(SAMPLE).unwrap();
        cfg.apply_cli(&CliOverrides {
            execute_trades: Some(false),
            log_level: Some("warn".into()),
        });
        assert!(!cfg.strategies.funding_arb.execute_trades);
        assert_eq!(cfg.app.log_level, "warn");
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        assert!(matches!(
            Config::from_toml_str("[strategies.funding_arb\n"),
            Err(ConfigError::Parse(_))
        ));
    }
}
