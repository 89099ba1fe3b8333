pub mod abi;
pub mod consensus;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod profile;
pub mod scoring;

pub mod config {
    use crate::domain::profile::{Address, RiskLevel};
    use crate::engine::EngineConfig;
    use crate::ingest::retry::RetryPolicy;
    use crate::ingest::{market_data_url, FetchConfig};
    use crate::scoring::decision::Thresholds;
    use anyhow::Context;
    use std::str::FromStr;
    use std::time::Duration;

    pub const DEFAULT_SCHEDULE_SECS: u64 = 300;

    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub rpc_url: Option<String>,
        pub profile_contract_address: Option<String>,
        pub user_address: Option<String>,
        pub default_risk_level: Option<String>,
        pub fear_greed_url: Option<String>,
        pub market_data_url: Option<String>,
        pub market_assets: Option<String>,
        pub signal_timeout_ms: Option<u64>,
        pub signal_attempts: Option<u32>,
        pub signal_backoff_ms: Option<u64>,
        pub threshold_high_risk: Option<u32>,
        pub threshold_high_volatility: Option<u32>,
        pub threshold_low_risk: Option<u32>,
        pub threshold_positive_sentiment: Option<i32>,
        pub schedule_secs: Option<u64>,
    }

    fn env_string(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }

    // Malformed numbers are ignored so the default applies.
    fn env_parse<T: FromStr>(key: &str) -> Option<T> {
        std::env::var(key)
            .ok()
            .and_then(|s| s.trim().parse::<T>().ok())
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                sentry_dsn: env_string("SENTRY_DSN"),
                rpc_url: env_string("RPC_URL"),
                profile_contract_address: env_string("PROFILE_CONTRACT_ADDRESS"),
                user_address: env_string("USER_ADDRESS"),
                default_risk_level: env_string("DEFAULT_RISK_LEVEL"),
                fear_greed_url: env_string("FEAR_GREED_URL"),
                market_data_url: env_string("MARKET_DATA_URL"),
                market_assets: env_string("MARKET_ASSETS"),
                signal_timeout_ms: env_parse("SIGNAL_TIMEOUT_MS"),
                signal_attempts: env_parse("SIGNAL_ATTEMPTS"),
                signal_backoff_ms: env_parse("SIGNAL_BACKOFF_MS"),
                threshold_high_risk: env_parse("THRESHOLD_HIGH_RISK"),
                threshold_high_volatility: env_parse("THRESHOLD_HIGH_VOLATILITY"),
                threshold_low_risk: env_parse("THRESHOLD_LOW_RISK"),
                threshold_positive_sentiment: env_parse("THRESHOLD_POSITIVE_SENTIMENT"),
                schedule_secs: env_parse("SCHEDULE_SECS"),
            })
        }

        pub fn require_rpc_url(&self) -> anyhow::Result<&str> {
            self.rpc_url.as_deref().context("RPC_URL is required")
        }

        pub fn require_profile_contract(&self) -> anyhow::Result<Address> {
            self.profile_contract_address
                .as_deref()
                .context("PROFILE_CONTRACT_ADDRESS is required")?
                .parse::<Address>()
                .context("PROFILE_CONTRACT_ADDRESS is invalid")
        }

        /// `USER_ADDRESS`, or the zero address when unset.
        pub fn user_address(&self) -> anyhow::Result<Address> {
            match self.user_address.as_deref() {
                Some(s) => s.parse::<Address>().context("USER_ADDRESS is invalid"),
                None => Ok(Address::ZERO),
            }
        }

        /// Profile level used without a chain. Defaults to MEDIUM.
        pub fn default_risk_level(&self) -> anyhow::Result<RiskLevel> {
            match self.default_risk_level.as_deref() {
                Some(s) => s
                    .parse::<RiskLevel>()
                    .context("DEFAULT_RISK_LEVEL is invalid"),
                None => Ok(RiskLevel::Medium),
            }
        }

        pub fn schedule_secs(&self) -> u64 {
            self.schedule_secs
                .filter(|s| *s > 0)
                .unwrap_or(DEFAULT_SCHEDULE_SECS)
        }

        pub fn fetch_config(&self) -> FetchConfig {
            let defaults = FetchConfig::default();
            let retry = RetryPolicy {
                attempts: self.signal_attempts.unwrap_or(defaults.retry.attempts),
                timeout: self
                    .signal_timeout_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.retry.timeout),
                backoff: self
                    .signal_backoff_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.retry.backoff),
            };

            let assets: Vec<String> = self
                .market_assets
                .as_deref()
                .map(|s| {
                    s.split(',')
                        .map(str::trim)
                        .filter(|a| !a.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();

            let assets = if assets.is_empty() {
                defaults.assets
            } else {
                assets
            };

            // An explicit URL is used verbatim; otherwise the query follows the asset list.
            let market_url = self
                .market_data_url
                .clone()
                .unwrap_or_else(|| market_data_url(&assets));

            FetchConfig {
                fear_greed_url: self
                    .fear_greed_url
                    .clone()
                    .unwrap_or(defaults.fear_greed_url),
                market_data_url: market_url,
                assets,
                retry,
            }
        }

        pub fn thresholds(&self) -> Thresholds {
            let defaults = Thresholds::default();
            Thresholds {
                high_risk: self.threshold_high_risk.unwrap_or(defaults.high_risk),
                high_volatility: self
                    .threshold_high_volatility
                    .unwrap_or(defaults.high_volatility),
                low_risk: self.threshold_low_risk.unwrap_or(defaults.low_risk),
                positive_sentiment: self
                    .threshold_positive_sentiment
                    .unwrap_or(defaults.positive_sentiment),
            }
        }

        pub fn engine_config(&self) -> anyhow::Result<EngineConfig> {
            let thresholds = self.thresholds();
            thresholds.validate().context("invalid decision thresholds")?;
            Ok(EngineConfig {
                fetch: self.fetch_config(),
                thresholds,
            })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn empty_settings_yield_contract_defaults() {
            let cfg = Settings::default().engine_config().unwrap();
            assert_eq!(cfg, EngineConfig::default());
            assert_eq!(cfg.fetch.retry.attempts, 2);
            assert_eq!(cfg.fetch.retry.timeout, Duration::from_secs(8));
            assert_eq!(cfg.fetch.retry.backoff, Duration::from_millis(1500));
            assert_eq!(cfg.fetch.assets, vec!["ethereum", "bitcoin"]);
            assert_eq!(cfg.thresholds.high_risk, 70);
            assert_eq!(cfg.thresholds.high_volatility, 80);
        }

        #[test]
        fn overrides_apply() {
            let settings = Settings {
                market_assets: Some(" ethereum, chainlink ,,".to_string()),
                signal_timeout_ms: Some(7000),
                threshold_high_volatility: Some(60),
                ..Settings::default()
            };
            let cfg = settings.engine_config().unwrap();
            assert_eq!(cfg.fetch.assets, vec!["ethereum", "chainlink"]);
            assert_eq!(cfg.fetch.retry.timeout, Duration::from_secs(7));
            assert_eq!(cfg.thresholds.high_volatility, 60);
            assert_eq!(cfg.thresholds.high_risk, 70);
        }

        #[test]
        fn market_query_requests_the_configured_assets() {
            let cfg = Settings::default().fetch_config();
            assert!(cfg
                .market_data_url
                .contains("?ids=ethereum,bitcoin&vs_currencies=usd&include_24hr_change=true"));

            let settings = Settings {
                market_assets: Some("chainlink,ethereum".to_string()),
                ..Settings::default()
            };
            let cfg = settings.fetch_config();
            assert_eq!(cfg.assets, vec!["chainlink", "ethereum"]);
            assert!(cfg.market_data_url.contains("ids=chainlink,ethereum&"));

            let settings = Settings {
                market_assets: Some("chainlink".to_string()),
                market_data_url: Some("http://mirror.local/prices".to_string()),
                ..Settings::default()
            };
            assert_eq!(settings.fetch_config().market_data_url, "http://mirror.local/prices");
        }

        #[test]
        fn out_of_range_thresholds_are_rejected() {
            let settings = Settings {
                threshold_high_risk: Some(250),
                ..Settings::default()
            };
            assert!(settings.engine_config().is_err());
        }

        #[test]
        fn addresses_and_levels_validate() {
            let settings = Settings::default();
            assert_eq!(settings.user_address().unwrap(), Address::ZERO);
            assert_eq!(settings.default_risk_level().unwrap(), RiskLevel::Medium);
            assert!(settings.require_rpc_url().is_err());
            assert_eq!(settings.schedule_secs(), DEFAULT_SCHEDULE_SECS);

            let settings = Settings {
                user_address: Some("not-an-address".to_string()),
                default_risk_level: Some("low".to_string()),
                ..Settings::default()
            };
            assert!(settings.user_address().is_err());
            assert_eq!(settings.default_risk_level().unwrap(), RiskLevel::Low);
        }
    }
}
