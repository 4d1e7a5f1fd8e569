pub mod analysis;
pub mod domain;
pub mod error;
pub mod provider;
pub mod report;
pub mod time;

pub use error::AnalysisError;

pub mod config {
    use anyhow::ensure;

    pub const DEFAULT_DATA_PROVIDER_BASE_URL: &str = "https://query1.finance.yahoo.com";
    pub const DEFAULT_DATA_PROVIDER_COOKIE_URL: &str = "https://fc.yahoo.com";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_HISTORY_DAYS: i64 = 365;
    pub const MAX_HISTORY_DAYS: i64 = 36_500;
    pub const DEFAULT_NEWS_LIMIT: usize = 5;
    pub const DEFAULT_CURRENCY_SYMBOL: &str = "₹";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub data_provider_base_url: String,
        pub data_provider_api_key: Option<String>,
        pub data_provider_timeout_secs: u64,
        /// Page that sets the session cookie the crumb is bound to.
        pub data_provider_cookie_url: String,
        /// Off for proxies and mirrors that serve quoteSummary without a crumb.
        pub data_provider_use_crumb: bool,
        pub history_days: i64,
        pub news_limit: usize,
        pub currency_symbol: String,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                sentry_dsn: None,
                data_provider_base_url: DEFAULT_DATA_PROVIDER_BASE_URL.to_string(),
                data_provider_api_key: None,
                data_provider_timeout_secs: DEFAULT_TIMEOUT_SECS,
                data_provider_cookie_url: DEFAULT_DATA_PROVIDER_COOKIE_URL.to_string(),
                data_provider_use_crumb: true,
                history_days: DEFAULT_HISTORY_DAYS,
                news_limit: DEFAULT_NEWS_LIMIT,
                currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let settings = Self::load_from_env();
            settings.validate()?;
            Ok(settings)
        }

        /// Reads the environment without validating, so callers can apply overrides first.
        pub fn load_from_env() -> Self {
            let defaults = Self::default();
            Self {
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                data_provider_base_url: non_empty_var("DATA_PROVIDER_BASE_URL")
                    .unwrap_or(defaults.data_provider_base_url),
                data_provider_api_key: non_empty_var("DATA_PROVIDER_API_KEY"),
                data_provider_timeout_secs: parsed_var("DATA_PROVIDER_TIMEOUT_SECS")
                    .unwrap_or(defaults.data_provider_timeout_secs),
                data_provider_cookie_url: non_empty_var("DATA_PROVIDER_COOKIE_URL")
                    .unwrap_or(defaults.data_provider_cookie_url),
                data_provider_use_crumb: parsed_var("DATA_PROVIDER_CRUMB")
                    .unwrap_or(defaults.data_provider_use_crumb),
                history_days: parsed_var("HISTORY_DAYS").unwrap_or(defaults.history_days),
                news_limit: parsed_var("NEWS_LIMIT").unwrap_or(defaults.news_limit),
                currency_symbol: non_empty_var("CURRENCY_SYMBOL")
                    .unwrap_or(defaults.currency_symbol),
            }
        }

        pub fn validate(&self) -> anyhow::Result<()> {
            ensure!(
                (1..=MAX_HISTORY_DAYS).contains(&self.history_days),
                "HISTORY_DAYS must be 1..={MAX_HISTORY_DAYS} (got {})",
                self.history_days
            );
            ensure!(
                self.news_limit >= 1,
                "NEWS_LIMIT must be >= 1 (got {})",
                self.news_limit
            );
            Ok(())
        }

        pub fn report_options(&self) -> crate::report::ReportOptions {
            crate::report::ReportOptions {
                history_days: self.history_days,
                news_limit: self.news_limit,
                currency_symbol: self.currency_symbol.clone(),
            }
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
        std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
    }

}
