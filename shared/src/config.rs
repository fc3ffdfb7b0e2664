use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ThemeColors, UserId, UserIdentity};

pub const DEFAULT_CONVERSION_RATE: f64 = 0.05;
pub const DEFAULT_STORAGE_KEY_PREFIX: &str = "watermelon_coin_data_";
pub const DEFAULT_REFERRAL_MARKER: &str = "ref_";
pub const DEFAULT_REFERRAL_QUERY_PARAM: &str = "ref";
pub const DEFAULT_REFERRAL_SESSION_KEY: &str = "referralMessageShown";
pub const DEFAULT_SHARE_BASE_URL: &str = "https://t.me/share/url";
pub const DEFAULT_NOTICE_DURATION_MS: u64 = 2_500;
pub const DEFAULT_SIMULATED_AD_DELAY_MS: u64 = 2_000;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(String),

    #[error("invalid config field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Startup configuration, constructed once and handed to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Secondary units credited per primary unit converted.
    pub conversion_rate: f64,
    pub storage_key_prefix: String,
    /// Prefix on the host launch parameter that carries a referrer id.
    pub referral_marker: String,
    pub referral_query_param: String,
    pub referral_session_key: String,
    /// Used for referral links when the current location is unknown.
    pub app_base_url: Option<String>,
    pub share_base_url: String,
    pub share_text: String,
    pub notice_duration_ms: u64,
    pub simulated_ad_delay_ms: u64,
    /// Identity used when the host does not provide one.
    pub fallback_identity: UserIdentity,
    pub default_theme: ThemeColors,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            conversion_rate: DEFAULT_CONVERSION_RATE,
            storage_key_prefix: DEFAULT_STORAGE_KEY_PREFIX.to_string(),
            referral_marker: DEFAULT_REFERRAL_MARKER.to_string(),
            referral_query_param: DEFAULT_REFERRAL_QUERY_PARAM.to_string(),
            referral_session_key: DEFAULT_REFERRAL_SESSION_KEY.to_string(),
            app_base_url: None,
            share_base_url: DEFAULT_SHARE_BASE_URL.to_string(),
            share_text: "🍉 Join Watermelon Coin Clicker! Watch ads, earn coins and turn them into real rewards. Use my link to get started!".to_string(),
            notice_duration_ms: DEFAULT_NOTICE_DURATION_MS,
            simulated_ad_delay_ms: DEFAULT_SIMULATED_AD_DELAY_MS,
            fallback_identity: UserIdentity {
                id: UserId(123_456_789),
                first_name: "معلم".to_string(),
                last_name: Some("بطيخ".to_string()),
                username: Some("watermelon_master".to_string()),
                language_code: "ar".to_string(),
            },
            default_theme: ThemeColors::default(),
        }
    }
}

impl AppConfig {
    /// Parses a JSON config; absent fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.conversion_rate.is_finite() || self.conversion_rate <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "conversion_rate",
                reason: format!("must be a positive finite number, got {}", self.conversion_rate),
            });
        }
        if self.storage_key_prefix.is_empty() {
            return Err(ConfigError::Invalid {
                field: "storage_key_prefix",
                reason: "cannot be empty".to_string(),
            });
        }
        if self.referral_marker.is_empty() {
            return Err(ConfigError::Invalid {
                field: "referral_marker",
                reason: "cannot be empty".to_string(),
            });
        }
        if self.referral_query_param.is_empty() {
            return Err(ConfigError::Invalid {
                field: "referral_query_param",
                reason: "cannot be empty".to_string(),
            });
        }
        if url::Url::parse(&self.share_base_url).is_err() {
            return Err(ConfigError::Invalid {
                field: "share_base_url",
                reason: format!("not a valid URL: {}", self.share_base_url),
            });
        }
        if let Some(base) = &self.app_base_url {
            if url::Url::parse(base).is_err() {
                return Err(ConfigError::Invalid {
                    field: "app_base_url",
                    reason: format!("not a valid URL: {base}"),
                });
            }
        }
        Ok(())
    }

    /// Storage key for a user's record: prefix followed by the id.
    #[must_use]
    pub fn storage_key(&self, user_id: UserId) -> String {
        format!("{}{}", self.storage_key_prefix, user_id)
    }
}
