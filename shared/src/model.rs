use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::config::AppConfig;
use crate::OperationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The user the session runs as. Field names match the host payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub language_code: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeColors {
    pub background: String,
    pub text: String,
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            background: "#ffffff".to_string(),
            text: "#000000".to_string(),
        }
    }
}

/// Per-user balances as persisted. Stored field names are kept stable so
/// records written by earlier builds still load.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceRecord {
    #[serde(rename = "watermelonBalance", default)]
    pub primary_balance: u64,
    #[serde(rename = "diggsBalance", default)]
    pub secondary_balance: f64,
    #[serde(rename = "adsWatched", default)]
    pub ads_watched: u64,
    #[serde(rename = "walletAddress", default)]
    pub wallet_address: String,
}

impl BalanceRecord {
    /// True when every field satisfies the record invariants.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.secondary_balance.is_finite() && self.secondary_balance >= 0.0
    }

    pub fn record_ad_view(&mut self) {
        self.primary_balance = self.primary_balance.saturating_add(1);
        self.ads_watched = self.ads_watched.saturating_add(1);
    }

    /// Moves `amount` primary units into the secondary balance at `rate`.
    /// Returns the credited secondary amount; on error nothing changes.
    pub fn convert(&mut self, amount: u64, rate: f64) -> Result<f64, OperationError> {
        if amount == 0 {
            return Err(OperationError::NonPositiveAmount);
        }
        if amount > self.primary_balance {
            return Err(OperationError::InsufficientPrimary {
                requested: amount,
                available: self.primary_balance,
            });
        }

        #[allow(clippy::cast_precision_loss)]
        let credited = amount as f64 * rate;
        self.primary_balance -= amount;
        self.secondary_balance += credited;
        Ok(credited)
    }

    pub fn withdraw(&mut self, amount: f64, address: &str) -> Result<(), OperationError> {
        if amount.is_nan() || amount <= 0.0 {
            return Err(OperationError::NonPositiveAmount);
        }
        if amount > self.secondary_balance {
            return Err(OperationError::InsufficientSecondary {
                requested: amount,
                available: self.secondary_balance,
            });
        }
        if address.trim().is_empty() {
            return Err(OperationError::MissingAddress);
        }

        self.secondary_balance -= amount;
        Ok(())
    }

    /// Returns whether the stored address changed.
    pub fn set_wallet_address(&mut self, address: &str) -> bool {
        if self.wallet_address == address {
            return false;
        }
        self.wallet_address = address.to_string();
        true
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    Profile,
    #[default]
    Watch,
    Convert,
    Withdraw,
    Wallet,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    #[default]
    Success,
    Error,
}

/// Transient toast. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub id: u64,
    pub message: String,
    pub kind: NoticeKind,
    pub duration_ms: u64,
}

#[derive(Clone, Debug, Default)]
pub struct Model {
    pub config: AppConfig,
    pub user: Option<UserIdentity>,
    pub record: BalanceRecord,
    /// Set between `AppStarted` and the stored record arriving.
    pub is_starting: bool,
    pub is_data_loaded: bool,
    pub is_ad_loading: bool,
    pub active_tab: Tab,
    pub notice: Option<Notice>,
    pub next_notice_id: u64,
    pub theme: Option<ThemeColors>,
    pub launch_parameter: Option<String>,
    pub referral_checked: bool,
    /// Whether the wallet connector currently reports an address. The
    /// record's address is only the last one seen.
    pub wallet_connected: bool,
    /// Base for invite links, captured at startup.
    pub link_base: Option<Url>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current notice and returns the new one's id.
    pub fn show_notice(&mut self, message: impl Into<String>, kind: NoticeKind, duration_ms: u64) -> u64 {
        self.next_notice_id = self.next_notice_id.wrapping_add(1);
        let id = self.next_notice_id;
        self.notice = Some(Notice {
            id,
            message: message.into(),
            kind,
            duration_ms,
        });
        id
    }

    /// Clears the notice only if it is still the one with `id`.
    pub fn expire_notice(&mut self, id: u64) -> bool {
        if self.notice.as_ref().is_some_and(|n| n.id == id) {
            self.notice = None;
            return true;
        }
        false
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: String,
    pub display_name: String,
    pub handle: String,
    pub initial: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeView {
    pub id: u64,
    pub message: String,
    pub kind: NoticeKind,
    pub duration_ms: u64,
}

impl From<&Notice> for NoticeView {
    fn from(n: &Notice) -> Self {
        Self {
            id: n.id,
            message: n.message.clone(),
            kind: n.kind,
            duration_ms: n.duration_ms,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub is_loading: bool,
    pub active_tab: Tab,
    pub user: Option<UserView>,
    pub primary_balance: u64,
    pub secondary_balance: f64,
    pub secondary_balance_text: String,
    pub ads_watched: u64,
    pub wallet_address: String,
    pub wallet_address_short: String,
    pub wallet_connected: bool,
    pub referral_link: Option<String>,
    pub is_ad_loading: bool,
    pub notice: Option<NoticeView>,
    pub theme: ThemeColors,
    pub conversion_rate: f64,
}
