use serde::{Deserialize, Serialize};

use crate::capabilities::{AdOutcome, BridgeError, ClipboardError, KvError, LaunchContext};
use crate::config::AppConfig;
use crate::model::Tab;
use crate::referral::Referral;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Noop,

    /// Replaces the default configuration. Ignored once startup began.
    Configure(AppConfig),

    /// Resolve identity, load the stored record, check referral.
    AppStarted,

    // Balance operations
    WatchAdRequested,
    /// A rewarded view the host reported on its own.
    AdWatched,
    ConvertRequested {
        amount: u64,
    },
    WithdrawRequested {
        amount: f64,
        address: String,
    },

    WalletAddressChanged {
        address: String,
    },

    ShareReferralRequested,
    TabSelected(Tab),
    DismissNotice,

    // Capability callbacks
    #[serde(skip)]
    Launched(LaunchContext),
    #[serde(skip)]
    RecordLoaded(Result<Option<Vec<u8>>, String>),
    #[serde(skip)]
    RecordWritten(Result<(), String>),
    #[serde(skip)]
    RecordDiscarded(Result<(), String>),
    #[serde(skip)]
    WalletAddressRead(String),
    #[serde(skip)]
    LocationRead(Option<String>),
    #[serde(skip)]
    ReferralFlagRead {
        referral: Referral,
        flag: Result<Option<String>, KvError>,
    },
    #[serde(skip)]
    AdFinished(AdOutcome),
    #[serde(skip)]
    ShareLinkOpened {
        link: String,
        result: Result<(), BridgeError>,
    },
    #[serde(skip)]
    LinkCopied(Result<(), ClipboardError>),
    #[serde(skip)]
    NoticeExpired {
        id: u64,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Configure(_) => "configure",
            Self::AppStarted => "app_started",
            Self::WatchAdRequested => "watch_ad_requested",
            Self::AdWatched => "ad_watched",
            Self::ConvertRequested { .. } => "convert_requested",
            Self::WithdrawRequested { .. } => "withdraw_requested",
            Self::WalletAddressChanged { .. } => "wallet_address_changed",
            Self::ShareReferralRequested => "share_referral_requested",
            Self::TabSelected(_) => "tab_selected",
            Self::DismissNotice => "dismiss_notice",
            Self::Launched(_) => "launched",
            Self::RecordLoaded(_) => "record_loaded",
            Self::RecordWritten(_) => "record_written",
            Self::RecordDiscarded(_) => "record_discarded",
            Self::WalletAddressRead(_) => "wallet_address_read",
            Self::LocationRead(_) => "location_read",
            Self::ReferralFlagRead { .. } => "referral_flag_read",
            Self::AdFinished(_) => "ad_finished",
            Self::ShareLinkOpened { .. } => "share_link_opened",
            Self::LinkCopied(_) => "link_copied",
            Self::NoticeExpired { .. } => "notice_expired",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::WatchAdRequested
                | Self::ConvertRequested { .. }
                | Self::WithdrawRequested { .. }
                | Self::ShareReferralRequested
                | Self::TabSelected(_)
                | Self::DismissNotice
        )
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::Noop
    }
}
