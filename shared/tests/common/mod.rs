#![allow(dead_code)]

use std::sync::Arc;

use watermelon_shared::capabilities::{
    HostBridge, KeyValueStore, ManualWalletConnector, MemoryClipboard, MemoryFeedback,
    MemoryLocation, MemoryStore, RewardedAdProvider, StaticHostBridge,
};
use watermelon_shared::persistence;
use watermelon_shared::{AppConfig, BalanceRecord, Core, Event, Platform, UserId, UserIdentity};

/// In-memory doubles a test shell keeps handles to. Several cores built
/// from one `Shell` share its storage, like reloads within one session.
pub struct Shell {
    pub records: Arc<MemoryStore>,
    pub session: Arc<MemoryStore>,
    pub feedback: Arc<MemoryFeedback>,
    pub location: Arc<MemoryLocation>,
    pub clipboard: Arc<MemoryClipboard>,
    pub wallet: ManualWalletConnector,
}

pub fn user(id: i64) -> UserIdentity {
    UserIdentity {
        id: UserId(id),
        first_name: "Mira".into(),
        last_name: Some("Haddad".into()),
        username: Some("mira".into()),
        language_code: "en".into(),
    }
}

pub fn host_for(id: i64) -> Arc<dyn HostBridge> {
    Arc::new(StaticHostBridge::with_user(user(id)))
}

pub fn key(id: i64) -> String {
    AppConfig::default().storage_key(UserId(id))
}

impl Shell {
    pub fn new(url: Option<&str>) -> Self {
        Self {
            records: Arc::new(MemoryStore::new()),
            session: Arc::new(MemoryStore::new()),
            feedback: Arc::new(MemoryFeedback::new()),
            location: Arc::new(url.map_or_else(MemoryLocation::default, MemoryLocation::at)),
            clipboard: Arc::new(MemoryClipboard::new()),
            wallet: ManualWalletConnector::new(),
        }
    }

    pub fn platform(&self, host: Arc<dyn HostBridge>) -> Platform {
        self.platform_over(host, self.records.clone(), None)
    }

    pub fn platform_with_ads(&self, host: Arc<dyn HostBridge>, ads: Arc<dyn RewardedAdProvider>) -> Platform {
        self.platform_over(host, self.records.clone(), Some(ads))
    }

    /// Platform whose balance records live in `records` instead of the
    /// shell's memory store.
    pub fn platform_over(
        &self,
        host: Arc<dyn HostBridge>,
        records: Arc<dyn KeyValueStore>,
        ads: Option<Arc<dyn RewardedAdProvider>>,
    ) -> Platform {
        Platform {
            host,
            ads,
            wallet: Arc::new(self.wallet.clone()),
            records,
            session: self.session.clone(),
            location: self.location.clone(),
            clipboard: self.clipboard.clone(),
            feedback: self.feedback.clone(),
        }
    }

    /// A core over this shell's doubles, already started.
    pub fn start(&self, host: Arc<dyn HostBridge>) -> Core {
        let mut core = Core::new(AppConfig::default(), self.platform(host)).unwrap();
        core.dispatch(Event::AppStarted);
        core
    }

    pub fn seed(&self, id: i64, json: &str) {
        self.records.set(&key(id), json).unwrap();
    }

    pub fn stored(&self, id: i64) -> Option<BalanceRecord> {
        let raw = self.records.get(&key(id)).unwrap()?;
        Some(persistence::decode(&key(id), raw.as_bytes()).unwrap())
    }
}
