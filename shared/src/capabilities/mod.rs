mod ads;
mod browser;
mod feedback;
mod identity;
mod kv;
mod timer;
mod wallet;

pub use self::ads::{
    AdError, AdOutcome, Ads, AdsOperation, RewardedAdProvider, ScriptedAdProvider,
    SimulatedAdProvider,
};
pub use self::browser::{
    Browser, BrowserOperation, BrowserOutput, Clipboard, ClipboardError, Location,
    MemoryClipboard, MemoryLocation, NoClipboard,
};
pub use self::feedback::{Cue, Feedback, FeedbackChannel, FeedbackOperation, MemoryFeedback, TracingFeedback};
pub use self::identity::{
    BridgeError, Host, HostBridge, HostOperation, HostOutput, LaunchContext, NoHostBridge,
    StaticHostBridge,
};
pub use self::kv::{
    resolve_key_value, validate_key, KeyValueStore, KvError, MemoryStore, StorageErrorCode,
    MAX_KEY_LENGTH, MAX_VALUE_SIZE,
};
pub use self::timer::{Timer, TimerOperation};
pub use self::wallet::{
    AddressHandler, ManualWalletConnector, Wallet, WalletConnector, WalletOperation,
};

#[cfg(all(feature = "sqlite", not(target_arch = "wasm32")))]
pub use self::kv::SqliteStore;

pub use crux_core::render::Render;
pub use crux_kv::KeyValue;

use crate::{App, Event};

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub render: Render<Event>,
    pub kv: KeyValue<Event>,
    pub host: Host<Event>,
    pub ads: Ads<Event>,
    pub wallet: Wallet<Event>,
    pub browser: Browser<Event>,
    pub feedback: Feedback<Event>,
    pub timer: Timer<Event>,
}
