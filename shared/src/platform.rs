//! Shell-side implementations behind the core's capabilities.

use std::sync::Arc;

use url::Url;

use crate::capabilities::{
    BrowserOperation, BrowserOutput, Clipboard, FeedbackChannel, HostBridge, KeyValueStore,
    Location, ManualWalletConnector, MemoryLocation, MemoryStore, NoClipboard, NoHostBridge,
    RewardedAdProvider, TracingFeedback, WalletConnector,
};

/// Everything the shell wires up outside the core.
///
/// `ads: None` means the host has no rewarded-video API; the runtime then
/// substitutes a simulated provider. `records` holds one balance record
/// per user; `session` holds per-session flags.
pub struct Platform {
    pub host: Arc<dyn HostBridge>,
    pub ads: Option<Arc<dyn RewardedAdProvider>>,
    pub wallet: Arc<dyn WalletConnector>,
    pub records: Arc<dyn KeyValueStore>,
    pub session: Arc<dyn KeyValueStore>,
    pub location: Arc<dyn Location>,
    pub clipboard: Arc<dyn Clipboard>,
    pub feedback: Arc<dyn FeedbackChannel>,
}

impl Platform {
    /// No bridge, no ads, in-memory storage, no location.
    pub fn headless() -> Self {
        Self {
            host: Arc::new(NoHostBridge),
            ads: None,
            wallet: Arc::new(ManualWalletConnector::new()),
            records: Arc::new(MemoryStore::new()),
            session: Arc::new(MemoryStore::new()),
            location: Arc::new(MemoryLocation::default()),
            clipboard: Arc::new(NoClipboard),
            feedback: Arc::new(TracingFeedback),
        }
    }

    pub fn browser_output(&self, operation: &BrowserOperation) -> BrowserOutput {
        match operation {
            BrowserOperation::CurrentUrl => {
                BrowserOutput::Url(self.location.current_url().map(String::from))
            }
            BrowserOperation::ReplaceUrl { url } => {
                match Url::parse(url) {
                    Ok(url) => self.location.replace_url(&url),
                    Err(e) => tracing::warn!(error = %e, "refusing to replace location with invalid url"),
                }
                BrowserOutput::Replaced
            }
            BrowserOperation::CopyText { text } => BrowserOutput::Copied(self.clipboard.write_text(text)),
            BrowserOperation::SessionGet { key } => BrowserOutput::SessionValue(self.session.get(key)),
            BrowserOperation::SessionSet { key, value } => {
                BrowserOutput::SessionStored(self.session.set(key, value))
            }
        }
    }
}
