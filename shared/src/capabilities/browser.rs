use std::sync::Mutex;

use crux_core::capability::{CapabilityContext, Operation};
use crux_core::macros::Capability;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use super::kv::KvError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "data")]
pub enum BrowserOperation {
    CurrentUrl,
    ReplaceUrl { url: String },
    CopyText { text: String },
    SessionGet { key: String },
    SessionSet { key: String, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum BrowserOutput {
    Url(Option<String>),
    Replaced,
    Copied(Result<(), ClipboardError>),
    SessionValue(Result<Option<String>, KvError>),
    SessionStored(Result<(), KvError>),
}

impl Operation for BrowserOperation {
    type Output = BrowserOutput;
}

/// Page-level facilities: location, clipboard, and per-tab session storage.
#[derive(Capability)]
pub struct Browser<Ev> {
    context: CapabilityContext<BrowserOperation, Ev>,
}

impl<Ev> Browser<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<BrowserOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn current_url<F>(&self, make_event: F)
    where
        F: FnOnce(Option<String>) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let url = match ctx.request_from_shell(BrowserOperation::CurrentUrl).await {
                BrowserOutput::Url(url) => url,
                other => {
                    tracing::warn!(?other, "unexpected browser output for current_url");
                    None
                }
            };
            ctx.update_app(make_event(url));
        });
    }

    /// Rewrites the visible URL in place, without a reload.
    pub fn replace_url(&self, url: &Url) {
        let ctx = self.context.clone();
        let url = url.to_string();
        self.context.spawn(async move {
            ctx.request_from_shell(BrowserOperation::ReplaceUrl { url }).await;
        });
    }

    pub fn copy_text<F>(&self, text: String, make_event: F)
    where
        F: FnOnce(Result<(), ClipboardError>) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = match ctx.request_from_shell(BrowserOperation::CopyText { text }).await {
                BrowserOutput::Copied(result) => result,
                other => {
                    tracing::warn!(?other, "unexpected browser output for copy_text");
                    Err(ClipboardError::Unavailable)
                }
            };
            ctx.update_app(make_event(result));
        });
    }

    pub fn session_get<F>(&self, key: String, make_event: F)
    where
        F: FnOnce(Result<Option<String>, KvError>) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = match ctx.request_from_shell(BrowserOperation::SessionGet { key }).await {
                BrowserOutput::SessionValue(result) => result,
                other => {
                    tracing::warn!(?other, "unexpected browser output for session_get");
                    Err(KvError::storage(
                        super::kv::StorageErrorCode::Unknown,
                        "unexpected session output",
                    ))
                }
            };
            ctx.update_app(make_event(result));
        });
    }

    /// Stores a session value. Failures are logged, not reported.
    pub fn session_set(&self, key: String, value: String) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let output = ctx
                .request_from_shell(BrowserOperation::SessionSet { key: key.clone(), value })
                .await;
            if let BrowserOutput::SessionStored(Err(error)) = output {
                tracing::warn!(key = %key, %error, "session write failed");
            }
        });
    }
}

/// The visible page location.
pub trait Location: Send + Sync {
    fn current_url(&self) -> Option<Url>;

    /// Rewrites the visible URL in place, without a reload.
    fn replace_url(&self, url: &Url);
}

pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("clipboard not available")]
    Unavailable,

    #[error("clipboard write rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Default)]
pub struct MemoryLocation {
    url: Mutex<Option<Url>>,
    replacements: Mutex<Vec<Url>>,
}

impl MemoryLocation {
    pub fn new(url: Option<Url>) -> Self {
        Self {
            url: Mutex::new(url),
            replacements: Mutex::new(Vec::new()),
        }
    }

    /// Parses `url`; an unparsable string yields a location with no URL.
    pub fn at(url: &str) -> Self {
        Self::new(Url::parse(url).ok())
    }

    pub fn replacements(&self) -> Vec<Url> {
        self.replacements
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Location for MemoryLocation {
    fn current_url(&self) -> Option<Url> {
        self.url.lock().ok().and_then(|u| u.clone())
    }

    fn replace_url(&self, url: &Url) {
        if let Ok(mut current) = self.url.lock() {
            *current = Some(url.clone());
        }
        if let Ok(mut replacements) = self.replacements.lock() {
            replacements.push(url.clone());
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoClipboard;

impl Clipboard for NoClipboard {
    fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable)
    }
}

#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|c| c.clone())
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut contents = self
            .contents
            .lock()
            .map_err(|_| ClipboardError::Rejected("clipboard lock poisoned".to_string()))?;
        *contents = Some(text.to_string());
        Ok(())
    }
}
