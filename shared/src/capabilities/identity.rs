use crux_core::capability::{CapabilityContext, Operation};
use crux_core::macros::Capability;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ThemeColors, UserIdentity};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "data")]
pub enum HostOperation {
    /// Signal readiness and report who the app was launched for.
    Launch,
    OpenLink { url: String },
}

/// What the host knows at launch. `user` is `Err` when the bridge is
/// absent or the lookup failed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LaunchContext {
    pub user: Result<Option<UserIdentity>, BridgeError>,
    pub theme: Option<ThemeColors>,
    pub launch_parameter: Option<String>,
}

impl LaunchContext {
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            user: Err(BridgeError::Unavailable),
            theme: None,
            launch_parameter: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum HostOutput {
    Launched(LaunchContext),
    LinkOpened(Result<(), BridgeError>),
}

impl Operation for HostOperation {
    type Output = HostOutput;
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum BridgeError {
    #[error("host bridge not available")]
    Unavailable,

    #[error("host bridge call '{method}' failed: {message}")]
    CallFailed { method: String, message: String },
}

impl BridgeError {
    pub fn call_failed(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CallFailed {
            method: method.into(),
            message: message.into(),
        }
    }
}

/// The chat platform's mini-app bridge, as seen from the core.
#[derive(Capability)]
pub struct Host<Ev> {
    context: CapabilityContext<HostOperation, Ev>,
}

impl<Ev> Host<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<HostOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn launch<F>(&self, make_event: F)
    where
        F: FnOnce(LaunchContext) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let launched = match ctx.request_from_shell(HostOperation::Launch).await {
                HostOutput::Launched(launched) => launched,
                other => {
                    tracing::warn!(?other, "unexpected host output for launch");
                    LaunchContext::unavailable()
                }
            };
            ctx.update_app(make_event(launched));
        });
    }

    pub fn open_link<F>(&self, url: String, make_event: F)
    where
        F: FnOnce(Result<(), BridgeError>) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = match ctx.request_from_shell(HostOperation::OpenLink { url }).await {
                HostOutput::LinkOpened(result) => result,
                other => {
                    tracing::warn!(?other, "unexpected host output for open_link");
                    Err(BridgeError::call_failed("open_link", "unexpected output"))
                }
            };
            ctx.update_app(make_event(result));
        });
    }
}

/// Shell-side view of the host bridge: current user, launch context,
/// theme, and the ability to open platform links.
///
/// A shell running outside the host supplies [`NoHostBridge`]; every
/// method then reports [`BridgeError::Unavailable`] or `None`, which the
/// core handles as a normal condition.
pub trait HostBridge: Send + Sync {
    /// Signals the host that the app is ready to be shown.
    fn ready(&self) -> Result<(), BridgeError>;

    /// The user the host launched the app for, if it provided one.
    fn current_user(&self) -> Result<Option<UserIdentity>, BridgeError>;

    fn theme_colors(&self) -> Option<ThemeColors>;

    /// Opaque start parameter the app was launched with.
    fn launch_parameter(&self) -> Option<String>;

    fn open_external_link(&self, url: &str) -> Result<(), BridgeError>;

    /// Answers a [`HostOperation`] from the core.
    fn resolve(&self, operation: &HostOperation) -> HostOutput {
        match operation {
            HostOperation::Launch => HostOutput::Launched(LaunchContext {
                user: self.ready().and_then(|()| self.current_user()),
                theme: self.theme_colors(),
                launch_parameter: self.launch_parameter(),
            }),
            HostOperation::OpenLink { url } => HostOutput::LinkOpened(self.open_external_link(url)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoHostBridge;

impl HostBridge for NoHostBridge {
    fn ready(&self) -> Result<(), BridgeError> {
        Err(BridgeError::Unavailable)
    }

    fn current_user(&self) -> Result<Option<UserIdentity>, BridgeError> {
        Err(BridgeError::Unavailable)
    }

    fn theme_colors(&self) -> Option<ThemeColors> {
        None
    }

    fn launch_parameter(&self) -> Option<String> {
        None
    }

    fn open_external_link(&self, _url: &str) -> Result<(), BridgeError> {
        Err(BridgeError::Unavailable)
    }
}

/// Fixed in-process bridge for development shells and tests.
///
/// Opened links are recorded and can be read back with
/// [`StaticHostBridge::opened_links`].
#[derive(Debug, Default)]
pub struct StaticHostBridge {
    user: Option<UserIdentity>,
    theme: Option<ThemeColors>,
    launch_parameter: Option<String>,
    fail_user_lookup: Option<String>,
    opened: std::sync::Mutex<Vec<String>>,
}

impl StaticHostBridge {
    pub fn with_user(user: UserIdentity) -> Self {
        Self {
            user: Some(user),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn launched_with(mut self, parameter: impl Into<String>) -> Self {
        self.launch_parameter = Some(parameter.into());
        self
    }

    #[must_use]
    pub fn themed(mut self, theme: ThemeColors) -> Self {
        self.theme = Some(theme);
        self
    }

    /// Makes `current_user` fail with `message`.
    #[must_use]
    pub fn failing_lookup(mut self, message: impl Into<String>) -> Self {
        self.fail_user_lookup = Some(message.into());
        self
    }

    pub fn opened_links(&self) -> Vec<String> {
        self.opened
            .lock()
            .map(|links| links.clone())
            .unwrap_or_default()
    }
}

impl HostBridge for StaticHostBridge {
    fn ready(&self) -> Result<(), BridgeError> {
        Ok(())
    }

    fn current_user(&self) -> Result<Option<UserIdentity>, BridgeError> {
        match &self.fail_user_lookup {
            Some(message) => Err(BridgeError::call_failed("current_user", message.clone())),
            None => Ok(self.user.clone()),
        }
    }

    fn theme_colors(&self) -> Option<ThemeColors> {
        self.theme.clone()
    }

    fn launch_parameter(&self) -> Option<String> {
        self.launch_parameter.clone()
    }

    fn open_external_link(&self, url: &str) -> Result<(), BridgeError> {
        let mut opened = self
            .opened
            .lock()
            .map_err(|_| BridgeError::call_failed("open_external_link", "lock poisoned"))?;
        opened.push(url.to_string());
        Ok(())
    }
}
