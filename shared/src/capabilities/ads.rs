use std::time::Duration;

use crux_core::capability::{CapabilityContext, Operation};
use crux_core::macros::Capability;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum AdsOperation {
    ShowRewardedVideo,
}

/// How a rewarded video ended: watched to the end, or failed.
pub type AdOutcome = Result<(), AdError>;

impl Operation for AdsOperation {
    type Output = AdOutcome;
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum AdError {
    #[error("ad not loaded")]
    NotLoaded,

    #[error("ad provider internal error: {0}")]
    Internal(String),

    #[error("ad provider unavailable")]
    Unavailable,
}

impl AdError {
    /// Maps the host's error strings onto typed variants.
    pub fn from_host_code(code: &str) -> Self {
        match code {
            "ad_not_loaded" => Self::NotLoaded,
            "internal_error" => Self::Internal("internal_error".to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Rewarded video ads. One request, one outcome.
#[derive(Capability)]
pub struct Ads<Ev> {
    context: CapabilityContext<AdsOperation, Ev>,
}

impl<Ev> Ads<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<AdsOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn show_rewarded_video<F>(&self, make_event: F)
    where
        F: FnOnce(AdOutcome) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let outcome = ctx.request_from_shell(AdsOperation::ShowRewardedVideo).await;
            ctx.update_app(make_event(outcome));
        });
    }
}

/// Host rewarded-video API, modelled as a future with two outcomes
/// instead of the host's `onViewed` / `onError` callback pair.
#[async_trait::async_trait]
pub trait RewardedAdProvider: Send + Sync {
    /// Resolves once the viewer has finished the ad (`Ok`) or the host
    /// reports a failure.
    async fn show_rewarded_video(&self) -> AdOutcome;
}

/// Stand-in used when the host offers no rewarded-video API, so the app
/// stays usable outside its host. Always succeeds after a fixed delay.
#[derive(Debug, Clone)]
pub struct SimulatedAdProvider {
    delay: Duration,
}

impl SimulatedAdProvider {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait::async_trait]
impl RewardedAdProvider for SimulatedAdProvider {
    async fn show_rewarded_video(&self) -> AdOutcome {
        tracing::info!(delay_ms = self.delay.as_millis() as u64, "simulating rewarded ad");
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Provider that resolves immediately with a preset outcome.
#[derive(Debug, Clone)]
pub struct ScriptedAdProvider {
    outcome: AdOutcome,
}

impl ScriptedAdProvider {
    pub fn succeeding() -> Self {
        Self { outcome: Ok(()) }
    }

    pub fn failing(error: AdError) -> Self {
        Self {
            outcome: Err(error),
        }
    }
}

#[async_trait::async_trait]
impl RewardedAdProvider for ScriptedAdProvider {
    async fn show_rewarded_video(&self) -> AdOutcome {
        self.outcome.clone()
    }
}
