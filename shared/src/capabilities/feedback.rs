use std::sync::Mutex;

use crux_core::capability::{CapabilityContext, Operation};
use crux_core::macros::Capability;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    Click,
    Success,
    Error,
    Swoosh,
}

impl Cue {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Success => "success",
            Self::Error => "error",
            Self::Swoosh => "swoosh",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedbackOperation {
    pub cue: Cue,
}

impl Operation for FeedbackOperation {
    type Output = ();
}

/// Sound/haptic cues. The core never waits for an answer.
#[derive(Capability)]
pub struct Feedback<Ev> {
    context: CapabilityContext<FeedbackOperation, Ev>,
}

impl<Ev> Feedback<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<FeedbackOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn emit(&self, cue: Cue) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(FeedbackOperation { cue }).await;
        });
    }
}

/// Shell-side sink for cues. Implementations log their own failures
/// and never report them back.
pub trait FeedbackChannel: Send + Sync {
    fn emit(&self, cue: Cue);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFeedback;

impl FeedbackChannel for TracingFeedback {
    fn emit(&self, cue: Cue) {
        tracing::debug!(cue = cue.name(), "feedback cue");
    }
}

/// Records every cue in order.
#[derive(Debug, Default)]
pub struct MemoryFeedback {
    cues: Mutex<Vec<Cue>>,
}

impl MemoryFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> Vec<Cue> {
        self.cues.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl FeedbackChannel for MemoryFeedback {
    fn emit(&self, cue: Cue) {
        match self.cues.lock() {
            Ok(mut cues) => cues.push(cue),
            Err(_) => tracing::warn!(cue = cue.name(), "feedback recorder poisoned"),
        }
    }
}
