use std::time::Duration;

use crux_core::capability::{CapabilityContext, Operation};
use crux_core::macros::Capability;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimerOperation {
    After { millis: u64 },
}

impl TimerOperation {
    pub fn duration(&self) -> Duration {
        match self {
            Self::After { millis } => Duration::from_millis(*millis),
        }
    }
}

impl Operation for TimerOperation {
    type Output = ();
}

/// One-shot delays, resolved by the shell once the time has passed.
#[derive(Capability)]
pub struct Timer<Ev> {
    context: CapabilityContext<TimerOperation, Ev>,
}

impl<Ev> Timer<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<TimerOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn after<F>(&self, delay: Duration, make_event: F)
    where
        F: FnOnce() -> Ev + Send + 'static,
    {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.request_from_shell(TimerOperation::After { millis }).await;
            ctx.update_app(make_event());
        });
    }
}
