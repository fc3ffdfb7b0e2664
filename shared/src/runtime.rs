//! Shell that drives the core on a tokio runtime: answers each
//! [`Effect`] from the [`Platform`], runs ads and timers as spawned tasks,
//! and feeds their results back through one queue.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crux_core::Request;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::capabilities::{
    resolve_key_value, AdError, AdOutcome, AdsOperation, RewardedAdProvider, SimulatedAdProvider,
    TimerOperation,
};
use crate::{App, AppConfig, AppResult, Effect, Event, Platform, ViewModel};

pub type RenderHook = Box<dyn Fn(&ViewModel) + Send + Sync>;

enum Message {
    Event(Event),
    AdFinished { id: u64, outcome: AdOutcome },
    TimerFired { id: u64 },
}

/// Feeds events into a [`Core`] from other tasks or threads.
#[derive(Clone)]
pub struct EventSender(mpsc::UnboundedSender<Message>);

impl EventSender {
    /// Returns `false` once the core is gone.
    pub fn send(&self, event: Event) -> bool {
        self.0.send(Message::Event(event)).is_ok()
    }
}

pub struct Core {
    core: crux_core::Core<Effect, App>,
    platform: Platform,
    ads: Arc<dyn RewardedAdProvider>,
    sender: mpsc::UnboundedSender<Message>,
    receiver: mpsc::UnboundedReceiver<Message>,
    pending_ads: HashMap<u64, Request<AdsOperation>>,
    pending_timers: HashMap<u64, Request<TimerOperation>>,
    /// Timers requested while no runtime was available.
    deferred_timers: Vec<(u64, Duration)>,
    next_request_id: u64,
    on_render: Option<RenderHook>,
    renders: usize,
}

impl Core {
    /// Validates `config`, picks the ad provider and subscribes to wallet
    /// changes.
    ///
    /// Ads and timers need a tokio runtime. Without one, ads fail at once
    /// and timers wait until [`Core::next_event`] runs inside a runtime.
    pub fn new(config: AppConfig, platform: Platform) -> AppResult<Self> {
        config.validate()?;

        let ads: Arc<dyn RewardedAdProvider> = match &platform.ads {
            Some(ads) => Arc::clone(ads),
            None => {
                info!("no rewarded ad provider; simulating ads");
                Arc::new(SimulatedAdProvider::new(Duration::from_millis(
                    config.simulated_ad_delay_ms,
                )))
            }
        };

        let (sender, receiver) = mpsc::unbounded_channel();

        let wallet_sender = sender.clone();
        platform.wallet.on_change(Box::new(move |address| {
            if wallet_sender
                .send(Message::Event(Event::WalletAddressChanged { address }))
                .is_err()
            {
                debug!("core gone; wallet change dropped");
            }
        }));

        let mut core = Self {
            core: crux_core::Core::new(),
            platform,
            ads,
            sender,
            receiver,
            pending_ads: HashMap::new(),
            pending_timers: HashMap::new(),
            deferred_timers: Vec::new(),
            next_request_id: 0,
            on_render: None,
            renders: 0,
        };
        core.process(Event::Configure(config));
        Ok(core)
    }

    #[must_use]
    pub fn with_render_hook(mut self, hook: impl Fn(&ViewModel) + Send + Sync + 'static) -> Self {
        self.on_render = Some(Box::new(hook));
        self
    }

    /// Handles `event`, then everything already waiting in the queue.
    pub fn dispatch(&mut self, event: Event) {
        self.process(event);
        self.drain();
    }

    /// Handles queued messages without waiting. Returns how many ran.
    pub fn drain(&mut self) -> usize {
        self.schedule_deferred();
        let mut handled = 0;
        while let Ok(message) = self.receiver.try_recv() {
            self.handle(message);
            handled += 1;
        }
        handled
    }

    /// Waits for the next result from spawned work or the wallet
    /// connector and handles it. Deferred timers are started first.
    pub async fn next_event(&mut self) -> bool {
        self.schedule_deferred();
        match self.receiver.recv().await {
            Some(message) => {
                self.handle(message);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender(self.sender.clone())
    }

    #[must_use]
    pub fn view(&self) -> ViewModel {
        self.core.view()
    }

    #[must_use]
    pub fn render_count(&self) -> usize {
        self.renders
    }

    /// Timers still waiting for a runtime.
    #[must_use]
    pub fn deferred_timers(&self) -> usize {
        self.deferred_timers.len()
    }

    fn handle(&mut self, message: Message) {
        match message {
            Message::Event(event) => self.process(event),
            Message::AdFinished { id, outcome } => match self.pending_ads.remove(&id) {
                Some(mut request) => {
                    let effects = self.core.resolve(&mut request, outcome);
                    self.run(effects);
                }
                None => warn!(id, "result for unknown ad request"),
            },
            Message::TimerFired { id } => match self.pending_timers.remove(&id) {
                Some(mut request) => {
                    let effects = self.core.resolve(&mut request, ());
                    self.run(effects);
                }
                None => warn!(id, "unknown timer fired"),
            },
        }
    }

    fn process(&mut self, event: Event) {
        let effects = self.core.process_event(event);
        self.run(effects);
    }

    fn run(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            queue.extend(self.execute(effect));
        }
    }

    fn execute(&mut self, effect: Effect) -> Vec<Effect> {
        match effect {
            Effect::Render(_) => {
                self.renders += 1;
                if let Some(hook) = &self.on_render {
                    hook(&self.core.view());
                }
                Vec::new()
            }

            Effect::KeyValue(mut request) => {
                let output = resolve_key_value(self.platform.records.as_ref(), &request.operation);
                self.core.resolve(&mut request, output)
            }

            Effect::Host(mut request) => {
                let output = self.platform.host.resolve(&request.operation);
                self.core.resolve(&mut request, output)
            }

            Effect::Browser(mut request) => {
                let output = self.platform.browser_output(&request.operation);
                self.core.resolve(&mut request, output)
            }

            Effect::Wallet(mut request) => {
                let address = self.platform.wallet.current_address();
                self.core.resolve(&mut request, address)
            }

            Effect::Feedback(request) => {
                self.platform.feedback.emit(request.operation.cue);
                Vec::new()
            }

            Effect::Ads(request) => self.show_ad(request),

            Effect::Timer(request) => {
                let id = self.next_id();
                let delay = request.operation.duration();
                self.pending_timers.insert(id, request);
                if !self.start_timer(id, delay) {
                    debug!(id, "no async runtime yet; timer deferred");
                    self.deferred_timers.push((id, delay));
                }
                Vec::new()
            }
        }
    }

    fn show_ad(&mut self, mut request: Request<AdsOperation>) -> Vec<Effect> {
        let id = self.next_id();
        let ads = Arc::clone(&self.ads);
        let sender = self.sender.clone();
        let spawned = spawn(async move {
            let outcome = ads.show_rewarded_video().await;
            if sender.send(Message::AdFinished { id, outcome }).is_err() {
                debug!("core gone; ad result dropped");
            }
        });

        if spawned {
            self.pending_ads.insert(id, request);
            Vec::new()
        } else {
            error!("no async runtime; rewarded ad unavailable");
            self.core.resolve(&mut request, Err(AdError::Unavailable))
        }
    }

    fn start_timer(&self, id: u64, delay: Duration) -> bool {
        let sender = self.sender.clone();
        spawn(async move {
            tokio::time::sleep(delay).await;
            if sender.send(Message::TimerFired { id }).is_err() {
                debug!(id, "core gone; timer dropped");
            }
        })
    }

    fn schedule_deferred(&mut self) {
        if self.deferred_timers.is_empty() {
            return;
        }
        for (id, delay) in std::mem::take(&mut self.deferred_timers) {
            if !self.start_timer(id, delay) {
                self.deferred_timers.push((id, delay));
            }
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_request_id = self.next_request_id.wrapping_add(1);
        self.next_request_id
    }
}

fn spawn<F>(future: F) -> bool
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(future);
            true
        }
        Err(_) => false,
    }
}
