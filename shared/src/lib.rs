#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod capabilities;
pub mod config;
pub mod event;
pub mod format;
pub mod forms;
pub mod model;
pub mod persistence;
pub mod platform;
pub mod referral;
pub mod runtime;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::{AppConfig, ConfigError};
pub use event::Event;
pub use model::{BalanceRecord, Model, Notice, NoticeKind, Tab, UserId, UserIdentity, ViewModel};
pub use persistence::PersistenceError;
pub use platform::Platform;
pub use runtime::Core;

use capabilities::{AdError, BridgeError, KvError};

pub const AD_REWARD_MESSAGE: &str = "+1 Watermelon Coin! 🍉";
pub const AD_FAILED_MESSAGE: &str = "Failed to load ad. Please try again later.";
pub const REFERRAL_WELCOME_MESSAGE: &str = "Welcome! Thanks for joining via a friend's invite.";
pub const LINK_COPIED_MESSAGE: &str = "Invite link copied!";
pub const LINK_COPY_FAILED_MESSAGE: &str = "Failed to copy link.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    IdentityUnavailable,
    CorruptedPersistence,
    Storage,
    Validation,
    AdFailed,
    Configuration,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::IdentityUnavailable => "IDENTITY_UNAVAILABLE",
            Self::CorruptedPersistence => "CORRUPTED_PERSISTENCE",
            Self::Storage => "STORAGE_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::AdFailed => "AD_FAILED",
            Self::Configuration => "CONFIGURATION_ERROR",
        }
    }

    /// Everything except configuration is handled inside the core and the
    /// session carries on.
    #[must_use]
    pub const fn is_recoverable(self) -> bool {
        !matches!(self, Self::Configuration)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub internal_message: Option<String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            internal_message: None,
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::IdentityUnavailable => {
                "Running without a platform account. Progress is kept on this device.".into()
            }
            ErrorKind::CorruptedPersistence => {
                "Saved progress could not be read and was reset.".into()
            }
            ErrorKind::Storage => "Unable to save progress on this device.".into(),
            ErrorKind::Validation => self.message.clone(),
            ErrorKind::AdFailed => AD_FAILED_MESSAGE.into(),
            ErrorKind::Configuration => {
                "The app is misconfigured. Please contact support.".into()
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

/// A balance operation whose precondition failed. Display text is what
/// the user sees.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OperationError {
    #[error("Amount must be greater than zero.")]
    NonPositiveAmount,

    #[error("Insufficient Watermelon Coins!")]
    InsufficientPrimary { requested: u64, available: u64 },

    #[error("Insufficient Diggs Balance!")]
    InsufficientSecondary { requested: f64, available: f64 },

    #[error("Please enter a wallet address.")]
    MissingAddress,
}

impl From<OperationError> for AppError {
    fn from(e: OperationError) -> Self {
        let internal = format!("{e:?}");
        AppError::new(ErrorKind::Validation, e.to_string()).with_internal(internal)
    }
}

impl From<BridgeError> for AppError {
    fn from(e: BridgeError) -> Self {
        AppError::new(ErrorKind::IdentityUnavailable, "host bridge unavailable")
            .with_internal(e.to_string())
    }
}

impl From<KvError> for AppError {
    fn from(e: KvError) -> Self {
        AppError::new(ErrorKind::Storage, e.to_string())
    }
}

impl From<PersistenceError> for AppError {
    fn from(e: PersistenceError) -> Self {
        match e {
            PersistenceError::Corrupted { .. } => {
                AppError::new(ErrorKind::CorruptedPersistence, e.to_string())
            }
            PersistenceError::Serialization(_)
            | PersistenceError::Storage(_)
            | PersistenceError::Request(_) => {
                AppError::new(ErrorKind::Storage, e.to_string())
            }
        }
    }
}

impl From<AdError> for AppError {
    fn from(e: AdError) -> Self {
        AppError::new(ErrorKind::AdFailed, "rewarded ad failed").with_internal(e.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::new(ErrorKind::Configuration, e.to_string())
    }
}

pub mod app {
    use std::time::Duration;

    use tracing::{debug, info, warn};
    use url::Url;

    use super::*;
    use crate::capabilities::{BridgeError, Cue};
    use crate::format::{self, ADDRESS_HEAD_CHARS, ADDRESS_TAIL_CHARS};
    use crate::model::{NoticeView, UserView};
    use crate::persistence;
    use crate::referral::{self, Referral};

    #[derive(Default)]
    pub struct App;

    impl App {
        fn notify(model: &mut Model, caps: &Capabilities, message: impl Into<String>, kind: NoticeKind) {
            let duration_ms = model.config.notice_duration_ms;
            let id = model.show_notice(message, kind, duration_ms);
            caps.feedback.emit(match kind {
                NoticeKind::Success => Cue::Success,
                NoticeKind::Error => Cue::Error,
            });
            caps.timer
                .after(Duration::from_millis(duration_ms), move || Event::NoticeExpired { id });
        }

        fn reject(model: &mut Model, caps: &Capabilities, error: OperationError) {
            let error = AppError::from(error);
            debug!(code = error.code(), error = %error, "operation rejected");
            Self::notify(model, caps, error.user_facing_message(), NoticeKind::Error);
        }

        /// Writes the whole record. Failures are logged when the write
        /// reports back; the session carries on either way.
        fn persist(model: &Model, caps: &Capabilities) {
            let Some(user) = &model.user else {
                warn!("no resolved user; change kept in memory only");
                return;
            };
            if !model.is_data_loaded {
                warn!("stored record not loaded yet; change kept in memory only");
                return;
            }

            match persistence::encode(&model.record) {
                Ok(bytes) => {
                    debug!(bytes = bytes.len(), "saving record");
                    caps.kv.set(model.config.storage_key(user.id), bytes, |result| {
                        Event::RecordWritten(result.map(drop).map_err(|e| format!("{e:?}")))
                    });
                }
                Err(e) => {
                    let error = AppError::from(e);
                    warn!(code = error.code(), error = %error, "failed to encode balances");
                }
            }
        }

        fn resolve_identity(config: &AppConfig, lookup: Result<Option<UserIdentity>, BridgeError>) -> UserIdentity {
            match lookup {
                Ok(Some(user)) => user,
                Ok(None) => {
                    info!("host supplied no user; using fallback identity");
                    config.fallback_identity.clone()
                }
                Err(BridgeError::Unavailable) => {
                    let error = AppError::from(BridgeError::Unavailable);
                    info!(error = %error, "host bridge absent; using fallback identity");
                    config.fallback_identity.clone()
                }
                Err(e) => {
                    let error = AppError::from(e);
                    warn!(error = %error, "user lookup failed; using fallback identity");
                    config.fallback_identity.clone()
                }
            }
        }

        fn load_record(model: &Model, caps: &Capabilities, loaded: Result<Option<Vec<u8>>, String>) -> BalanceRecord {
            let Some(user) = &model.user else {
                return BalanceRecord::default();
            };
            let key = model.config.storage_key(user.id);

            match loaded {
                Ok(Some(bytes)) => match persistence::decode(&key, &bytes) {
                    Ok(record) => record,
                    Err(e) => {
                        let error = AppError::from(e);
                        warn!(code = error.code(), error = %error, "discarding corrupted record");
                        caps.kv.delete(key, |result| {
                            Event::RecordDiscarded(result.map(drop).map_err(|e| format!("{e:?}")))
                        });
                        BalanceRecord::default()
                    }
                },
                Ok(None) => {
                    debug!("no stored record");
                    BalanceRecord::default()
                }
                Err(e) => {
                    let error = AppError::from(PersistenceError::Request(e));
                    warn!(code = error.code(), error = %error, "record read failed; starting from defaults");
                    BalanceRecord::default()
                }
            }
        }

        fn check_referral(model: &mut Model, caps: &Capabilities, current_url: Option<&Url>) {
            if model.referral_checked {
                return;
            }
            model.referral_checked = true;

            if model.user.is_none() {
                return;
            }

            let param = &model.config.referral_query_param;
            if let Some(url) = current_url.filter(|url| referral::has_query_param(url, param)) {
                caps.browser.replace_url(&referral::strip_query_param(url, param));
            }

            let Some(found) = referral::resolve(
                model.launch_parameter.as_deref(),
                current_url,
                &model.config.referral_marker,
                param,
            ) else {
                return;
            };

            caps.browser
                .session_get(model.config.referral_session_key.clone(), move |flag| {
                    Event::ReferralFlagRead {
                        referral: found,
                        flag,
                    }
                });
        }

        fn welcome_referral(model: &mut Model, caps: &Capabilities, found: &Referral) {
            let Some(user_id) = model.user.as_ref().map(|u| u.id) else {
                return;
            };

            if found.is_self_referral(user_id) {
                info!("ignoring self-referral");
            } else {
                info!(referrer_id = %found.referrer_id, source = ?found.source, "referred user");
                Self::notify(model, caps, REFERRAL_WELCOME_MESSAGE, NoticeKind::Success);
            }

            caps.browser
                .session_set(model.config.referral_session_key.clone(), "true".to_string());
        }

        fn credit_ad_view(model: &mut Model, caps: &Capabilities) {
            model.record.record_ad_view();
            debug!(
                primary = model.record.primary_balance,
                ads_watched = model.record.ads_watched,
                "ad view credited"
            );
            Self::persist(model, caps);
            Self::notify(model, caps, AD_REWARD_MESSAGE, NoticeKind::Success);
        }

        fn share_referral(model: &Model, caps: &Capabilities) {
            caps.feedback.emit(Cue::Click);

            let Some(link) = Self::referral_link(model) else {
                warn!("no base url for referral link");
                return;
            };

            match referral::share_link(&model.config.share_base_url, &link, &model.config.share_text) {
                Ok(share) => {
                    let link = link.to_string();
                    caps.host
                        .open_link(share.to_string(), move |result| Event::ShareLinkOpened { link, result });
                }
                Err(e) => {
                    warn!(error = %e, "invalid share url; copying instead");
                    caps.browser.copy_text(link.to_string(), Event::LinkCopied);
                }
            }
        }

        fn referral_link(model: &Model) -> Option<Url> {
            let base = model.link_base.as_ref()?;
            let user = model.user.as_ref()?;
            Some(referral::referral_link(
                base,
                &model.config.referral_query_param,
                user.id,
            ))
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            let event_name = event.name();
            if event.is_user_initiated() {
                info!(event = event_name, "user action");
            } else {
                debug!(event = event_name, "event");
            }

            match event {
                Event::Noop => {}

                Event::Configure(config) => {
                    if model.is_starting || model.is_data_loaded {
                        warn!("configuration after startup ignored");
                        return;
                    }
                    match config.validate() {
                        Ok(()) => model.config = config,
                        Err(e) => {
                            let error = AppError::from(e);
                            warn!(code = error.code(), error = %error, "keeping previous configuration");
                        }
                    }
                }

                Event::AppStarted => {
                    if model.is_data_loaded || model.is_starting {
                        debug!("already started");
                        return;
                    }
                    model.is_starting = true;
                    caps.host.launch(Event::Launched);
                }

                Event::Launched(launched) => {
                    if !model.is_starting {
                        warn!("launch context outside startup; ignoring");
                        return;
                    }

                    let user = Self::resolve_identity(&model.config, launched.user);
                    let key = model.config.storage_key(user.id);
                    info!(user_id = %user.id, "identity resolved");

                    model.theme = launched.theme;
                    model.launch_parameter = launched.launch_parameter;
                    model.user = Some(user);
                    caps.kv.get(key, |result| {
                        Event::RecordLoaded(result.map_err(|e| format!("{e:?}")))
                    });
                }

                Event::RecordLoaded(loaded) => {
                    if model.is_data_loaded {
                        warn!("record already loaded; ignoring");
                        return;
                    }
                    model.record = Self::load_record(model, caps, loaded);
                    model.is_data_loaded = true;
                    model.is_starting = false;

                    caps.wallet.current_address(Event::WalletAddressRead);
                    caps.browser.current_url(Event::LocationRead);
                    caps.render.render();
                }

                Event::RecordWritten(result) => {
                    if let Err(e) = result {
                        let error = AppError::from(PersistenceError::Request(e));
                        warn!(code = error.code(), error = %error, "failed to persist balances");
                    }
                }

                Event::RecordDiscarded(result) => {
                    if let Err(e) = result {
                        warn!(error = %e, "failed to remove corrupted record");
                    }
                }

                Event::WalletAddressRead(address) => {
                    let was_connected = model.wallet_connected;
                    model.wallet_connected = !address.is_empty();

                    // A paired wallet wins over the stored address; an empty
                    // connector at startup leaves the record alone.
                    let adopted = !address.is_empty() && model.record.set_wallet_address(&address);
                    if adopted {
                        info!("adopting connected wallet address");
                        Self::persist(model, caps);
                    }
                    if adopted || was_connected != model.wallet_connected {
                        caps.render.render();
                    }
                }

                Event::LocationRead(current) => {
                    let current = current.and_then(|raw| Url::parse(&raw).ok());
                    model.link_base = current.clone().or_else(|| {
                        model
                            .config
                            .app_base_url
                            .as_deref()
                            .and_then(|base| Url::parse(base).ok())
                    });
                    Self::check_referral(model, caps, current.as_ref());
                    caps.render.render();
                }

                Event::ReferralFlagRead { referral, flag } => {
                    match flag {
                        Ok(None) => {}
                        Ok(Some(_)) => {
                            debug!("referral already handled this session");
                            return;
                        }
                        Err(e) => {
                            warn!(error = %e, "session store unreadable; skipping referral");
                            return;
                        }
                    }
                    Self::welcome_referral(model, caps, &referral);
                    caps.render.render();
                }

                Event::WatchAdRequested => {
                    if model.is_ad_loading {
                        debug!("ad already showing");
                        return;
                    }
                    caps.feedback.emit(Cue::Click);
                    model.is_ad_loading = true;
                    caps.ads.show_rewarded_video(Event::AdFinished);
                    caps.render.render();
                }

                Event::AdFinished(result) => {
                    if !model.is_ad_loading {
                        warn!("ad completion without a pending ad; ignoring");
                        return;
                    }
                    model.is_ad_loading = false;

                    match result {
                        Ok(()) => Self::credit_ad_view(model, caps),
                        Err(e) => {
                            let error = AppError::from(e);
                            warn!(error = %error, "rewarded ad failed");
                            Self::notify(model, caps, error.user_facing_message(), NoticeKind::Error);
                        }
                    }
                    caps.render.render();
                }

                Event::AdWatched => {
                    Self::credit_ad_view(model, caps);
                    caps.render.render();
                }

                Event::ConvertRequested { amount } => {
                    match model.record.convert(amount, model.config.conversion_rate) {
                        Ok(credited) => {
                            info!(amount, credited, "converted");
                            Self::persist(model, caps);
                            caps.feedback.emit(Cue::Swoosh);
                            Self::notify(
                                model,
                                caps,
                                format!("Converted {amount} 🍉 to {credited:.4} Diggs"),
                                NoticeKind::Success,
                            );
                        }
                        Err(e) => Self::reject(model, caps, e),
                    }
                    caps.render.render();
                }

                Event::WithdrawRequested { amount, address } => {
                    let address = address.trim();
                    match model.record.withdraw(amount, address) {
                        Ok(()) => {
                            info!(amount, "withdrawn");
                            Self::persist(model, caps);
                            caps.feedback.emit(Cue::Swoosh);
                            Self::notify(
                                model,
                                caps,
                                format!("Withdrew {amount} Diggs to {address}"),
                                NoticeKind::Success,
                            );
                        }
                        Err(e) => Self::reject(model, caps, e),
                    }
                    caps.render.render();
                }

                Event::WalletAddressChanged { address } => {
                    let was_connected = model.wallet_connected;
                    model.wallet_connected = !address.is_empty();

                    if !model.is_data_loaded {
                        debug!("wallet changed before the record loaded; record untouched");
                    } else if model.record.set_wallet_address(&address) {
                        info!(connected = model.wallet_connected, "wallet address changed");
                        Self::persist(model, caps);
                        caps.render.render();
                        return;
                    }

                    if was_connected != model.wallet_connected {
                        caps.render.render();
                    }
                }

                Event::ShareReferralRequested => Self::share_referral(model, caps),

                Event::ShareLinkOpened { link, result } => match result {
                    Ok(()) => info!("share sheet opened"),
                    Err(e) => {
                        debug!(error = %e, "share link not opened; copying instead");
                        caps.browser.copy_text(link, Event::LinkCopied);
                    }
                },

                Event::LinkCopied(result) => {
                    match result {
                        Ok(()) => Self::notify(model, caps, LINK_COPIED_MESSAGE, NoticeKind::Success),
                        Err(e) => {
                            warn!(error = %e, "clipboard write failed");
                            Self::notify(model, caps, LINK_COPY_FAILED_MESSAGE, NoticeKind::Error);
                        }
                    }
                    caps.render.render();
                }

                Event::TabSelected(tab) => {
                    caps.feedback.emit(Cue::Click);
                    model.active_tab = tab;
                    caps.render.render();
                }

                Event::NoticeExpired { id } => {
                    if model.expire_notice(id) {
                        caps.render.render();
                    }
                }

                Event::DismissNotice => {
                    if model.notice.take().is_some() {
                        caps.render.render();
                    }
                }
            }
        }

        fn view(&self, model: &Model) -> ViewModel {
            let record = &model.record;

            ViewModel {
                is_loading: !model.is_data_loaded,
                active_tab: model.active_tab,
                user: model.user.as_ref().map(|u| UserView {
                    id: u.id.to_string(),
                    display_name: format::display_name(u),
                    handle: format::handle(u),
                    initial: format::initial(u),
                }),
                primary_balance: record.primary_balance,
                secondary_balance: record.secondary_balance,
                secondary_balance_text: format::format_secondary(record.secondary_balance),
                ads_watched: record.ads_watched,
                wallet_address: record.wallet_address.clone(),
                wallet_address_short: format::truncate_address(
                    &record.wallet_address,
                    ADDRESS_HEAD_CHARS,
                    ADDRESS_TAIL_CHARS,
                ),
                wallet_connected: model.wallet_connected,
                referral_link: Self::referral_link(model).map(String::from),
                is_ad_loading: model.is_ad_loading,
                notice: model.notice.as_ref().map(NoticeView::from),
                theme: model
                    .theme
                    .clone()
                    .unwrap_or_else(|| model.config.default_theme.clone()),
                conversion_rate: model.config.conversion_rate,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;

    use crux_core::testing::AppTester;
    use crux_core::Request;

    use crate::capabilities::{
        resolve_key_value, AdsOperation, Cue, KeyValueStore, MemoryLocation, StaticHostBridge,
        TimerOperation,
    };
    use crate::platform::testing::{mock_platform, Doubles};

    fn user(id: i64) -> UserIdentity {
        UserIdentity {
            id: UserId(id),
            first_name: "Test".into(),
            last_name: None,
            username: Some("tester".into()),
            language_code: "en".into(),
        }
    }

    /// What one step of the harness produced.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct Step {
        renders: usize,
        ads: usize,
        timers: usize,
    }

    struct Harness {
        app: AppTester<App, Effect>,
        model: Model,
        platform: Platform,
        doubles: Doubles,
        pending_ads: Vec<Request<AdsOperation>>,
        pending_timers: Vec<Request<TimerOperation>>,
    }

    impl Harness {
        fn with_host(host: Arc<StaticHostBridge>) -> Self {
            let (platform, doubles) = mock_platform(host);
            Self {
                app: AppTester::default(),
                model: Model::default(),
                platform,
                doubles,
                pending_ads: Vec::new(),
                pending_timers: Vec::new(),
            }
        }

        fn new(host: StaticHostBridge) -> Self {
            Self::with_host(Arc::new(host))
        }

        fn for_user(id: i64) -> Self {
            Self::new(StaticHostBridge::with_user(user(id)))
        }

        fn at(mut self, url: &str) -> Self {
            let location = Arc::new(MemoryLocation::at(url));
            self.platform.location = location.clone();
            self.doubles.location = location;
            self
        }

        fn configured(mut self, config: AppConfig) -> Self {
            self.send(Event::Configure(config));
            self
        }

        fn send(&mut self, event: Event) -> Step {
            let update = self.app.update(event, &mut self.model);
            self.settle(update.effects, update.events)
        }

        fn started(mut self) -> Self {
            self.send(Event::AppStarted);
            self
        }

        /// Resolves every effect the platform answers synchronously and
        /// feeds resulting events back in. Ads and timers stay pending.
        fn settle(&mut self, effects: Vec<Effect>, events: Vec<Event>) -> Step {
            let mut step = Step::default();
            let mut effects: VecDeque<Effect> = effects.into();
            let mut events: VecDeque<Event> = events.into();

            loop {
                if let Some(effect) = effects.pop_front() {
                    let update = match effect {
                        Effect::Render(_) => {
                            step.renders += 1;
                            continue;
                        }
                        Effect::Feedback(request) => {
                            self.platform.feedback.emit(request.operation.cue);
                            continue;
                        }
                        Effect::Ads(request) => {
                            step.ads += 1;
                            self.pending_ads.push(request);
                            continue;
                        }
                        Effect::Timer(request) => {
                            step.timers += 1;
                            self.pending_timers.push(request);
                            continue;
                        }
                        Effect::KeyValue(mut request) => {
                            let output = resolve_key_value(self.platform.records.as_ref(), &request.operation);
                            self.app.resolve(&mut request, output).expect("kv resolves")
                        }
                        Effect::Host(mut request) => {
                            let output = self.platform.host.resolve(&request.operation);
                            self.app.resolve(&mut request, output).expect("host resolves")
                        }
                        Effect::Browser(mut request) => {
                            let output = self.platform.browser_output(&request.operation);
                            self.app.resolve(&mut request, output).expect("browser resolves")
                        }
                        Effect::Wallet(mut request) => {
                            let output = self.platform.wallet.current_address();
                            self.app.resolve(&mut request, output).expect("wallet resolves")
                        }
                    };
                    effects.extend(update.effects);
                    events.extend(update.events);
                    continue;
                }

                if let Some(event) = events.pop_front() {
                    let update = self.app.update(event, &mut self.model);
                    effects.extend(update.effects);
                    events.extend(update.events);
                    continue;
                }

                return step;
            }
        }

        fn finish_ad(&mut self, outcome: capabilities::AdOutcome) -> Step {
            let mut request = self.pending_ads.remove(0);
            let update = self.app.resolve(&mut request, outcome).expect("ad resolves");
            self.settle(update.effects, update.events)
        }

        fn fire_timers(&mut self) -> Step {
            let mut step = Step::default();
            for mut request in std::mem::take(&mut self.pending_timers) {
                let update = self.app.resolve(&mut request, ()).expect("timer resolves");
                let fired = self.settle(update.effects, update.events);
                step.renders += fired.renders;
                step.timers += fired.timers;
                step.ads += fired.ads;
            }
            step
        }

        fn key(id: i64) -> String {
            AppConfig::default().storage_key(UserId(id))
        }

        fn seed(&self, id: i64, record: &BalanceRecord) {
            let bytes = persistence::encode(record).unwrap();
            self.doubles
                .records
                .set(&Self::key(id), &String::from_utf8(bytes).unwrap())
                .unwrap();
        }

        fn stored(&self, id: i64) -> Option<BalanceRecord> {
            let raw = self.doubles.records.get(&Self::key(id)).unwrap()?;
            Some(persistence::decode(&Self::key(id), raw.as_bytes()).unwrap())
        }

        fn view(&self) -> ViewModel {
            self.app.view(&self.model)
        }

        fn notice(&self) -> Option<(&str, NoticeKind)> {
            self.model
                .notice
                .as_ref()
                .map(|n| (n.message.as_str(), n.kind))
        }

        fn writes(&self) -> usize {
            self.doubles.records.write_count()
        }
    }

    mod error_tests {
        use super::*;

        #[test]
        fn operation_errors_are_validation() {
            let err = AppError::from(OperationError::InsufficientPrimary {
                requested: 5,
                available: 1,
            });
            assert_eq!(err.kind, ErrorKind::Validation);
            assert_eq!(err.user_facing_message(), "Insufficient Watermelon Coins!");
            assert_eq!(err.code(), "VALIDATION_ERROR");
        }

        #[test]
        fn ad_errors_use_fixed_message() {
            let err = AppError::from(AdError::NotLoaded);
            assert_eq!(err.kind, ErrorKind::AdFailed);
            assert_eq!(err.user_facing_message(), AD_FAILED_MESSAGE);
            assert!(err.to_string().contains("ad not loaded"));
        }

        #[test]
        fn persistence_errors_split_by_cause() {
            let corrupted = PersistenceError::Corrupted {
                key: "k".into(),
                reason: "bad".into(),
            };
            assert_eq!(AppError::from(corrupted).kind, ErrorKind::CorruptedPersistence);

            let storage = PersistenceError::Storage(KvError::storage(
                capabilities::StorageErrorCode::QuotaExceeded,
                "full",
            ));
            assert_eq!(AppError::from(storage).kind, ErrorKind::Storage);
            assert_eq!(
                AppError::from(PersistenceError::Request("Timeout".into())).kind,
                ErrorKind::Storage
            );
        }

        #[test]
        fn only_configuration_is_unrecoverable() {
            let err = AppError::from(ConfigError::Parse("eof".into()));
            assert_eq!(err.kind, ErrorKind::Configuration);
            assert!(!err.kind.is_recoverable());
            assert!(ErrorKind::IdentityUnavailable.is_recoverable());
        }

        #[test]
        fn display_includes_internal_detail() {
            let err = AppError::from(BridgeError::Unavailable);
            assert_eq!(
                err.to_string(),
                "[IDENTITY_UNAVAILABLE] host bridge unavailable (internal: host bridge not available)"
            );
        }
    }

    mod startup_tests {
        use super::*;

        #[test]
        fn host_user_is_used_and_record_loaded() {
            let h = Harness::for_user(42);
            h.seed(
                42,
                &BalanceRecord {
                    primary_balance: 9,
                    ..BalanceRecord::default()
                },
            );
            let h = h.started();

            assert_eq!(h.model.user.as_ref().map(|u| u.id), Some(UserId(42)));
            assert_eq!(h.model.record.primary_balance, 9);
            assert!(h.model.is_data_loaded);
            assert!(!h.model.is_starting);
        }

        #[test]
        fn startup_asks_host_then_renders_loaded_state() {
            let mut h = Harness::for_user(1);
            let update = h.app.update(Event::AppStarted, &mut h.model);

            assert!(h.model.is_starting);
            assert!(update.effects.iter().all(|e| matches!(e, Effect::Host(_))));
            assert_eq!(update.effects.len(), 1);

            let step = h.settle(update.effects, update.events);
            assert_eq!(step.renders, 2);
            assert!(!h.view().is_loading);
        }

        #[test]
        fn absent_bridge_falls_back_to_configured_identity() {
            let (platform, doubles) = mock_platform(Arc::new(capabilities::NoHostBridge));
            let mut h = Harness::for_user(0);
            h.platform = platform;
            h.doubles = doubles;
            let h = h.started();

            let resolved = h.model.user.clone().unwrap();
            assert_eq!(resolved.id, UserId(123_456_789));
            assert_eq!(resolved.username.as_deref(), Some("watermelon_master"));
        }

        #[test]
        fn failed_lookup_falls_back() {
            let host = StaticHostBridge::with_user(user(5)).failing_lookup("boom");
            let h = Harness::new(host).started();
            assert_eq!(h.model.user.map(|u| u.id), Some(UserId(123_456_789)));
        }

        #[test]
        fn missing_host_user_falls_back() {
            let h = Harness::new(StaticHostBridge::default()).started();
            assert_eq!(h.model.user.map(|u| u.id), Some(UserId(123_456_789)));
        }

        #[test]
        fn fresh_user_starts_at_zero() {
            let h = Harness::for_user(1).started();
            assert_eq!(h.model.record, BalanceRecord::default());
            assert_eq!(h.writes(), 0);
        }

        #[test]
        fn second_start_is_ignored() {
            let mut h = Harness::for_user(1).started();
            h.send(Event::AdWatched);
            let step = h.send(Event::AppStarted);
            assert_eq!(step, Step::default());
            assert_eq!(h.model.record.primary_balance, 1);
        }

        #[test]
        fn start_while_starting_is_ignored() {
            let mut h = Harness::for_user(1);
            let first = h.app.update(Event::AppStarted, &mut h.model);
            let second = h.app.update(Event::AppStarted, &mut h.model);
            assert!(second.effects.is_empty());

            h.settle(first.effects, first.events);
            assert!(h.model.is_data_loaded);
        }

        #[test]
        fn corrupted_record_is_discarded() {
            let h = Harness::for_user(5);
            h.doubles.records.set(&Harness::key(5), "{not json").unwrap();
            let h = h.started();

            assert_eq!(h.model.record, BalanceRecord::default());
            assert_eq!(h.doubles.records.get(&Harness::key(5)).unwrap(), None);
        }

        #[test]
        fn connected_wallet_is_adopted_at_startup() {
            let h = Harness::for_user(3);
            h.doubles.wallet.connect("EQnew");
            let h = h.started();
            assert_eq!(h.model.record.wallet_address, "EQnew");
            assert_eq!(h.stored(3).unwrap().wallet_address, "EQnew");
            assert!(h.view().wallet_connected);
        }

        #[test]
        fn empty_connector_keeps_stored_address_but_reports_disconnected() {
            let h = Harness::for_user(3);
            h.seed(
                3,
                &BalanceRecord {
                    wallet_address: "EQold".into(),
                    ..BalanceRecord::default()
                },
            );
            let h = h.started();
            let view = h.view();

            assert_eq!(view.wallet_address, "EQold");
            assert!(!view.wallet_connected);
        }

        #[test]
        fn theme_comes_from_host_or_config() {
            let theme = model::ThemeColors {
                background: "#101010".into(),
                text: "#fafafa".into(),
            };
            let h = Harness::new(StaticHostBridge::with_user(user(1)).themed(theme.clone())).started();
            assert_eq!(h.view().theme, theme);

            let h = Harness::for_user(1).started();
            assert_eq!(h.view().theme, model::ThemeColors::default());
        }
    }

    mod config_tests {
        use super::*;

        #[test]
        fn configuration_applies_before_start() {
            let h = Harness::for_user(1)
                .configured(AppConfig {
                    conversion_rate: 0.1,
                    ..AppConfig::default()
                })
                .started();
            assert_eq!(h.view().conversion_rate, 0.1);
        }

        #[test]
        fn invalid_configuration_is_rejected() {
            let h = Harness::for_user(1).configured(AppConfig {
                conversion_rate: -1.0,
                ..AppConfig::default()
            });
            assert_eq!(h.model.config, AppConfig::default());
        }

        #[test]
        fn configuration_after_start_is_ignored() {
            let mut h = Harness::for_user(1).started();
            h.send(Event::Configure(AppConfig {
                conversion_rate: 0.5,
                ..AppConfig::default()
            }));
            assert_eq!(h.model.config.conversion_rate, 0.05);
        }

        #[test]
        fn configured_prefix_keys_the_record() {
            let config = AppConfig {
                storage_key_prefix: "melon_".into(),
                ..AppConfig::default()
            };
            let mut h = Harness::for_user(6).configured(config).started();
            h.send(Event::AdWatched);

            assert!(h.doubles.records.get("melon_6").unwrap().is_some());
            assert!(h.stored(6).is_none());
        }
    }

    mod ad_tests {
        use super::*;

        #[test]
        fn watch_request_sets_loading_and_asks_for_ad() {
            let mut h = Harness::for_user(1).started();
            let step = h.send(Event::WatchAdRequested);
            assert!(h.model.is_ad_loading);
            assert_eq!(step, Step { renders: 1, ads: 1, timers: 0 });
            assert_eq!(h.pending_ads[0].operation, AdsOperation::ShowRewardedVideo);
        }

        #[test]
        fn second_request_while_loading_is_ignored() {
            let mut h = Harness::for_user(1).started();
            h.send(Event::WatchAdRequested);
            let step = h.send(Event::WatchAdRequested);
            assert_eq!(step, Step::default());
            assert_eq!(h.pending_ads.len(), 1);
        }

        #[test]
        fn successful_ad_credits_once() {
            let mut h = Harness::for_user(1).started();
            h.send(Event::WatchAdRequested);
            h.finish_ad(Ok(()));

            assert!(!h.model.is_ad_loading);
            assert_eq!(h.model.record.primary_balance, 1);
            assert_eq!(h.model.record.ads_watched, 1);
            assert_eq!(h.notice(), Some((AD_REWARD_MESSAGE, NoticeKind::Success)));
            assert_eq!(h.stored(1).unwrap().primary_balance, 1);

            h.send(Event::AdFinished(Ok(())));
            assert_eq!(h.model.record.primary_balance, 1);
        }

        #[test]
        fn failed_ad_shows_error_and_clears_loading() {
            let mut h = Harness::for_user(1).started();
            h.send(Event::WatchAdRequested);
            h.finish_ad(Err(AdError::Internal("internal_error".into())));

            assert!(!h.model.is_ad_loading);
            assert_eq!(h.model.record.primary_balance, 0);
            assert_eq!(h.notice(), Some((AD_FAILED_MESSAGE, NoticeKind::Error)));
            assert_eq!(h.writes(), 0);
            assert_eq!(h.doubles.feedback.cues(), vec![Cue::Click, Cue::Error]);
        }

        #[test]
        fn three_views_from_fresh_user() {
            let mut h = Harness::for_user(1).started();
            for _ in 0..3 {
                h.send(Event::AdWatched);
            }
            let stored = h.stored(1).unwrap();
            assert_eq!(stored.primary_balance, 3);
            assert_eq!(stored.ads_watched, 3);
        }
    }

    mod operation_tests {
        use super::*;

        fn with_balances(primary: u64, secondary: f64) -> Harness {
            let h = Harness::for_user(7);
            h.seed(
                7,
                &BalanceRecord {
                    primary_balance: primary,
                    secondary_balance: secondary,
                    ..BalanceRecord::default()
                },
            );
            h.started()
        }

        #[test]
        fn convert_updates_both_balances_and_persists() {
            let mut h = with_balances(100, 0.0);
            h.send(Event::ConvertRequested { amount: 40 });

            assert_eq!(h.model.record.primary_balance, 60);
            assert!((h.model.record.secondary_balance - 2.0).abs() < 1e-12);
            assert_eq!(
                h.notice(),
                Some(("Converted 40 🍉 to 2.0000 Diggs", NoticeKind::Success))
            );
            assert_eq!(h.stored(7).unwrap().primary_balance, 60);
            assert_eq!(h.doubles.feedback.cues(), vec![Cue::Swoosh, Cue::Success]);
        }

        #[test]
        fn convert_over_balance_changes_nothing() {
            let mut h = with_balances(10, 1.0);
            let writes = h.writes();
            h.send(Event::ConvertRequested { amount: 11 });

            assert_eq!(h.model.record.primary_balance, 10);
            assert_eq!(h.model.record.secondary_balance, 1.0);
            assert_eq!(h.notice(), Some(("Insufficient Watermelon Coins!", NoticeKind::Error)));
            assert_eq!(h.writes(), writes);
        }

        #[test]
        fn convert_zero_is_rejected() {
            let mut h = with_balances(10, 0.0);
            h.send(Event::ConvertRequested { amount: 0 });
            assert_eq!(h.notice(), Some(("Amount must be greater than zero.", NoticeKind::Error)));
        }

        #[test]
        fn withdraw_full_balance() {
            let mut h = with_balances(0, 2.0);
            h.send(Event::WithdrawRequested {
                amount: 2.0,
                address: "addrX".into(),
            });
            assert_eq!(h.model.record.secondary_balance, 0.0);
            assert_eq!(h.notice(), Some(("Withdrew 2 Diggs to addrX", NoticeKind::Success)));
            assert_eq!(h.stored(7).unwrap().secondary_balance, 0.0);
        }

        #[test]
        fn withdraw_over_balance_changes_nothing() {
            let mut h = with_balances(0, 2.0);
            let writes = h.writes();
            h.send(Event::WithdrawRequested {
                amount: 2.5,
                address: "addrX".into(),
            });
            assert_eq!(h.model.record.secondary_balance, 2.0);
            assert_eq!(h.notice(), Some(("Insufficient Diggs Balance!", NoticeKind::Error)));
            assert_eq!(h.writes(), writes);
        }

        #[test]
        fn withdraw_requires_address() {
            let mut h = with_balances(0, 2.0);
            h.send(Event::WithdrawRequested {
                amount: 1.0,
                address: "  ".into(),
            });
            assert_eq!(h.model.record.secondary_balance, 2.0);
            assert_eq!(h.notice(), Some(("Please enter a wallet address.", NoticeKind::Error)));
        }

        #[test]
        fn mutation_before_start_is_not_saved() {
            let mut h = Harness::for_user(1);
            h.send(Event::AdWatched);
            assert_eq!(h.model.record.primary_balance, 1);
            assert_eq!(h.writes(), 0);
        }

        #[test]
        fn mutation_before_record_arrives_is_not_saved() {
            let mut h = Harness::for_user(1);
            h.seed(
                1,
                &BalanceRecord {
                    primary_balance: 50,
                    ..BalanceRecord::default()
                },
            );
            let started = h.app.update(Event::AppStarted, &mut h.model);
            let Some(Effect::Host(mut launch)) = started.effects.into_iter().next() else {
                panic!("expected a host request");
            };
            let output = h.platform.host.resolve(&launch.operation);
            let launched = h.app.resolve(&mut launch, output).expect("host resolves");
            for event in launched.events {
                let loading = h.app.update(event, &mut h.model);
                assert!(loading.effects.iter().all(|e| matches!(e, Effect::KeyValue(_))));
                h.send(Event::AdWatched);
                assert_eq!(h.writes(), 0);
                h.settle(loading.effects, loading.events);
            }

            assert_eq!(h.stored(1).unwrap().primary_balance, 50);
            assert_eq!(h.model.record.primary_balance, 50);
        }

        #[test]
        fn notice_expiry_is_scheduled_and_clears() {
            let mut h = with_balances(5, 0.0);
            let step = h.send(Event::ConvertRequested { amount: 5 });

            assert_eq!(step.timers, 1);
            assert_eq!(
                h.pending_timers[0].operation,
                TimerOperation::After { millis: 2_500 }
            );

            let fired = h.fire_timers();
            assert_eq!(fired.renders, 1);
            assert_eq!(h.notice(), None);
        }
    }

    mod wallet_tests {
        use super::*;

        #[test]
        fn change_is_copied_and_saved() {
            let mut h = Harness::for_user(2).started();
            h.send(Event::WalletAddressChanged {
                address: "EQabc".into(),
            });
            assert_eq!(h.stored(2).unwrap().wallet_address, "EQabc");
            assert!(h.view().wallet_connected);

            h.send(Event::WalletAddressChanged {
                address: String::new(),
            });
            assert_eq!(h.stored(2).unwrap().wallet_address, "");
            assert!(!h.view().wallet_connected);
        }

        #[test]
        fn unchanged_address_does_not_write() {
            let mut h = Harness::for_user(2).started();
            h.send(Event::WalletAddressChanged {
                address: "EQabc".into(),
            });
            let writes = h.writes();
            let step = h.send(Event::WalletAddressChanged {
                address: "EQabc".into(),
            });
            assert_eq!(step, Step::default());
            assert_eq!(h.writes(), writes);
        }

        #[test]
        fn change_before_load_only_updates_connection() {
            let mut h = Harness::for_user(2);
            h.send(Event::WalletAddressChanged {
                address: "EQabc".into(),
            });
            assert!(h.model.wallet_connected);
            assert_eq!(h.model.record.wallet_address, "");
            assert_eq!(h.writes(), 0);
        }
    }

    mod referral_tests {
        use super::*;

        #[test]
        fn launch_parameter_referral_welcomes_once() {
            let host = StaticHostBridge::with_user(user(10)).launched_with("ref_99");
            let h = Harness::new(host).started();

            assert_eq!(h.notice(), Some((REFERRAL_WELCOME_MESSAGE, NoticeKind::Success)));
            assert_eq!(
                h.doubles.session.get("referralMessageShown").unwrap().as_deref(),
                Some("true")
            );
            assert!(h.doubles.location.replacements().is_empty());
        }

        #[test]
        fn self_referral_is_silent_but_marked() {
            let host = StaticHostBridge::with_user(user(10)).launched_with("ref_10");
            let h = Harness::new(host).started();

            assert_eq!(h.notice(), None);
            assert!(h.doubles.session.get("referralMessageShown").unwrap().is_some());
        }

        #[test]
        fn session_flag_suppresses_notice() {
            let host = StaticHostBridge::with_user(user(10)).launched_with("ref_99");
            let h = Harness::new(host);
            h.doubles.session.set("referralMessageShown", "true").unwrap();
            let h = h.started();
            assert_eq!(h.notice(), None);
        }

        #[test]
        fn url_referral_strips_only_ref() {
            let h = Harness::for_user(10)
                .at("https://app.example/play?ref=55&utm=tg")
                .started();

            assert_eq!(h.notice(), Some((REFERRAL_WELCOME_MESSAGE, NoticeKind::Success)));
            let replaced = h.doubles.location.replacements();
            assert_eq!(replaced.len(), 1);
            assert_eq!(replaced[0].as_str(), "https://app.example/play?utm=tg");
        }

        #[test]
        fn url_is_cleaned_when_launch_parameter_refers() {
            let host = StaticHostBridge::with_user(user(10)).launched_with("ref_99");
            let h = Harness::new(host)
                .at("https://app.example/play?ref=55")
                .started();

            assert_eq!(h.notice(), Some((REFERRAL_WELCOME_MESSAGE, NoticeKind::Success)));
            let replaced = h.doubles.location.replacements();
            assert_eq!(replaced.len(), 1);
            assert_eq!(replaced[0].as_str(), "https://app.example/play");
        }

        #[test]
        fn url_is_cleaned_when_referral_already_handled() {
            let h = Harness::for_user(10).at("https://app.example/play?ref=55");
            h.doubles.session.set("referralMessageShown", "true").unwrap();
            let h = h.started();

            assert_eq!(h.notice(), None);
            assert_eq!(h.doubles.location.replacements().len(), 1);
        }

        #[test]
        fn no_referral_leaves_session_untouched() {
            let h = Harness::for_user(10).at("https://app.example/play").started();
            assert!(h.doubles.session.is_empty());
            assert!(h.doubles.location.replacements().is_empty());
            assert!(h.model.referral_checked);
        }
    }

    mod share_tests {
        use super::*;

        fn with_base() -> AppConfig {
            AppConfig {
                app_base_url: Some("https://app.example/".into()),
                ..AppConfig::default()
            }
        }

        #[test]
        fn opens_share_sheet_through_host() {
            let host = Arc::new(StaticHostBridge::with_user(user(5)));
            let mut h = Harness::with_host(host.clone())
                .at("https://app.example/play?x=1")
                .started();

            h.send(Event::ShareReferralRequested);

            let opened = host.opened_links();
            assert_eq!(opened.len(), 1);
            assert!(opened[0].starts_with("https://t.me/share/url?url=https%3A%2F%2Fapp.example%2Fplay%3Fref%3D5"));
            assert_eq!(h.doubles.clipboard.contents(), None);
            assert_eq!(h.doubles.feedback.cues(), vec![Cue::Click]);
        }

        #[test]
        fn falls_back_to_clipboard_without_host() {
            let mut h = Harness::for_user(0).configured(with_base());
            h.platform.host = Arc::new(capabilities::NoHostBridge);
            let mut h = h.started();

            h.send(Event::ShareReferralRequested);

            assert_eq!(
                h.doubles.clipboard.contents().as_deref(),
                Some("https://app.example/?ref=123456789")
            );
            assert_eq!(h.notice(), Some((LINK_COPIED_MESSAGE, NoticeKind::Success)));
        }

        #[test]
        fn clipboard_failure_is_reported() {
            let mut h = Harness::for_user(0).configured(with_base());
            h.platform.host = Arc::new(capabilities::NoHostBridge);
            h.platform.clipboard = Arc::new(capabilities::NoClipboard);
            let mut h = h.started();

            h.send(Event::ShareReferralRequested);

            assert_eq!(h.notice(), Some((LINK_COPY_FAILED_MESSAGE, NoticeKind::Error)));
        }
    }

    mod notice_tests {
        use super::*;

        #[test]
        fn stale_expiry_keeps_newer_notice() {
            let mut h = Harness::for_user(1).started();
            h.send(Event::AdWatched);
            let first = h.model.notice.as_ref().unwrap().id;
            h.send(Event::ConvertRequested { amount: 5 });

            assert_eq!(h.send(Event::NoticeExpired { id: first }), Step::default());
            assert_eq!(h.notice().map(|(_, k)| k), Some(NoticeKind::Error));
        }

        #[test]
        fn dismiss_clears_notice() {
            let mut h = Harness::for_user(1).started();
            h.send(Event::AdWatched);
            assert_eq!(h.send(Event::DismissNotice).renders, 1);
            assert_eq!(h.notice(), None);
            assert_eq!(h.send(Event::DismissNotice), Step::default());
        }

        #[test]
        fn tab_selection_clicks_and_renders() {
            let mut h = Harness::for_user(1).started();
            assert_eq!(h.send(Event::TabSelected(Tab::Wallet)).renders, 1);
            assert_eq!(h.model.active_tab, Tab::Wallet);
            assert_eq!(h.doubles.feedback.cues(), vec![Cue::Click]);
        }
    }

    mod view_tests {
        use super::*;

        #[test]
        fn loading_before_start() {
            let h = Harness::for_user(1);
            let view = h.view();
            assert!(view.is_loading);
            assert!(view.user.is_none());
            assert_eq!(view.active_tab, Tab::Watch);
        }

        #[test]
        fn projects_record_and_user() {
            let h = Harness::for_user(77).at("https://app.example/play");
            h.seed(
                77,
                &BalanceRecord {
                    primary_balance: 12,
                    secondary_balance: 0.15,
                    ads_watched: 30,
                    wallet_address: "EQD4FPq-PRDieyQKkizFTRtSDyucUIqrj0v_zXJmqaDp6_0t".into(),
                },
            );
            h.doubles
                .wallet
                .connect("EQD4FPq-PRDieyQKkizFTRtSDyucUIqrj0v_zXJmqaDp6_0t");
            let h = h.started();
            let view = h.view();

            assert!(!view.is_loading);
            assert_eq!(view.primary_balance, 12);
            assert_eq!(view.secondary_balance_text, "0.1500");
            assert_eq!(view.wallet_address_short, "EQD4...6_0t");
            assert!(view.wallet_connected);
            assert_eq!(
                view.referral_link.as_deref(),
                Some("https://app.example/play?ref=77")
            );
            let user_view = view.user.unwrap();
            assert_eq!(user_view.handle, "@tester");
            assert_eq!(user_view.initial, "T");
            assert_eq!(view.conversion_rate, 0.05);
        }

        #[test]
        fn notice_view_carries_id() {
            let mut h = Harness::for_user(1).started();
            h.send(Event::AdWatched);
            let id = h.model.notice.as_ref().unwrap().id;
            assert_eq!(h.view().notice.map(|n| n.id), Some(id));
        }

        #[test]
        fn no_link_without_base() {
            let h = Harness::for_user(1).started();
            assert_eq!(h.view().referral_link, None);
        }
    }
}
