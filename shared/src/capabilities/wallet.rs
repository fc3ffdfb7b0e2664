use std::sync::{Arc, Mutex};

use crux_core::capability::{CapabilityContext, Operation};
use crux_core::macros::Capability;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum WalletOperation {
    /// The connected address, `""` when disconnected.
    CurrentAddress,
}

impl Operation for WalletOperation {
    type Output = String;
}

/// Read side of the external wallet widget. Changes arrive from the shell
/// as `Event::WalletAddressChanged`; the core never connects or
/// disconnects.
#[derive(Capability)]
pub struct Wallet<Ev> {
    context: CapabilityContext<WalletOperation, Ev>,
}

impl<Ev> Wallet<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<WalletOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn current_address<F>(&self, make_event: F)
    where
        F: FnOnce(String) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let address = ctx.request_from_shell(WalletOperation::CurrentAddress).await;
            ctx.update_app(make_event(address));
        });
    }
}

pub type AddressHandler = Box<dyn Fn(String) + Send + Sync>;

/// External wallet-pairing widget as the shell sees it: the current
/// address (`""` when disconnected) and change notifications.
pub trait WalletConnector: Send + Sync {
    fn current_address(&self) -> String;

    /// Registers `handler` to be called with the new address every time
    /// the connection changes.
    fn on_change(&self, handler: AddressHandler);
}

/// Connector driven directly by the shell (or a test) through
/// [`ManualWalletConnector::connect`] and [`ManualWalletConnector::disconnect`].
#[derive(Default, Clone)]
pub struct ManualWalletConnector {
    inner: Arc<Mutex<ConnectorState>>,
}

#[derive(Default)]
struct ConnectorState {
    address: String,
    handlers: Vec<Arc<dyn Fn(String) + Send + Sync>>,
}

impl ManualWalletConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, address: impl Into<String>) {
        self.publish(address.into());
    }

    pub fn disconnect(&self) {
        self.publish(String::new());
    }

    pub fn handler_count(&self) -> usize {
        self.inner.lock().map(|s| s.handlers.len()).unwrap_or(0)
    }

    fn publish(&self, address: String) {
        // Handlers run outside the lock so they may call back into the connector.
        let handlers = match self.inner.lock() {
            Ok(mut state) => {
                if state.address == address {
                    return;
                }
                state.address.clone_from(&address);
                state.handlers.clone()
            }
            Err(_) => {
                tracing::error!("wallet connector state poisoned; dropping address change");
                return;
            }
        };

        for handler in handlers {
            handler(address.clone());
        }
    }
}

impl WalletConnector for ManualWalletConnector {
    fn current_address(&self) -> String {
        self.inner
            .lock()
            .map(|s| s.address.clone())
            .unwrap_or_default()
    }

    fn on_change(&self, handler: AddressHandler) {
        match self.inner.lock() {
            Ok(mut state) => state.handlers.push(Arc::from(handler)),
            Err(_) => tracing::error!("wallet connector state poisoned; handler not registered"),
        }
    }
}
