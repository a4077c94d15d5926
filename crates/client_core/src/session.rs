//! Wallet connection state machine.
//!
//! A connect attempt moves `Idle -> Connecting`, and a successful provider
//! connection immediately starts backend registration (`Registering`), ending
//! in `Idle` or `Error`. Both flows share the one status field, so a failed
//! registration reports `Error` on a session that is still connected.

use std::sync::Arc;

use serde::Serialize;
use shared::domain::Address;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{info, warn};

use crate::{error::ClientError, gateway::BackendGateway, provider::WalletProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Idle,
    Connecting,
    Registering,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct WalletSession {
    pub address: Option<Address>,
    pub connected: bool,
    pub status: ConnectionStatus,
}

impl WalletSession {
    /// The connected address, if the wallet is connected.
    pub fn active_address(&self) -> Option<&Address> {
        self.address.as_ref().filter(|_| self.connected)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Changed(WalletSession),
    RegistrationFailed { address: Address, reason: String },
}

pub struct WalletConnectionController {
    provider: Arc<dyn WalletProvider>,
    gateway: Arc<BackendGateway>,
    session: RwLock<WalletSession>,
    connect_guard: Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

impl WalletConnectionController {
    pub fn new(provider: Arc<dyn WalletProvider>, gateway: Arc<BackendGateway>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            provider,
            gateway,
            session: RwLock::new(WalletSession::default()),
            connect_guard: Mutex::new(()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn session(&self) -> WalletSession {
        self.session.read().await.clone()
    }

    async fn update(&self, apply: impl FnOnce(&mut WalletSession)) -> WalletSession {
        let snapshot = {
            let mut session = self.session.write().await;
            apply(&mut session);
            session.clone()
        };
        let _ = self.events.send(SessionEvent::Changed(snapshot.clone()));
        snapshot
    }

    /// Connects the wallet and registers the address with the backend.
    ///
    /// A registration failure leaves the wallet connected; it shows up as
    /// `ConnectionStatus::Error` and a [`SessionEvent::RegistrationFailed`].
    pub async fn connect(&self) -> Result<WalletSession, ClientError> {
        let _guard = self
            .connect_guard
            .try_lock()
            .map_err(|_| ClientError::ActionInFlight("wallet connection".to_string()))?;

        self.update(|s| s.status = ConnectionStatus::Connecting).await;

        let address = match self.request_connection().await {
            Ok(address) => address,
            Err(err) => {
                warn!(error = %err, "failed to connect wallet");
                self.update(|s| {
                    s.address = None;
                    s.connected = false;
                    s.status = ConnectionStatus::Error;
                })
                .await;
                return Err(err);
            }
        };
        info!(address = %address.short(), "wallet connected");

        self.update(|s| {
            s.address = Some(address.clone());
            s.connected = true;
        })
        .await;

        if let Err(err) = self.register().await {
            warn!(address = %address.short(), error = %err, "wallet registration failed; staying connected");
        }
        Ok(self.session().await)
    }

    async fn request_connection(&self) -> Result<Address, ClientError> {
        if !self.provider.is_available() {
            return Err(ClientError::ProviderUnavailable(
                "no injected wallet provider".to_string(),
            ));
        }
        let accounts = self.provider.request_accounts().await.map_err(|err| {
            if err.is_user_rejection() {
                ClientError::UserRejected
            } else {
                ClientError::ProviderUnavailable(err.message)
            }
        })?;
        accounts.into_iter().next().ok_or(ClientError::NoAccounts)
    }

    /// Registers the connected address with the backend. Also the manual retry
    /// after a failed registration.
    pub async fn register(&self) -> Result<(), ClientError> {
        let address = self
            .session()
            .await
            .active_address()
            .cloned()
            .ok_or(ClientError::NotConnected)?;

        self.update(|s| s.status = ConnectionStatus::Registering).await;

        let outcome = self.gateway.register_wallet(&address).await;
        let still_current =
            |s: &WalletSession| s.active_address().is_some_and(|a| a == &address);

        match outcome {
            Ok(_) => {
                self.update(|s| {
                    if still_current(&*s) {
                        s.status = ConnectionStatus::Idle;
                    }
                })
                .await;
                info!(address = %address.short(), "wallet registered");
                Ok(())
            }
            Err(err) => {
                self.update(|s| {
                    if still_current(&*s) {
                        s.status = ConnectionStatus::Error;
                    }
                })
                .await;
                let _ = self.events.send(SessionEvent::RegistrationFailed {
                    address: address.clone(),
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Drops the session. The provider is told to disconnect on a best-effort
    /// basis and the backend is not contacted.
    pub async fn disconnect(&self) -> WalletSession {
        if let Err(err) = self.provider.disconnect().await {
            warn!(error = %err, "wallet provider disconnect failed");
        }
        let session = self.update(|s| *s = WalletSession::default()).await;
        info!("wallet disconnected");
        session
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
