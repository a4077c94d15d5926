use std::sync::Arc;

use serde_json::Value;
use shared::{domain::PlanId, protocol::DcaPlan};
use tracing::info;

pub mod amount;
pub mod error;
pub mod executor;
pub mod gateway;
pub mod plans;
pub mod provider;
pub mod session;
pub mod settings;
pub mod transfer;

pub use error::{ClientError, ProviderError};
pub use executor::{DcaExecutor, ExecutionOutcome};
pub use gateway::BackendGateway;
pub use plans::{owned_plans, FieldError, PlanDraft};
pub use provider::{JsonRpcWalletProvider, MissingWalletProvider, WalletProvider};
pub use session::{ConnectionStatus, SessionEvent, WalletConnectionController, WalletSession};
pub use settings::{load_settings, Settings};

/// Everything a plan screen needs: one gateway, one wallet, the session
/// controller and the executor sharing them.
pub struct DcaClient {
    gateway: Arc<BackendGateway>,
    connection: WalletConnectionController,
    executor: DcaExecutor,
}

impl DcaClient {
    pub fn new(settings: &Settings, provider: Arc<dyn WalletProvider>) -> Result<Self, ClientError> {
        let gateway = Arc::new(BackendGateway::new(&settings.api_url)?);
        Ok(Self::with_gateway(gateway, provider, settings))
    }

    pub fn with_gateway(
        gateway: Arc<BackendGateway>,
        provider: Arc<dyn WalletProvider>,
        settings: &Settings,
    ) -> Self {
        Self {
            connection: WalletConnectionController::new(provider.clone(), gateway.clone()),
            executor: DcaExecutor::new(gateway.clone(), provider, settings.token_registry()),
            gateway,
        }
    }

    pub fn gateway(&self) -> &BackendGateway {
        &self.gateway
    }

    pub fn connection(&self) -> &WalletConnectionController {
        &self.connection
    }

    pub fn executor(&self) -> &DcaExecutor {
        &self.executor
    }

    /// Plans owned by the connected wallet; empty while disconnected.
    pub async fn owned_plans(&self) -> Result<Vec<DcaPlan>, ClientError> {
        let session = self.connection.session().await;
        let Some(owner) = session.active_address() else {
            return Ok(Vec::new());
        };
        let plans = self.gateway.list_plans().await?;
        Ok(owned_plans(plans, owner))
    }

    pub async fn create_plan(&self, draft: &PlanDraft) -> Result<Value, ClientError> {
        let session = self.connection.session().await;
        let owner = session.active_address().ok_or(ClientError::NotConnected)?;
        let mut submission = draft.validate().map_err(ClientError::Validation)?;
        submission.user_address = Some(owner.clone());

        let created = self.gateway.create_plan(&submission).await?;
        info!(owner = %owner.short(), frequency = %submission.frequency, "DCA plan created");
        Ok(created)
    }

    pub async fn execute_plan(&self, plan_id: &PlanId) -> Result<ExecutionOutcome, ClientError> {
        if self.connection.session().await.active_address().is_none() {
            return Err(ClientError::NotConnected);
        }
        self.executor.execute(plan_id).await
    }
}

/// Short message for showing an error to the person using the wallet.
pub fn user_message(err: &ClientError) -> String {
    match err {
        ClientError::NotConnected => "Please connect your wallet first".to_string(),
        ClientError::TransactionRejected => "Transaction was rejected by the user".to_string(),
        ClientError::UserRejected => "Wallet connection was cancelled".to_string(),
        ClientError::ProviderMissing | ClientError::ProviderUnavailable(_) => {
            "No Ethereum wallet detected. Please install MetaMask.".to_string()
        }
        ClientError::NoAccounts => "No accounts found. Please connect your wallet.".to_string(),
        ClientError::OwnerMismatch { .. } => {
            "Connected wallet does not match the plan owner".to_string()
        }
        ClientError::ActionInFlight(_) => "Already in progress, please wait".to_string(),
        ClientError::Validation(errors) => errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        ClientError::Preparation(_) => {
            "Could not prepare this DCA plan. Please try again.".to_string()
        }
        ClientError::Http { .. } | ClientError::Transport(_) | ClientError::Decode { .. } => {
            "The DCA service is unreachable. Please try again later.".to_string()
        }
        ClientError::Provider(_)
        | ClientError::InvalidAmount(_)
        | ClientError::InvalidAddress(_)
        | ClientError::InvalidBaseUrl(_)
        | ClientError::InvalidRpcUrl(_) => "Transaction failed. Please try again.".to_string(),
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
