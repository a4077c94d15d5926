//! Executes one DCA plan through the wallet provider.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{
    domain::{PlanId, TxHash},
    protocol::{ExecutionNotice, PlanDetails},
};
use tracing::{error, info, warn};

use crate::{
    error::ClientError,
    gateway::BackendGateway,
    provider::WalletProvider,
    transfer::{ExecutionRequest, TokenRegistry},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
    pub success: bool,
    pub tx_hash: TxHash,
    pub message: String,
    pub execution_time: DateTime<Utc>,
}

pub struct DcaExecutor {
    gateway: Arc<BackendGateway>,
    provider: Arc<dyn WalletProvider>,
    tokens: TokenRegistry,
    in_flight: Mutex<HashSet<PlanId>>,
}

/// Removes the plan from the in-flight set when the execution ends.
struct InFlight<'a> {
    plans: &'a Mutex<HashSet<PlanId>>,
    plan_id: PlanId,
}

impl<'a> InFlight<'a> {
    fn acquire(plans: &'a Mutex<HashSet<PlanId>>, plan_id: &PlanId) -> Result<Self, ClientError> {
        let mut set = plans.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(plan_id.clone()) {
            return Err(ClientError::ActionInFlight(format!("execution of plan {plan_id}")));
        }
        Ok(Self {
            plans,
            plan_id: plan_id.clone(),
        })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.plans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.plan_id);
    }
}

impl DcaExecutor {
    pub fn new(
        gateway: Arc<BackendGateway>,
        provider: Arc<dyn WalletProvider>,
        tokens: TokenRegistry,
    ) -> Self {
        Self {
            gateway,
            provider,
            tokens,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn is_executing(&self, plan_id: &PlanId) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(plan_id)
    }

    /// Prepares, signs and reports one execution of `plan_id`.
    ///
    /// A wallet rejection (code 4001) surfaces as
    /// [`ClientError::TransactionRejected`]; other failures propagate as-is.
    /// Once the wallet returns a hash the call succeeds even if the backend
    /// bookkeeping that follows fails.
    pub async fn execute(&self, plan_id: &PlanId) -> Result<ExecutionOutcome, ClientError> {
        let _in_flight = InFlight::acquire(&self.in_flight, plan_id)?;
        info!(plan_id = %plan_id, "initiating DCA execution");

        match self.run(plan_id).await {
            Ok(outcome) => Ok(outcome),
            Err(ClientError::Provider(err)) if err.is_user_rejection() => {
                warn!(plan_id = %plan_id, "transaction rejected in wallet");
                Err(ClientError::TransactionRejected)
            }
            Err(err) => {
                error!(plan_id = %plan_id, error = %err, "DCA execution failed");
                Err(err)
            }
        }
    }

    async fn run(&self, plan_id: &PlanId) -> Result<ExecutionOutcome, ClientError> {
        let (details, adjusted_amount) = self.prepare(plan_id).await?;

        if !self.provider.is_available() {
            return Err(ClientError::ProviderMissing);
        }
        let from_address = self
            .provider
            .request_accounts()
            .await?
            .into_iter()
            .next()
            .ok_or(ClientError::NoAccounts)?;
        info!(plan_id = %plan_id, from = %from_address.short(), "sending from wallet");

        // Plans without a recorded owner are sent from the active account.
        if let Some(owner) = &details.user_address {
            if !owner.eq_ignore_case(&from_address) {
                return Err(ClientError::OwnerMismatch {
                    active: from_address,
                    owner: owner.clone(),
                });
            }
        }

        let request = ExecutionRequest {
            plan_id: plan_id.clone(),
            from_address,
            adjusted_amount,
            to_address: details.to_address.clone(),
        };
        let kind = self.tokens.resolve(details.token.as_deref());
        let tx = self.tokens.build_transaction(&kind, &request)?;
        info!(
            plan_id = %plan_id,
            to = %tx.to.short(),
            value = %tx.value,
            gas = %tx.gas,
            "requesting wallet confirmation"
        );

        let tx_hash = self.provider.send_transaction(&tx).await?;
        info!(plan_id = %plan_id, tx_hash = %tx_hash, "transaction sent");

        self.notify_backend(plan_id, &tx_hash).await;

        Ok(ExecutionOutcome {
            success: true,
            tx_hash,
            message: "DCA plan executed successfully".to_string(),
            execution_time: Utc::now(),
        })
    }

    async fn prepare(&self, plan_id: &PlanId) -> Result<(PlanDetails, f64), ClientError> {
        let preparation = self
            .gateway
            .prepare_execution(plan_id)
            .await
            .map_err(|err| ClientError::Preparation(err.to_string()))?;

        if !preparation.success {
            return Err(ClientError::Preparation(
                "backend did not approve the execution".to_string(),
            ));
        }
        let details = preparation
            .plan_details
            .ok_or_else(|| ClientError::Preparation("missing plan details".to_string()))?;
        let adjusted_amount = preparation
            .adjusted_amount
            .ok_or_else(|| ClientError::Preparation("missing adjusted amount".to_string()))?;
        Ok((details, adjusted_amount))
    }

    /// Best effort: the transaction is already on its way, so failures here
    /// are only logged.
    async fn notify_backend(&self, plan_id: &PlanId, tx_hash: &TxHash) {
        let notice = ExecutionNotice {
            plan_id: plan_id.clone(),
            tx_hash: tx_hash.clone(),
            executed_at: Utc::now(),
        };
        if let Err(err) = self.gateway.record_execution(&notice).await {
            warn!(plan_id = %plan_id, error = %err, "failed to record execution on backend, but transaction was sent");
        }
        if let Err(err) = self.gateway.confirm_transaction(&notice).await {
            warn!(plan_id = %plan_id, error = %err, "failed to notify backend about transaction, but transaction was sent");
        }
    }
}

#[cfg(test)]
#[path = "tests/executor_tests.rs"]
mod tests;
