//! REST wrappers for the DCA backend. One call, one request: non-2xx statuses
//! become [`ClientError::Http`], anything else is decoded and returned.

use reqwest::{header::CONTENT_TYPE, Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::{
    domain::{Address, PlanId},
    protocol::{
        DcaPlan, DcaPlanSubmission, ExecutionNotice, ExecutionPreparation, ScheduleAck,
        ScheduleRequest, WalletAddressRequest,
    },
};
use tracing::{debug, warn};
use url::Url;

use crate::error::ClientError;

const NO_BODY: Option<&()> = None;

#[derive(Debug, Clone)]
pub struct BackendGateway {
    http: Client,
    base_url: Url,
}

impl BackendGateway {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(base_url).map_err(|_| ClientError::InvalidBaseUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn call<T, B>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let url = self.endpoint(segments);
        debug!(%method, %url, "backend request");

        let mut request: RequestBuilder = self
            .http
            .request(method.clone(), url.clone())
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%method, %url, status = status.as_u16(), "backend request failed");
            return Err(ClientError::Http {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode {
            endpoint: url.path().to_string(),
            reason: e.to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ClientError> {
        self.call(Method::GET, segments, NO_BODY).await
    }

    /// `POST /api/wallet`, the route the wallet proxy forwards to.
    pub async fn connect_wallet(&self, address: &Address) -> Result<Value, ClientError> {
        let body = WalletAddressRequest {
            address: address.clone(),
        };
        self.call(Method::POST, &["api", "wallet"], Some(&body)).await
    }

    pub async fn register_wallet(&self, address: &Address) -> Result<Value, ClientError> {
        let body = WalletAddressRequest {
            address: address.clone(),
        };
        self.call(Method::POST, &["api", "wallet", "connect"], Some(&body))
            .await
    }

    pub async fn wallet_details(&self, address: &Address) -> Result<Value, ClientError> {
        self.get(&["api", "wallet", address.as_str()]).await
    }

    pub async fn create_plan(&self, submission: &DcaPlanSubmission) -> Result<Value, ClientError> {
        self.call(Method::POST, &["api", "dca", "create"], Some(submission))
            .await
    }

    pub async fn list_plans(&self) -> Result<Vec<DcaPlan>, ClientError> {
        let documents: Vec<Value> = self.get(&["api", "dca", "plans"]).await?;
        Ok(decode_plans(documents))
    }

    pub async fn get_plan(&self, plan_id: &PlanId) -> Result<DcaPlan, ClientError> {
        self.get(&["api", "dca", "plan", plan_id.as_str()]).await
    }

    pub async fn list_user_plans(&self, address: &Address) -> Result<Vec<DcaPlan>, ClientError> {
        let documents: Vec<Value> = self
            .get(&["api", "dca", "plans", "user", address.as_str()])
            .await?;
        Ok(decode_plans(documents))
    }

    /// Backend-side execution; the wallet flow lives in [`crate::executor`].
    pub async fn execute_plan(&self, plan_id: &PlanId) -> Result<Value, ClientError> {
        self.call(Method::POST, &["api", "dca", "execute", plan_id.as_str()], NO_BODY)
            .await
    }

    pub async fn delete_plan(&self, plan_id: &PlanId) -> Result<Value, ClientError> {
        self.call(Method::DELETE, &["api", "dca", "plan", plan_id.as_str()], NO_BODY)
            .await
    }

    pub async fn prepare_execution(
        &self,
        plan_id: &PlanId,
    ) -> Result<ExecutionPreparation, ClientError> {
        self.get(&["api", "dca", "prepareDCA", plan_id.as_str()])
            .await
    }

    pub async fn record_execution(&self, notice: &ExecutionNotice) -> Result<Value, ClientError> {
        self.call(Method::POST, &["api", "dca", "recordExecution"], Some(notice))
            .await
    }

    pub async fn confirm_transaction(
        &self,
        notice: &ExecutionNotice,
    ) -> Result<Value, ClientError> {
        self.call(Method::POST, &["api", "dca", "transaction", "confirm"], Some(notice))
            .await
    }

    pub async fn execution_history(&self, plan_id: &PlanId) -> Result<Value, ClientError> {
        self.get(&["api", "dca", "history", plan_id.as_str()]).await
    }

    pub async fn schedule_plan(
        &self,
        plan_id: &PlanId,
        frequency: &str,
    ) -> Result<ScheduleAck, ClientError> {
        let body = ScheduleRequest {
            plan_id: plan_id.clone(),
            frequency: frequency.to_string(),
        };
        let mut ack: ScheduleAck = self
            .call(Method::POST, &["api", "dca", "schedule"], Some(&body))
            .await?;
        if ack.message.is_none() {
            ack.message = Some(format!(
                "DCA plan {plan_id} scheduled with frequency {frequency}"
            ));
        }
        Ok(ack)
    }

    pub async fn stop_plan(&self, plan_id: &PlanId) -> Result<Value, ClientError> {
        self.call(Method::POST, &["api", "dca", "stop", plan_id.as_str()], NO_BODY)
            .await
    }
}

/// Decodes plan documents one by one; a document that does not fit `DcaPlan`
/// is logged and left out instead of failing the whole list.
fn decode_plans(documents: Vec<Value>) -> Vec<DcaPlan> {
    documents
        .into_iter()
        .filter_map(|document| match serde_json::from_value::<DcaPlan>(document) {
            Ok(plan) => Some(plan),
            Err(e) => {
                warn!(error = %e, "skipping undecodable plan document");
                None
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
