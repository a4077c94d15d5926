//! Wallet provider seam: the injected `request(method, params)` object a
//! wallet exposes, plus the implementations this crate ships.

use alloy::{
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::json_rpc::RpcError,
    transports::{
        http::{reqwest, Client, Http},
        TransportError,
    },
};
use async_trait::async_trait;
use serde_json::{json, Value};
use shared::{
    domain::{Address, TxHash},
    protocol::TransactionRequest,
};
use tracing::debug;

use crate::error::{ClientError, ProviderError, DISCONNECTED_CODE};

pub const REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
pub const ACCOUNTS: &str = "eth_accounts";
pub const SEND_TRANSACTION: &str = "eth_sendTransaction";

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Whether a wallet is actually injected.
    fn is_available(&self) -> bool {
        true
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    async fn disconnect(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let value = self.request(REQUEST_ACCOUNTS, json!([])).await?;
        serde_json::from_value(value)
            .map_err(|e| ProviderError::malformed(format!("{REQUEST_ACCOUNTS} returned {e}")))
    }

    /// Suspends until the wallet answers; there is no timeout.
    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash, ProviderError> {
        let params = json!([tx]);
        let value = self.request(SEND_TRANSACTION, params).await?;
        serde_json::from_value(value)
            .map_err(|e| ProviderError::malformed(format!("{SEND_TRANSACTION} returned {e}")))
    }
}

/// Stand-in used when no wallet is injected.
pub struct MissingWalletProvider;

#[async_trait]
impl WalletProvider for MissingWalletProvider {
    fn is_available(&self) -> bool {
        false
    }

    async fn request(&self, method: &str, _params: Value) -> Result<Value, ProviderError> {
        Err(ProviderError::new(
            DISCONNECTED_CODE,
            format!("no wallet provider available for {method}"),
        ))
    }
}

/// Provider backed by a JSON-RPC node holding unlocked accounts.
pub struct JsonRpcWalletProvider {
    rpc_url: String,
    node: RootProvider<Http<Client>>,
}

impl JsonRpcWalletProvider {
    pub fn new(rpc_url: &str) -> Result<Self, ClientError> {
        let url: reqwest::Url = rpc_url
            .parse()
            .map_err(|_| ClientError::InvalidRpcUrl(rpc_url.to_string()))?;
        Ok(Self {
            rpc_url: rpc_url.to_string(),
            node: ProviderBuilder::new().on_http(url),
        })
    }
}

#[async_trait]
impl WalletProvider for JsonRpcWalletProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        // A node has no account prompt; it just lists what it holds.
        let method = if method == REQUEST_ACCOUNTS {
            ACCOUNTS
        } else {
            method
        };
        debug!(method, rpc_url = %self.rpc_url, "json-rpc request");

        self.node
            .raw_request::<Value, Value>(method.to_string().into(), params)
            .await
            .map_err(|err| rpc_failure(method, err))
    }
}

/// Error objects keep their code; anything that never produced a response is
/// reported as a disconnected provider.
fn rpc_failure(method: &str, err: TransportError) -> ProviderError {
    match err {
        RpcError::ErrorResp(payload) => ProviderError::new(payload.code, payload.message.to_string()),
        err @ (RpcError::NullResp | RpcError::SerError(_) | RpcError::DeserError { .. }) => {
            ProviderError::malformed(format!("{method}: {err}"))
        }
        other => ProviderError::new(DISCONNECTED_CODE, other.to_string()),
    }
}

#[cfg(test)]
#[path = "tests/provider_tests.rs"]
mod tests;
