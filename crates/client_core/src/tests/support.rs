//! Mock backend and scripted wallet shared by the client_core tests.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, Uri},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{
    error::{ProviderError, DISCONNECTED_CODE},
    provider::{WalletProvider, REQUEST_ACCOUNTS, SEND_TRANSACTION},
};

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

type Routes = HashMap<(Method, String), (StatusCode, Value)>;

#[derive(Clone)]
struct BackendState {
    routes: Arc<Routes>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

async fn handle(
    State(state): State<BackendState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let path = uri.path().to_string();
    state.calls.lock().await.push(RecordedCall {
        method: method.clone(),
        path: path.clone(),
        body: serde_json::from_slice(&body).ok(),
    });
    match state.routes.get(&(method, path)) {
        Some((status, reply)) => (*status, Json(reply.clone())),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "no such route" })),
        ),
    }
}

#[derive(Default)]
pub(crate) struct MockBackendBuilder {
    routes: Routes,
}

impl MockBackendBuilder {
    pub fn route(mut self, method: Method, path: &str, status: StatusCode, reply: Value) -> Self {
        self.routes.insert((method, path.to_string()), (status, reply));
        self
    }

    pub fn ok(self, method: Method, path: &str, reply: Value) -> Self {
        self.route(method, path, StatusCode::OK, reply)
    }

    pub async fn spawn(self) -> anyhow::Result<MockBackend> {
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let calls = Arc::new(Mutex::new(Vec::new()));
        let state = BackendState {
            routes: Arc::new(self.routes),
            calls: calls.clone(),
        };
        let app = Router::new().fallback(handle).with_state(state);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(MockBackend {
            url: format!("http://{addr}"),
            calls,
        })
    }
}

pub(crate) struct MockBackend {
    pub url: String,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockBackend {
    pub fn builder() -> MockBackendBuilder {
        MockBackendBuilder::default()
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    pub async fn paths(&self) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .map(|call| call.path.clone())
            .collect()
    }
}

/// In-memory wallet that answers from a script and records what it was asked.
pub(crate) struct ScriptedProvider {
    available: bool,
    accounts: Result<Vec<String>, ProviderError>,
    send_result: Result<String, ProviderError>,
    pub methods: Arc<Mutex<Vec<String>>>,
    pub sent: Arc<Mutex<Vec<Value>>>,
    pub disconnects: Arc<Mutex<u32>>,
}

impl ScriptedProvider {
    pub fn with_accounts(accounts: &[&str]) -> Self {
        Self {
            available: true,
            accounts: Ok(accounts.iter().map(|a| a.to_string()).collect()),
            send_result: Ok("0xtxhash".to_string()),
            methods: Arc::new(Mutex::new(Vec::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            disconnects: Arc::new(Mutex::new(0)),
        }
    }

    pub fn unavailable() -> Self {
        let mut provider = Self::with_accounts(&[]);
        provider.available = false;
        provider
    }

    pub fn rejecting_accounts(mut self) -> Self {
        self.accounts = Err(ProviderError::user_rejected());
        self
    }

    pub fn failing_accounts(mut self, message: &str) -> Self {
        self.accounts = Err(ProviderError::new(DISCONNECTED_CODE, message));
        self
    }

    pub fn sending(mut self, tx_hash: &str) -> Self {
        self.send_result = Ok(tx_hash.to_string());
        self
    }

    pub fn failing_send(mut self, error: ProviderError) -> Self {
        self.send_result = Err(error);
        self
    }
}

#[async_trait]
impl WalletProvider for ScriptedProvider {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.methods.lock().await.push(method.to_string());
        match method {
            REQUEST_ACCOUNTS => self.accounts.clone().map(|accounts| json!(accounts)),
            SEND_TRANSACTION => {
                self.sent.lock().await.push(params);
                self.send_result.clone().map(Value::String)
            }
            other => Err(ProviderError::new(-32601, format!("unsupported {other}"))),
        }
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        *self.disconnects.lock().await += 1;
        Ok(())
    }
}
