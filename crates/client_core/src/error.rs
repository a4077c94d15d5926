use shared::domain::Address;
use thiserror::Error;

use crate::plans::FieldError;

/// EIP-1193 code a wallet returns when the user declines a prompt.
pub const USER_REJECTED_CODE: i64 = 4001;
/// EIP-1193 code for a provider that lost its connection.
pub const DISCONNECTED_CODE: i64 = 4900;
/// JSON-RPC code used for malformed provider responses.
pub const INTERNAL_ERROR_CODE: i64 = -32603;

/// Error object returned by a wallet provider's `request`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("provider error {code}: {message}")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn user_rejected() -> Self {
        Self::new(USER_REJECTED_CODE, "User rejected the request.")
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR_CODE, message)
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == USER_REJECTED_CODE
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP {status} {status_text}")]
    Http { status: u16, status_text: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
    #[error("invalid backend url '{0}'")]
    InvalidBaseUrl(String),
    #[error("invalid wallet rpc url '{0}'")]
    InvalidRpcUrl(String),
    #[error("failed to prepare DCA execution: {0}")]
    Preparation(String),
    #[error("No Ethereum wallet detected. Please install MetaMask.")]
    ProviderMissing,
    #[error("wallet provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("wallet connection was rejected by the user")]
    UserRejected,
    #[error("No accounts found. Please connect your wallet.")]
    NoAccounts,
    #[error("connected wallet {active} does not match the plan owner {owner}")]
    OwnerMismatch { active: Address, owner: Address },
    #[error("Transaction was rejected by the user")]
    TransactionRejected,
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid address '{0}'")]
    InvalidAddress(Address),
    #[error("invalid plan: {}", summarize(.0))]
    Validation(Vec<FieldError>),
    #[error("wallet is not connected")]
    NotConnected,
    #[error("{0} is already in progress")]
    ActionInFlight(String),
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ClientError {
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
