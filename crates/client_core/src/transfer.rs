//! Turning an execution request into the transaction a wallet signs.

use std::{collections::HashMap, str::FromStr};

use alloy::{
    primitives::{hex, Address as EvmAddress, U256},
    sol,
    sol_types::SolCall,
};
use shared::{
    domain::{Address, PlanId},
    protocol::TransactionRequest,
};

use crate::{
    amount::{to_base_units, to_hex_quantity, NATIVE_TRANSFER_GAS},
    error::ClientError,
    settings::TokenEntry,
};

sol! {
    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

/// One execution attempt; built per call and never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRequest {
    pub plan_id: PlanId,
    pub from_address: Address,
    pub adjusted_amount: f64,
    pub to_address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferKind {
    Native { decimals: u8 },
    Erc20 { contract: Address, decimals: u8 },
}

#[derive(Debug, Clone)]
pub struct TokenRegistry {
    native_symbol: String,
    native_decimals: u8,
    erc20_gas_limit: u64,
    tokens: HashMap<String, TokenEntry>,
}

impl TokenRegistry {
    pub fn new(
        native_symbol: impl Into<String>,
        native_decimals: u8,
        erc20_gas_limit: u64,
        tokens: HashMap<String, TokenEntry>,
    ) -> Self {
        Self {
            native_symbol: native_symbol.into().to_ascii_lowercase(),
            native_decimals,
            erc20_gas_limit,
            tokens: tokens
                .into_iter()
                .map(|(symbol, entry)| (symbol.to_ascii_lowercase(), entry))
                .collect(),
        }
    }

    /// Unknown symbols fall back to a native transfer.
    pub fn resolve(&self, symbol: Option<&str>) -> TransferKind {
        let native = TransferKind::Native {
            decimals: self.native_decimals,
        };
        let Some(symbol) = symbol.map(str::to_ascii_lowercase) else {
            return native;
        };
        if symbol == self.native_symbol {
            return native;
        }
        match self.tokens.get(&symbol) {
            Some(entry) => TransferKind::Erc20 {
                contract: entry.contract.clone(),
                decimals: entry.decimals,
            },
            None => native,
        }
    }

    pub fn build_transaction(
        &self,
        kind: &TransferKind,
        request: &ExecutionRequest,
    ) -> Result<TransactionRequest, ClientError> {
        match kind {
            TransferKind::Native { decimals } => {
                let units = to_base_units(request.adjusted_amount, *decimals)?;
                Ok(TransactionRequest {
                    from: request.from_address.clone(),
                    to: request.to_address.clone(),
                    value: to_hex_quantity(units),
                    gas: to_hex_quantity(U256::from(NATIVE_TRANSFER_GAS)),
                    data: None,
                })
            }
            TransferKind::Erc20 { contract, decimals } => {
                let units = to_base_units(request.adjusted_amount, *decimals)?;
                Ok(TransactionRequest {
                    from: request.from_address.clone(),
                    to: contract.clone(),
                    value: to_hex_quantity(U256::ZERO),
                    gas: to_hex_quantity(U256::from(self.erc20_gas_limit)),
                    data: Some(erc20_transfer_calldata(&request.to_address, units)?),
                })
            }
        }
    }
}

/// ABI-encoded `transfer(recipient, units)` call on an ERC-20 contract.
pub fn erc20_transfer_calldata(recipient: &Address, units: U256) -> Result<String, ClientError> {
    if !recipient.is_well_formed() {
        return Err(ClientError::InvalidAddress(recipient.clone()));
    }
    let to = EvmAddress::from_str(recipient.as_str())
        .map_err(|_| ClientError::InvalidAddress(recipient.clone()))?;
    let call = IERC20::transferCall { to, amount: units };
    Ok(hex::encode_prefixed(call.abi_encode()))
}
