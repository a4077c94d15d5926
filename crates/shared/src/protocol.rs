use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{Address, PlanId, RiskLevel, TxHash};

/// A plan as the backend stores it. Held here only as a transient copy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DcaPlan {
    #[serde(rename = "_id", alias = "id")]
    pub id: PlanId,
    pub token: String,
    pub amount: f64,
    pub frequency: String,
    pub to_address: Address,
    pub risk_level: RiskLevel,
    #[serde(
        rename = "userAddress",
        alias = "ownerAddress",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub owner_address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of `POST /api/dca/create`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DcaPlanSubmission {
    pub token: String,
    pub amount: f64,
    pub frequency: String,
    pub to_address: Address,
    pub risk_level: RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_address: Option<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletAddressRequest {
    pub address: Address,
}

/// Plan fields returned by the preparation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanDetails {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PlanId>,
    pub to_address: Address,
    #[serde(default, alias = "ownerAddress", skip_serializing_if = "Option::is_none")]
    pub user_address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
}

/// Response of `GET /api/dca/prepareDCA/:id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPreparation {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub plan_details: Option<PlanDetails>,
    #[serde(default)]
    pub adjusted_amount: Option<f64>,
}

/// Body posted to `recordExecution` and `transaction/confirm` after a send.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionNotice {
    pub plan_id: PlanId,
    pub tx_hash: TxHash,
    pub executed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub plan_id: PlanId,
    pub frequency: String,
}

/// Acknowledgement of `POST /api/dca/schedule`; unknown backend fields are kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleAck {
    #[serde(default = "accepted")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn accepted() -> bool {
    true
}

/// Transaction object handed to a wallet provider's `eth_sendTransaction`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub value: String,
    pub gas: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_reads_backend_field_names() {
        let plan: DcaPlan = serde_json::from_value(serde_json::json!({
            "_id": "p1",
            "token": "sonic",
            "amount": 1.0,
            "frequency": "5 minutes",
            "toAddress": "0xabc",
            "riskLevel": "medium",
            "userAddress": "0xUSER",
            "createdAt": "2025-03-01T10:00:00Z",
            "updatedAt": "2025-03-01T10:00:00Z"
        }))
        .expect("plan");

        assert_eq!(plan.id, PlanId::from("p1"));
        assert_eq!(plan.risk_level, RiskLevel::Medium);
        assert_eq!(plan.owner_address, Some(Address::from("0xUSER")));
        assert!(plan.created_at.is_some());
    }

    #[test]
    fn preparation_tolerates_missing_fields() {
        let prep: ExecutionPreparation =
            serde_json::from_value(serde_json::json!({ "message": "not found" }))
                .expect("preparation");
        assert!(!prep.success);
        assert!(prep.plan_details.is_none());
        assert!(prep.adjusted_amount.is_none());
    }

    #[test]
    fn transaction_request_omits_empty_calldata() {
        let tx = TransactionRequest {
            from: Address::from("0xfrom"),
            to: Address::from("0xto"),
            value: "0x1".into(),
            gas: "0x5208".into(),
            data: None,
        };
        let json = serde_json::to_value(&tx).expect("serialize");
        assert!(json.get("data").is_none());
        assert_eq!(json["gas"], "0x5208");
    }
}
