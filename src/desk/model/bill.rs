use chrono::NaiveDateTime;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use crate::desk::model::UserId;
use crate::desk::util::time;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum BillStatus {
    #[display("APPROVED")]
    Approved,
    #[display("DECLINED")]
    Declined,
    /// any status the client does not know how to act on
    #[serde(other)]
    #[display("UNKNOWN")]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BillItem {
    pub product_name: String,
    pub unit_price: f64,
    pub quantity: i64,
}

impl BillItem {
    pub fn subtotal(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// Bill as listed by `GET /user/{userId}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BillRecord {
    pub id: i64,
    pub user_id: UserId,
    #[serde(deserialize_with = "time::deserialize_purchase_date")]
    pub purchase_date: NaiveDateTime,
    pub total_amount: f64,
    pub status: BillStatus,
    pub response_message: Option<String>,
    #[serde(default)]
    pub items: Vec<BillItem>,
}

/// Body of `POST /`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BillSubmissionRequest {
    pub user_id: UserId,
    pub items: Vec<BillItem>,
    pub total_amount: f64,
}

/// Decision returned for a submitted bill. Only `status` is guaranteed,
/// the rest is assigned by the server for approved bills.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BillResponse {
    pub status: BillStatus,
    #[serde(default)]
    pub response_message: Option<String>,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default, deserialize_with = "time::deserialize_optional_purchase_date")]
    pub purchase_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub items: Option<Vec<BillItem>>,
}

impl BillResponse {
    pub fn message(&self) -> &str {
        self.response_message.as_deref().unwrap_or_default()
    }
}

/// The part of a create reply that makes it a decision. A body that has it
/// is a decision whatever shape the server-assigned fields have.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BillDecision {
    pub status: BillStatus,
    #[serde(default)]
    pub response_message: Option<String>,
}

impl From<BillDecision> for BillResponse {
    fn from(decision: BillDecision) -> Self {
        Self {
            status: decision.status,
            response_message: decision.response_message,
            id: None,
            user_id: None,
            purchase_date: None,
            total_amount: None,
            items: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_is_camel_case() {
        let request = BillSubmissionRequest {
            user_id: 12345,
            items: vec![BillItem {
                product_name: "Coffee".to_string(),
                unit_price: 3.5,
                quantity: 2,
            }],
            total_amount: 7.0,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "userId": 12345,
                "items": [{"productName": "Coffee", "unitPrice": 3.5, "quantity": 2}],
                "totalAmount": 7.0,
            })
        );
    }

    #[test]
    fn declined_response_needs_only_status() {
        let response: BillResponse = serde_json::from_value(json!({
            "status": "DECLINED",
            "responseMessage": "insufficient limit",
        }))
        .unwrap();
        assert_eq!(response.status, BillStatus::Declined);
        assert_eq!(response.message(), "insufficient limit");
        assert!(response.id.is_none());
        assert!(response.items.is_none());
    }

    #[test]
    fn approved_response_carries_server_fields() {
        let response: BillResponse = serde_json::from_value(json!({
            "id": 77,
            "userId": 12345,
            "purchaseDate": "2024-05-01T10:15:30.123",
            "totalAmount": 35.0,
            "status": "APPROVED",
            "responseMessage": "ok",
            "items": [{"productName": "A", "unitPrice": 10.0, "quantity": 2}],
        }))
        .unwrap();
        assert_eq!(response.status, BillStatus::Approved);
        assert_eq!(response.id, Some(77));
        assert_eq!(
            response.purchase_date.map(|ts| ts.format("%Y-%m-%d").to_string()),
            Some("2024-05-01".to_string())
        );
        assert_eq!(response.items.unwrap().len(), 1);
    }

    #[test]
    fn date_only_purchase_date_is_dropped() {
        let response: BillResponse = serde_json::from_value(json!({
            "id": 9,
            "status": "APPROVED",
            "purchaseDate": "2024-05-01",
        }))
        .unwrap();
        assert_eq!(response.id, Some(9));
        assert!(response.purchase_date.is_none());
    }

    #[test]
    fn decision_ignores_other_fields() {
        let decision: BillDecision = serde_json::from_value(json!({
            "status": "APPROVED",
            "responseMessage": "ok",
            "items": "not a list",
        }))
        .unwrap();
        let response = BillResponse::from(decision);
        assert_eq!(response.status, BillStatus::Approved);
        assert_eq!(response.message(), "ok");
        assert!(response.items.is_none());
    }

    #[test]
    fn unknown_status_is_not_an_error() {
        let response: BillResponse =
            serde_json::from_value(json!({"status": "PENDING_REVIEW"})).unwrap();
        assert_eq!(response.status, BillStatus::Unknown);
    }

    #[test]
    fn record_accepts_offset_dates() {
        let record: BillRecord = serde_json::from_value(json!({
            "id": 1,
            "userId": 12345,
            "purchaseDate": "2024-05-01T23:30:00+02:00",
            "totalAmount": 12.5,
            "status": "APPROVED",
            "responseMessage": null,
            "items": [],
        }))
        .unwrap();
        assert_eq!(record.purchase_date.format("%Y-%m-%d %H:%M").to_string(), "2024-05-01 23:30");
        assert!(record.response_message.is_none());
    }
}
