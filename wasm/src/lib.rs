//! WebAssembly module for the Retail Ops Platform
//!
//! Lets the back-office UI run the same rules as the server:
//! - Transfer draft validation
//! - Receipt preview (resulting status, short lines, over-receipt)
//! - Available actions and labels per transfer status
//! - Journey grouping of a transfer page
//!
//! Every function takes and returns JSON strings so the JS side needs no
//! generated bindings beyond plain strings.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use shared::{
    error_codes, group_by_journey, validate_create_transfer, workflow, CreateTransferInput,
    ErrorBody, FieldError, ReceiveOutcome, ReceiveTransferInput, StockTransfer, TransferStatus,
    WorkflowError,
};

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::debug_1(&JsValue::from_str("retail-ops-wasm loaded"));
}

fn error_json(body: ErrorBody) -> String {
    serde_json::to_string(&body).unwrap_or_else(|_| format!("{{\"code\":\"{}\"}}", body.code))
}

fn field_error(err: FieldError) -> ErrorBody {
    ErrorBody {
        code: error_codes::VALIDATION.to_string(),
        message: err.message,
        details: Some(serde_json::json!({ "field": err.field })),
    }
}

fn workflow_error(err: WorkflowError) -> ErrorBody {
    match err {
        WorkflowError::Validation(field) => field_error(field),
        WorkflowError::InsufficientQuantity {
            product_id,
            available,
            requested,
        } => ErrorBody {
            code: error_codes::INSUFFICIENT_STOCK.to_string(),
            message: "Received quantity exceeds what is left to receive".to_string(),
            details: Some(serde_json::json!({
                "productId": product_id,
                "available": available,
                "requested": requested,
            })),
        },
        other => ErrorBody {
            code: error_codes::INVALID_TRANSITION.to_string(),
            message: other.to_string(),
            details: None,
        },
    }
}

fn parse<T: serde::de::DeserializeOwned>(json: &str, what: &str) -> Result<T, ErrorBody> {
    serde_json::from_str(json).map_err(|e| {
        field_error(FieldError::new(what, format!("Invalid JSON: {}", e)))
    })
}

/// Check a transfer draft; empty string when valid, error JSON otherwise
#[wasm_bindgen]
pub fn validate_transfer_draft(input_json: &str) -> String {
    let result = parse::<CreateTransferInput>(input_json, "body")
        .and_then(|input| validate_create_transfer(&input).map_err(field_error));

    match result {
        Ok(()) => String::new(),
        Err(body) => error_json(body),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReceivePreview {
    #[serde(flatten)]
    outcome: ReceiveOutcome,
    transfer: StockTransfer,
}

fn preview(transfer_json: &str, receipt_json: &str) -> Result<String, ErrorBody> {
    let mut transfer: StockTransfer = parse(transfer_json, "transfer")?;
    let receipt: ReceiveTransferInput = parse(receipt_json, "receipt")?;

    let now = preview_clock(&transfer);
    let outcome = workflow::receive(&mut transfer, &receipt, now)
        .map_err(workflow_error)?;

    serde_json::to_string(&ReceivePreview { outcome, transfer })
        .map_err(|e| field_error(FieldError::new("transfer", e.to_string())))
}

// Preview timestamps reuse the transfer's own clock; the server sets the real one
fn preview_clock(transfer: &StockTransfer) -> chrono::DateTime<chrono::Utc> {
    transfer.updated_at
}

/// Apply a receipt to a copy of the transfer without sending anything.
///
/// Returns `{previousStatus, status, applied, shortLines, transfer}`, or
/// throws the error envelope body the server would answer with.
#[wasm_bindgen]
pub fn preview_receive(transfer_json: &str, receipt_json: &str) -> Result<String, JsValue> {
    preview(transfer_json, receipt_json).map_err(|body| JsValue::from_str(&error_json(body)))
}

fn parse_status(status: &str) -> Option<TransferStatus> {
    TransferStatus::from_str(status.trim())
}

/// JSON array of the actions allowed from a status (`[]` for unknown ones)
#[wasm_bindgen]
pub fn available_actions(status: &str) -> String {
    let actions = parse_status(status)
        .map(|s| s.available_actions())
        .unwrap_or_default();
    serde_json::to_string(&actions).unwrap_or_else(|_| "[]".to_string())
}

/// Human label of a status code
#[wasm_bindgen]
pub fn transfer_status_label(status: &str) -> String {
    parse_status(status)
        .map(|s| s.to_string())
        .unwrap_or_else(|| status.to_string())
}

/// Whether no further action is possible from the status
#[wasm_bindgen]
pub fn is_terminal_status(status: &str) -> bool {
    parse_status(status).map_or(false, |s| s.is_terminal())
}

fn group(transfers_json: &str) -> Result<String, ErrorBody> {
    let transfers: Vec<StockTransfer> = parse(transfers_json, "transfers")?;
    serde_json::to_string(&group_by_journey(transfers))
        .map_err(|e| field_error(FieldError::new("transfers", e.to_string())))
}

/// Fold journey legs of a transfer page into journey rows
#[wasm_bindgen]
pub fn group_transfers(transfers_json: &str) -> Result<String, JsValue> {
    group(transfers_json).map_err(|body| JsValue::from_str(&error_json(body)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use uuid::Uuid;

    fn transfer_json(status: &str, qty: &str, received: &str) -> (Value, Uuid) {
        let product = Uuid::new_v4();
        let wh = |code: &str| {
            json!({ "id": Uuid::new_v4(), "code": code, "name": code, "kind": "DEPOT", "isSystem": false })
        };
        let transfer = json!({
            "id": Uuid::new_v4(),
            "status": status,
            "purpose": null,
            "fromWarehouse": wh("WH-A"),
            "toWarehouse": wh("WH-B"),
            "journeyId": null,
            "note": null,
            "disputeReason": null,
            "shippedAt": "2025-01-01T08:00:00Z",
            "receivedAt": null,
            "createdAt": "2025-01-01T07:00:00Z",
            "updatedAt": "2025-01-01T08:00:00Z",
            "lines": [{ "id": Uuid::new_v4(), "productId": product, "qty": qty, "qtyReceived": received, "note": null }]
        });
        (transfer, product)
    }

    #[test]
    fn test_validate_transfer_draft() {
        let ok = json!({
            "fromWarehouseId": Uuid::new_v4(),
            "toWarehouseId": Uuid::new_v4(),
            "lines": [{ "productId": Uuid::new_v4(), "qty": "3" }]
        });
        assert_eq!(validate_transfer_draft(&ok.to_string()), "");

        let empty = json!({
            "fromWarehouseId": Uuid::new_v4(),
            "toWarehouseId": Uuid::new_v4(),
            "lines": []
        });
        let err: Value = serde_json::from_str(&validate_transfer_draft(&empty.to_string())).unwrap();
        assert_eq!(err["code"], "VALIDATION");
        assert_eq!(err["details"]["field"], "lines");

        let err: Value = serde_json::from_str(&validate_transfer_draft("{not json")).unwrap();
        assert_eq!(err["details"]["field"], "body");
    }

    #[test]
    fn test_preview_partial_receipt() {
        let (transfer, product) = transfer_json("SHIPPED", "10", "0");
        let receipt = json!({ "lines": [{ "productId": product, "qty": "4" }] });

        let out: Value =
            serde_json::from_str(&preview(&transfer.to_string(), &receipt.to_string()).unwrap()).unwrap();
        assert_eq!(out["previousStatus"], "SHIPPED");
        assert_eq!(out["status"], "PARTIALLY_RECEIVED");
        assert_eq!(out["transfer"]["lines"][0]["qtyReceived"], "4");
    }

    #[test]
    fn test_preview_over_receipt() {
        let (transfer, product) = transfer_json("PARTIALLY_RECEIVED", "10", "8");
        let receipt = json!({ "lines": [{ "productId": product, "qty": "3" }] });

        let err = preview(&transfer.to_string(), &receipt.to_string()).unwrap_err();
        assert_eq!(err.code, "INSUFFICIENT_STOCK");
        let details = err.details.unwrap();
        assert_eq!(details["available"], "2");
        assert_eq!(details["requested"], "3");
    }

    #[test]
    fn test_preview_on_received_is_invalid() {
        let (transfer, product) = transfer_json("RECEIVED", "1", "1");
        let receipt = json!({ "lines": [{ "productId": product, "qty": "1" }] });
        let err = preview(&transfer.to_string(), &receipt.to_string()).unwrap_err();
        assert_eq!(err.code, "INVALID_TRANSITION");
    }

    #[test]
    fn test_available_actions() {
        assert_eq!(available_actions("DRAFT"), r#"["ship","cancel"]"#);
        assert_eq!(available_actions("RECEIVED"), "[]");
        assert_eq!(available_actions("BOGUS"), "[]");
        assert!(is_terminal_status("CANCELLED"));
        assert!(!is_terminal_status("SHIPPED"));
    }

    #[test]
    fn test_status_label() {
        assert_eq!(transfer_status_label("PARTIALLY_RECEIVED"), "Partially received");
        assert_eq!(transfer_status_label("???"), "???");
    }

    #[test]
    fn test_group_transfers() {
        let (a, _) = transfer_json("DRAFT", "1", "0");
        let (b, _) = transfer_json("DRAFT", "2", "0");
        let rows: Value =
            serde_json::from_str(&group(&json!([a, b]).to_string()).unwrap()).unwrap();
        assert_eq!(rows.as_array().unwrap().len(), 2);
        assert_eq!(rows[0]["type"], "single");
    }
}
