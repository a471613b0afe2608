//! Validation utilities for the Retail Ops Platform
//!
//! These checks run in the browser (through the WASM module), in the API
//! client before a request is sent, and again in the backend before any
//! database access.

use std::collections::HashSet;

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::models::{
    CreateStoreInput, CreateTransferInput, CreateTripInput, DisputeTransferInput,
    ReceiveTransferInput,
};

/// A rejected input field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<ValidationErrors> for FieldError {
    fn from(errors: ValidationErrors) -> Self {
        first_field_error(&errors, "")
            .unwrap_or_else(|| FieldError::new("input", "Invalid input"))
    }
}

/// First failing field of a `validator` report, with a dotted/indexed path
fn first_field_error(errors: &ValidationErrors, prefix: &str) -> Option<FieldError> {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (name, kind) in fields {
        let path = if prefix.is_empty() {
            to_camel_case(name)
        } else {
            format!("{}.{}", prefix, to_camel_case(name))
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                if let Some(err) = errs.first() {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' check", err.code));
                    return Some(FieldError::new(path, message));
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                if let Some(found) = first_field_error(inner, &path) {
                    return Some(found);
                }
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    let item_path = format!("{}[{}]", path, index);
                    if let Some(found) = first_field_error(inner, &item_path) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

// ============================================================================
// Stock Transfer Validations
// ============================================================================

/// Decimal places a stored quantity keeps (`NUMERIC(14, 4)`)
pub const QTY_SCALE: u32 = 4;

/// Quantities must stay below 10^10 to fit the quantity columns
pub fn max_qty() -> Decimal {
    Decimal::from(10_000_000_000i64)
}

/// Check that a quantity can be stored exactly. Zero is only accepted when
/// `allow_zero` is set (receipt deltas).
pub fn validate_qty(field: &str, qty: Decimal, allow_zero: bool) -> Result<(), FieldError> {
    if qty < Decimal::ZERO || (qty.is_zero() && !allow_zero) {
        let message = if allow_zero {
            "Received quantity cannot be negative"
        } else {
            "Quantity must be positive"
        };
        return Err(FieldError::new(field, message));
    }
    if qty.normalize().scale() > QTY_SCALE {
        return Err(FieldError::new(
            field,
            format!("Quantity accepts at most {} decimal places", QTY_SCALE),
        ));
    }
    if qty >= max_qty() {
        return Err(FieldError::new(field, "Quantity is too large"));
    }
    Ok(())
}

/// Endpoint and line rules shared by transfer creation and shipping
pub fn validate_transfer_lines<I>(from_id: Uuid, to_id: Uuid, lines: I) -> Result<(), FieldError>
where
    I: IntoIterator<Item = (Uuid, Decimal)>,
{
    if from_id == to_id {
        return Err(FieldError::new(
            "toWarehouseId",
            "Origin and destination must differ",
        ));
    }

    let mut products = HashSet::new();
    for (i, (product_id, qty)) in lines.into_iter().enumerate() {
        validate_qty(&format!("lines[{}].qty", i), qty, false)?;
        if !products.insert(product_id) {
            return Err(FieldError::new(
                format!("lines[{}].productId", i),
                "Product appears on more than one line",
            ));
        }
    }
    if products.is_empty() {
        return Err(FieldError::new("lines", "A transfer needs at least one line"));
    }
    Ok(())
}

/// Validate a transfer creation request
pub fn validate_create_transfer(input: &CreateTransferInput) -> Result<(), FieldError> {
    input.validate()?;
    validate_transfer_lines(
        input.from_warehouse_id,
        input.to_warehouse_id,
        input.lines.iter().map(|l| (l.product_id, l.qty)),
    )
}

/// Validate one receipt entry; `seen` collects the products met so far
pub fn validate_receipt_line(
    index: usize,
    product_id: Uuid,
    qty: Decimal,
    seen: &mut HashSet<Uuid>,
) -> Result<(), FieldError> {
    validate_qty(&format!("lines[{}].qty", index), qty, true)?;
    if !seen.insert(product_id) {
        return Err(FieldError::new(
            format!("lines[{}].productId", index),
            "Product appears more than once in the receipt",
        ));
    }
    Ok(())
}

/// Validate the shape of a receipt (quantities against the transfer are
/// checked by the workflow)
pub fn validate_receive(input: &ReceiveTransferInput) -> Result<(), FieldError> {
    let mut products = HashSet::new();
    for (i, line) in input.lines.iter().enumerate() {
        validate_receipt_line(i, line.product_id, line.qty, &mut products)?;
    }

    let nothing = input.lines.iter().all(|l| l.qty.is_zero());
    if nothing && !input.close {
        return Err(FieldError::new("lines", "Nothing to receive"));
    }
    Ok(())
}

/// Validate a dispute request
pub fn validate_dispute(input: &DisputeTransferInput) -> Result<(), FieldError> {
    input.validate()?;
    if input.reason.trim().is_empty() {
        return Err(FieldError::new("reason", "A dispute needs a reason"));
    }
    Ok(())
}

// ============================================================================
// Directory Validations
// ============================================================================

/// Validate a location code (2-32 chars, uppercase alphanumeric, `-` or `_`)
pub fn validate_location_code(code: &str) -> Result<(), &'static str> {
    if code.len() < 2 {
        return Err("Code must be at least 2 characters");
    }
    if code.len() > 32 {
        return Err("Code must be at most 32 characters");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err("Code must be uppercase alphanumeric, '-' or '_'");
    }
    Ok(())
}

/// Validate a store creation request
pub fn validate_create_store(input: &CreateStoreInput) -> Result<(), FieldError> {
    input.validate()?;
    validate_location_code(&input.code).map_err(|m| FieldError::new("code", m))?;
    if input.name.trim().is_empty() {
        return Err(FieldError::new("name", "Name is required"));
    }
    Ok(())
}

/// Validate a trip creation request
pub fn validate_create_trip(input: &CreateTripInput) -> Result<(), FieldError> {
    input.validate()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateTransferLineInput, ReceiveLineInput, TransferPurpose};

    fn transfer_input(lines: Vec<CreateTransferLineInput>) -> CreateTransferInput {
        CreateTransferInput {
            purpose: Some(TransferPurpose::Rebalance),
            from_warehouse_id: Uuid::new_v4(),
            to_warehouse_id: Uuid::new_v4(),
            note: None,
            via_transit: None,
            lines,
        }
    }

    fn transfer_line(qty: i64) -> CreateTransferLineInput {
        CreateTransferLineInput {
            product_id: Uuid::new_v4(),
            qty: Decimal::from(qty),
            note: None,
        }
    }

    #[test]
    fn test_validate_create_transfer_valid() {
        let input = transfer_input(vec![transfer_line(10), transfer_line(5)]);
        assert!(validate_create_transfer(&input).is_ok());
    }

    #[test]
    fn test_validate_create_transfer_empty_lines() {
        let err = validate_create_transfer(&transfer_input(vec![])).unwrap_err();
        assert_eq!(err.field, "lines");
    }

    #[test]
    fn test_validate_create_transfer_non_positive_qty() {
        let err =
            validate_create_transfer(&transfer_input(vec![transfer_line(3), transfer_line(0)]))
                .unwrap_err();
        assert_eq!(err.field, "lines[1].qty");
    }

    #[test]
    fn test_validate_create_transfer_same_locations() {
        let mut input = transfer_input(vec![transfer_line(1)]);
        input.to_warehouse_id = input.from_warehouse_id;
        let err = validate_create_transfer(&input).unwrap_err();
        assert_eq!(err.field, "toWarehouseId");
    }

    #[test]
    fn test_validate_create_transfer_duplicate_product() {
        let line = transfer_line(2);
        let err =
            validate_create_transfer(&transfer_input(vec![line.clone(), line])).unwrap_err();
        assert_eq!(err.field, "lines[1].productId");
    }

    #[test]
    fn test_validate_create_transfer_long_line_note() {
        let mut line = transfer_line(2);
        line.note = Some("x".repeat(501));
        let err = validate_create_transfer(&transfer_input(vec![line])).unwrap_err();
        assert_eq!(err.field, "lines[0].note");
    }

    #[test]
    fn test_validate_create_transfer_qty_must_fit_column() {
        for qty in ["0.00001", "1.00005", "10000000000"] {
            let mut line = transfer_line(1);
            line.qty = qty.parse().unwrap();
            let err = validate_create_transfer(&transfer_input(vec![line])).unwrap_err();
            assert_eq!(err.field, "lines[0].qty", "qty {}", qty);
        }

        let mut line = transfer_line(1);
        line.qty = "9999999999.9999".parse().unwrap();
        assert!(validate_create_transfer(&transfer_input(vec![line])).is_ok());

        // Trailing zeros do not count as precision
        let mut line = transfer_line(1);
        line.qty = "2.50000".parse().unwrap();
        assert!(validate_create_transfer(&transfer_input(vec![line])).is_ok());
    }

    #[test]
    fn test_validate_receive_rejects_extra_decimals() {
        let input = ReceiveTransferInput {
            lines: vec![ReceiveLineInput {
                product_id: Uuid::new_v4(),
                qty: "0.99999".parse().unwrap(),
            }],
            close: false,
        };
        let err = validate_receive(&input).unwrap_err();
        assert_eq!(err.field, "lines[0].qty");
        assert!(err.message.contains("decimal places"));
    }

    #[test]
    fn test_validate_receive() {
        let product_id = Uuid::new_v4();
        let ok = ReceiveTransferInput {
            lines: vec![ReceiveLineInput {
                product_id,
                qty: Decimal::from(3),
            }],
            close: false,
        };
        assert!(validate_receive(&ok).is_ok());

        let empty = ReceiveTransferInput::default();
        assert!(validate_receive(&empty).is_err());

        let close_only = ReceiveTransferInput {
            lines: vec![],
            close: true,
        };
        assert!(validate_receive(&close_only).is_ok());

        let negative = ReceiveTransferInput {
            lines: vec![ReceiveLineInput {
                product_id,
                qty: Decimal::from(-1),
            }],
            close: false,
        };
        assert_eq!(validate_receive(&negative).unwrap_err().field, "lines[0].qty");
    }

    #[test]
    fn test_validate_location_code() {
        assert!(validate_location_code("WH-A").is_ok());
        assert!(validate_location_code("STORE_12").is_ok());
        assert!(validate_location_code("A").is_err());
        assert!(validate_location_code("wh-a").is_err());
        assert!(validate_location_code(&"A".repeat(33)).is_err());
    }

    #[test]
    fn test_validate_create_store() {
        let input = CreateStoreInput {
            code: "MAG-01".to_string(),
            name: "Magasin centre".to_string(),
            address: Some("12 rue du Port".to_string()),
            is_active: true,
        };
        assert!(validate_create_store(&input).is_ok());

        let blank = CreateStoreInput {
            name: "   ".to_string(),
            ..input.clone()
        };
        assert_eq!(validate_create_store(&blank).unwrap_err().field, "name");

        let bad_code = CreateStoreInput {
            code: "mag 01".to_string(),
            ..input
        };
        assert_eq!(validate_create_store(&bad_code).unwrap_err().field, "code");
    }

    #[test]
    fn test_validate_dispute() {
        let ok = DisputeTransferInput {
            reason: "Missing pallet".to_string(),
        };
        assert!(validate_dispute(&ok).is_ok());
        let blank = DisputeTransferInput {
            reason: "  ".to_string(),
        };
        assert!(validate_dispute(&blank).is_err());
    }
}
