//! Stock transfer workflow tests
//!
//! Tests for the transfer lifecycle including:
//! - Ship then full receipt always lands in RECEIVED
//! - Partial receipts and the worked two-product scenario
//! - Over-receipt rejection leaves quantities untouched
//! - Cancel and dispute rules

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::{
    cancel, dispute, receive, ship, ReceiveLineInput, ReceiveTransferInput, StockTransfer,
    StockTransferLine, TransferStatus, WarehouseKind, WarehouseRef, WorkflowError,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn warehouse(code: &str, kind: WarehouseKind) -> WarehouseRef {
    WarehouseRef {
        id: Uuid::new_v4(),
        code: code.to_string(),
        name: code.to_string(),
        kind,
        is_system: false,
    }
}

fn draft(quantities: &[Decimal]) -> StockTransfer {
    let now = Utc::now();
    StockTransfer {
        id: Uuid::new_v4(),
        status: TransferStatus::Draft,
        purpose: None,
        from_warehouse: warehouse("WH-A", WarehouseKind::Depot),
        to_warehouse: warehouse("WH-B", WarehouseKind::Store),
        journey_id: None,
        note: None,
        dispute_reason: None,
        shipped_at: None,
        received_at: None,
        created_at: now,
        updated_at: now,
        lines: quantities
            .iter()
            .map(|qty| StockTransferLine {
                id: Uuid::new_v4(),
                product_id: Uuid::new_v4(),
                qty: *qty,
                qty_received: Decimal::ZERO,
                note: None,
            })
            .collect(),
    }
}

fn receipt(entries: &[(Uuid, Decimal)]) -> ReceiveTransferInput {
    ReceiveTransferInput {
        lines: entries
            .iter()
            .map(|(product_id, qty)| ReceiveLineInput {
                product_id: *product_id,
                qty: *qty,
            })
            .collect(),
        close: false,
    }
}

fn full_receipt(transfer: &StockTransfer) -> ReceiveTransferInput {
    let entries: Vec<(Uuid, Decimal)> = transfer
        .lines
        .iter()
        .map(|l| (l.product_id, l.remaining()))
        .collect();
    receipt(&entries)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// P1 x10 and P2 x5 from a depot to a store, received in two goes
    #[test]
    fn test_two_product_scenario() {
        let mut transfer = draft(&[dec("10"), dec("5")]);
        let p1 = transfer.lines[0].product_id;
        let p2 = transfer.lines[1].product_id;

        ship(&mut transfer, Utc::now()).unwrap();
        assert_eq!(transfer.status, TransferStatus::Shipped);
        assert!(transfer.shipped_at.is_some());

        let outcome = receive(&mut transfer, &receipt(&[(p1, dec("10")), (p2, dec("2"))]), Utc::now()).unwrap();
        assert_eq!(outcome.status, TransferStatus::PartiallyReceived);
        assert_eq!(transfer.status, TransferStatus::PartiallyReceived);
        assert_eq!(transfer.lines[0].qty_received, dec("10"));
        assert_eq!(transfer.lines[1].qty_received, dec("2"));
        assert!(transfer.received_at.is_none());

        let outcome = receive(&mut transfer, &receipt(&[(p2, dec("3"))]), Utc::now()).unwrap();
        assert_eq!(outcome.previous_status, TransferStatus::PartiallyReceived);
        assert_eq!(transfer.status, TransferStatus::Received);
        assert_eq!(transfer.lines[0].qty_received, dec("10"));
        assert_eq!(transfer.lines[1].qty_received, dec("5"));
        assert!(transfer.received_at.is_some());
        assert!(outcome.short_lines.is_empty());
    }

    #[test]
    fn test_partial_receipt_of_single_line() {
        let mut transfer = draft(&[dec("10"), dec("4")]);
        let p1 = transfer.lines[0].product_id;
        ship(&mut transfer, Utc::now()).unwrap();

        receive(&mut transfer, &receipt(&[(p1, dec("3"))]), Utc::now()).unwrap();
        assert_eq!(transfer.lines[0].qty_received, dec("3"));
        assert_eq!(transfer.status, TransferStatus::PartiallyReceived);
    }

    #[test]
    fn test_over_receipt_is_rejected_without_changes() {
        let mut transfer = draft(&[dec("10"), dec("5")]);
        let p1 = transfer.lines[0].product_id;
        let p2 = transfer.lines[1].product_id;
        ship(&mut transfer, Utc::now()).unwrap();
        receive(&mut transfer, &receipt(&[(p2, dec("4"))]), Utc::now()).unwrap();

        let before = transfer.clone();
        // First entry is fine, second exceeds what is left; nothing may apply
        let err = receive(&mut transfer, &receipt(&[(p1, dec("1")), (p2, dec("2"))]), Utc::now())
            .unwrap_err();

        match err {
            WorkflowError::InsufficientQuantity {
                product_id,
                available,
                requested,
            } => {
                assert_eq!(product_id, p2);
                assert_eq!(available, dec("1"));
                assert_eq!(requested, dec("2"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(transfer, before);
    }

    #[test]
    fn test_unknown_product_in_receipt() {
        let mut transfer = draft(&[dec("1")]);
        ship(&mut transfer, Utc::now()).unwrap();

        let err = receive(&mut transfer, &receipt(&[(Uuid::new_v4(), dec("1"))]), Utc::now())
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
        assert_eq!(transfer.status, TransferStatus::Shipped);
    }

    #[test]
    fn test_cancel_rules() {
        let mut drafted = draft(&[dec("2")]);
        assert!(cancel(&mut drafted, Utc::now()).unwrap().is_empty());
        assert_eq!(drafted.status, TransferStatus::Cancelled);

        let mut shipped = draft(&[dec("2")]);
        ship(&mut shipped, Utc::now()).unwrap();
        let returned = cancel(&mut shipped, Utc::now()).unwrap();
        assert_eq!(returned.len(), 1);
        assert_eq!(returned[0].qty, dec("2"));

        let mut partial = draft(&[dec("5")]);
        let p = partial.lines[0].product_id;
        ship(&mut partial, Utc::now()).unwrap();
        receive(&mut partial, &receipt(&[(p, dec("3"))]), Utc::now()).unwrap();
        let returned = cancel(&mut partial, Utc::now()).unwrap();
        assert_eq!(returned[0].qty, dec("2"));
        assert_eq!(partial.status, TransferStatus::Cancelled);

        let mut received = draft(&[dec("1")]);
        ship(&mut received, Utc::now()).unwrap();
        let full = full_receipt(&received);
        receive(&mut received, &full, Utc::now()).unwrap();
        let err = cancel(&mut received, Utc::now()).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
        assert_eq!(received.status, TransferStatus::Received);
    }

    #[test]
    fn test_dispute_after_partial_receipt() {
        let mut transfer = draft(&[dec("5")]);
        let p = transfer.lines[0].product_id;
        ship(&mut transfer, Utc::now()).unwrap();
        receive(&mut transfer, &receipt(&[(p, dec("2"))]), Utc::now()).unwrap();

        dispute(&mut transfer, "  three cartons crushed ", Utc::now()).unwrap();
        assert_eq!(transfer.status, TransferStatus::Disputed);
        assert_eq!(transfer.dispute_reason.as_deref(), Some("three cartons crushed"));

        let err = receive(&mut transfer, &receipt(&[(p, dec("1"))]), Utc::now()).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }

    #[test]
    fn test_dispute_on_draft_is_invalid() {
        let mut transfer = draft(&[dec("5")]);
        let err = dispute(&mut transfer, "wrong", Utc::now()).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }

    #[test]
    fn test_close_short_without_lines() {
        let mut transfer = draft(&[dec("3")]);
        ship(&mut transfer, Utc::now()).unwrap();
        let close = ReceiveTransferInput {
            lines: vec![],
            close: true,
        };
        let outcome = receive(&mut transfer, &close, Utc::now()).unwrap();
        assert_eq!(outcome.status, TransferStatus::Received);
        assert_eq!(outcome.short_lines.len(), 1);
        assert_eq!(outcome.short_lines[0].missing, dec("3"));
        assert!(transfer.received_at.is_some());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Positive quantities with up to two decimal places
    fn qty_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..100_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Ship then receive everything: RECEIVED with every line complete
        #[test]
        fn prop_ship_then_full_receipt(quantities in prop::collection::vec(qty_strategy(), 1..8)) {
            let mut transfer = draft(&quantities);
            ship(&mut transfer, Utc::now()).unwrap();

            let full = full_receipt(&transfer);
            let outcome = receive(&mut transfer, &full, Utc::now()).unwrap();

            prop_assert_eq!(outcome.status, TransferStatus::Received);
            prop_assert!(transfer.received_at.is_some());
            for line in &transfer.lines {
                prop_assert_eq!(line.qty_received, line.qty);
            }
        }

        /// A receipt reaches RECEIVED only when every line is complete
        #[test]
        fn prop_partial_receipt_status(
            quantities in prop::collection::vec(qty_strategy(), 2..6),
            fraction in 0u32..100,
        ) {
            let mut transfer = draft(&quantities);
            ship(&mut transfer, Utc::now()).unwrap();

            // Take a share of the first line only
            let first = &transfer.lines[0];
            let delta = (first.qty * Decimal::from(fraction) / Decimal::from(100)).round_dp(2);
            prop_assume!(delta > Decimal::ZERO);
            let product = first.product_id;

            receive(&mut transfer, &receipt(&[(product, delta)]), Utc::now()).unwrap();

            prop_assert_eq!(transfer.lines[0].qty_received, delta);
            prop_assert_eq!(transfer.status, TransferStatus::PartiallyReceived);
            prop_assert!(transfer.received_at.is_none());
        }

        /// Over-receipt never changes any line
        #[test]
        fn prop_over_receipt_is_atomic(
            quantities in prop::collection::vec(qty_strategy(), 1..6),
            excess in qty_strategy(),
        ) {
            let mut transfer = draft(&quantities);
            ship(&mut transfer, Utc::now()).unwrap();
            let before = transfer.clone();

            let mut entries: Vec<(Uuid, Decimal)> =
                transfer.lines.iter().map(|l| (l.product_id, l.qty)).collect();
            let last = entries.len() - 1;
            entries[last].1 += excess;

            let result = receive(&mut transfer, &receipt(&entries), Utc::now());
            let is_insufficient = matches!(result, Err(WorkflowError::InsufficientQuantity { .. }));
            prop_assert!(is_insufficient);
            prop_assert_eq!(transfer, before);
        }

        /// Terminal statuses reject every further action
        #[test]
        fn prop_cancelled_rejects_everything(quantities in prop::collection::vec(qty_strategy(), 1..4)) {
            let mut transfer = draft(&quantities);
            cancel(&mut transfer, Utc::now()).unwrap();

            prop_assert!(ship(&mut transfer, Utc::now()).is_err());
            prop_assert!(cancel(&mut transfer, Utc::now()).is_err());
            prop_assert!(dispute(&mut transfer, "late", Utc::now()).is_err());
            let full = full_receipt(&transfer);
            prop_assert!(receive(&mut transfer, &full, Utc::now()).is_err());
            prop_assert_eq!(transfer.status, TransferStatus::Cancelled);
        }
    }
}
