//! Stock transfer state machine
//!
//! Every function here takes the current persisted transfer plus an event
//! payload and either mutates the transfer into its next state or rejects the
//! call without touching it. Persistence and stock bookkeeping belong to the
//! caller.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    ReceiveTransferInput, StockTransfer, StockTransferLine, TransferStatus, WarehouseRef,
};
use crate::validation::{validate_receipt_line, validate_transfer_lines, FieldError};

/// Operator-facing actions on a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferAction {
    Ship,
    Receive,
    Cancel,
    Dispute,
}

impl TransferAction {
    pub const ALL: [TransferAction; 4] = [
        TransferAction::Ship,
        TransferAction::Receive,
        TransferAction::Cancel,
        TransferAction::Dispute,
    ];
}

impl std::fmt::Display for TransferAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferAction::Ship => write!(f, "ship"),
            TransferAction::Receive => write!(f, "receive"),
            TransferAction::Cancel => write!(f, "cancel"),
            TransferAction::Dispute => write!(f, "dispute"),
        }
    }
}

/// Event fed to the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEvent {
    Ship,
    /// `complete` is true once every line is received or the receipt is closed short
    Receive { complete: bool },
    Cancel,
    Dispute,
}

impl TransferEvent {
    pub fn action(&self) -> TransferAction {
        match self {
            TransferEvent::Ship => TransferAction::Ship,
            TransferEvent::Receive { .. } => TransferAction::Receive,
            TransferEvent::Cancel => TransferAction::Cancel,
            TransferEvent::Dispute => TransferAction::Dispute,
        }
    }
}

impl TransferStatus {
    /// Transition table. `None` means the event is not legal from this status.
    pub fn transition(self, event: TransferEvent) -> Option<TransferStatus> {
        use TransferEvent as E;
        use TransferStatus as S;

        match (self, event) {
            (S::Draft, E::Ship) => Some(S::Shipped),
            (S::Draft, E::Receive { .. } | E::Dispute) => None,
            (S::Draft | S::Shipped | S::PartiallyReceived, E::Cancel) => Some(S::Cancelled),
            (S::Shipped | S::PartiallyReceived, E::Ship) => None,
            (S::Shipped | S::PartiallyReceived, E::Receive { complete: true }) => Some(S::Received),
            (S::Shipped | S::PartiallyReceived, E::Receive { complete: false }) => {
                Some(S::PartiallyReceived)
            }
            (S::Shipped | S::PartiallyReceived, E::Dispute) => Some(S::Disputed),
            (S::Received | S::Cancelled | S::Disputed, _) => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransferStatus::Received | TransferStatus::Cancelled | TransferStatus::Disputed
        )
    }

    pub fn allows(self, action: TransferAction) -> bool {
        match action {
            TransferAction::Ship => self.transition(TransferEvent::Ship).is_some(),
            TransferAction::Receive => {
                self.transition(TransferEvent::Receive { complete: false }).is_some()
                    || self.transition(TransferEvent::Receive { complete: true }).is_some()
            }
            TransferAction::Cancel => self.transition(TransferEvent::Cancel).is_some(),
            TransferAction::Dispute => self.transition(TransferEvent::Dispute).is_some(),
        }
    }

    /// Actions a UI may offer for a transfer in this status
    pub fn available_actions(self) -> Vec<TransferAction> {
        TransferAction::ALL
            .into_iter()
            .filter(|a| self.allows(*a))
            .collect()
    }
}

/// Workflow rejections
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    #[error("Validation error: {0}")]
    Validation(#[from] FieldError),

    #[error("Cannot {action} a transfer in status {from}")]
    InvalidTransition {
        from: TransferStatus,
        action: TransferAction,
    },

    #[error("Journey {journey_id} leg is not ready: {reason}")]
    LegNotReady { journey_id: Uuid, reason: String },

    #[error("Insufficient quantity for product {product_id}: available {available}, requested {requested}")]
    InsufficientQuantity {
        product_id: Uuid,
        available: Decimal,
        requested: Decimal,
    },
}

impl WorkflowError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        WorkflowError::Validation(FieldError::new(field, message))
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Quantity credited to one line by a receipt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedReceipt {
    pub line_id: Uuid,
    pub product_id: Uuid,
    pub qty: Decimal,
    pub qty_received: Decimal,
}

/// Result of a successful receive
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveOutcome {
    pub previous_status: TransferStatus,
    pub status: TransferStatus,
    /// Non-zero deltas, in line order
    pub applied: Vec<AppliedReceipt>,
    /// Lines accepted below their requested quantity when closing short
    pub short_lines: Vec<ShortLine>,
}

/// A line closed below its requested quantity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortLine {
    pub product_id: Uuid,
    pub missing: Decimal,
}

/// Stock that goes back to the origin when a shipped transfer is cancelled
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnedStock {
    pub product_id: Uuid,
    pub qty: Decimal,
}

fn next_status(transfer: &StockTransfer, event: TransferEvent) -> WorkflowResult<TransferStatus> {
    transfer
        .status
        .transition(event)
        .ok_or(WorkflowError::InvalidTransition {
            from: transfer.status,
            action: event.action(),
        })
}

fn ensure_allowed(transfer: &StockTransfer, action: TransferAction) -> WorkflowResult<()> {
    if transfer.status.allows(action) {
        Ok(())
    } else {
        Err(WorkflowError::InvalidTransition {
            from: transfer.status,
            action,
        })
    }
}

/// Shape checks a transfer must pass before it can leave DRAFT
pub fn validate_transfer_shape(
    from: &WarehouseRef,
    to: &WarehouseRef,
    lines: &[StockTransferLine],
) -> WorkflowResult<()> {
    validate_transfer_lines(from.id, to.id, lines.iter().map(|l| (l.product_id, l.qty)))?;
    Ok(())
}

/// DRAFT -> SHIPPED
pub fn ship(transfer: &mut StockTransfer, at: DateTime<Utc>) -> WorkflowResult<()> {
    let status = next_status(transfer, TransferEvent::Ship)?;
    validate_transfer_shape(&transfer.from_warehouse, &transfer.to_warehouse, &transfer.lines)?;

    transfer.status = status;
    if transfer.shipped_at.is_none() {
        transfer.shipped_at = Some(at);
    }
    transfer.updated_at = at;
    Ok(())
}

/// Credit received quantities, moving to PARTIALLY_RECEIVED or RECEIVED.
///
/// The whole receipt is checked before any line changes, so a rejected call
/// leaves every `qty_received` untouched.
pub fn receive(
    transfer: &mut StockTransfer,
    input: &ReceiveTransferInput,
    at: DateTime<Utc>,
) -> WorkflowResult<ReceiveOutcome> {
    ensure_allowed(transfer, TransferAction::Receive)?;

    let mut seen = HashSet::new();
    let mut deltas: Vec<(usize, Decimal)> = Vec::with_capacity(input.lines.len());
    for (i, entry) in input.lines.iter().enumerate() {
        validate_receipt_line(i, entry.product_id, entry.qty, &mut seen)?;
        let idx = transfer
            .lines
            .iter()
            .position(|l| l.product_id == entry.product_id)
            .ok_or_else(|| {
                WorkflowError::validation(
                    format!("lines[{}].productId", i),
                    "Product is not part of this transfer",
                )
            })?;

        let remaining = transfer.lines[idx].remaining();
        if entry.qty > remaining {
            return Err(WorkflowError::InsufficientQuantity {
                product_id: entry.product_id,
                available: remaining,
                requested: entry.qty,
            });
        }
        if !entry.qty.is_zero() {
            deltas.push((idx, entry.qty));
        }
    }

    if deltas.is_empty() && !input.close {
        return Err(WorkflowError::validation(
            "lines",
            "Nothing to receive",
        ));
    }

    let previous_status = transfer.status;
    let mut applied = Vec::with_capacity(deltas.len());
    deltas.sort_by_key(|(idx, _)| *idx);
    for (idx, qty) in deltas {
        let line = &mut transfer.lines[idx];
        line.qty_received += qty;
        applied.push(AppliedReceipt {
            line_id: line.id,
            product_id: line.product_id,
            qty,
            qty_received: line.qty_received,
        });
    }

    let complete = transfer.is_fully_received() || input.close;
    let status = next_status(transfer, TransferEvent::Receive { complete })?;

    let short_lines = if status == TransferStatus::Received {
        transfer
            .lines
            .iter()
            .filter(|l| !l.is_complete())
            .map(|l| ShortLine {
                product_id: l.product_id,
                missing: l.remaining(),
            })
            .collect()
    } else {
        Vec::new()
    };

    transfer.status = status;
    if status == TransferStatus::Received && transfer.received_at.is_none() {
        transfer.received_at = Some(at);
    }
    transfer.updated_at = at;

    Ok(ReceiveOutcome {
        previous_status,
        status,
        applied,
        short_lines,
    })
}

/// Any non-terminal status -> CANCELLED.
///
/// Returns the quantities still on the road, which go back to the origin.
pub fn cancel(transfer: &mut StockTransfer, at: DateTime<Utc>) -> WorkflowResult<Vec<ReturnedStock>> {
    let status = next_status(transfer, TransferEvent::Cancel)?;

    let returned = match transfer.status {
        TransferStatus::Shipped | TransferStatus::PartiallyReceived => transfer
            .lines
            .iter()
            .filter(|l| l.remaining() > Decimal::ZERO)
            .map(|l| ReturnedStock {
                product_id: l.product_id,
                qty: l.remaining(),
            })
            .collect(),
        _ => Vec::new(),
    };

    transfer.status = status;
    transfer.updated_at = at;
    Ok(returned)
}

/// SHIPPED / PARTIALLY_RECEIVED -> DISPUTED
pub fn dispute(transfer: &mut StockTransfer, reason: &str, at: DateTime<Utc>) -> WorkflowResult<()> {
    let status = next_status(transfer, TransferEvent::Dispute)?;
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(WorkflowError::validation(
            "reason",
            "A dispute needs a reason",
        ));
    }

    transfer.status = status;
    transfer.dispute_reason = Some(reason.to_string());
    transfer.updated_at = at;
    Ok(())
}
