//! Journeys: two-leg movements chained through the TRANSIT warehouse
//!
//! A journey is not an entity of its own. Its legs are ordinary transfers that
//! share a `journey_id`; everything here either plans those legs or rebuilds
//! the logical movement from them on the read side.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{StockTransfer, TransferPurpose, TransferStatus, WarehouseRef};
use crate::workflow::{WorkflowError, WorkflowResult};

/// Endpoints of one transfer to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegPlan {
    pub from: WarehouseRef,
    pub to: WarehouseRef,
}

/// How a requested movement is turned into transfers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePlan {
    Direct(LegPlan),
    ViaTransit {
        journey_id: Uuid,
        first: LegPlan,
        second: LegPlan,
    },
}

impl RoutePlan {
    pub fn journey_id(&self) -> Option<Uuid> {
        match self {
            RoutePlan::Direct(_) => None,
            RoutePlan::ViaTransit { journey_id, .. } => Some(*journey_id),
        }
    }

    /// Legs in creation order
    pub fn legs(&self) -> Vec<&LegPlan> {
        match self {
            RoutePlan::Direct(leg) => vec![leg],
            RoutePlan::ViaTransit { first, second, .. } => vec![first, second],
        }
    }
}

/// Whether a movement goes through TRANSIT; an explicit flag wins over the purpose
pub fn needs_transit(purpose: Option<TransferPurpose>, via_transit: Option<bool>) -> bool {
    via_transit.unwrap_or_else(|| purpose.map_or(false, |p| p.requires_transit()))
}

/// Plan the transfers for an operator request.
///
/// Operators never address a system warehouse directly; TRANSIT only appears
/// as the hop between the two legs of a journey.
pub fn plan_route(
    purpose: Option<TransferPurpose>,
    via_transit: Option<bool>,
    from: WarehouseRef,
    to: WarehouseRef,
    transit: Option<WarehouseRef>,
    journey_id: Uuid,
) -> WorkflowResult<RoutePlan> {
    if from.id == to.id {
        return Err(WorkflowError::validation(
            "toWarehouseId",
            "Origin and destination must differ",
        ));
    }
    if from.is_system {
        return Err(WorkflowError::validation(
            "fromWarehouseId",
            "System warehouses cannot be used as origin",
        ));
    }
    if to.is_system {
        return Err(WorkflowError::validation(
            "toWarehouseId",
            "System warehouses cannot be used as destination",
        ));
    }

    if !needs_transit(purpose, via_transit) {
        return Ok(RoutePlan::Direct(LegPlan { from, to }));
    }

    let transit = match transit {
        Some(t) if t.is_transit() => t,
        _ => {
            return Err(WorkflowError::validation(
                "viaTransit",
                "TRANSIT warehouse is not configured",
            ))
        }
    };

    Ok(RoutePlan::ViaTransit {
        journey_id,
        first: LegPlan {
            from,
            to: transit.clone(),
        },
        second: LegPlan { from: transit, to },
    })
}

/// A second leg may only ship once the first leg has landed at TRANSIT, and
/// never more of a product than the first leg actually delivered there.
///
/// `siblings` are the other transfers sharing the leg's journey id.
pub fn ensure_leg_can_ship(leg: &StockTransfer, siblings: &[StockTransfer]) -> WorkflowResult<()> {
    let journey_id = match leg.journey_id {
        Some(id) if leg.is_second_leg() => id,
        _ => return Ok(()),
    };

    let first = siblings
        .iter()
        .find(|t| t.id != leg.id && t.journey_id == Some(journey_id) && t.is_first_leg());

    match first {
        None => Err(WorkflowError::LegNotReady {
            journey_id,
            reason: "first leg is missing".to_string(),
        }),
        Some(first) if first.status != TransferStatus::Received => Err(WorkflowError::LegNotReady {
            journey_id,
            reason: format!("first leg is {}, not received", first.status.as_str()),
        }),
        Some(first) => {
            for line in &leg.lines {
                let landed = first
                    .line_for_product(line.product_id)
                    .map_or(Decimal::ZERO, |l| l.qty_received);
                if line.qty > landed {
                    return Err(WorkflowError::InsufficientQuantity {
                        product_id: line.product_id,
                        available: landed,
                        requested: line.qty,
                    });
                }
            }
            Ok(())
        }
    }
}

/// Read-side view of one journey
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyView {
    pub journey_id: Uuid,
    /// Origin of the first leg, when that leg exists
    pub origin: Option<WarehouseRef>,
    /// Final destination of the second leg; never TRANSIT
    pub destination: Option<WarehouseRef>,
    pub status: TransferStatus,
    /// True when a leg is missing
    pub incomplete: bool,
    pub legs: Vec<StockTransfer>,
}

/// Rebuild a journey from whatever legs exist
pub fn build_journey(journey_id: Uuid, mut legs: Vec<StockTransfer>) -> JourneyView {
    legs.sort_by_key(|t| (leg_rank(t), t.created_at));

    let first = legs.iter().find(|t| t.is_first_leg());
    let second = legs.iter().find(|t| t.is_second_leg());

    let origin = first.map(|t| t.from_warehouse.clone());
    let destination = second.map(|t| t.to_warehouse.clone());
    let status = journey_status(first, second);
    let incomplete = first.is_none() || second.is_none();

    JourneyView {
        journey_id,
        origin,
        destination,
        status,
        incomplete,
        legs,
    }
}

fn leg_rank(t: &StockTransfer) -> u8 {
    if t.is_first_leg() {
        0
    } else if t.is_second_leg() {
        1
    } else {
        2
    }
}

/// Status of the movement as a whole.
///
/// Goods waiting at TRANSIT for the second leg to leave are still on their
/// way, so a received first leg with a draft or missing second leg reads as
/// SHIPPED.
fn journey_status(first: Option<&StockTransfer>, second: Option<&StockTransfer>) -> TransferStatus {
    let legs = [first, second];
    for terminal in [TransferStatus::Cancelled, TransferStatus::Disputed] {
        if legs.iter().flatten().any(|t| t.status == terminal) {
            return terminal;
        }
    }

    match (first, second) {
        (Some(f), _) if f.status != TransferStatus::Received => f.status,
        (Some(_), Some(s)) if s.status == TransferStatus::Draft => TransferStatus::Shipped,
        (_, Some(s)) => s.status,
        (Some(_), None) => TransferStatus::Shipped,
        (None, None) => TransferStatus::Draft,
    }
}

/// A row of the grouped transfer list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TransferGroup {
    Single { transfer: StockTransfer },
    Journey { journey: JourneyView },
}

/// Group same-journey transfers for display, keeping first-appearance order
pub fn group_by_journey(transfers: Vec<StockTransfer>) -> Vec<TransferGroup> {
    enum Slot {
        Single(StockTransfer),
        Journey(Uuid),
    }

    let mut slots = Vec::new();
    let mut journeys: HashMap<Uuid, Vec<StockTransfer>> = HashMap::new();

    for transfer in transfers {
        match transfer.journey_id {
            Some(journey_id) => {
                let legs = journeys.entry(journey_id).or_default();
                if legs.is_empty() {
                    slots.push(Slot::Journey(journey_id));
                }
                legs.push(transfer);
            }
            None => slots.push(Slot::Single(transfer)),
        }
    }

    slots
        .into_iter()
        .map(|slot| match slot {
            Slot::Single(transfer) => TransferGroup::Single { transfer },
            Slot::Journey(journey_id) => {
                let legs = journeys.remove(&journey_id).unwrap_or_default();
                TransferGroup::Journey {
                    journey: build_journey(journey_id, legs),
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{WarehouseKind, TRANSIT_CODE};

    fn wh(code: &str, kind: WarehouseKind) -> WarehouseRef {
        WarehouseRef {
            id: Uuid::new_v4(),
            code: code.to_string(),
            name: code.to_string(),
            kind,
            is_system: false,
        }
    }

    fn transit() -> WarehouseRef {
        WarehouseRef {
            is_system: true,
            ..wh(TRANSIT_CODE, WarehouseKind::Depot)
        }
    }

    #[test]
    fn test_needs_transit() {
        assert!(needs_transit(Some(TransferPurpose::StoreReplenish), None));
        assert!(needs_transit(Some(TransferPurpose::InternalDelivery), None));
        assert!(!needs_transit(Some(TransferPurpose::Rebalance), None));
        assert!(!needs_transit(None, None));
        assert!(needs_transit(Some(TransferPurpose::Other), Some(true)));
        assert!(!needs_transit(Some(TransferPurpose::StoreReplenish), Some(false)));
    }

    #[test]
    fn test_plan_direct() {
        let from = wh("WH-A", WarehouseKind::Depot);
        let to = wh("WH-B", WarehouseKind::Store);
        let plan = plan_route(
            Some(TransferPurpose::Rebalance),
            None,
            from.clone(),
            to.clone(),
            Some(transit()),
            Uuid::new_v4(),
        )
        .unwrap();
        assert_eq!(plan, RoutePlan::Direct(LegPlan { from, to }));
        assert_eq!(plan.journey_id(), None);
    }

    #[test]
    fn test_plan_rejects_system_endpoints() {
        let t = transit();
        let err = plan_route(
            None,
            None,
            t,
            wh("WH-B", WarehouseKind::Store),
            None,
            Uuid::new_v4(),
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(ref f) if f.field == "fromWarehouseId"));
    }

    #[test]
    fn test_plan_without_transit_configured() {
        let err = plan_route(
            Some(TransferPurpose::StoreReplenish),
            None,
            wh("WH-A", WarehouseKind::Depot),
            wh("WH-B", WarehouseKind::Store),
            None,
            Uuid::new_v4(),
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
    }
}
