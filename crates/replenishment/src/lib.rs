//! Replenishment engine: reorder-point scan, EOQ sizing, and the persisted
//! replenishment request lifecycle.
//!
//! Pure domain logic (no IO, no HTTP, no storage).

pub mod eoq;
pub mod request;
pub mod scan;

pub use eoq::{EoqDetails, EoqInputs, HoldingCost};
pub use request::{
    ApproveRequest, CreateRequest, MarkConverted, RejectRequest, ReplenishmentCommand,
    ReplenishmentEvent, ReplenishmentRequest, ReplenishmentRequestId, RequestStatus,
};
pub use scan::{
    evaluate, needs_replenishment, suggested_quantity, ReplenishmentAlert, ReplenishmentCandidate,
    StockBasis,
};
