//! Inventory-side SCM logic: available-to-promise, stock reservations,
//! received lots and shipment tracking.
//!
//! Pure domain logic (no IO, no HTTP, no storage). Stock positions and
//! incoming purchase-order lines are read-only inputs supplied by the
//! inventory and procurement collaborators.

pub mod atp;
pub mod lot;
pub mod reservation;
pub mod shipment;
pub mod stock;

pub use atp::{calculate_atp, AtpBreakdown, AtpQuery, AtpResult, IncomingContribution};
pub use lot::{InventoryLot, LotCommand, LotEvent, LotId, ReceiveLot};
pub use reservation::{
    ConsumeReservation, ReleaseReservation, ReservationCommand, ReservationEvent, ReservationId,
    ReservationStatus, ReserveStock, StockReservation,
};
pub use shipment::{
    AddShipmentLine, CreateShipment, Shipment, ShipmentCommand, ShipmentEvent, ShipmentId,
    ShipmentKind, ShipmentLine, ShipmentStatus, TrackingEvent, UpdateShipmentStatus,
};
pub use stock::{IncomingLineStatus, IncomingOrderLine, StockPosition};
