//! `stockpact-core`: domain foundation building blocks shared by the SCM
//! decision modules.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod clock;
pub mod error;
pub mod event;
pub mod id;

pub use aggregate::{execute, Aggregate, AggregateRoot, ExpectedVersion};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{DomainError, DomainResult};
pub use event::Event;
pub use id::{AggregateId, ProductId, UserId, VendorId, WarehouseId};
