//! Supplier risk engine: signal derivation, weighted risk score and level.
//!
//! Pure domain logic (no IO, no HTTP, no storage). Persistence of the score
//! history and its ledger entry is done by the infrastructure facade.

pub mod policy;
pub mod risk;
pub mod signals;

pub use policy::{RiskPolicy, RiskThresholds, RiskWeights};
pub use risk::{assess, RiskAssessment, RiskLevel, RiskScore, RiskScoreId, RiskSignals};
pub use signals::{
    derive_signals, Certification, DeliveryRecord, PriceObservation, SupplierHistory, VendorProfile,
    VendorStatus,
};
