//! Request-for-quotation lifecycle and bid evaluation.
//!
//! Pure domain logic (no IO, no HTTP, no storage). Purchase-order creation
//! on acceptance is delegated to the procurement collaborator by the
//! infrastructure facade.

pub mod evaluation;
pub mod rfq;

pub use evaluation::{
    payment_terms_score, rank_bids, Bid, EvaluationPolicy, PaymentTermScore, ResponseScore,
    RfqWeights, ScoreComponents,
};
pub use rfq::{
    AcceptResponse, AddBid, AddLine, AddResponse, ArchiveRfq, CancelRfq, CreateRfq, EvaluateResponses,
    RemoveLine, ResponseStatus, Rfq, RfqCommand, RfqEvent, RfqId, RfqLine, RfqResponse, RfqResponseId,
    RfqStatus, RfqType, SendRfq, VendorBid,
};
