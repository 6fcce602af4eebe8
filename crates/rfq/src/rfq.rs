//! RFQ aggregate.
//!
//! Status flow: `draft -> sent -> responses_received -> evaluated -> closed`,
//! with `cancelled` reachable from any non-terminal state. Responses move
//! `submitted -> evaluated -> accepted | rejected`.
//!
//! A submitted response may carry per-line bids; those price the purchase
//! order lines when the response is accepted.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockpact_core::{
    aggregate_id, Aggregate, AggregateRoot, DomainError, DomainResult, Event, ProductId, VendorId,
};

use crate::evaluation::{rank_bids, Bid, EvaluationPolicy, ResponseScore};

aggregate_id!(
    /// RFQ identifier.
    RfqId
);

aggregate_id!(
    /// Vendor response identifier (unique across RFQs).
    RfqResponseId
);

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RfqType {
    #[default]
    Standard,
    Emergency,
    Framework,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RfqStatus {
    Draft,
    Sent,
    ResponsesReceived,
    Evaluated,
    Closed,
    Cancelled,
}

impl RfqStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RfqStatus::Draft => "draft",
            RfqStatus::Sent => "sent",
            RfqStatus::ResponsesReceived => "responses_received",
            RfqStatus::Evaluated => "evaluated",
            RfqStatus::Closed => "closed",
            RfqStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RfqStatus::Closed | RfqStatus::Cancelled)
    }

    /// Still collecting or weighing bids.
    pub fn is_open(&self) -> bool {
        matches!(self, RfqStatus::Draft | RfqStatus::Sent | RfqStatus::ResponsesReceived)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Submitted,
    Evaluated,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfqLine {
    pub line_no: u32,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: i64,
    pub unit_of_measure: String,
    /// Minor currency units.
    pub estimated_unit_price: Option<i64>,
    pub specifications: Option<String>,
}

/// A vendor's price for one RFQ line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorBid {
    pub line_no: u32,
    /// Minor currency units.
    pub unit_price: i64,
    /// `unit_price * quantity` of the line.
    pub line_total: i64,
    pub lead_time_days: Option<u32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfqResponse {
    pub id: RfqResponseId,
    pub vendor_id: VendorId,
    /// Minor currency units.
    pub total_quoted_value: i64,
    pub delivery_days: u32,
    pub payment_terms: String,
    pub notes: Option<String>,
    pub evaluation_score: Option<f64>,
    pub rank: Option<u32>,
    pub status: ResponseStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub bids: Vec<VendorBid>,
}

impl RfqResponse {
    pub fn bid_for_line(&self, line_no: u32) -> Option<&VendorBid> {
        self.bids.iter().find(|b| b.line_no == line_no)
    }
}

/// Aggregate root: Rfq.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rfq {
    id: RfqId,
    rfq_number: String,
    title: String,
    description: Option<String>,
    rfq_type: RfqType,
    status: RfqStatus,
    required_delivery_date: Option<NaiveDate>,
    lines: Vec<RfqLine>,
    responses: Vec<RfqResponse>,
    po_number: Option<String>,
    /// Highest line number ever issued; removed numbers are not reused.
    #[serde(skip)]
    last_line_no: u32,
    archived: bool,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    version: u64,
    #[serde(skip)]
    created: bool,
}

impl Rfq {
    pub fn empty(id: RfqId) -> Self {
        Self {
            id,
            rfq_number: String::new(),
            title: String::new(),
            description: None,
            rfq_type: RfqType::Standard,
            status: RfqStatus::Draft,
            required_delivery_date: None,
            lines: Vec::new(),
            responses: Vec::new(),
            po_number: None,
            last_line_no: 0,
            archived: false,
            created_at: None,
            updated_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> RfqId {
        self.id
    }

    pub fn rfq_number(&self) -> &str {
        &self.rfq_number
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn status(&self) -> RfqStatus {
        self.status
    }

    pub fn required_delivery_date(&self) -> Option<NaiveDate> {
        self.required_delivery_date
    }

    pub fn lines(&self) -> &[RfqLine] {
        &self.lines
    }

    pub fn responses(&self) -> &[RfqResponse] {
        &self.responses
    }

    pub fn response(&self, response_id: RfqResponseId) -> Option<&RfqResponse> {
        self.responses.iter().find(|r| r.id == response_id)
    }

    pub fn line(&self, line_no: u32) -> Option<&RfqLine> {
        self.lines.iter().find(|l| l.line_no == line_no)
    }

    pub fn po_number(&self) -> Option<&str> {
        self.po_number.as_deref()
    }

    pub fn is_archived(&self) -> bool {
        self.archived
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Responses that take part in an evaluation run.
    pub fn evaluable_responses(&self) -> impl Iterator<Item = &RfqResponse> {
        self.responses
            .iter()
            .filter(|r| matches!(r.status, ResponseStatus::Submitted | ResponseStatus::Evaluated))
    }

    /// Delivery date promised by an accepted response.
    ///
    /// The RFQ's required date wins; otherwise acceptance date plus the
    /// quoted delivery days.
    pub fn expected_delivery(&self, response: &RfqResponse, accepted_on: NaiveDate) -> NaiveDate {
        self.required_delivery_date
            .unwrap_or_else(|| accepted_on + Duration::days(i64::from(response.delivery_days)))
    }

    /// Check that `response_id` can be accepted right now.
    ///
    /// The facade calls this before creating the purchase order so that
    /// procurement is never touched for a request that would be rejected.
    pub fn ensure_acceptable(&self, response_id: RfqResponseId) -> DomainResult<&RfqResponse> {
        self.ensure_mutable()?;
        let response = self
            .response(response_id)
            .ok_or_else(|| DomainError::not_found("rfq response", response_id))?;
        if response.status != ResponseStatus::Evaluated {
            return Err(DomainError::conflict(format!(
                "response {response_id} is {:?}, only evaluated responses can be accepted",
                response.status
            )));
        }
        Ok(response)
    }

    /// Lines are editable only while the RFQ is draft or sent and unanswered.
    fn ensure_lines_editable(&self) -> DomainResult<()> {
        self.ensure_mutable()?;
        if !self.responses.is_empty() || !matches!(self.status, RfqStatus::Draft | RfqStatus::Sent) {
            return Err(DomainError::conflict("lines can only change before responses arrive"));
        }
        Ok(())
    }

    fn ensure_created(&self) -> DomainResult<()> {
        if self.created {
            Ok(())
        } else {
            Err(DomainError::not_found("rfq", self.id))
        }
    }

    /// Created, not archived, not closed or cancelled.
    fn ensure_mutable(&self) -> DomainResult<()> {
        self.ensure_created()?;
        if self.archived {
            return Err(DomainError::conflict(format!("rfq {} is archived", self.rfq_number)));
        }
        if self.status.is_terminal() {
            return Err(DomainError::conflict(format!(
                "rfq {} is already {}",
                self.rfq_number,
                self.status.as_str()
            )));
        }
        Ok(())
    }
}

impl AggregateRoot for Rfq {
    type Id = RfqId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRfq {
    pub rfq_id: RfqId,
    /// Allocated by the caller (`RFQ-2026-0001`, ...).
    pub rfq_number: String,
    pub title: String,
    pub description: Option<String>,
    pub rfq_type: RfqType,
    pub required_delivery_date: Option<NaiveDate>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLine {
    pub rfq_id: RfqId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: i64,
    pub unit_of_measure: String,
    pub estimated_unit_price: Option<i64>,
    pub specifications: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveLine {
    pub rfq_id: RfqId,
    pub line_no: u32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddResponse {
    pub rfq_id: RfqId,
    pub response_id: RfqResponseId,
    pub vendor_id: VendorId,
    pub total_quoted_value: i64,
    pub delivery_days: u32,
    pub payment_terms: String,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Price one line on behalf of a submitted response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddBid {
    pub rfq_id: RfqId,
    pub response_id: RfqResponseId,
    pub line_no: u32,
    pub unit_price: i64,
    pub lead_time_days: Option<u32>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRfq {
    pub rfq_id: RfqId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelRfq {
    pub rfq_id: RfqId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Score and rank the evaluable responses.
///
/// `vendor_ratings` comes from the vendor master; vendors missing from it
/// get the policy's default rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluateResponses {
    pub rfq_id: RfqId,
    pub vendor_ratings: BTreeMap<VendorId, f64>,
    pub policy: EvaluationPolicy,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptResponse {
    pub rfq_id: RfqId,
    pub response_id: RfqResponseId,
    /// Number of the purchase order synthesized from the accepted bid.
    pub po_number: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRfq {
    pub rfq_id: RfqId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RfqCommand {
    Create(CreateRfq),
    AddLine(AddLine),
    RemoveLine(RemoveLine),
    AddResponse(AddResponse),
    AddBid(AddBid),
    Send(SendRfq),
    Cancel(CancelRfq),
    Evaluate(EvaluateResponses),
    Accept(AcceptResponse),
    Archive(ArchiveRfq),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RfqEvent {
    RfqCreated(CreateRfq),
    LineAdded {
        rfq_id: RfqId,
        line: RfqLine,
        occurred_at: DateTime<Utc>,
    },
    LineRemoved(RemoveLine),
    ResponseAdded {
        rfq_id: RfqId,
        response: RfqResponse,
        occurred_at: DateTime<Utc>,
    },
    BidAdded {
        rfq_id: RfqId,
        response_id: RfqResponseId,
        bid: VendorBid,
        occurred_at: DateTime<Utc>,
    },
    RfqSent(SendRfq),
    RfqCancelled(CancelRfq),
    ResponsesEvaluated {
        rfq_id: RfqId,
        scores: Vec<ResponseScore>,
        occurred_at: DateTime<Utc>,
    },
    ResponseAccepted {
        rfq_id: RfqId,
        response_id: RfqResponseId,
        rejected: Vec<RfqResponseId>,
        po_number: String,
        occurred_at: DateTime<Utc>,
    },
    RfqArchived(ArchiveRfq),
}

impl Event for RfqEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RfqEvent::RfqCreated(_) => "rfq.created",
            RfqEvent::LineAdded { .. } => "rfq.line_added",
            RfqEvent::LineRemoved(_) => "rfq.line_removed",
            RfqEvent::ResponseAdded { .. } => "rfq.response.added",
            RfqEvent::BidAdded { .. } => "rfq.response.bid_added",
            RfqEvent::RfqSent(_) => "rfq.sent",
            RfqEvent::RfqCancelled(_) => "rfq.cancelled",
            RfqEvent::ResponsesEvaluated { .. } => "rfq.responses.evaluated",
            RfqEvent::ResponseAccepted { .. } => "rfq.response.accepted",
            RfqEvent::RfqArchived(_) => "rfq.archived",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            RfqEvent::RfqCreated(e) => e.occurred_at,
            RfqEvent::LineRemoved(e) => e.occurred_at,
            RfqEvent::RfqSent(e) => e.occurred_at,
            RfqEvent::RfqCancelled(e) => e.occurred_at,
            RfqEvent::RfqArchived(e) => e.occurred_at,
            RfqEvent::LineAdded { occurred_at, .. }
            | RfqEvent::ResponseAdded { occurred_at, .. }
            | RfqEvent::BidAdded { occurred_at, .. }
            | RfqEvent::ResponsesEvaluated { occurred_at, .. }
            | RfqEvent::ResponseAccepted { occurred_at, .. } => *occurred_at,
        }
    }
}

impl Aggregate for Rfq {
    type Command = RfqCommand;
    type Event = RfqEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            RfqEvent::RfqCreated(e) => {
                self.id = e.rfq_id;
                self.rfq_number = e.rfq_number.clone();
                self.title = e.title.clone();
                self.description = e.description.clone();
                self.rfq_type = e.rfq_type;
                self.required_delivery_date = e.required_delivery_date;
                self.status = RfqStatus::Draft;
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            RfqEvent::LineAdded { line, .. } => {
                self.last_line_no = self.last_line_no.max(line.line_no);
                self.lines.push(line.clone());
            }
            RfqEvent::LineRemoved(e) => {
                self.lines.retain(|l| l.line_no != e.line_no);
            }
            RfqEvent::ResponseAdded { response, .. } => {
                self.responses.push(response.clone());
                self.status = RfqStatus::ResponsesReceived;
            }
            RfqEvent::BidAdded { response_id, bid, .. } => {
                if let Some(r) = self.responses.iter_mut().find(|r| r.id == *response_id) {
                    r.bids.push(bid.clone());
                }
            }
            RfqEvent::RfqSent(_) => {
                self.status = RfqStatus::Sent;
            }
            RfqEvent::RfqCancelled(_) => {
                self.status = RfqStatus::Cancelled;
            }
            RfqEvent::ResponsesEvaluated { scores, .. } => {
                for score in scores {
                    if let Some(r) = self.responses.iter_mut().find(|r| r.id == score.response_id) {
                        r.evaluation_score = Some(score.evaluation_score);
                        r.rank = Some(score.rank);
                        r.status = ResponseStatus::Evaluated;
                    }
                }
                self.status = RfqStatus::Evaluated;
            }
            RfqEvent::ResponseAccepted {
                response_id,
                rejected,
                po_number,
                ..
            } => {
                for r in &mut self.responses {
                    if r.id == *response_id {
                        r.status = ResponseStatus::Accepted;
                    } else if rejected.contains(&r.id) {
                        r.status = ResponseStatus::Rejected;
                    }
                }
                self.po_number = Some(po_number.clone());
                self.status = RfqStatus::Closed;
            }
            RfqEvent::RfqArchived(_) => {
                self.archived = true;
            }
        }

        self.updated_at = Some(event.occurred_at());
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            RfqCommand::Create(cmd) => self.handle_create(cmd),
            RfqCommand::AddLine(cmd) => self.handle_add_line(cmd),
            RfqCommand::RemoveLine(cmd) => self.handle_remove_line(cmd),
            RfqCommand::AddResponse(cmd) => self.handle_add_response(cmd),
            RfqCommand::AddBid(cmd) => self.handle_add_bid(cmd),
            RfqCommand::Send(cmd) => {
                self.ensure_mutable()?;
                if self.status != RfqStatus::Draft {
                    return Err(DomainError::conflict(format!(
                        "only draft rfqs can be sent (status: {})",
                        self.status.as_str()
                    )));
                }
                if self.lines.is_empty() {
                    return Err(DomainError::validation("rfq has no lines"));
                }
                Ok(vec![RfqEvent::RfqSent(cmd.clone())])
            }
            RfqCommand::Cancel(cmd) => {
                self.ensure_mutable()?;
                Ok(vec![RfqEvent::RfqCancelled(cmd.clone())])
            }
            RfqCommand::Evaluate(cmd) => self.handle_evaluate(cmd),
            RfqCommand::Accept(cmd) => self.handle_accept(cmd),
            RfqCommand::Archive(cmd) => {
                self.ensure_created()?;
                if self.archived {
                    return Err(DomainError::conflict(format!("rfq {} is already archived", self.rfq_number)));
                }
                Ok(vec![RfqEvent::RfqArchived(cmd.clone())])
            }
        }
    }
}

impl Rfq {
    fn handle_create(&self, cmd: &CreateRfq) -> DomainResult<Vec<RfqEvent>> {
        if self.created {
            return Err(DomainError::conflict("rfq already exists"));
        }
        if cmd.title.trim().is_empty() {
            return Err(DomainError::validation("title cannot be empty"));
        }
        if cmd.rfq_number.trim().is_empty() {
            return Err(DomainError::validation("rfq number cannot be empty"));
        }
        let mut cmd = cmd.clone();
        cmd.title = cmd.title.trim().to_string();
        Ok(vec![RfqEvent::RfqCreated(cmd)])
    }

    fn handle_add_line(&self, cmd: &AddLine) -> DomainResult<Vec<RfqEvent>> {
        self.ensure_lines_editable()?;
        if cmd.product_name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if cmd.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if cmd.estimated_unit_price.is_some_and(|p| p < 0) {
            return Err(DomainError::validation("estimated unit price cannot be negative"));
        }

        let line_no = self.last_line_no + 1;
        Ok(vec![RfqEvent::LineAdded {
            rfq_id: cmd.rfq_id,
            line: RfqLine {
                line_no,
                product_id: cmd.product_id,
                product_name: cmd.product_name.trim().to_string(),
                quantity: cmd.quantity,
                unit_of_measure: cmd.unit_of_measure.clone(),
                estimated_unit_price: cmd.estimated_unit_price,
                specifications: cmd.specifications.clone(),
            },
            occurred_at: cmd.occurred_at,
        }])
    }

    fn handle_remove_line(&self, cmd: &RemoveLine) -> DomainResult<Vec<RfqEvent>> {
        self.ensure_lines_editable()?;
        if self.line(cmd.line_no).is_none() {
            return Err(DomainError::not_found("rfq line", cmd.line_no));
        }
        if self.status == RfqStatus::Sent && self.lines.len() == 1 {
            return Err(DomainError::validation("a sent rfq must keep at least one line"));
        }
        Ok(vec![RfqEvent::LineRemoved(cmd.clone())])
    }

    fn handle_add_bid(&self, cmd: &AddBid) -> DomainResult<Vec<RfqEvent>> {
        self.ensure_mutable()?;
        let response = self
            .response(cmd.response_id)
            .ok_or_else(|| DomainError::not_found("rfq response", cmd.response_id))?;
        if response.status != ResponseStatus::Submitted {
            return Err(DomainError::conflict(format!(
                "response {} is {:?}, bids are frozen",
                cmd.response_id, response.status
            )));
        }
        let line = self
            .line(cmd.line_no)
            .ok_or_else(|| DomainError::not_found("rfq line", cmd.line_no))?;
        if response.bid_for_line(cmd.line_no).is_some() {
            return Err(DomainError::conflict(format!(
                "response {} already bid on line {}",
                cmd.response_id, cmd.line_no
            )));
        }
        if cmd.unit_price < 0 {
            return Err(DomainError::validation("unit price cannot be negative"));
        }
        let line_total = cmd
            .unit_price
            .checked_mul(line.quantity)
            .ok_or_else(|| DomainError::validation("line total is out of range"))?;

        Ok(vec![RfqEvent::BidAdded {
            rfq_id: cmd.rfq_id,
            response_id: cmd.response_id,
            bid: VendorBid {
                line_no: cmd.line_no,
                unit_price: cmd.unit_price,
                line_total,
                lead_time_days: cmd.lead_time_days,
                notes: cmd.notes.clone(),
            },
            occurred_at: cmd.occurred_at,
        }])
    }

    fn handle_add_response(&self, cmd: &AddResponse) -> DomainResult<Vec<RfqEvent>> {
        self.ensure_mutable()?;
        if !self.status.is_open() {
            return Err(DomainError::conflict(format!(
                "rfq {} is {}, no more responses accepted",
                self.rfq_number,
                self.status.as_str()
            )));
        }
        if cmd.total_quoted_value <= 0 {
            return Err(DomainError::validation("total quoted value must be positive"));
        }
        if self.response(cmd.response_id).is_some() {
            return Err(DomainError::conflict("response already recorded"));
        }

        Ok(vec![RfqEvent::ResponseAdded {
            rfq_id: cmd.rfq_id,
            response: RfqResponse {
                id: cmd.response_id,
                vendor_id: cmd.vendor_id,
                total_quoted_value: cmd.total_quoted_value,
                delivery_days: cmd.delivery_days,
                payment_terms: cmd.payment_terms.trim().to_string(),
                notes: cmd.notes.clone(),
                evaluation_score: None,
                rank: None,
                status: ResponseStatus::Submitted,
                submitted_at: cmd.occurred_at,
                bids: Vec::new(),
            },
            occurred_at: cmd.occurred_at,
        }])
    }

    fn handle_evaluate(&self, cmd: &EvaluateResponses) -> DomainResult<Vec<RfqEvent>> {
        self.ensure_mutable()?;
        cmd.policy.validate()?;

        let bids: Vec<Bid<'_>> = self
            .evaluable_responses()
            .map(|r| Bid {
                response_id: r.id,
                total_quoted_value: r.total_quoted_value,
                delivery_days: r.delivery_days,
                payment_terms: &r.payment_terms,
                vendor_rating: cmd
                    .vendor_ratings
                    .get(&r.vendor_id)
                    .copied()
                    .unwrap_or(cmd.policy.default_vendor_rating),
                submitted_at: r.submitted_at,
            })
            .collect();
        if bids.len() < 2 {
            return Err(DomainError::validation(format!(
                "at least two responses are required to evaluate rfq {} (found {})",
                self.rfq_number,
                bids.len()
            )));
        }

        Ok(vec![RfqEvent::ResponsesEvaluated {
            rfq_id: cmd.rfq_id,
            scores: rank_bids(&bids, &cmd.policy),
            occurred_at: cmd.occurred_at,
        }])
    }

    fn handle_accept(&self, cmd: &AcceptResponse) -> DomainResult<Vec<RfqEvent>> {
        self.ensure_acceptable(cmd.response_id)?;
        if cmd.po_number.trim().is_empty() {
            return Err(DomainError::validation("po number cannot be empty"));
        }
        let rejected = self
            .responses
            .iter()
            .filter(|r| r.id != cmd.response_id)
            .map(|r| r.id)
            .collect();

        Ok(vec![RfqEvent::ResponseAccepted {
            rfq_id: cmd.rfq_id,
            response_id: cmd.response_id,
            rejected,
            po_number: cmd.po_number.clone(),
            occurred_at: cmd.occurred_at,
        }])
    }
}
