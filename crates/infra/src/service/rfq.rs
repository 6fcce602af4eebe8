use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use stockpact_audit::{AuditAction, AuditStore, EntityType};
use stockpact_core::{AggregateRoot, ExpectedVersion, ProductId, VendorId};
use stockpact_rfq::{
    AcceptResponse, AddBid, AddLine, AddResponse, ArchiveRfq, CancelRfq, CreateRfq, EvaluateResponses,
    RemoveLine, Rfq, RfqCommand, RfqId, RfqResponse, RfqResponseId, RfqType, SendRfq, VendorBid,
};

use super::{Change, ScmService};
use crate::error::ScmError;
use crate::providers::{NewPurchaseOrder, PurchaseOrderLine};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRfq {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rfq_type: RfqType,
    #[serde(default)]
    pub required_delivery_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRfqLine {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: i64,
    #[serde(default = "default_uom")]
    pub unit_of_measure: String,
    #[serde(default)]
    pub estimated_unit_price: Option<i64>,
    #[serde(default)]
    pub specifications: Option<String>,
}

fn default_uom() -> String {
    "pcs".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRfqResponse {
    pub vendor_id: VendorId,
    pub total_quoted_value: i64,
    pub delivery_days: u32,
    #[serde(default)]
    pub payment_terms: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVendorBid {
    pub line_no: u32,
    pub unit_price: i64,
    #[serde(default)]
    pub lead_time_days: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Outcome of accepting a response: the closed RFQ and the PO it produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptedResponse {
    pub rfq: Rfq,
    pub po_number: String,
}

impl<S: AuditStore> ScmService<S> {
    #[tracing::instrument(skip(self, rfq), fields(title = %rfq.title))]
    pub fn create_rfq(&self, rfq: NewRfq) -> Result<Rfq, ScmError> {
        let rfq_id = RfqId::generate();
        let now = self.clock.now();
        self.numbers.issue_with("RFQ", now.year(), |rfq_number| {
            let command = RfqCommand::Create(CreateRfq {
                rfq_id,
                rfq_number,
                title: rfq.title,
                description: rfq.description,
                rfq_type: rfq.rfq_type,
                required_delivery_date: rfq.required_delivery_date,
                occurred_at: now,
            });
            self.rfq_transition(rfq_id, AuditAction::Create, ExpectedVersion::Exact(0), &command)
        })
    }

    #[tracing::instrument(skip(self, line), fields(rfq_id = %rfq_id))]
    pub fn add_rfq_line(&self, rfq_id: RfqId, line: NewRfqLine, expected: ExpectedVersion) -> Result<Rfq, ScmError> {
        let command = RfqCommand::AddLine(AddLine {
            rfq_id,
            product_id: line.product_id,
            product_name: line.product_name,
            quantity: line.quantity,
            unit_of_measure: line.unit_of_measure,
            estimated_unit_price: line.estimated_unit_price,
            specifications: line.specifications,
            occurred_at: self.clock.now(),
        });
        self.rfq_transition(rfq_id, AuditAction::Update, expected, &command)
    }

    /// Drop a line from an RFQ that has no responses yet.
    #[tracing::instrument(skip(self), fields(rfq_id = %rfq_id, line_no))]
    pub fn remove_rfq_line(&self, rfq_id: RfqId, line_no: u32, expected: ExpectedVersion) -> Result<Rfq, ScmError> {
        let command = RfqCommand::RemoveLine(RemoveLine {
            rfq_id,
            line_no,
            occurred_at: self.clock.now(),
        });
        self.rfq_transition(rfq_id, AuditAction::Update, expected, &command)
    }

    #[tracing::instrument(skip(self, response), fields(rfq_id = %rfq_id, vendor_id = %response.vendor_id))]
    pub fn add_rfq_response(
        &self,
        rfq_id: RfqId,
        response: NewRfqResponse,
        expected: ExpectedVersion,
    ) -> Result<Rfq, ScmError> {
        self.require_vendor(response.vendor_id)?;
        let command = RfqCommand::AddResponse(AddResponse {
            rfq_id,
            response_id: RfqResponseId::generate(),
            vendor_id: response.vendor_id,
            total_quoted_value: response.total_quoted_value,
            delivery_days: response.delivery_days,
            payment_terms: response.payment_terms,
            notes: response.notes,
            occurred_at: self.clock.now(),
        });
        self.rfq_transition(rfq_id, AuditAction::Update, expected, &command)
    }

    #[tracing::instrument(skip(self), fields(rfq_id = %rfq_id))]
    pub fn send_rfq(&self, rfq_id: RfqId, expected: ExpectedVersion) -> Result<Rfq, ScmError> {
        let command = RfqCommand::Send(SendRfq {
            rfq_id,
            occurred_at: self.clock.now(),
        });
        self.rfq_transition(rfq_id, AuditAction::Update, expected, &command)
    }

    #[tracing::instrument(skip(self), fields(rfq_id = %rfq_id))]
    pub fn cancel_rfq(
        &self,
        rfq_id: RfqId,
        reason: Option<String>,
        expected: ExpectedVersion,
    ) -> Result<Rfq, ScmError> {
        let command = RfqCommand::Cancel(CancelRfq {
            rfq_id,
            reason,
            occurred_at: self.clock.now(),
        });
        self.rfq_transition(rfq_id, AuditAction::Update, expected, &command)
    }

    /// Record a vendor's price for one line of the RFQ the response answers.
    #[tracing::instrument(skip(self, bid), fields(response_id = %response_id, line_no = bid.line_no))]
    pub fn add_vendor_bid(
        &self,
        response_id: RfqResponseId,
        bid: NewVendorBid,
        expected: ExpectedVersion,
    ) -> Result<Rfq, ScmError> {
        let mut rows = self.rfqs.write()?;
        let current = rfq_for_response(&rows, response_id)?;
        let rfq_id = current.id_typed();
        let command = RfqCommand::AddBid(AddBid {
            rfq_id,
            response_id,
            line_no: bid.line_no,
            unit_price: bid.unit_price,
            lead_time_days: bid.lead_time_days,
            notes: bid.notes,
            occurred_at: self.clock.now(),
        });
        let change = Change {
            entity_type: EntityType::Rfq,
            entity_id: rfq_id.aggregate_id(),
            action: AuditAction::Update,
            expected,
            command: &command,
        };
        self.chain_transition(&mut rows, current, change)
    }

    /// Per-line bids of one response, in line order.
    pub fn vendor_bids(&self, response_id: RfqResponseId) -> Result<Vec<VendorBid>, ScmError> {
        let rows = self.rfqs.read()?;
        let rfq = rfq_for_response(&rows, response_id)?;
        let mut bids = rfq
            .response(response_id)
            .map(|r| r.bids.clone())
            .unwrap_or_default();
        bids.sort_by_key(|b| b.line_no);
        Ok(bids)
    }

    /// Score and rank the submitted responses. Returns them best first.
    #[tracing::instrument(skip(self), fields(rfq_id = %rfq_id))]
    pub fn evaluate_rfq_responses(
        &self,
        rfq_id: RfqId,
        expected: ExpectedVersion,
    ) -> Result<Vec<RfqResponse>, ScmError> {
        let mut rows = self.rfqs.write()?;
        let current = rows.get(&rfq_id).cloned().unwrap_or_else(|| Rfq::empty(rfq_id));

        let mut vendor_ratings = BTreeMap::new();
        for response in current.evaluable_responses() {
            if let Some(rating) = self
                .collaborators
                .vendors
                .vendor(response.vendor_id)?
                .and_then(|vendor| vendor.rating)
            {
                vendor_ratings.insert(response.vendor_id, rating);
            }
        }

        let command = RfqCommand::Evaluate(EvaluateResponses {
            rfq_id,
            vendor_ratings,
            policy: self.config.rfq.clone(),
            occurred_at: self.clock.now(),
        });
        let change = Change {
            entity_type: EntityType::Rfq,
            entity_id: rfq_id.aggregate_id(),
            action: AuditAction::Update,
            expected,
            command: &command,
        };
        let evaluated = self.chain_transition(&mut rows, current, change)?;

        let mut ranked: Vec<RfqResponse> = evaluated
            .responses()
            .iter()
            .filter(|r| r.rank.is_some())
            .cloned()
            .collect();
        ranked.sort_by_key(|r| r.rank);
        tracing::info!(responses = ranked.len(), "rfq responses evaluated");
        Ok(ranked)
    }

    /// Accept one evaluated response, close its RFQ and raise the PO.
    ///
    /// The PO is voided again if the RFQ cannot be committed.
    #[tracing::instrument(skip(self), fields(response_id = %response_id))]
    pub fn accept_rfq_response(
        &self,
        response_id: RfqResponseId,
        expected: ExpectedVersion,
    ) -> Result<AcceptedResponse, ScmError> {
        let mut rows = self.rfqs.write()?;
        let current = rfq_for_response(&rows, response_id)?;
        expected.check(current.version())?;
        let response = current.ensure_acceptable(response_id)?.clone();

        let today = self.today();
        let po_number = self.collaborators.purchase_orders.create(NewPurchaseOrder {
            vendor_id: response.vendor_id,
            warehouse_id: None,
            order_date: today,
            expected_delivery_date: Some(current.expected_delivery(&response, today)),
            lines: current
                .lines()
                .iter()
                .map(|line| {
                    // The vendor's bid wins over the buyer's estimate.
                    let (unit_price, line_total) = match response.bid_for_line(line.line_no) {
                        Some(bid) => (bid.unit_price, bid.line_total),
                        None => {
                            let unit_price = line.estimated_unit_price.unwrap_or(0);
                            (unit_price, unit_price.saturating_mul(line.quantity))
                        }
                    };
                    PurchaseOrderLine {
                        product_id: line.product_id,
                        product_name: line.product_name.clone(),
                        quantity: line.quantity,
                        received_quantity: 0,
                        unit_of_measure: line.unit_of_measure.clone(),
                        unit_price,
                        line_total,
                    }
                })
                .collect(),
            total_amount: response.total_quoted_value,
            notes: Some(format!("Auto-generated from RFQ {}", current.rfq_number())),
        })?;

        let rfq_id = current.id_typed();
        let command = RfqCommand::Accept(AcceptResponse {
            rfq_id,
            response_id,
            po_number: po_number.clone(),
            occurred_at: self.clock.now(),
        });
        let change = Change {
            entity_type: EntityType::Rfq,
            entity_id: rfq_id.aggregate_id(),
            action: AuditAction::Update,
            expected: ExpectedVersion::Any,
            command: &command,
        };
        match self.chain_transition(&mut rows, current, change) {
            Ok(rfq) => {
                tracing::info!(po_number = %po_number, "purchase order raised from rfq");
                Ok(AcceptedResponse { rfq, po_number })
            }
            Err(err) => {
                self.void_purchase_order(&po_number, &err);
                Err(err)
            }
        }
    }

    /// Archive an RFQ. It stays readable by id but leaves the listing.
    #[tracing::instrument(skip(self), fields(rfq_id = %rfq_id))]
    pub fn delete_rfq(&self, rfq_id: RfqId, expected: ExpectedVersion) -> Result<Rfq, ScmError> {
        let command = RfqCommand::Archive(ArchiveRfq {
            rfq_id,
            occurred_at: self.clock.now(),
        });
        self.rfq_transition(rfq_id, AuditAction::Delete, expected, &command)
    }

    pub fn get_rfq(&self, rfq_id: RfqId) -> Result<Rfq, ScmError> {
        self.rfqs.get(&rfq_id)?.ok_or_else(|| ScmError::not_found("rfq", rfq_id))
    }

    /// Non-archived RFQs, newest first.
    pub fn list_rfqs(&self) -> Result<Vec<Rfq>, ScmError> {
        let mut rfqs: Vec<Rfq> = self.rfqs.list()?.into_iter().filter(|r| !r.is_archived()).collect();
        rfqs.sort_by(|a, b| b.created_at().cmp(&a.created_at()).then_with(|| b.rfq_number().cmp(a.rfq_number())));
        Ok(rfqs)
    }

    fn rfq_transition(
        &self,
        rfq_id: RfqId,
        action: AuditAction,
        expected: ExpectedVersion,
        command: &RfqCommand,
    ) -> Result<Rfq, ScmError> {
        self.transition(
            &self.rfqs,
            rfq_id,
            || Rfq::empty(rfq_id),
            Change {
                entity_type: EntityType::Rfq,
                entity_id: rfq_id.aggregate_id(),
                action,
                expected,
                command,
            },
        )
    }
}

/// The RFQ a response belongs to.
fn rfq_for_response(rows: &HashMap<RfqId, Rfq>, response_id: RfqResponseId) -> Result<Rfq, ScmError> {
    rows.values()
        .find(|rfq| rfq.response(response_id).is_some())
        .cloned()
        .ok_or_else(|| ScmError::not_found("rfq response", response_id))
}
