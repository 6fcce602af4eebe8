use serde::Serialize;

use stockpact_audit::{AuditAction, AuditDraft, AuditStore, EntityType};
use stockpact_core::VendorId;
use stockpact_suppliers::{assess, derive_signals, RiskScore, RiskScoreId, RiskSignals, VendorProfile};

use super::{InFlight, ScmService};
use crate::error::ScmError;

/// Latest assessment per vendor. `latest: None` means "not assessed".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorRiskSummary {
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub latest: Option<RiskScore>,
}

/// Most recent row by assessment date; later rows win ties.
pub(super) fn latest_score(history: &[RiskScore]) -> Option<&RiskScore> {
    history.iter().max_by_key(|score| score.assessment_date)
}

impl<S: AuditStore> ScmService<S> {
    pub(super) fn require_vendor(&self, vendor_id: VendorId) -> Result<VendorProfile, ScmError> {
        self.collaborators
            .vendors
            .vendor(vendor_id)?
            .ok_or_else(|| ScmError::not_found("vendor", vendor_id))
    }

    /// Derive signals from the history feed and record a new assessment.
    #[tracing::instrument(skip(self), fields(vendor_id = %vendor_id))]
    pub fn calculate_supplier_risk_score(&self, vendor_id: VendorId) -> Result<RiskScore, ScmError> {
        let _in_flight = InFlight::acquire(&self.assessments_in_flight, vendor_id)?;
        let profile = self.require_vendor(vendor_id)?;
        let history = self.collaborators.history.history(vendor_id)?;
        let signals = derive_signals(&profile, &history, &self.config.risk, self.today());
        self.record_risk_score(vendor_id, signals)
    }

    /// Record an assessment from signals the caller already holds.
    #[tracing::instrument(skip(self, signals), fields(vendor_id = %vendor_id))]
    pub fn assess_with_signals(&self, vendor_id: VendorId, signals: RiskSignals) -> Result<RiskScore, ScmError> {
        signals.validate()?;
        let _in_flight = InFlight::acquire(&self.assessments_in_flight, vendor_id)?;
        self.require_vendor(vendor_id)?;
        self.record_risk_score(vendor_id, signals)
    }

    fn record_risk_score(&self, vendor_id: VendorId, signals: RiskSignals) -> Result<RiskScore, ScmError> {
        let assessment = assess(&signals, &self.config.risk)?;
        let score = RiskScore::new(RiskScoreId::generate(), vendor_id, signals, assessment, self.clock.now());
        let draft = AuditDraft::new(
            EntityType::SupplierRiskScore,
            score.id.aggregate_id(),
            AuditAction::Create,
            &score,
        )?;

        let mut rows = self.risk_scores.write()?;
        let row = score.clone();
        self.ledger.append_with(draft, move |_| {
            rows.entry(vendor_id).or_default().push(row);
        })?;

        tracing::info!(
            risk_score = score.risk_score,
            risk_level = ?score.risk_level,
            "supplier risk assessed"
        );
        if score.risk_level.is_elevated() {
            tracing::warn!(risk_level = ?score.risk_level, "supplier risk is elevated");
        }
        Ok(score)
    }

    /// Every vendor in the vendor master with its latest score, by name.
    pub fn latest_risk_scores(&self) -> Result<Vec<VendorRiskSummary>, ScmError> {
        let mut vendors = self.collaborators.vendors.vendors()?;
        vendors.sort_by(|a, b| a.name.cmp(&b.name));

        let rows = self.risk_scores.read()?;
        Ok(vendors
            .into_iter()
            .map(|vendor| VendorRiskSummary {
                latest: rows
                    .get(&vendor.vendor_id)
                    .and_then(|history| latest_score(history))
                    .cloned(),
                vendor_id: vendor.vendor_id,
                vendor_name: vendor.name,
            })
            .collect())
    }

    /// A vendor's assessments, newest first.
    pub fn risk_history(&self, vendor_id: VendorId) -> Result<Vec<RiskScore>, ScmError> {
        self.require_vendor(vendor_id)?;
        let mut history: Vec<RiskScore> = self
            .risk_scores
            .get(&vendor_id)?
            .unwrap_or_default()
            .into_iter()
            .rev()
            .collect();
        history.sort_by(|a, b| b.assessment_date.cmp(&a.assessment_date));
        Ok(history)
    }
}
