//! Derive the five risk signals from raw vendor history.
//!
//! Every derived signal is clamped to [0, 100]. A signal with no underlying
//! data takes the policy's neutral value instead of a synthetic 0 or 100.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use stockpact_core::VendorId;

use crate::policy::RiskPolicy;
use crate::risk::RiskSignals;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorStatus {
    Active,
    Inactive,
    Blocked,
}

impl VendorStatus {
    fn compliance_base(&self) -> f64 {
        match self {
            VendorStatus::Active => 90.0,
            VendorStatus::Inactive => 40.0,
            VendorStatus::Blocked => 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    /// `None` never expires.
    pub expires_on: Option<NaiveDate>,
}

/// Vendor master data relevant to risk and bid scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorProfile {
    pub vendor_id: VendorId,
    pub name: String,
    /// 1-5 scale.
    pub rating: Option<f64>,
    pub status: VendorStatus,
    #[serde(default)]
    pub certifications: Vec<Certification>,
}

/// One received (or partially received) purchase order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub po_number: String,
    pub expected_date: Option<NaiveDate>,
    pub received_date: Option<NaiveDate>,
    pub quantity_received: i64,
    #[serde(default)]
    pub quantity_rejected: i64,
}

/// A price the vendor charged next to the category benchmark for it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub price: f64,
    pub benchmark: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplierHistory {
    #[serde(default)]
    pub deliveries: Vec<DeliveryRecord>,
    #[serde(default)]
    pub prices: Vec<PriceObservation>,
    /// Hours from RFQ sent to response, one per response.
    #[serde(default)]
    pub response_hours: Vec<f64>,
}

pub fn derive_signals(
    profile: &VendorProfile,
    history: &SupplierHistory,
    policy: &RiskPolicy,
    today: NaiveDate,
) -> RiskSignals {
    let neutral = policy.neutral_signal;
    let window_start = today - Duration::days(policy.trailing_window_days);
    let in_window: Vec<&DeliveryRecord> = history
        .deliveries
        .iter()
        .filter(|d| d.received_date.is_some_and(|r| r >= window_start && r <= today))
        .collect();

    RiskSignals {
        on_time_delivery_rate: on_time_rate(&in_window).unwrap_or(neutral),
        quality_score: quality(&in_window)
            .or_else(|| profile.rating.map(|r| r * 20.0))
            .map(clamp)
            .unwrap_or(neutral),
        price_competitiveness: price_competitiveness(&history.prices).unwrap_or(neutral),
        responsiveness: responsiveness(&history.response_hours, policy.max_response_hours)
            .unwrap_or(neutral),
        compliance_score: compliance(profile, today),
    }
}

fn clamp(v: f64) -> f64 {
    if v.is_finite() { v.clamp(0.0, 100.0) } else { 0.0 }
}

fn on_time_rate(deliveries: &[&DeliveryRecord]) -> Option<f64> {
    let dated: Vec<_> = deliveries
        .iter()
        .filter_map(|d| Some((d.received_date?, d.expected_date?)))
        .collect();
    if dated.is_empty() {
        return None;
    }
    let on_time = dated.iter().filter(|(received, expected)| received <= expected).count();
    Some(clamp(on_time as f64 / dated.len() as f64 * 100.0))
}

fn quality(deliveries: &[&DeliveryRecord]) -> Option<f64> {
    let received: i64 = deliveries.iter().map(|d| d.quantity_received.max(0)).sum();
    if received == 0 {
        return None;
    }
    let rejected: i64 = deliveries.iter().map(|d| d.quantity_rejected.max(0)).sum();
    Some(clamp(100.0 * (1.0 - rejected as f64 / received as f64)))
}

fn price_competitiveness(prices: &[PriceObservation]) -> Option<f64> {
    let ratios: Vec<f64> = prices
        .iter()
        .filter(|p| p.benchmark > 0.0 && p.price.is_finite())
        .map(|p| p.price / p.benchmark)
        .collect();
    if ratios.is_empty() {
        return None;
    }
    let avg = ratios.iter().sum::<f64>() / ratios.len() as f64;
    Some(clamp(100.0 - (avg - 1.0) * 100.0))
}

fn responsiveness(hours: &[f64], max_hours: f64) -> Option<f64> {
    let valid: Vec<f64> = hours.iter().copied().filter(|h| h.is_finite() && *h >= 0.0).collect();
    if valid.is_empty() || max_hours <= 0.0 {
        return None;
    }
    let avg = valid.iter().sum::<f64>() / valid.len() as f64;
    Some(clamp(100.0 * (1.0 - avg / max_hours)))
}

fn compliance(profile: &VendorProfile, today: NaiveDate) -> f64 {
    let certified = profile
        .certifications
        .iter()
        .any(|c| c.expires_on.is_none_or(|exp| exp >= today));
    let bonus = if certified { 10.0 } else { 0.0 };
    clamp(profile.status.compliance_base() + bonus)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 30).unwrap()
    }

    fn profile(status: VendorStatus, rating: Option<f64>) -> VendorProfile {
        VendorProfile {
            vendor_id: VendorId::new(),
            name: "Acme Metals".to_string(),
            rating,
            status,
            certifications: Vec::new(),
        }
    }

    fn delivery(expected: (u32, u32), received: (u32, u32), qty: i64, rejected: i64) -> DeliveryRecord {
        DeliveryRecord {
            po_number: "PO-2026-0001".to_string(),
            expected_date: NaiveDate::from_ymd_opt(2026, expected.0, expected.1),
            received_date: NaiveDate::from_ymd_opt(2026, received.0, received.1),
            quantity_received: qty,
            quantity_rejected: rejected,
        }
    }

    #[test]
    fn no_history_uses_neutral_values_and_rating_for_quality() {
        let s = derive_signals(
            &profile(VendorStatus::Active, Some(4.0)),
            &SupplierHistory::default(),
            &RiskPolicy::default(),
            today(),
        );
        assert_eq!(s.on_time_delivery_rate, 50.0);
        assert_eq!(s.quality_score, 80.0);
        assert_eq!(s.price_competitiveness, 50.0);
        assert_eq!(s.responsiveness, 50.0);
        assert_eq!(s.compliance_score, 90.0);
    }

    #[test]
    fn derives_each_signal_from_history() {
        let history = SupplierHistory {
            deliveries: vec![
                delivery((3, 1), (2, 27), 100, 5),
                delivery((4, 1), (4, 3), 100, 0),
                delivery((5, 1), (5, 1), 200, 15),
                delivery((6, 1), (5, 20), 100, 0),
            ],
            prices: vec![
                PriceObservation { price: 110.0, benchmark: 100.0 },
                PriceObservation { price: 90.0, benchmark: 100.0 },
                PriceObservation { price: 105.0, benchmark: 100.0 },
            ],
            response_hours: vec![12.0, 36.0],
        };
        let s = derive_signals(&profile(VendorStatus::Inactive, None), &history, &RiskPolicy::default(), today());

        assert_eq!(s.on_time_delivery_rate, 75.0);
        assert!((s.quality_score - 96.0).abs() < 1e-9); // 20 of 500 rejected
        assert!((s.price_competitiveness - 98.333_333).abs() < 1e-4);
        assert!((s.responsiveness - 85.714_285).abs() < 1e-4);
        assert_eq!(s.compliance_score, 40.0);
    }

    #[test]
    fn deliveries_outside_the_window_are_ignored() {
        let mut old = delivery((1, 1), (1, 10), 100, 100);
        old.received_date = NaiveDate::from_ymd_opt(2024, 1, 10);
        old.expected_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        let history = SupplierHistory {
            deliveries: vec![old],
            ..SupplierHistory::default()
        };
        let s = derive_signals(&profile(VendorStatus::Active, None), &history, &RiskPolicy::default(), today());
        assert_eq!(s.on_time_delivery_rate, 50.0);
        assert_eq!(s.quality_score, 50.0);
    }

    #[test]
    fn only_unexpired_certifications_earn_the_bonus() {
        let mut p = profile(VendorStatus::Active, None);
        p.certifications.push(Certification {
            name: "ISO 9001".into(),
            expires_on: NaiveDate::from_ymd_opt(2025, 12, 31),
        });
        let history = SupplierHistory::default();
        let policy = RiskPolicy::default();
        assert_eq!(derive_signals(&p, &history, &policy, today()).compliance_score, 90.0);

        p.certifications.push(Certification {
            name: "ISO 14001".into(),
            expires_on: None,
        });
        assert_eq!(derive_signals(&p, &history, &policy, today()).compliance_score, 100.0);
    }

    #[test]
    fn terrible_values_are_clamped() {
        let history = SupplierHistory {
            prices: vec![PriceObservation { price: 400.0, benchmark: 100.0 }],
            response_hours: vec![1_000.0],
            ..SupplierHistory::default()
        };
        let s = derive_signals(&profile(VendorStatus::Blocked, Some(9.0)), &history, &RiskPolicy::default(), today());
        assert_eq!(s.price_competitiveness, 0.0);
        assert_eq!(s.responsiveness, 0.0);
        assert_eq!(s.quality_score, 100.0);
        assert_eq!(s.compliance_score, 10.0);
    }
}
