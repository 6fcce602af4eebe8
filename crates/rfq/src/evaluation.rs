//! Weighted bid scoring and ranking.
//!
//! Each component is normalized to 0-100 (higher is better):
//! - price: `100 - (price / min_price - 1) * 100`, floored at 0
//! - delivery: `100 * min_days / days` (0 days scores 100)
//! - payment terms: favorability table keyed by net days
//! - vendor rating: 1-5 rating times 20

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockpact_core::{DomainError, DomainResult};

use crate::rfq::RfqResponseId;

const WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RfqWeights {
    pub price: f64,
    pub delivery: f64,
    pub vendor_rating: f64,
    pub payment_terms: f64,
}

impl Default for RfqWeights {
    fn default() -> Self {
        Self {
            price: 0.40,
            delivery: 0.30,
            vendor_rating: 0.20,
            payment_terms: 0.10,
        }
    }
}

impl RfqWeights {
    pub fn validate(&self) -> DomainResult<()> {
        let weights = [self.price, self.delivery, self.vendor_rating, self.payment_terms];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(DomainError::validation("rfq weights must be finite and non-negative"));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(DomainError::validation(format!("rfq weights must sum to 1 (got {sum})")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaymentTermScore {
    pub net_days: u32,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationPolicy {
    pub weights: RfqWeights,
    pub payment_terms: Vec<PaymentTermScore>,
    /// Score for terms not found in `payment_terms`.
    pub other_payment_terms_score: f64,
    /// Rating assumed for vendors without one.
    pub default_vendor_rating: f64,
}

impl Default for EvaluationPolicy {
    fn default() -> Self {
        Self {
            weights: RfqWeights::default(),
            payment_terms: vec![
                PaymentTermScore { net_days: 30, score: 100.0 },
                PaymentTermScore { net_days: 15, score: 80.0 },
                PaymentTermScore { net_days: 45, score: 60.0 },
            ],
            other_payment_terms_score: 40.0,
            default_vendor_rating: 3.0,
        }
    }
}

impl EvaluationPolicy {
    pub fn validate(&self) -> DomainResult<()> {
        self.weights.validate()?;
        let scores = self
            .payment_terms
            .iter()
            .map(|t| t.score)
            .chain([self.other_payment_terms_score]);
        for score in scores {
            if !(0.0..=100.0).contains(&score) {
                return Err(DomainError::validation("payment term scores must be within [0, 100]"));
            }
        }
        if !(1.0..=5.0).contains(&self.default_vendor_rating) {
            return Err(DomainError::validation("default vendor rating must be within [1, 5]"));
        }
        Ok(())
    }
}

/// Score for free-text terms such as "Net 30" or "30 days".
///
/// The first number in the text is taken as the net-days value.
pub fn payment_terms_score(terms: &str, policy: &EvaluationPolicy) -> f64 {
    let digits: String = terms
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits
        .parse::<u32>()
        .ok()
        .and_then(|days| policy.payment_terms.iter().find(|t| t.net_days == days))
        .map(|t| t.score)
        .unwrap_or(policy.other_payment_terms_score)
}

/// One response as seen by the scorer.
#[derive(Debug, Clone, PartialEq)]
pub struct Bid<'a> {
    pub response_id: RfqResponseId,
    /// Minor currency units.
    pub total_quoted_value: i64,
    pub delivery_days: u32,
    pub payment_terms: &'a str,
    /// 1-5 scale, already defaulted by the caller.
    pub vendor_rating: f64,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub price: f64,
    pub delivery: f64,
    pub payment_terms: f64,
    pub vendor_rating: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseScore {
    pub response_id: RfqResponseId,
    pub evaluation_score: f64,
    pub rank: u32,
    pub components: ScoreComponents,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Score every bid and assign ranks `1..=N` (1 = best).
///
/// Ties on the rounded score go to the earlier submission, then to the lower
/// response id, so ranks are always unique.
pub fn rank_bids(bids: &[Bid<'_>], policy: &EvaluationPolicy) -> Vec<ResponseScore> {
    let min_price = bids
        .iter()
        .map(|b| b.total_quoted_value)
        .filter(|v| *v > 0)
        .min();
    let min_days = bids.iter().map(|b| b.delivery_days).min().unwrap_or(0);
    let w = &policy.weights;

    let mut scored: Vec<(ResponseScore, DateTime<Utc>)> = bids
        .iter()
        .map(|bid| {
            let price = match min_price {
                Some(min) if bid.total_quoted_value > 0 => {
                    (100.0 - (bid.total_quoted_value as f64 / min as f64 - 1.0) * 100.0).max(0.0)
                }
                _ => 0.0,
            };
            let delivery = if bid.delivery_days == 0 {
                100.0
            } else {
                100.0 * f64::from(min_days) / f64::from(bid.delivery_days)
            };
            let components = ScoreComponents {
                price,
                delivery,
                payment_terms: payment_terms_score(bid.payment_terms, policy),
                vendor_rating: (bid.vendor_rating * 20.0).clamp(0.0, 100.0),
            };
            let total = components.price * w.price
                + components.delivery * w.delivery
                + components.vendor_rating * w.vendor_rating
                + components.payment_terms * w.payment_terms;
            (
                ResponseScore {
                    response_id: bid.response_id,
                    evaluation_score: round2(total),
                    rank: 0,
                    components,
                },
                bid.submitted_at,
            )
        })
        .collect();

    scored.sort_by(|(a, a_at), (b, b_at)| {
        b.evaluation_score
            .partial_cmp(&a.evaluation_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a_at.cmp(b_at))
            .then_with(|| a.response_id.cmp(&b.response_id))
    });

    scored
        .into_iter()
        .enumerate()
        .map(|(i, (mut score, _))| {
            score.rank = i as u32 + 1;
            score
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn bid(value: i64, days: u32, terms: &'static str, rating: f64, minute: i64) -> Bid<'static> {
        Bid {
            response_id: RfqResponseId::generate(),
            total_quoted_value: value,
            delivery_days: days,
            payment_terms: terms,
            vendor_rating: rating,
            submitted_at: at(minute),
        }
    }

    #[test]
    fn payment_terms_lookup() {
        let p = EvaluationPolicy::default();
        assert_eq!(payment_terms_score("Net 30", &p), 100.0);
        assert_eq!(payment_terms_score("15 days", &p), 80.0);
        assert_eq!(payment_terms_score("NET45", &p), 60.0);
        assert_eq!(payment_terms_score("Net 60", &p), 40.0);
        assert_eq!(payment_terms_score("cash on delivery", &p), 40.0);
    }

    #[test]
    fn cheapest_fastest_bid_ranks_first() {
        let bids = [
            bid(1_200_000, 20, "Net 30", 4.0, 0),
            bid(1_000_000, 10, "Net 30", 4.0, 1),
        ];
        let ranked = rank_bids(&bids, &EvaluationPolicy::default());

        assert_eq!(ranked[0].response_id, bids[1].response_id);
        assert_eq!(ranked[0].rank, 1);
        // 100*.4 + 100*.3 + 80*.2 + 100*.1
        assert_eq!(ranked[0].evaluation_score, 96.0);
        // 80*.4 + 50*.3 + 80*.2 + 100*.1
        assert_eq!(ranked[1].evaluation_score, 73.0);
        assert!((ranked[1].components.price - 80.0).abs() < 1e-9);
        assert_eq!(ranked[1].components.delivery, 50.0);
    }

    #[test]
    fn ties_go_to_the_earlier_submission() {
        let bids = [
            bid(50_000, 7, "Net 30", 3.0, 10),
            bid(50_000, 7, "Net 30", 3.0, 2),
        ];
        let ranked = rank_bids(&bids, &EvaluationPolicy::default());
        assert_eq!(ranked[0].evaluation_score, ranked[1].evaluation_score);
        assert_eq!(ranked[0].response_id, bids[1].response_id);
    }

    #[test]
    fn weights_must_sum_to_one() {
        let policy = EvaluationPolicy {
            weights: RfqWeights {
                price: 0.9,
                ..RfqWeights::default()
            },
            ..EvaluationPolicy::default()
        };
        assert!(matches!(policy.validate(), Err(DomainError::Validation(_))));
        EvaluationPolicy::default().validate().unwrap();
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: ranks are always a permutation of 1..=N and follow the score order.
        #[test]
        fn ranks_are_a_permutation(
            raw in prop::collection::vec((1i64..10_000_000, 0u32..90, 1.0f64..=5.0, 0i64..5), 2..12),
        ) {
            let bids: Vec<Bid<'static>> = raw
                .iter()
                .map(|(value, days, rating, minute)| bid(*value, *days, "Net 30", *rating, *minute))
                .collect();
            let ranked = rank_bids(&bids, &EvaluationPolicy::default());

            let mut ranks: Vec<u32> = ranked.iter().map(|r| r.rank).collect();
            ranks.sort_unstable();
            prop_assert_eq!(ranks, (1..=bids.len() as u32).collect::<Vec<_>>());

            for pair in ranked.windows(2) {
                prop_assert!(pair[0].evaluation_score >= pair[1].evaluation_score);
            }
            for r in &ranked {
                prop_assert!((0.0..=100.0).contains(&r.evaluation_score));
            }
        }
    }
}
