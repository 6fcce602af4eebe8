//! Runtime configuration.
//!
//! Loaded from the JSON file named by `STOCKPACT_CONFIG` (every field
//! optional), then overridden by individual environment variables:
//!
//! - `STOCKPACT_BIND_ADDR`
//! - `STOCKPACT_STOCK_BASIS` (`on_hand` | `atp`)
//! - `STOCKPACT_SEED_FILE`

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use stockpact_core::{DomainError, DomainResult, ProductId};
use stockpact_replenishment::{EoqInputs, HoldingCost, StockBasis};
use stockpact_rfq::EvaluationPolicy;
use stockpact_suppliers::RiskPolicy;

pub const CONFIG_PATH_ENV: &str = "STOCKPACT_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScmConfig {
    pub replenishment: ReplenishmentConfig,
    pub risk: RiskPolicy,
    pub rfq: EvaluationPolicy,
    pub api: ApiConfig,
}

/// Partial EOQ inputs. Unset fields fall through to the next source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EoqSettings {
    pub annual_demand: Option<f64>,
    pub ordering_cost: Option<f64>,
    pub holding_cost: Option<HoldingCost>,
}

impl EoqSettings {
    /// Field-wise `self`, then `fallback`.
    pub fn or(self, fallback: EoqSettings) -> EoqSettings {
        EoqSettings {
            annual_demand: self.annual_demand.or(fallback.annual_demand),
            ordering_cost: self.ordering_cost.or(fallback.ordering_cost),
            holding_cost: self.holding_cost.or(fallback.holding_cost),
        }
    }

    pub fn complete(&self) -> Option<EoqInputs> {
        Some(EoqInputs {
            annual_demand: self.annual_demand?,
            ordering_cost: self.ordering_cost?,
            holding_cost: self.holding_cost?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplenishmentConfig {
    pub stock_basis: StockBasis,
    pub default_eoq: EoqSettings,
    pub eoq_overrides: HashMap<ProductId, EoqSettings>,
}

impl ReplenishmentConfig {
    /// EOQ inputs for a product: override, then catalog, then default.
    pub fn eoq_inputs(&self, product_id: ProductId, catalog: EoqSettings) -> Option<EoqInputs> {
        self.eoq_overrides
            .get(&product_id)
            .copied()
            .unwrap_or_default()
            .or(catalog)
            .or(self.default_eoq)
            .complete()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind_addr: String,
    /// JSON seed for the in-memory collaborators.
    pub seed_file: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            seed_file: None,
        }
    }
}

impl ScmConfig {
    /// Load from `STOCKPACT_CONFIG` (if set) and apply env overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => {
                let path = PathBuf::from(path);
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                Self::from_json(&raw).with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Apply per-field overrides; `lookup` is `std::env::var` outside tests.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(addr) = lookup("STOCKPACT_BIND_ADDR") {
            self.api.bind_addr = addr;
        }
        if let Some(basis) = lookup("STOCKPACT_STOCK_BASIS") {
            self.replenishment.stock_basis = match basis.trim() {
                "on_hand" => StockBasis::OnHand,
                "atp" => StockBasis::Atp,
                other => anyhow::bail!("STOCKPACT_STOCK_BASIS must be on_hand or atp, got '{other}'"),
            };
        }
        if let Some(seed) = lookup("STOCKPACT_SEED_FILE") {
            self.api.seed_file = Some(PathBuf::from(seed));
        }
        Ok(())
    }

    pub fn validate(&self) -> DomainResult<()> {
        self.risk.validate()?;
        self.rfq.validate()?;
        if self.api.bind_addr.trim().is_empty() {
            return Err(DomainError::validation("api.bind_addr cannot be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ScmConfig::default();
        config.validate().unwrap();
        assert_eq!(config.risk.weights.on_time, 0.35);
        assert_eq!(config.risk.thresholds.critical, 75.0);
        assert_eq!(config.rfq.weights.price, 0.40);
        assert_eq!(config.rfq.default_vendor_rating, 3.0);
        assert_eq!(config.api.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.replenishment.stock_basis, StockBasis::OnHand);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = ScmConfig::from_json(
            r#"{ "replenishment": { "stock_basis": "atp" }, "risk": { "neutral_signal": 40 } }"#,
        )
        .unwrap();
        assert_eq!(config.replenishment.stock_basis, StockBasis::Atp);
        assert_eq!(config.risk.neutral_signal, 40.0);
        assert_eq!(config.risk.trailing_window_days, 365);
    }

    #[test]
    fn env_overrides_win() {
        let mut config = ScmConfig::default();
        config
            .apply_env(|key| match key {
                "STOCKPACT_BIND_ADDR" => Some("127.0.0.1:9000".to_string()),
                "STOCKPACT_STOCK_BASIS" => Some("atp".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.api.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.replenishment.stock_basis, StockBasis::Atp);

        let err = config.apply_env(|key| (key == "STOCKPACT_STOCK_BASIS").then(|| "fifo".to_string()));
        assert!(err.is_err());
    }

    #[test]
    fn unbalanced_weights_fail_validation() {
        let config = ScmConfig::from_json(r#"{ "rfq": { "weights": { "price": 0.9 } } }"#).unwrap();
        assert!(matches!(config.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn eoq_inputs_resolve_override_then_catalog_then_default() {
        let product = ProductId::new();
        let mut config = ReplenishmentConfig {
            default_eoq: EoqSettings {
                annual_demand: Some(100.0),
                ordering_cost: Some(10.0),
                holding_cost: Some(HoldingCost::PerUnit { amount: 1.0 }),
            },
            ..ReplenishmentConfig::default()
        };
        let catalog = EoqSettings {
            annual_demand: Some(1200.0),
            ..EoqSettings::default()
        };

        let inputs = config.eoq_inputs(product, catalog).unwrap();
        assert_eq!((inputs.annual_demand, inputs.ordering_cost), (1200.0, 10.0));

        config.eoq_overrides.insert(
            product,
            EoqSettings {
                ordering_cost: Some(50.0),
                ..EoqSettings::default()
            },
        );
        let inputs = config.eoq_inputs(product, catalog).unwrap();
        assert_eq!((inputs.annual_demand, inputs.ordering_cost), (1200.0, 50.0));

        config.default_eoq = EoqSettings::default();
        assert!(config.eoq_inputs(ProductId::new(), EoqSettings::default()).is_none());
    }
}
