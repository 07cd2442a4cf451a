//! Engine configuration.
//!
//! The observed interface exposes no fee parameter; whether the original
//! contract charges one is undetermined, so the fee rate is configurable and
//! defaults to zero.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const BPS_DENOMINATOR: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Swap fee in basis points, taken on the input side and retained by the
    /// pool. 0 = fee-less constant product.
    #[serde(default)]
    pub fee_bps: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { fee_bps: 0 }
    }
}

impl EngineConfig {
    /// Loads configuration from a TOML file, applying defaults for missing
    /// fields.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading engine config from {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("parsing engine config from {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.fee_bps < BPS_DENOMINATOR,
            "fee_bps must be below {}, got {}",
            BPS_DENOMINATOR,
            self.fee_bps
        );
        Ok(())
    }
}
