use anyhow::anyhow;
use serde::Serialize;
use std::fmt;

use crate::error::Result;

/// One of the three reentrancy attacks the harness can replay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    Withdraw,
    Reinvest,
    Claim,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 3] = [Self::Withdraw, Self::Reinvest, Self::Claim];

    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "withdraw" => Ok(Self::Withdraw),
            "reinvest" => Ok(Self::Reinvest),
            "claim" | "claim_erc20" | "claim-erc20" => Ok(Self::Claim),
            _ => Err(anyhow!("unsupported scenario: {raw}").into()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Withdraw => "withdraw",
            Self::Reinvest => "reinvest",
            Self::Claim => "claim",
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScenarioSelection {
    All,
    Only(ScenarioKind),
}

impl ScenarioSelection {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        ScenarioKind::parse(raw).map(Self::Only)
    }

    pub fn kinds(&self) -> Vec<ScenarioKind> {
        match self {
            Self::All => ScenarioKind::ALL.to_vec(),
            Self::Only(kind) => vec![*kind],
        }
    }
}

/// What an attacker does with the revert of its nested call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureMode {
    /// Re-throw the nested revert data so the outer call fails too.
    #[default]
    Propagate,
    /// Record the nested failure and return normally.
    Absorb,
}

impl FailureMode {
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "propagate" | "rethrow" => Ok(Self::Propagate),
            "absorb" | "swallow" => Ok(Self::Absorb),
            _ => Err(anyhow!("unsupported scenarios.failure_mode: {raw}").into()),
        }
    }

    pub fn absorbs(&self) -> bool {
        matches!(self, Self::Absorb)
    }
}
