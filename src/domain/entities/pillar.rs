use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of institutional activity signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pillar {
    /// 13F holdings changes (position delta in USD)
    Filings,
    /// Federal contract and grant awards (USD)
    Awards,
    /// Granted patents (count)
    Patents,
    /// Disclosed ETF trades (signed trade value in USD)
    Etf,
}

impl Pillar {
    pub const ALL: [Pillar; 4] = [Pillar::Filings, Pillar::Awards, Pillar::Patents, Pillar::Etf];

    pub fn as_str(&self) -> &'static str {
        match self {
            Pillar::Filings => "filings",
            Pillar::Awards => "awards",
            Pillar::Patents => "patents",
            Pillar::Etf => "etf",
        }
    }

    /// Source label used when the upstream adapter does not provide one
    pub fn default_source(&self) -> &'static str {
        match self {
            Pillar::Filings => "SEC 13F",
            Pillar::Awards => "USAspending",
            Pillar::Patents => "PatentsView",
            Pillar::Etf => "ARK",
        }
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pillar {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "filings" => Ok(Pillar::Filings),
            "awards" => Ok(Pillar::Awards),
            "patents" => Ok(Pillar::Patents),
            "etf" => Ok(Pillar::Etf),
            other => Err(format!("Unknown pillar: {}", other)),
        }
    }
}
