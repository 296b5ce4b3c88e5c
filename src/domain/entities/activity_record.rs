use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::pillar::Pillar;
use crate::domain::value_objects::company_id::CompanyId;

/// One validated observation for one company in one pillar.
///
/// Built only through the ingestion boundary; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    company: CompanyId,
    pillar: Pillar,
    magnitude: f64,
    observed_at: DateTime<Utc>,
    source: String,
    /// What distinguishes this observation from others of the same company,
    /// pillar and date: holding fund, awarding agency, patent title, ETF and
    /// direction. Empty when upstream gave nothing.
    #[serde(default)]
    reference: String,
}

impl ActivityRecord {
    pub fn new(
        company: CompanyId,
        pillar: Pillar,
        magnitude: f64,
        observed_at: DateTime<Utc>,
        source: impl Into<String>,
    ) -> Result<Self, String> {
        if !magnitude.is_finite() {
            return Err(format!("Magnitude must be finite, got {}", magnitude));
        }
        let source = source.into();
        let source = if source.trim().is_empty() {
            pillar.default_source().to_string()
        } else {
            source.trim().to_string()
        };
        Ok(ActivityRecord {
            company,
            pillar,
            magnitude,
            observed_at,
            source,
            reference: String::new(),
        })
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into().trim().to_string();
        self
    }

    pub fn company(&self) -> &CompanyId {
        &self.company
    }

    pub fn pillar(&self) -> Pillar {
        self.pillar
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Identity of the observation within (company, pillar, date, source).
    /// Awards carry no distinguishing title, so their amount is part of it.
    pub fn natural_key(&self) -> String {
        match self.pillar {
            Pillar::Awards => format!("{}|{}", self.reference, self.magnitude),
            _ => self.reference.clone(),
        }
    }
}

/// 13F holding change as delivered by the filings adapter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFiling {
    pub company: Option<String>,
    pub fund: Option<String>,
    pub position_delta_usd: Option<f64>,
    pub filed_on: Option<String>,
    pub source: Option<String>,
}

/// Government award as delivered by the awards adapter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAward {
    pub recipient: Option<String>,
    pub agency: Option<String>,
    pub amount_usd: Option<f64>,
    pub signed_on: Option<String>,
    pub program: Option<String>,
    pub source: Option<String>,
}

/// Patent grant as delivered by the patents adapter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPatent {
    pub assignee: Option<String>,
    pub title: Option<String>,
    pub published_on: Option<String>,
    /// Number of grants in this row; one when absent
    pub count: Option<u32>,
    pub source: Option<String>,
}

/// ETF trade disclosure as delivered by the ETF adapter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEtfTrade {
    pub ticker: Option<String>,
    pub company: Option<String>,
    pub etf: Option<String>,
    pub direction: Option<String>,
    pub value_usd: Option<f64>,
    pub traded_on: Option<String>,
    pub source: Option<String>,
}

/// Tagged upstream record, one variant per pillar
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawActivity {
    Filing(RawFiling),
    Award(RawAward),
    Patent(RawPatent),
    EtfTrade(RawEtfTrade),
}

impl RawActivity {
    pub fn kind(&self) -> &'static str {
        match self {
            RawActivity::Filing(_) => "filing",
            RawActivity::Award(_) => "award",
            RawActivity::Patent(_) => "patent",
            RawActivity::EtfTrade(_) => "etf_trade",
        }
    }

    pub fn pillar(&self) -> Pillar {
        match self {
            RawActivity::Filing(_) => Pillar::Filings,
            RawActivity::Award(_) => Pillar::Awards,
            RawActivity::Patent(_) => Pillar::Patents,
            RawActivity::EtfTrade(_) => Pillar::Etf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_activity_record_rejects_non_finite_magnitude() {
        let company = CompanyId::new("ACME").unwrap();
        let result = ActivityRecord::new(company, Pillar::Awards, f64::NAN, ts(), "USAspending");
        assert!(result.is_err());
    }

    #[test]
    fn test_activity_record_defaults_blank_source() {
        let company = CompanyId::new("ACME").unwrap();
        let record = ActivityRecord::new(company, Pillar::Patents, 2.0, ts(), " ").unwrap();
        assert_eq!(record.source(), "PatentsView");
        assert_eq!(record.pillar(), Pillar::Patents);
        assert_eq!(record.magnitude(), 2.0);
        assert_eq!(record.reference(), "");
    }

    #[test]
    fn test_activity_record_reference_is_trimmed() {
        let company = CompanyId::new("IBM").unwrap();
        let record = ActivityRecord::new(company, Pillar::Patents, 1.0, ts(), "")
            .unwrap()
            .with_reference("  Quantum error correction ");
        assert_eq!(record.reference(), "Quantum error correction");
        assert_eq!(record.natural_key(), "Quantum error correction");
    }

    #[test]
    fn test_award_natural_key_includes_amount() {
        let company = CompanyId::new("ACME").unwrap();
        let small = ActivityRecord::new(company.clone(), Pillar::Awards, 1.0e6, ts(), "")
            .unwrap()
            .with_reference("DOD");
        let large = ActivityRecord::new(company, Pillar::Awards, 2.5e6, ts(), "")
            .unwrap()
            .with_reference("DOD");
        assert_ne!(small.natural_key(), large.natural_key());
    }

    #[test]
    fn test_raw_activity_tagged_deserialization() {
        let raw: RawActivity = serde_json::from_str(
            r#"{"kind":"etf_trade","ticker":"TSLA","etf":"ARKK","direction":"buy","value_usd":1200.5,"traded_on":"2024-03-01"}"#,
        )
        .unwrap();
        assert_eq!(raw.kind(), "etf_trade");
        assert_eq!(raw.pillar(), Pillar::Etf);
        match raw {
            RawActivity::EtfTrade(trade) => {
                assert_eq!(trade.ticker.as_deref(), Some("TSLA"));
                assert_eq!(trade.value_usd, Some(1200.5));
                assert!(trade.company.is_none());
            }
            other => panic!("unexpected variant {:?}", other),
        }
    }
}
