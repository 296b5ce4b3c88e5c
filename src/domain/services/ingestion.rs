//! Ingestion boundary
//!
//! Upstream adapters deliver loosely shaped rows. Each row is parsed into a
//! tagged [`RawActivity`] and validated into an [`ActivityRecord`]; rows that
//! fail are dropped with a warning and never abort the batch.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use tracing::{info, warn};

use crate::domain::entities::activity_record::{
    ActivityRecord, RawActivity, RawAward, RawEtfTrade, RawFiling, RawPatent,
};
use crate::domain::entities::pillar::Pillar;
use crate::domain::errors::ScoringError;
use crate::domain::value_objects::company_id::CompanyId;

/// A row that did not survive validation
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedRecord {
    pub index: usize,
    pub error: ScoringError,
}

/// Result of validating one batch
#[derive(Debug, Clone, Default)]
pub struct IngestionReport {
    pub records: Vec<ActivityRecord>,
    pub dropped: Vec<DroppedRecord>,
}

impl IngestionReport {
    pub fn accepted(&self) -> usize {
        self.records.len()
    }
}

/// Validate one tagged record
pub fn validate(raw: &RawActivity) -> Result<ActivityRecord, ScoringError> {
    match raw {
        RawActivity::Filing(filing) => validate_filing(filing),
        RawActivity::Award(award) => validate_award(award),
        RawActivity::Patent(patent) => validate_patent(patent),
        RawActivity::EtfTrade(trade) => validate_etf_trade(trade),
    }
}

/// Validate a batch of already-tagged records
pub fn ingest_batch(raw: &[RawActivity]) -> IngestionReport {
    let mut report = IngestionReport::default();
    for (index, item) in raw.iter().enumerate() {
        push_result(&mut report, index, validate(item));
    }
    log_report(&report);
    report
}

/// Parse and validate a batch of JSON rows. A row whose shape does not match
/// any pillar is dropped like any other malformed record.
pub fn ingest_json(rows: Vec<Value>) -> IngestionReport {
    let mut report = IngestionReport::default();
    for (index, row) in rows.into_iter().enumerate() {
        let result = serde_json::from_value::<RawActivity>(row)
            .map_err(|e| ScoringError::malformed("unknown", e.to_string()))
            .and_then(|raw| validate(&raw));
        push_result(&mut report, index, result);
    }
    log_report(&report);
    report
}

fn push_result(
    report: &mut IngestionReport,
    index: usize,
    result: Result<ActivityRecord, ScoringError>,
) {
    match result {
        Ok(record) => report.records.push(record),
        Err(error) => {
            warn!(index = index, reason = %error, "Dropping malformed activity record");
            report.dropped.push(DroppedRecord { index, error });
        }
    }
}

fn log_report(report: &IngestionReport) {
    info!(
        accepted = report.accepted(),
        dropped = report.dropped.len(),
        "Validated activity batch"
    );
}

fn validate_filing(filing: &RawFiling) -> Result<ActivityRecord, ScoringError> {
    const KIND: &str = "filing";
    let company = required_company(KIND, "company", filing.company.as_deref())?;
    let delta = required_amount(KIND, "position_delta_usd", filing.position_delta_usd)?;
    let observed_at = required_date(KIND, "filed_on", filing.filed_on.as_deref())?;
    let fund = trimmed(filing.fund.as_deref()).unwrap_or_default();
    build(KIND, company, Pillar::Filings, delta, observed_at, &filing.source)
        .map(|record| record.with_reference(fund))
}

fn validate_award(award: &RawAward) -> Result<ActivityRecord, ScoringError> {
    const KIND: &str = "award";
    let company = required_company(KIND, "recipient", award.recipient.as_deref())?;
    let amount = required_amount(KIND, "amount_usd", award.amount_usd)?;
    let observed_at = required_date(KIND, "signed_on", award.signed_on.as_deref())?;
    let reference = [award.agency.as_deref(), award.program.as_deref()]
        .into_iter()
        .filter_map(trimmed)
        .collect::<Vec<_>>()
        .join(" / ");
    build(KIND, company, Pillar::Awards, amount, observed_at, &award.source)
        .map(|record| record.with_reference(reference))
}

fn validate_patent(patent: &RawPatent) -> Result<ActivityRecord, ScoringError> {
    const KIND: &str = "patent";
    let company = required_company(KIND, "assignee", patent.assignee.as_deref())?;
    let title = trimmed(patent.title.as_deref())
        .ok_or_else(|| ScoringError::malformed(KIND, "missing title"))?;
    let observed_at = required_date(KIND, "published_on", patent.published_on.as_deref())?;
    let count = patent.count.unwrap_or(1);
    build(
        KIND,
        company,
        Pillar::Patents,
        f64::from(count),
        observed_at,
        &patent.source,
    )
    .map(|record| record.with_reference(title))
}

fn validate_etf_trade(trade: &RawEtfTrade) -> Result<ActivityRecord, ScoringError> {
    const KIND: &str = "etf_trade";
    // The company name joins the other pillars' rows; the ticker is a fallback
    let name = trimmed(trade.company.as_deref()).or(trimmed(trade.ticker.as_deref()));
    let company = required_company(KIND, "company or ticker", name)?;
    let value = required_amount(KIND, "value_usd", trade.value_usd)?;
    let direction = trade.direction.as_deref().map(|d| d.trim().to_ascii_lowercase());
    let sign = match direction.as_deref() {
        Some("buy") => 1.0,
        Some("sell") => -1.0,
        Some(d) => {
            return Err(ScoringError::malformed(
                KIND,
                format!("unknown direction: {}", d),
            ))
        }
        None => return Err(ScoringError::malformed(KIND, "missing direction")),
    };
    let observed_at = required_date(KIND, "traded_on", trade.traded_on.as_deref())?;
    build(
        KIND,
        company,
        Pillar::Etf,
        sign * value.abs(),
        observed_at,
        &trade.source,
    )
    .map(|record| {
        let etf = trimmed(trade.etf.as_deref()).unwrap_or_default();
        let direction = direction.unwrap_or_default();
        record.with_reference(format!("{} {}", etf, direction))
    })
}

fn trimmed(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn build(
    kind: &str,
    company: CompanyId,
    pillar: Pillar,
    magnitude: f64,
    observed_at: DateTime<Utc>,
    source: &Option<String>,
) -> Result<ActivityRecord, ScoringError> {
    let source = source.clone().unwrap_or_default();
    ActivityRecord::new(company, pillar, magnitude, observed_at, source)
        .map_err(|reason| ScoringError::malformed(kind, reason))
}

fn required_company(
    kind: &str,
    field: &str,
    value: Option<&str>,
) -> Result<CompanyId, ScoringError> {
    let value = value.ok_or_else(|| ScoringError::malformed(kind, format!("missing {}", field)))?;
    CompanyId::new(value).map_err(|_| ScoringError::malformed(kind, format!("missing {}", field)))
}

fn required_amount(kind: &str, field: &str, value: Option<f64>) -> Result<f64, ScoringError> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(ScoringError::malformed(
            kind,
            format!("{} is not finite: {}", field, v),
        )),
        None => Err(ScoringError::malformed(kind, format!("missing {}", field))),
    }
}

fn required_date(
    kind: &str,
    field: &str,
    value: Option<&str>,
) -> Result<DateTime<Utc>, ScoringError> {
    let value = value.ok_or_else(|| ScoringError::malformed(kind, format!("missing {}", field)))?;
    parse_observation_date(value)
        .ok_or_else(|| ScoringError::malformed(kind, format!("invalid {}: {}", field, value)))
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC)
pub fn parse_observation_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
