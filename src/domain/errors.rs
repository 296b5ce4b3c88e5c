use thiserror::Error;

use crate::domain::entities::pillar::Pillar;

/// Errors raised inside the scoring core.
///
/// None of these abort a scoring run: history problems exclude a pillar,
/// malformed records are dropped at ingestion.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Insufficient history for {pillar}: need {required} samples, have {available}")]
    InsufficientHistory {
        pillar: Pillar,
        required: usize,
        available: usize,
    },

    #[error("Degenerate baseline for {pillar}: standard deviation {std_dev}")]
    DegenerateBaseline { pillar: Pillar, std_dev: f64 },

    #[error("Malformed {kind} record: {reason}")]
    MalformedRecord { kind: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl ScoringError {
    pub fn malformed(kind: &str, reason: impl Into<String>) -> Self {
        ScoringError::MalformedRecord {
            kind: kind.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors that only degrade a company's composite.
    pub fn is_degradation(&self) -> bool {
        matches!(
            self,
            ScoringError::InsufficientHistory { .. } | ScoringError::DegenerateBaseline { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_history_message() {
        let err = ScoringError::InsufficientHistory {
            pillar: Pillar::Patents,
            required: 5,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient history for patents: need 5 samples, have 2"
        );
        assert!(err.is_degradation());
    }

    #[test]
    fn test_malformed_record_is_not_degradation() {
        let err = ScoringError::malformed("award", "missing amount_usd");
        assert_eq!(err.to_string(), "Malformed award record: missing amount_usd");
        assert!(!err.is_degradation());
    }
}
