pub mod aggregator;
pub mod normalizer;
pub mod weights;

pub use aggregator::{rank_results, MissingHistoryPolicy, ScoringInput, SignalScorer};
pub use normalizer::{PillarBaselines, PillarNormalizer, ZScoreNormalizer};
pub use weights::PillarWeights;
