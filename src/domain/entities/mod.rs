pub mod activity_record;
pub mod company_score;
pub mod pillar;
pub mod scoring_run;
