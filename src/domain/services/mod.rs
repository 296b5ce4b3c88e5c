pub mod activity_window;
pub mod ingestion;
pub mod scoring;
pub mod signal_scoring;
