pub mod baseline;
pub mod company_id;
