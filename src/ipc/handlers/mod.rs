pub mod analytics;
pub mod banks;
pub mod core;
pub mod evaluation;
pub mod reports;
pub mod responses;
