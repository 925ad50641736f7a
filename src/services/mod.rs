pub mod logger;
pub mod report;
pub mod validation;
