pub mod quote;
pub mod report;
