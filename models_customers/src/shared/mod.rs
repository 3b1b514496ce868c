//! Shared types used across the db, service and api layers

pub mod calendar_date;
pub mod data_type;

pub use calendar_date::parse_calendar_date;
pub use data_type::DataType;
