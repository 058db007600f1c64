//! Shared types: configuration, errors, domain records and responses.

pub mod config;
pub mod errors;
pub mod records;
pub mod responses;
