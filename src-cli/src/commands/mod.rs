//! Command handlers. Each takes the loaded state and an output writer.

pub mod admin;
pub mod allergens;
pub mod scan;
