pub mod models;
pub mod schedule;
pub mod strict_mode;
