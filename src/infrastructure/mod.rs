pub mod auth;
pub mod config;
pub mod date_provider;
pub mod error;
pub mod foreground_service;
pub mod logger;
pub mod siren_lookout;
pub mod siren_tier;
pub mod storage;
pub mod timer_repository;
