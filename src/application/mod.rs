pub mod blocklist_editor;
pub mod bootstrap;
pub mod clock;
pub mod engine;
pub mod listener;
pub mod schedule_sync;
pub mod session_presence;
pub mod session_store;
pub mod siren_detection;
pub mod strict_mode;
