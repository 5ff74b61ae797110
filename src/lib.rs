pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
mod testing;

pub use application::blocklist_editor::{BlocklistEditError, BlocklistEditor};
pub use application::bootstrap::{bootstrap_workspace, BootstrapResult};
pub use application::engine::{BlockingEngine, EngineHandle, EnginePorts};
pub use application::session_store::{BlockSessionStore, EngineSnapshot, StoreError};
pub use application::strict_mode::{StrictModeError, StrictModeService, StrictModeStatus};
pub use domain::models::{
    AndroidSiren, BlockSession, BlockingSchedule, Blocklist, Device, LockedSirens, SirenKind,
    Sirens, StrictModeTimer,
};
pub use domain::strict_mode::{TimeLeft, TimerDuration};
pub use infrastructure::error::InfraError;
pub use infrastructure::logger::init_tracing;
