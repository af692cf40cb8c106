//! Xray process supervisor
//!
//! Owns the daemon's lifecycle:
//! - Startup reconciliation of orphans left by a crashed manager (`xray.pid`)
//! - Start / stop / restart-on-config-switch with bounded termination
//! - One truncate-created log file per run in `logs/`
//! - Config discovery in `configs/`
//!
//! ```text
//!            start                 spawn ok
//!  Stopped ─────────▶ Starting ─────────────▶ Running
//!     ▲                  │ spawn failed          │ stop / self-exit
//!     └──────────────────┘                       ▼
//!     └────────────────────────────────────── Stopping
//! ```

pub mod configs;
pub mod logs;
pub mod manager;
pub mod pid_record;
pub mod process;
pub mod state;

pub use configs::ConfigCatalog;
pub use logs::LogDirectory;
pub use manager::{Supervisor, SupervisorOptions};
pub use pid_record::{OrphanOutcome, PidRecordFile, ProcessRecord};
pub use state::{ServiceState, ServiceStatus};
