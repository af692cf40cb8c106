pub mod app;
pub mod clienv;
pub mod completions;
pub mod error;
pub mod fs_util;
pub mod installer;
pub mod layout;
pub mod project_config;
pub mod release_installer;
pub mod supervisor;
pub mod user_config;

#[cfg(test)]
mod test_support;

pub use app::XrayManager;
pub use error::{ManagerError, Result};
pub use installer::{InstallEvent, InstallOutcome, Installer};
pub use layout::SupportLayout;
pub use release_installer::{Extractor, GitHubReleases, ReleaseSource};
pub use supervisor::{ServiceState, ServiceStatus, Supervisor, SupervisorOptions};
