use std::path::PathBuf;
use std::time::Duration;

/// Environment variables understood by xray-manager.
#[derive(Debug, Clone, Copy)]
pub enum EnvVar {
    Home,
    ReleaseUrl,
    StopTimeoutMs,
    GraceMs,
}

impl EnvVar {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvVar::Home => "XRAY_MANAGER_HOME",
            EnvVar::ReleaseUrl => "XRAY_MANAGER_RELEASE_URL",
            EnvVar::StopTimeoutMs => "XRAY_MANAGER_STOP_TIMEOUT_MS",
            EnvVar::GraceMs => "XRAY_MANAGER_GRACE_MS",
        }
    }
}

const FALLBACK_DATA_DIR: &str = "~/.local/share";
const APP_SUBDIR: &str = "xray-manager";
const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(500);

/// Non-empty value of an environment variable.
fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_millis(var: EnvVar) -> Option<Duration> {
    env_opt(var.as_str())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Support directory ($XRAY_MANAGER_HOME or ~/.local/share/xray-manager)
pub fn support_dir() -> PathBuf {
    let dir = env_opt(EnvVar::Home.as_str())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from(FALLBACK_DATA_DIR))
                .join(APP_SUBDIR)
        });
    tracing::trace!(dir = %dir.display(), "Resolved support directory");
    dir
}

/// Release index override ($XRAY_MANAGER_RELEASE_URL)
pub fn release_url_override() -> Option<String> {
    let val = env_opt(EnvVar::ReleaseUrl.as_str());
    tracing::trace!(value = ?val, "Release URL override");
    val
}

/// Upper bound for a graceful stop ($XRAY_MANAGER_STOP_TIMEOUT_MS or 5s)
pub fn stop_timeout() -> Duration {
    let timeout = env_millis(EnvVar::StopTimeoutMs).unwrap_or(DEFAULT_STOP_TIMEOUT);
    tracing::trace!(timeout = ?timeout, "Stop timeout");
    timeout
}

/// Grace period before force-killing an orphan ($XRAY_MANAGER_GRACE_MS or 500ms)
pub fn grace_period() -> Duration {
    let grace = env_millis(EnvVar::GraceMs).unwrap_or(DEFAULT_GRACE_PERIOD);
    tracing::trace!(grace = ?grace, "Orphan grace period");
    grace
}
