use serde::Deserialize;
use std::sync::OnceLock;

static PROJECT_CONFIG: OnceLock<ProjectConfig> = OnceLock::new();

const CONFIG_TOML: &str = include_str!("../config.toml");

#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    pub project: Project,
    pub daemon: DaemonFiles,
}

#[derive(Debug, Deserialize)]
pub struct Project {
    pub repository: String,
}

/// Files shipped in each upstream release archive.
#[derive(Debug, Deserialize)]
pub struct DaemonFiles {
    pub binary: String,
    #[serde(default)]
    pub data_files: Vec<String>,
}

impl ProjectConfig {
    pub fn get() -> &'static ProjectConfig {
        PROJECT_CONFIG
            .get_or_init(|| toml::from_str(CONFIG_TOML).expect("Failed to parse config.toml"))
    }

    /// Parse repository URL to get owner and repo name
    /// Example: "https://github.com/XTLS/Xray-core" -> ("XTLS", "Xray-core")
    pub fn parse_repository(&self) -> Option<(&str, &str)> {
        let url = self.project.repository.trim_end_matches('/');
        let mut parts = url.rsplit('/');
        let repo = parts.next().filter(|s| !s.is_empty())?;
        let owner = parts.next().filter(|s| !s.is_empty())?;
        Some((owner, repo))
    }

    /// GitHub "latest release" endpoint for the upstream repository.
    pub fn latest_release_url(&self) -> Option<String> {
        self.parse_repository().map(|(owner, repo)| {
            format!("https://api.github.com/repos/{owner}/{repo}/releases/latest")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repository() {
        let config = ProjectConfig::get();
        let (owner, repo) = config.parse_repository().unwrap();
        assert_eq!(owner, "XTLS");
        assert_eq!(repo, "Xray-core");
    }

    #[test]
    fn test_latest_release_url() {
        assert_eq!(
            ProjectConfig::get().latest_release_url().as_deref(),
            Some("https://api.github.com/repos/XTLS/Xray-core/releases/latest")
        );
    }

    #[test]
    fn test_daemon_files() {
        let daemon = &ProjectConfig::get().daemon;
        assert_eq!(daemon.binary, "xray");
        assert_eq!(daemon.data_files, vec!["geoip.dat", "geosite.dat"]);
    }
}
