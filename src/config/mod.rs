use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConfigFile {
    #[serde(alias = "api")]
    pub api_url: Option<String>,
    pub timeout: Option<u64>,
    pub proxy: Option<String>,
    pub header: Option<String>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub storage: Option<String>,
    pub iiq_url: Option<String>,
    pub google_admin_url: Option<String>,
    pub trusted_wan_prefix: Option<String>,
    pub no_color: Option<bool>,
    pub widgets: Option<bool>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

fn app_dir() -> Option<PathBuf> {
    Some(home_dir()?.join(".fleetview"))
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(app_dir()?.join("config.yml"))
}

/// Client-side key/value state; falls back to the working directory without a home.
pub fn default_storage_path() -> PathBuf {
    app_dir()
        .map(|dir| dir.join("storage.json"))
        .unwrap_or_else(|| PathBuf::from(".fleetview-storage.json"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn expand_tilde_string(path: &str) -> String {
    expand_tilde(path).to_string_lossy().to_string()
}

pub fn parse_config(contents: &str, origin: &Path) -> Result<ConfigFile, String> {
    // An all-comment file is an empty YAML document.
    if contents.lines().all(|l| {
        let l = l.trim();
        l.is_empty() || l.starts_with('#')
    }) {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str::<ConfigFile>(contents)
        .map_err(|e| format!("failed to parse config '{}': {e}", origin.display()))
}

pub fn load_config(path: &Path, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents, path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

fn default_config_yaml() -> String {
    r#"# Fleetview config
#
# Location (default):
#   ~/.fleetview/config.yml
#
# Every key is optional. Command-line flags take precedence.

# Backend
# api_url: http://127.0.0.1:8000
# timeout: 30
# proxy: http://127.0.0.1:8080
# header: "Authorization: Bearer <token>"

# Output (optional)
# output: ./dashboard.html
# output_format: html

# Client-side state (search history, hero panel)
# storage: ~/.fleetview/storage.json

# Outbound links
# iiq_url: https://crsd.incidentiq.com
# google_admin_url: https://admin.google.com

# WAN addresses outside this prefix are highlighted on device cards.
# trusted_wan_prefix: "167"

# Load the AUE and security widgets on startup
# widgets: true

# Output styling
# no_color: false
"#
    .to_string()
}

pub fn ensure_default_config_file(path: &Path) -> Result<(), String> {
    if path.exists() {
        return Ok(());
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    let contents = default_config_yaml();
    std::fs::write(path, contents)
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    log::info!("wrote default config to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_keys() {
        let cfg = parse_config(
            "api_url: https://inventory.example.org\ntimeout: 15\nwidgets: false\ntrusted_wan_prefix: \"10.\"\n",
            Path::new("test.yml"),
        )
        .unwrap();
        assert_eq!(cfg.api_url.as_deref(), Some("https://inventory.example.org"));
        assert_eq!(cfg.timeout, Some(15));
        assert_eq!(cfg.widgets, Some(false));
        assert_eq!(cfg.trusted_wan_prefix.as_deref(), Some("10."));
        assert!(cfg.proxy.is_none());
    }

    #[test]
    fn default_template_parses_as_empty() {
        let cfg = parse_config(&default_config_yaml(), Path::new("default.yml")).unwrap();
        assert_eq!(cfg, ConfigFile::default());
    }

    #[test]
    fn bad_yaml_reports_path() {
        let err = parse_config("timeout: [1, 2", Path::new("broken.yml")).unwrap_err();
        assert!(err.contains("broken.yml"));
    }

    #[test]
    fn missing_file_handling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.yml");
        assert_eq!(load_config(&path, true).unwrap(), ConfigFile::default());
        assert!(load_config(&path, false).unwrap_err().contains("not found"));
    }

    #[test]
    fn writes_default_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yml");
        ensure_default_config_file(&path).unwrap();
        assert!(path.exists());
        std::fs::write(&path, "timeout: 5\n").unwrap();
        ensure_default_config_file(&path).unwrap();
        assert_eq!(load_config(&path, false).unwrap().timeout, Some(5));
    }
}
