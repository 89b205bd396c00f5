use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed to call the API from a browser.
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Lifetime of a login token.
    pub token_ttl_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let data_dir = project_dirs()
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("pixel-builder"));
        Self { data_dir }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_minutes: 30,
        }
    }
}

impl Config {
    pub fn database_path(&self) -> PathBuf {
        self.paths.data_dir.join("pixel_builder.sqlite3")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "pixel-builder", "pixel-builder")
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj = project_dirs().context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

fn write_private(path: &Path, raw: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    fs::write(path, raw).with_context(|| format!("write {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    Ok(())
}

pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        let cfg = Config::default();
        let raw = toml::to_string_pretty(&cfg).context("serialize default config")?;
        write_private(&path, &raw)?;
        tracing::info!("wrote default config to {}", path.display());
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg = toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let cfg = load(Some(&path)).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.auth.token_ttl_minutes, 30);
        assert_eq!(cfg.paths.data_dir, Config::default().paths.data_dir);

        let reloaded = load(Some(&path)).unwrap();
        assert_eq!(reloaded.server.host, cfg.server.host);
        assert_eq!(reloaded.paths.data_dir, cfg.paths.data_dir);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[server]\nport = 9100\n\n[auth]\ntoken_ttl_minutes = 5\n").unwrap();

        let cfg = load(Some(&path)).unwrap();
        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.cors_origins.len(), 2);
        assert_eq!(cfg.auth.token_ttl_minutes, 5);
        assert_eq!(cfg.bind_addr(), "0.0.0.0:9100");
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[server]\nport = \"eighty\"\n").unwrap();
        assert!(load(Some(&path)).is_err());
    }
}
