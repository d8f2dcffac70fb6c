use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Upper bound on distinct characters accepted by a single `/chars/` request.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_chars: default_max_chars(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:9081".to_string()
}

fn default_max_chars() -> usize {
    128
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_url")]
    pub url: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_shallow")]
    pub shallow: bool,
    /// Where the upstream checkout lives. Defaults to a hashed directory
    /// next to the database file.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// The upstream project's own build tool, run inside the checkout.
    #[serde(default = "default_build_command")]
    pub build_command: Vec<String>,
    /// Path of the database the build tool produces, relative to the checkout.
    #[serde(default = "default_artifact")]
    pub artifact: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            branch: default_branch(),
            shallow: default_shallow(),
            cache_dir: None,
            build_command: default_build_command(),
            artifact: default_artifact(),
        }
    }
}

fn default_upstream_url() -> String {
    "https://github.com/osfans/MCPDict.git".to_string()
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_shallow() -> bool {
    true
}

fn default_build_command() -> Vec<String> {
    vec!["python3".to_string(), "main.py".to_string()]
}

fn default_artifact() -> String {
    "mcpdict.db".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.server.bind.is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    if config.server.max_chars == 0 {
        anyhow::bail!("server.max_chars must be >= 1");
    }

    if config.upstream.url.is_empty() {
        anyhow::bail!("upstream.url must not be empty");
    }

    if config.upstream.build_command.is_empty() {
        anyhow::bail!("upstream.build_command must not be empty");
    }

    if config.upstream.artifact.is_empty() {
        anyhow::bail!("upstream.artifact must not be empty");
    }

    Ok(config)
}
