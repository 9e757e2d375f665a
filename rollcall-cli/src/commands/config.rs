//! Config discovery and secret resolution for every command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use rollcall_core::{Config, EnvSecretResolver, FileSecretResolver, SecretResolver};

pub const CONFIG_ENV: &str = "ROLLCALL_CONFIG";
pub const SECRETS_DIR_ENV: &str = "ROLLCALL_SECRETS_DIR";

const FILE_NAME: &str = "rollcall.yaml";

/// `$ROLLCALL_CONFIG`, else `./rollcall.yaml`, else the per-user config dir.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    let local = PathBuf::from(FILE_NAME);
    if local.exists() {
        return local;
    }
    dirs::config_dir()
        .map(|dir| dir.join("rollcall").join(FILE_NAME))
        .filter(|path| path.exists())
        .unwrap_or(local)
}

/// Load, validate and resolve secrets.
pub fn load() -> Result<Config> {
    let path = config_path();
    let config = Config::load_at(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;

    let resolver: Box<dyn SecretResolver> = match std::env::var_os(SECRETS_DIR_ENV) {
        Some(dir) => Box::new(FileSecretResolver::new(dir)),
        None => Box::new(EnvSecretResolver::default()),
    };
    config
        .resolve_secrets(resolver.as_ref())
        .context("failed to resolve config secrets")
}
