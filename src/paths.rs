use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Env var overriding the config/data directory
pub const CONFIG_DIR_ENV: &str = "WIRESTATE_CONFIG_DIR";

/// Files whose presence makes the working directory the config directory
const LOCAL_MARKERS: &[&str] = &["wirestate.json", "wirestate.log"];

/// Overrides for default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI args → ENV var (WIRESTATE_CONFIG_DIR) → None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from));
        Self { config_dir }
    }
}

#[derive(Clone, Copy)]
enum DirKind {
    Config,
    Data,
}

/// Path to a configuration file
///
/// Priority:
/// 1. CLI --config-dir argument
/// 2. WIRESTATE_CONFIG_DIR environment variable
/// 3. Working directory IF wirestate.json or wirestate.log exist there
/// 4. Platform config directory from dirs-next (e.g. ~/.config/wirestate)
pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    resolve_dir(config, DirKind::Config).join(name)
}

/// Path to a data file (logs); same priority, platform data directory last.
pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    resolve_dir(config, DirKind::Data).join(name)
}

/// Create the parent directory of `path` if missing.
pub fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display())),
        _ => Ok(()),
    }
}

fn has_local_markers(dir: &Path) -> bool {
    LOCAL_MARKERS.iter().any(|f| dir.join(f).exists())
}

fn resolve_dir(config: &PathConfig, kind: DirKind) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }

    if let Ok(cwd) = std::env::current_dir() {
        if has_local_markers(&cwd) {
            return cwd;
        }
    }

    let platform = match kind {
        DirKind::Config => dirs_next::config_dir(),
        DirKind::Data => dirs_next::data_dir(),
    };
    platform
        .map(|d| d.join("wirestate"))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_dir_wins() {
        let config = PathConfig::from_env_and_cli(Some(PathBuf::from("/tmp/ws")));
        assert_eq!(config_file("wirestate.json", &config), PathBuf::from("/tmp/ws/wirestate.json"));
        assert_eq!(data_file("wirestate.log", &config), PathBuf::from("/tmp/ws/wirestate.log"));
    }

    #[test]
    fn test_ensure_parent_without_dir() {
        assert!(ensure_parent(Path::new("scene.json")).is_ok());
    }
}
