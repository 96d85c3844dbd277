//! Configuration Vault – reads/writes `~/.cobotlink/config.toml`.

use cobotlink_bridge::ClientConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted user configuration stored in `~/.cobotlink/config.toml`.
///
/// ```toml
/// snapshot_dir = "."
///
/// [bridge]
/// host = "192.168.1.42"
/// port = 9090
/// ready_log_interval_ms = 3000
/// connect_timeout_ms = 10000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory `/save` writes scene snapshots into when given a bare
    /// file name.
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: String,

    /// rosbridge connection settings.
    #[serde(default)]
    pub bridge: ClientConfig,
}

fn default_snapshot_dir() -> String {
    ".".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot_dir: default_snapshot_dir(),
            bridge: ClientConfig::default(),
        }
    }
}

impl Config {
    /// Resolve a `/save` target: relative paths land in `snapshot_dir`.
    pub fn snapshot_path(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            Path::new(&self.snapshot_dir).join(path)
        }
    }
}

/// Return the path to `~/.cobotlink/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".cobotlink").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `COBOTLINK_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `COBOTLINK_HOST` | `bridge.host` |
/// | `COBOTLINK_PORT` | `bridge.port` |
/// | `COBOTLINK_READY_TIMEOUT_SECS` | `bridge.ready_timeout_ms` (seconds; `0` disables) |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("COBOTLINK_HOST") {
        cfg.bridge.host = v;
    }
    if let Ok(v) = std::env::var("COBOTLINK_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.bridge.port = port;
    }
    if let Ok(v) = std::env::var("COBOTLINK_READY_TIMEOUT_SECS")
        && let Ok(secs) = v.parse::<u64>()
    {
        cfg.bridge.ready_timeout_ms = (secs > 0).then(|| secs.saturating_mul(1_000));
    }
}

/// Save the config to disk, creating `~/.cobotlink/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.bridge.port, 9090);
        assert_eq!(loaded.bridge.ready_log_interval_ms, 3_000);
        assert_eq!(loaded.snapshot_dir, ".");
    }

    #[test]
    fn parses_bridge_table() {
        let cfg: Config = toml::from_str(
            r#"
            snapshot_dir = "/tmp/frames"

            [bridge]
            host = "192.168.1.42"
            ready_timeout_ms = 20000
            "#,
        )
        .unwrap();
        assert_eq!(cfg.bridge.url(), "ws://192.168.1.42:9090");
        assert_eq!(cfg.bridge.ready_timeout_ms, Some(20_000));
        assert_eq!(cfg.snapshot_path("a.png"), PathBuf::from("/tmp/frames/a.png"));
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let file_mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
        let dir_mode = std::fs::metadata(path.parent().unwrap()).unwrap().permissions().mode() & 0o777;
        assert_eq!(dir_mode, 0o700);
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn config_path_points_to_cobotlink_dir() {
        let p = config_path_for_home("/home/operator");
        assert!(p.to_string_lossy().contains(".cobotlink"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    // The env-var tests below share process state, so each touches a
    // distinct variable.

    #[test]
    fn apply_env_overrides_changes_host() {
        // SAFETY: no other test reads or writes COBOTLINK_HOST.
        unsafe { std::env::set_var("COBOTLINK_HOST", "10.0.0.7") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.bridge.host, "10.0.0.7");
        unsafe { std::env::remove_var("COBOTLINK_HOST") };
    }

    #[test]
    fn apply_env_overrides_ignores_invalid_port() {
        // SAFETY: no other test reads or writes COBOTLINK_PORT.
        unsafe { std::env::set_var("COBOTLINK_PORT", "not-a-port") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.bridge.port, 9090);
        unsafe { std::env::remove_var("COBOTLINK_PORT") };
    }

    #[test]
    fn apply_env_overrides_zero_timeout_waits_forever() {
        // SAFETY: no other test reads or writes COBOTLINK_READY_TIMEOUT_SECS.
        unsafe { std::env::set_var("COBOTLINK_READY_TIMEOUT_SECS", "0") };
        let mut cfg = Config::default();
        cfg.bridge.ready_timeout_ms = Some(5_000);
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.bridge.ready_timeout_ms, None);
        unsafe { std::env::remove_var("COBOTLINK_READY_TIMEOUT_SECS") };
    }
}
