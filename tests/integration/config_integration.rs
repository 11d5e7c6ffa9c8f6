//! Layered configuration loading.

use cmdexec::config::ConfigLoader;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Points HOME at an empty directory and restores the environment on drop.
struct EnvGuard {
    saved: Vec<(&'static str, Option<std::ffi::OsString>)>,
}

impl EnvGuard {
    fn isolate(home: &Path) -> Self {
        let keys = [
            "HOME",
            "XDG_CONFIG_HOME",
            "CMDEXEC_ENV",
            "CMDEXEC__EXECUTION__FORK_LIMIT",
        ];
        let saved = keys.iter().map(|k| (*k, std::env::var_os(k))).collect();
        for key in keys {
            std::env::remove_var(key);
        }
        std::env::set_var("HOME", home);
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..) {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }
}

fn write_workspace_config(workspace: &Path, name: &str, body: &str) {
    let dir = workspace.join("config");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), body).unwrap();
}

#[test]
fn test_env_specific_file_overrides_base() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp = TempDir::new().unwrap();
    let _env = EnvGuard::isolate(&temp.path().join("home"));
    std::env::set_var("CMDEXEC_ENV", "ci");

    write_workspace_config(
        temp.path(),
        "config.toml",
        "[execution]\ncommand_limit = 500\nfork_limit = 8\n",
    );
    write_workspace_config(temp.path(), "ci.toml", "[execution]\ncommand_limit = 25\n");

    let config = ConfigLoader::load(temp.path()).unwrap();
    assert_eq!(config.execution.command_limit, 25);
    assert_eq!(config.execution.fork_limit, 8);
}

#[test]
fn test_environment_variables_override_files() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp = TempDir::new().unwrap();
    let _env = EnvGuard::isolate(&temp.path().join("home"));
    std::env::set_var("CMDEXEC__EXECUTION__FORK_LIMIT", "2");

    write_workspace_config(temp.path(), "config.toml", "[execution]\nfork_limit = 8\n");

    let config = ConfigLoader::load(temp.path()).unwrap();
    assert_eq!(config.execution.fork_limit, 2);
    assert_eq!(config.execution.to_limits().fork_limit, 2);
}

#[test]
fn test_invalid_workspace_config_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp = TempDir::new().unwrap();
    let _env = EnvGuard::isolate(&temp.path().join("home"));

    write_workspace_config(temp.path(), "config.toml", "[logging]\nformat = \"xml\"\n");
    assert!(ConfigLoader::load(temp.path()).is_err());
}
