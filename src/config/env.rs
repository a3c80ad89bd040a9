//! Environment overlay.
//!
//! A snapshot of the variables the agent consumes. Payload building reads
//! this snapshot instead of `std::env`, so tests can supply their own.

use std::path::PathBuf;

/// Host override for the shared lifecycle-manager coordinates.
pub const LC_MANAGER_HOST: &str = "lcManagerHost";
/// Host override for the discovery coordinates.
pub const LC_MANAGER_DISCOVER_HOST: &str = "lcManagerDiscoverHost";
/// Host override for the registration coordinates.
pub const LC_MANAGER_REGISTER_HOST: &str = "lcManagerRegisterHost";
/// Launch directory on the docker host; its presence marks a dockerized agent.
pub const DOCKER_PWD: &str = "DOCKER_PWD";
/// Working directory of the launching shell.
pub const PWD: &str = "PWD";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    pub lc_manager_host: Option<String>,
    pub lc_manager_discover_host: Option<String>,
    pub lc_manager_register_host: Option<String>,
    pub docker_pwd: Option<String>,
    pub pwd: Option<String>,
}

impl Environment {
    /// Load `.env` (if any) and snapshot the process environment.
    pub fn from_process() -> Self {
        load_dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a snapshot from an arbitrary lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            lc_manager_host: get(LC_MANAGER_HOST),
            lc_manager_discover_host: get(LC_MANAGER_DISCOVER_HOST),
            lc_manager_register_host: get(LC_MANAGER_REGISTER_HOST),
            docker_pwd: get(DOCKER_PWD),
            pwd: get(PWD),
        }
    }

    /// `DOCKER_PWD`, else `PWD`, else the current directory.
    pub fn launch_path(&self) -> String {
        self.docker_pwd
            .clone()
            .or_else(|| self.pwd.clone())
            .unwrap_or_else(|| current_dir().display().to_string())
    }

    pub fn dockerized(&self) -> bool {
        self.docker_pwd.is_some()
    }

    /// Directory static registration files are resolved against.
    pub fn working_dir(&self) -> PathBuf {
        self.pwd.as_ref().map(PathBuf::from).unwrap_or_else(current_dir)
    }
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(".env cannot be found");
        }
        Err(err) => tracing::warn!(error = %err, "Failed to load .env file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> Environment {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn test_launch_path_precedence() {
        let e = env(&[(DOCKER_PWD, "/host/app"), (PWD, "/app")]);
        assert_eq!(e.launch_path(), "/host/app");
        assert!(e.dockerized());

        let e = env(&[(PWD, "/app")]);
        assert_eq!(e.launch_path(), "/app");
        assert!(!e.dockerized());
        assert_eq!(e.working_dir(), PathBuf::from("/app"));
    }

    #[test]
    fn test_empty_values_are_unset() {
        let e = env(&[(LC_MANAGER_HOST, "  "), (LC_MANAGER_REGISTER_HOST, "reg")]);
        assert!(e.lc_manager_host.is_none());
        assert_eq!(e.lc_manager_register_host.as_deref(), Some("reg"));
    }
}
