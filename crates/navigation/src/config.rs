//! Environment-driven configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use gatehouse_auth::{
    ConfirmationGate, GuardPaths, PermissionConfigError, PermissionTable, RouteGuard,
};

pub const PERMISSIONS_ENV: &str = "GATEHOUSE_PERMISSIONS";
pub const LOGIN_PATH_ENV: &str = "GATEHOUSE_LOGIN_PATH";
pub const CREDENTIAL_CHANGE_PATH_ENV: &str = "GATEHOUSE_CREDENTIAL_CHANGE_PATH";
pub const HOME_PATH_ENV: &str = "GATEHOUSE_HOME_PATH";
pub const CONFIRMATION_TIMEOUT_ENV: &str = "GATEHOUSE_CONFIRMATION_TIMEOUT_SECS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a positive number of seconds, got '{value}'")]
    InvalidTimeout { var: &'static str, value: String },

    #[error("{var} must be an absolute path starting with '/', got '{value}'")]
    InvalidPath { var: &'static str, value: String },

    #[error(transparent)]
    Permissions(#[from] PermissionConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NavigationConfig {
    /// Permission table file; the builtin policy is used when unset.
    pub permissions_path: Option<PathBuf>,
    pub paths: GuardPaths,
    /// No timeout unless configured.
    pub confirmation_timeout: Option<Duration>,
}

impl NavigationConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = GuardPaths::default();
        let path_var = |var: &'static str, default: String| -> Result<String, ConfigError> {
            match lookup(var) {
                None => Ok(default),
                Some(value) if value.starts_with('/') => Ok(value),
                Some(value) => Err(ConfigError::InvalidPath { var, value }),
            }
        };

        let paths = GuardPaths {
            login: path_var(LOGIN_PATH_ENV, defaults.login)?,
            credential_change: path_var(CREDENTIAL_CHANGE_PATH_ENV, defaults.credential_change)?,
            home: path_var(HOME_PATH_ENV, defaults.home)?,
        };

        let confirmation_timeout = match lookup(CONFIRMATION_TIMEOUT_ENV) {
            None => None,
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    return Err(ConfigError::InvalidTimeout {
                        var: CONFIRMATION_TIMEOUT_ENV,
                        value,
                    });
                }
            },
        };

        Ok(Self {
            permissions_path: lookup(PERMISSIONS_ENV).map(PathBuf::from),
            paths,
            confirmation_timeout,
        })
    }

    pub fn load_table(&self) -> Result<PermissionTable, ConfigError> {
        match &self.permissions_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading permission table");
                Ok(PermissionTable::from_path(path)?)
            }
            None => {
                tracing::warn!("{PERMISSIONS_ENV} not set; using builtin permission table");
                Ok(PermissionTable::builtin()?)
            }
        }
    }

    pub fn build_guard(&self) -> Result<RouteGuard, ConfigError> {
        let table = self.load_table()?;
        Ok(RouteGuard::new(Arc::new(table), self.paths.clone()))
    }

    pub fn build_gate(&self) -> ConfirmationGate {
        match self.confirmation_timeout {
            Some(timeout) => ConfirmationGate::with_timeout(timeout),
            None => ConfirmationGate::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = NavigationConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, NavigationConfig::default());
        assert!(config.load_table().is_ok());
    }

    #[test]
    fn reads_paths_and_timeout() {
        let config = NavigationConfig::from_lookup(lookup(&[
            (LOGIN_PATH_ENV, "/signin"),
            (CREDENTIAL_CHANGE_PATH_ENV, "/account/password"),
            (CONFIRMATION_TIMEOUT_ENV, "90"),
        ]))
        .unwrap();
        assert_eq!(config.paths.login, "/signin");
        assert_eq!(config.paths.credential_change, "/account/password");
        assert_eq!(config.paths.home, "/");
        assert_eq!(config.confirmation_timeout, Some(Duration::from_secs(90)));
    }

    #[test]
    fn rejects_bad_timeout_and_relative_paths() {
        for bad in ["0", "-3", "soon"] {
            let err = NavigationConfig::from_lookup(lookup(&[(CONFIRMATION_TIMEOUT_ENV, bad)]))
                .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidTimeout { .. }));
        }

        let err =
            NavigationConfig::from_lookup(lookup(&[(HOME_PATH_ENV, "dashboard")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidPath {
                var: HOME_PATH_ENV,
                ..
            }
        ));
    }

    #[test]
    fn missing_permissions_file_is_an_error() {
        let config = NavigationConfig::from_lookup(lookup(&[(
            PERMISSIONS_ENV,
            "/definitely/not/here.json",
        )]))
        .unwrap();
        assert!(matches!(
            config.load_table(),
            Err(ConfigError::Permissions(PermissionConfigError::Io(_)))
        ));
    }
}
