//! Environment configuration.

use std::env;
use std::path::PathBuf;

pub const SESSION_DIR_ENV_VAR: &str = "AGENT_SESSION_DIR";
pub const LOG_FILTER_ENV_VAR: &str = "AGENT_SESSION_LOG";
pub const DEBUG_ENV_VAR: &str = "AGENT_SESSION_DEBUG";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    pub sessions_dir: Option<PathBuf>,
    pub log_filter: Option<String>,
    pub debug: bool,
}

impl SessionConfig {
    pub fn from_env() -> Self {
        Self {
            sessions_dir: env_string_opt(SESSION_DIR_ENV_VAR).map(PathBuf::from),
            log_filter: env_string_opt(LOG_FILTER_ENV_VAR),
            debug: env_flag(DEBUG_ENV_VAR),
        }
    }

    /// Filter directive handed to the tracing subscriber.
    ///
    /// An explicit filter wins over the debug flag.
    #[must_use]
    pub fn log_directive(&self) -> String {
        match &self.log_filter {
            Some(filter) => filter.clone(),
            None if self.debug => "debug".to_string(),
            None => "warn".to_string(),
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{SessionConfig, DEBUG_ENV_VAR, LOG_FILTER_ENV_VAR, SESSION_DIR_ENV_VAR};
    use std::env;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    #[test]
    fn env_defaults_are_empty() {
        let _lock = env_lock();
        let _g1 = set_env_guard(SESSION_DIR_ENV_VAR, None);
        let _g2 = set_env_guard(LOG_FILTER_ENV_VAR, None);
        let _g3 = set_env_guard(DEBUG_ENV_VAR, None);

        let config = SessionConfig::from_env();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.log_directive(), "warn");
    }

    #[test]
    fn env_values_are_read() {
        let _lock = env_lock();
        let _g1 = set_env_guard(SESSION_DIR_ENV_VAR, Some("/tmp/conversations"));
        let _g2 = set_env_guard(LOG_FILTER_ENV_VAR, Some("session_runner=trace"));
        let _g3 = set_env_guard(DEBUG_ENV_VAR, Some("1"));

        let config = SessionConfig::from_env();
        assert_eq!(
            config.sessions_dir,
            Some(PathBuf::from("/tmp/conversations"))
        );
        assert!(config.debug);
        assert_eq!(config.log_directive(), "session_runner=trace");
    }

    #[test]
    fn debug_flag_raises_default_level() {
        let _lock = env_lock();
        let _g1 = set_env_guard(LOG_FILTER_ENV_VAR, Some("   "));
        let _g2 = set_env_guard(DEBUG_ENV_VAR, Some("1"));

        let config = SessionConfig::from_env();
        assert!(config.log_filter.is_none());
        assert_eq!(config.log_directive(), "debug");
    }

    #[test]
    fn debug_flag_requires_exact_one() {
        let _lock = env_lock();
        let _g = set_env_guard(DEBUG_ENV_VAR, Some("true"));

        assert!(!SessionConfig::from_env().debug);
    }
}
