//! Application configuration
//!
//! Runtime options that come from the command line rather than from a
//! configuration document.

use crate::subprocess::{ShellExecutor, SubprocessManager, COMMAND_TIMEOUT};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Verbosity level for logging
    pub verbose: u8,
    /// Interpreter for `{% %}` commands; `$SHELL` when unset
    pub shell: Option<String>,
    /// Ceiling on a single command's run time
    pub command_timeout: Duration,
}

impl AppConfig {
    pub fn new(verbose: u8) -> Self {
        Self {
            verbose,
            ..Self::default()
        }
    }

    pub fn with_shell(mut self, shell: Option<String>) -> Self {
        self.shell = shell;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Get the log filter based on verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace,hyper=debug",
        }
    }

    /// Shell executor configured with these options
    pub fn shell_executor(&self) -> Arc<ShellExecutor> {
        let mut executor = SubprocessManager::production()
            .shell()
            .with_timeout(self.command_timeout);
        if let Some(shell) = &self.shell {
            executor = executor.with_shell(shell.clone());
        }
        Arc::new(executor)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            verbose: 0,
            shell: None,
            command_timeout: COMMAND_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_follows_verbosity() {
        assert_eq!(AppConfig::new(0).log_level(), "warn");
        assert_eq!(AppConfig::new(1).log_level(), "info");
        assert_eq!(AppConfig::new(2).log_level(), "debug");
        assert_eq!(AppConfig::new(5).log_level(), "trace,hyper=debug");
    }

    #[test]
    fn test_shell_executor_uses_options() {
        let config = AppConfig::default()
            .with_shell(Some("/bin/bash".to_string()))
            .with_command_timeout(Duration::from_secs(3));
        let executor = config.shell_executor();
        assert_eq!(executor.timeout(), Duration::from_secs(3));
        assert_eq!(executor.resolve_shell(), "/bin/bash");
    }
}
