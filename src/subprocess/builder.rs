use std::collections::HashMap;
use std::time::Duration;

use crate::subprocess::ProcessCommand;
use crate::variables::EnvPair;

pub struct ProcessCommandBuilder {
    command: ProcessCommand,
}

impl ProcessCommandBuilder {
    pub fn new(program: &str) -> Self {
        Self {
            command: ProcessCommand {
                program: program.to_string(),
                args: Vec::new(),
                env: Vec::new(),
                timeout: None,
                stdin: None,
            },
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.command.args.push(arg.to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.command
            .args
            .extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.command.env.push(EnvPair::new(key, value));
        self
    }

    /// Append environment pairs in order; later duplicates win at spawn
    pub fn envs<I>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = EnvPair>,
    {
        self.command.env.extend(pairs);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.command.timeout = Some(timeout);
        self
    }

    pub fn stdin(mut self, input: String) -> Self {
        self.command.stdin = Some(input);
        self
    }

    pub fn build(self) -> ProcessCommand {
        self.command
    }
}

impl ProcessCommand {
    /// Effective environment overrides, last occurrence of a key winning
    pub fn env_map(&self) -> HashMap<&str, &str> {
        self.env
            .iter()
            .map(|pair| (pair.key.as_str(), pair.value.as_str()))
            .collect()
    }
}
