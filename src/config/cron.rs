//! Standard five-field cron expressions and `@` descriptors
//!
//! Field grammar is delegated to `croner`; descriptors and `@every` are
//! handled here.

use croner::Cron;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CronError {
    #[error("expected exactly 5 fields, found {0}")]
    FieldCount(usize),

    #[error("unrecognized descriptor: {0}")]
    UnknownDescriptor(String),

    #[error("invalid duration '{value}': {reason}")]
    InvalidEvery { value: String, reason: String },

    #[error("failed to parse '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },
}

/// A validated schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CronSchedule {
    /// Five-field expression, descriptors expanded
    Pattern(String),
    Every(Duration),
}

impl CronSchedule {
    pub fn parse(expression: &str) -> Result<Self, CronError> {
        let expression = expression.trim();
        if let Some(descriptor) = expression.strip_prefix('@') {
            return parse_descriptor(descriptor);
        }
        parse_pattern(expression)
    }
}

impl FromStr for CronSchedule {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CronSchedule::Pattern(pattern) => f.write_str(pattern),
            CronSchedule::Every(every) => {
                write!(f, "@every {}", humantime::format_duration(*every))
            }
        }
    }
}

fn parse_descriptor(descriptor: &str) -> Result<CronSchedule, CronError> {
    let expansion = match descriptor {
        "yearly" | "annually" => "0 0 1 1 *",
        "monthly" => "0 0 1 * *",
        "weekly" => "0 0 * * 0",
        "daily" | "midnight" => "0 0 * * *",
        "hourly" => "0 * * * *",
        _ => {
            let Some(value) = descriptor.strip_prefix("every ") else {
                return Err(CronError::UnknownDescriptor(format!("@{descriptor}")));
            };
            return parse_every(value.trim()).map(CronSchedule::Every);
        }
    };
    parse_pattern(expansion)
}

fn parse_every(value: &str) -> Result<Duration, CronError> {
    let every = humantime::parse_duration(value).map_err(|e| CronError::InvalidEvery {
        value: value.to_string(),
        reason: e.to_string(),
    })?;
    if every.is_zero() {
        return Err(CronError::InvalidEvery {
            value: value.to_string(),
            reason: "duration must be positive".to_string(),
        });
    }
    Ok(every)
}

// The field count is checked here so a seconds field is never accepted.
fn parse_pattern(expression: &str) -> Result<CronSchedule, CronError> {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    if fields.len() != 5 {
        return Err(CronError::FieldCount(fields.len()));
    }

    let pattern = fields.join(" ");
    Cron::new(&pattern)
        .parse()
        .map_err(|e| CronError::InvalidExpression {
            expression: pattern.clone(),
            reason: e.to_string(),
        })?;
    Ok(CronSchedule::Pattern(pattern))
}
