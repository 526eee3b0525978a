//! Configuration documents and their validation
//!
//! A document is parsed from YAML or JSON into [`Config`] and then checked
//! by a fixed schema that binds each field to its validators.

pub mod cron;
pub mod loader;
pub mod model;
pub mod schema;
pub mod validator;


pub use cron::{CronError, CronSchedule};
pub use loader::{load_and_validate, load_config, parse_config, ConfigError, Format};
pub use model::{Config, Expect, ExpectBody, Step, StepRequest, Transaction};
pub use schema::{FieldError, Schema, ValidationReport};
pub use validator::{
    CronValidator, DefaultValidator, ExpectBodyValidator, FieldLookup, Occupancy, Presence,
    RequiredValidator, UniqueValidator, Validator, Violation, Violations, VersionValidator,
};
