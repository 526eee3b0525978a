//! # apid
//!
//! Execution engine for declarative API transaction tests.
//!
//! A transaction is an ordered list of steps described in a YAML or JSON
//! document. This crate provides the pieces an orchestrator drives for
//! each step: template rendering, variable scoping, shell commands, timed
//! HTTP calls, and document validation.
//!
//! ## Modules
//!
//! - `app` - Logging, runtime options and fatal error reporting for the binary
//! - `config` - Document model, loader, cron grammar and schema validation
//! - `error` - Unified error type with numeric codes
//! - `http` - HTTP/1.1 client with per-phase network timings
//! - `subprocess` - Process runner abstraction and the shell command executor
//! - `template` - `{{ identifier }}` / `{% command %}` lexer and evaluator
//! - `variables` - Nested variable store and environment flattening
pub mod app;
pub mod config;
pub mod error;
pub mod http;
pub mod subprocess;
pub mod template;
pub mod variables;

pub use error::{ApidError, Result};
