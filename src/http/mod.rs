//! HTTP client that reports per-phase network timings
//!
//! Each request opens a fresh connection so that DNS, TCP, and TLS
//! phases are measured on every call. Dropping the returned future
//! aborts the request.

mod client;
mod error;
mod trace;

pub use client::{HttpClient, Request, Response, TimedClient};
pub use error::HttpError;
pub use trace::{Timings, TraceHooks, TracedStream};
