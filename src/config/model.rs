//! Configuration document data model

use crate::variables::Variables;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Root of a configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Kept untyped so a non-string version is reported by validation
    /// rather than rejected by the parser
    #[serde(default)]
    pub version: Value,
    /// Untyped for the same reason as `version`; absent means unscheduled
    #[serde(default)]
    pub schedule: Value,
    #[serde(default)]
    pub variables: Variables,
    #[serde(default)]
    pub transactions: Option<Vec<Transaction>>,
}

impl Config {
    pub fn version_str(&self) -> Option<&str> {
        self.version.as_str()
    }

    pub fn schedule_str(&self) -> Option<&str> {
        self.schedule.as_str()
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.transactions.as_deref().unwrap_or_default()
    }

    pub fn transaction(&self, id: &str) -> Option<&Transaction> {
        self.transactions().iter().find(|t| t.id == id)
    }

    /// Variables visible to templates of `transaction`
    ///
    /// Document variables are exposed under `var`, with the transaction's
    /// own variables layered on top.
    pub fn scope_for(&self, transaction: Option<&Transaction>) -> Variables {
        let mut var = self.variables.clone();
        if let Some(transaction) = transaction {
            var.merge(&transaction.variables);
        }
        Variables::with_namespace("var", var.raw().clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub variables: Variables,
    #[serde(default)]
    pub steps: Option<Vec<Step>>,
}

impl Transaction {
    pub fn steps(&self) -> &[Step] {
        self.steps.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub variables: Variables,
    #[serde(default)]
    pub request: StepRequest,
    #[serde(default)]
    pub expect: Expect,
    /// Exported name to response path
    #[serde(default)]
    pub export: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRequest {
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub headers: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub skip_ssl_verify: bool,
}

impl Default for StepRequest {
    fn default() -> Self {
        Self {
            method: default_method(),
            endpoint: String::new(),
            headers: BTreeMap::new(),
            body: String::new(),
            skip_ssl_verify: false,
        }
    }
}

fn default_method() -> String {
    "GET".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Expect {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub headers: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub body: Option<Vec<ExpectBody>>,
}

/// Structural assertion against a response body
///
/// `keys_only` and `subset` stay `None` until validation fills in the
/// defaults, so an omitted flag can be told apart from an explicit one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpectBody {
    #[serde(default)]
    pub is: Vec<Value>,
    #[serde(default, alias = "keysOnly", skip_serializing_if = "Option::is_none")]
    pub keys_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subset: Option<bool>,
}

impl ExpectBody {
    pub fn new(is: Vec<Value>) -> Self {
        Self {
            is,
            keys_only: None,
            subset: None,
        }
    }
}
