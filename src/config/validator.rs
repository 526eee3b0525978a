//! Field validators
//!
//! Every validator works both on typed document fields and on untyped
//! `serde_json::Value`s, so type mismatches in dynamic data surface as
//! violations instead of parse failures.

use super::cron::{CronError, CronSchedule};
use super::model::{ExpectBody, Step, Transaction};
use crate::variables::flatten::natural_string;
use crate::variables::Variables;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

pub const SUPPORTED_VERSION: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("version must be a string")]
    VersionNotString,

    #[error("supported versions: \"1\"")]
    UnsupportedVersion(String),

    #[error("must be a list")]
    NotAList,

    #[error("should contain unique values for {field}. Found multiple {value} (elements {first} and {index})")]
    Duplicate {
        field: String,
        value: String,
        first: usize,
        index: usize,
    },

    #[error("must not be nil")]
    Nil,

    #[error("length must not be 0")]
    Empty,

    #[error("expectation {index}: missing `is` clause")]
    MissingIs { index: usize },

    #[error("expectation {index}: must be a mapping")]
    MalformedClause { index: usize },

    #[error("not a string")]
    NotAString,

    #[error(transparent)]
    Cron(#[from] CronError),
}

/// Every violation found by one validator on one field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, violation: Violation) {
        self.0.push(violation);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.0.iter()
    }

    pub fn into_result(self) -> Result<(), Violations> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<Violation> for Violations {
    fn from(violation: Violation) -> Self {
        Self(vec![violation])
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Check applied to a single field
///
/// Validation may normalize the value in place, which is how defaults
/// reach downstream consumers.
pub trait Validator<T: ?Sized>: Send + Sync {
    fn name(&self) -> &'static str;

    fn validate(&self, value: &mut T) -> Result<(), Violations>;
}

/// Placeholder for fields with no constraint
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValidator;

impl<T: ?Sized> Validator<T> for DefaultValidator {
    fn name(&self) -> &'static str {
        "default"
    }

    fn validate(&self, _value: &mut T) -> Result<(), Violations> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VersionValidator;

impl VersionValidator {
    fn check(version: &str) -> Result<(), Violations> {
        if version == SUPPORTED_VERSION {
            Ok(())
        } else {
            Err(Violation::UnsupportedVersion(version.to_string()).into())
        }
    }
}

impl Validator<String> for VersionValidator {
    fn name(&self) -> &'static str {
        "version"
    }

    fn validate(&self, value: &mut String) -> Result<(), Violations> {
        Self::check(value)
    }
}

impl Validator<Value> for VersionValidator {
    fn name(&self) -> &'static str {
        "version"
    }

    fn validate(&self, value: &mut Value) -> Result<(), Violations> {
        match value {
            Value::String(version) => Self::check(version),
            _ => Err(Violation::VersionNotString.into()),
        }
    }
}

/// Named field of a list element, rendered as a string
pub trait FieldLookup {
    fn lookup_field(&self, field: &str) -> Option<String>;
}

impl FieldLookup for Value {
    fn lookup_field(&self, field: &str) -> Option<String> {
        self.as_object()?.get(field).map(natural_string)
    }
}

impl FieldLookup for Transaction {
    fn lookup_field(&self, field: &str) -> Option<String> {
        match field {
            "id" => Some(self.id.clone()),
            _ => None,
        }
    }
}

impl FieldLookup for Step {
    fn lookup_field(&self, field: &str) -> Option<String> {
        match field {
            "id" => Some(self.id.clone()),
            "endpoint" => Some(self.request.endpoint.clone()),
            "method" => Some(self.request.method.clone()),
            _ => None,
        }
    }
}

/// Requires a named field to be distinct across list elements
///
/// Elements without the field are ignored. Every repeat is reported.
#[derive(Debug, Clone)]
pub struct UniqueValidator {
    field: String,
}

impl UniqueValidator {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    fn check<'a, E, I>(&self, elements: I) -> Result<(), Violations>
    where
        E: FieldLookup + 'a,
        I: IntoIterator<Item = &'a E>,
    {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut violations = Violations::new();
        for (index, element) in elements.into_iter().enumerate() {
            let Some(value) = element.lookup_field(&self.field) else {
                continue;
            };
            match seen.get(&value) {
                Some(&first) => violations.push(Violation::Duplicate {
                    field: self.field.clone(),
                    value,
                    first,
                    index,
                }),
                None => {
                    seen.insert(value, index);
                }
            }
        }
        violations.into_result()
    }
}

impl<E: FieldLookup> Validator<Vec<E>> for UniqueValidator {
    fn name(&self) -> &'static str {
        "unique"
    }

    fn validate(&self, value: &mut Vec<E>) -> Result<(), Violations> {
        self.check(value.iter())
    }
}

impl<T> Validator<Option<T>> for UniqueValidator
where
    UniqueValidator: Validator<T>,
{
    fn name(&self) -> &'static str {
        "unique"
    }

    fn validate(&self, value: &mut Option<T>) -> Result<(), Violations> {
        match value {
            Some(inner) => Validator::<T>::validate(self, inner),
            None => Ok(()),
        }
    }
}

impl Validator<Value> for UniqueValidator {
    fn name(&self) -> &'static str {
        "unique"
    }

    fn validate(&self, value: &mut Value) -> Result<(), Violations> {
        match value {
            Value::Null => Ok(()),
            Value::Array(items) => self.check(items.iter()),
            _ => Err(Violation::NotAList.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    Nil,
    Empty,
    Filled,
}

/// Nil and emptiness as seen by [`RequiredValidator`]
///
/// Struct-shaped values only report nil-ness, never emptiness.
pub trait Presence {
    fn occupancy(&self) -> Occupancy;
}

fn by_len(len: usize) -> Occupancy {
    if len == 0 {
        Occupancy::Empty
    } else {
        Occupancy::Filled
    }
}

impl Presence for str {
    fn occupancy(&self) -> Occupancy {
        by_len(self.len())
    }
}

impl Presence for String {
    fn occupancy(&self) -> Occupancy {
        by_len(self.len())
    }
}

impl<T> Presence for Vec<T> {
    fn occupancy(&self) -> Occupancy {
        by_len(self.len())
    }
}

impl<T> Presence for [T] {
    fn occupancy(&self) -> Occupancy {
        by_len(self.len())
    }
}

impl<K, V> Presence for BTreeMap<K, V> {
    fn occupancy(&self) -> Occupancy {
        by_len(self.len())
    }
}

impl<K, V, S> Presence for HashMap<K, V, S> {
    fn occupancy(&self) -> Occupancy {
        by_len(self.len())
    }
}

impl<T, S> Presence for HashSet<T, S> {
    fn occupancy(&self) -> Occupancy {
        by_len(self.len())
    }
}

impl Presence for Map<String, Value> {
    fn occupancy(&self) -> Occupancy {
        by_len(self.len())
    }
}

impl Presence for Variables {
    fn occupancy(&self) -> Occupancy {
        by_len(self.len())
    }
}

impl Presence for Value {
    fn occupancy(&self) -> Occupancy {
        match self {
            Value::Null => Occupancy::Nil,
            Value::String(s) => s.occupancy(),
            Value::Array(items) => items.occupancy(),
            Value::Object(map) => map.occupancy(),
            Value::Bool(_) | Value::Number(_) => Occupancy::Filled,
        }
    }
}

impl<T: Presence> Presence for Option<T> {
    fn occupancy(&self) -> Occupancy {
        match self {
            Some(inner) => inner.occupancy(),
            None => Occupancy::Nil,
        }
    }
}

impl<T: Presence + ?Sized> Presence for Box<T> {
    fn occupancy(&self) -> Occupancy {
        (**self).occupancy()
    }
}

impl Presence for Transaction {
    fn occupancy(&self) -> Occupancy {
        Occupancy::Filled
    }
}

impl Presence for Step {
    fn occupancy(&self) -> Occupancy {
        Occupancy::Filled
    }
}

impl Presence for ExpectBody {
    fn occupancy(&self) -> Occupancy {
        Occupancy::Filled
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredValidator;

impl<T: Presence + ?Sized> Validator<T> for RequiredValidator {
    fn name(&self) -> &'static str {
        "required"
    }

    fn validate(&self, value: &mut T) -> Result<(), Violations> {
        match value.occupancy() {
            Occupancy::Nil => Err(Violation::Nil.into()),
            Occupancy::Empty => Err(Violation::Empty.into()),
            Occupancy::Filled => Ok(()),
        }
    }
}

/// Checks body expectations and fills in omitted flags
///
/// `keys_only` and `subset` default to `false` in place; a clause with an
/// empty `is` list is malformed. Every clause is checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpectBodyValidator;

impl Validator<Vec<ExpectBody>> for ExpectBodyValidator {
    fn name(&self) -> &'static str {
        "expect_body"
    }

    fn validate(&self, value: &mut Vec<ExpectBody>) -> Result<(), Violations> {
        let mut violations = Violations::new();
        for (index, clause) in value.iter_mut().enumerate() {
            clause.keys_only.get_or_insert(false);
            clause.subset.get_or_insert(false);
            if clause.is.is_empty() {
                violations.push(Violation::MissingIs { index });
            }
        }
        violations.into_result()
    }
}

impl Validator<Option<Vec<ExpectBody>>> for ExpectBodyValidator {
    fn name(&self) -> &'static str {
        "expect_body"
    }

    fn validate(&self, value: &mut Option<Vec<ExpectBody>>) -> Result<(), Violations> {
        match value {
            Some(clauses) => Validator::<Vec<ExpectBody>>::validate(self, clauses),
            None => Ok(()),
        }
    }
}

impl Validator<Value> for ExpectBodyValidator {
    fn name(&self) -> &'static str {
        "expect_body"
    }

    fn validate(&self, value: &mut Value) -> Result<(), Violations> {
        let clauses = match value {
            Value::Null => return Ok(()),
            Value::Array(clauses) => clauses,
            _ => return Err(Violation::NotAList.into()),
        };

        let mut violations = Violations::new();
        for (index, clause) in clauses.iter_mut().enumerate() {
            let Value::Object(clause) = clause else {
                violations.push(Violation::MalformedClause { index });
                continue;
            };
            for flag in ["keys_only", "subset"] {
                clause.entry(flag).or_insert(Value::Bool(false));
            }
            if clause.get("is").map(Presence::occupancy) != Some(Occupancy::Filled) {
                violations.push(Violation::MissingIs { index });
            }
        }
        violations.into_result()
    }
}

/// Empty string or null means no schedule; anything else must parse
#[derive(Debug, Clone, Copy, Default)]
pub struct CronValidator;

impl CronValidator {
    fn check(expression: &str) -> Result<(), Violations> {
        if expression.is_empty() {
            return Ok(());
        }
        CronSchedule::parse(expression)
            .map(|_| ())
            .map_err(|e| Violation::Cron(e).into())
    }
}

impl Validator<String> for CronValidator {
    fn name(&self) -> &'static str {
        "cron"
    }

    fn validate(&self, value: &mut String) -> Result<(), Violations> {
        Self::check(value)
    }
}

impl Validator<Value> for CronValidator {
    fn name(&self) -> &'static str {
        "cron"
    }

    fn validate(&self, value: &mut Value) -> Result<(), Violations> {
        match value {
            Value::Null => Ok(()),
            Value::String(expression) => Self::check(expression),
            _ => Err(Violation::NotAString.into()),
        }
    }
}
