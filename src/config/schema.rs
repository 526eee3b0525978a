//! Explicit field-to-validator bindings
//!
//! A [`Schema`] is built once and lists, for a document type, which
//! validator checks which field. Running it visits every rule and gathers
//! all failures into one [`ValidationReport`].

use super::model::{Config, Expect, Step, StepRequest, Transaction};
use super::validator::{
    CronValidator, DefaultValidator, ExpectBodyValidator, RequiredValidator, UniqueValidator,
    Validator, Violations, VersionValidator,
};
use crate::error::{ApidError, ErrorCode};
use once_cell::sync::Lazy;
use std::fmt;

/// Failure of one validator on one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub path: String,
    pub validator: &'static str,
    pub violations: Violations,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{} ({}): {}", self.path, self.validator, violation)?;
        }
        Ok(())
    }
}

/// Every failure found in a document, one per line when displayed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of individual violations across all fields
    pub fn violation_count(&self) -> usize {
        self.errors.iter().map(|e| e.violations.len()).sum()
    }

    pub fn lines(&self) -> Vec<String> {
        self.to_string().lines().map(str::to_string).collect()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

impl From<ValidationReport> for ApidError {
    fn from(report: ValidationReport) -> Self {
        ApidError::validation_with_code(
            ErrorCode::VALIDATION_FAILED,
            format!(
                "{} problem(s):\n{}",
                report.violation_count(),
                report
            ),
        )
    }
}

type Rule<D> = Box<dyn Fn(&mut D, &str, &mut Vec<FieldError>) + Send + Sync>;

pub struct Schema<D> {
    rules: Vec<Rule<D>>,
}

impl<D: 'static> Default for Schema<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: 'static> Schema<D> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Bind `validator` to the field reached through `access`
    pub fn field<T, A, V>(mut self, name: &'static str, access: A, validator: V) -> Self
    where
        T: ?Sized + 'static,
        A: Fn(&mut D) -> &mut T + Send + Sync + 'static,
        V: Validator<T> + 'static,
    {
        self.rules.push(Box::new(move |doc, prefix, errors| {
            if let Err(violations) = validator.validate(access(doc)) {
                errors.push(FieldError {
                    path: join(prefix, name),
                    validator: validator.name(),
                    violations,
                });
            }
        }));
        self
    }

    /// Apply `schema` to every element of a list field
    pub fn each<C, A>(mut self, name: &'static str, access: A, schema: Schema<C>) -> Self
    where
        C: 'static,
        A: Fn(&mut D) -> &mut [C] + Send + Sync + 'static,
    {
        self.rules.push(Box::new(move |doc, prefix, errors| {
            let path = join(prefix, name);
            for (i, child) in access(doc).iter_mut().enumerate() {
                schema.check(child, &format!("{path}[{i}]"), errors);
            }
        }));
        self
    }

    /// Apply `schema` to a nested structure
    pub fn nested<C, A>(mut self, name: &'static str, access: A, schema: Schema<C>) -> Self
    where
        C: 'static,
        A: Fn(&mut D) -> &mut C + Send + Sync + 'static,
    {
        self.rules.push(Box::new(move |doc, prefix, errors| {
            schema.check(access(doc), &join(prefix, name), errors);
        }));
        self
    }

    fn check(&self, doc: &mut D, prefix: &str, errors: &mut Vec<FieldError>) {
        for rule in &self.rules {
            rule(doc, prefix, errors);
        }
    }

    /// Run every rule, normalizing `doc` in place
    pub fn validate(&self, doc: &mut D) -> Result<(), ValidationReport> {
        let mut errors = Vec::new();
        self.check(doc, "", &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationReport { errors })
        }
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

static DOCUMENT_SCHEMA: Lazy<Schema<Config>> = Lazy::new(|| {
    Schema::new()
        .field("version", |c: &mut Config| &mut c.version, VersionValidator)
        .field("schedule", |c: &mut Config| &mut c.schedule, CronValidator)
        .field("variables", |c: &mut Config| &mut c.variables, DefaultValidator)
        .field(
            "transactions",
            |c: &mut Config| &mut c.transactions,
            RequiredValidator,
        )
        .field(
            "transactions",
            |c: &mut Config| &mut c.transactions,
            UniqueValidator::new("id"),
        )
        .each(
            "transactions",
            |c: &mut Config| c.transactions.as_deref_mut().unwrap_or_default(),
            transaction_schema(),
        )
});

fn transaction_schema() -> Schema<Transaction> {
    Schema::new()
        .field("id", |t: &mut Transaction| &mut t.id, RequiredValidator)
        .field(
            "variables",
            |t: &mut Transaction| &mut t.variables,
            DefaultValidator,
        )
        .field("steps", |t: &mut Transaction| &mut t.steps, RequiredValidator)
        .field(
            "steps",
            |t: &mut Transaction| &mut t.steps,
            UniqueValidator::new("id"),
        )
        .each(
            "steps",
            |t: &mut Transaction| t.steps.as_deref_mut().unwrap_or_default(),
            step_schema(),
        )
}

fn step_schema() -> Schema<Step> {
    Schema::new()
        .field("id", |s: &mut Step| &mut s.id, RequiredValidator)
        .nested(
            "request",
            |s: &mut Step| &mut s.request,
            Schema::new().field(
                "endpoint",
                |r: &mut StepRequest| &mut r.endpoint,
                RequiredValidator,
            ),
        )
        .nested(
            "expect",
            |s: &mut Step| &mut s.expect,
            Schema::new().field("body", |e: &mut Expect| &mut e.body, ExpectBodyValidator),
        )
}

impl Config {
    /// Check the document against its schema
    ///
    /// Omitted expectation flags are filled in even when other fields fail.
    pub fn validate(&mut self) -> Result<(), ValidationReport> {
        DOCUMENT_SCHEMA.validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pair {
        left: String,
        right: Vec<String>,
    }

    fn pair_schema() -> Schema<Pair> {
        Schema::new()
            .field("left", |p: &mut Pair| &mut p.left, RequiredValidator)
            .field("right", |p: &mut Pair| &mut p.right, RequiredValidator)
    }

    #[test]
    fn test_collects_all_failures() {
        let mut pair = Pair {
            left: String::new(),
            right: Vec::new(),
        };
        let report = pair_schema().validate(&mut pair).unwrap_err();
        assert_eq!(
            report.lines(),
            vec![
                "left (required): length must not be 0",
                "right (required): length must not be 0"
            ]
        );
    }

    #[test]
    fn test_passes_valid_document() {
        let mut pair = Pair {
            left: "x".to_string(),
            right: vec!["y".to_string()],
        };
        assert!(pair_schema().validate(&mut pair).is_ok());
    }

    #[test]
    fn test_each_prefixes_paths() {
        struct Outer {
            pairs: Vec<Pair>,
        }
        let schema = Schema::new().each("pairs", |o: &mut Outer| &mut o.pairs[..], pair_schema());
        let mut outer = Outer {
            pairs: vec![
                Pair {
                    left: "ok".to_string(),
                    right: vec!["ok".to_string()],
                },
                Pair {
                    left: String::new(),
                    right: vec!["ok".to_string()],
                },
            ],
        };
        let report = schema.validate(&mut outer).unwrap_err();
        assert_eq!(report.errors().len(), 1);
        assert_eq!(report.errors()[0].path, "pairs[1].left");
    }

    #[test]
    fn test_report_converts_to_validation_error() {
        let mut pair = Pair {
            left: String::new(),
            right: Vec::new(),
        };
        let report = pair_schema().validate(&mut pair).unwrap_err();
        let error: ApidError = report.into();
        assert_eq!(error.code(), ErrorCode::VALIDATION_FAILED);
        assert!(error.to_string().contains("2 problem(s)"));
    }
}
