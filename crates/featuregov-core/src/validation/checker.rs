//! Accumulating field checker shared by every policy validator.
//!
//! Each check appends at most one issue and never aborts. A check that
//! passes hands back the decoded value so callers can chain nested checks.

use serde_json::{Map, Value};

use super::{IssueCode, PolicyKind, ValidationIssue, ValidationReport};

/// A position inside a policy document: the value plus its dotted path.
#[derive(Debug, Clone)]
pub(crate) struct Scope<'v> {
    value: &'v Value,
    prefix: String,
}

impl<'v> Scope<'v> {
    fn new(value: &'v Value, prefix: impl Into<String>) -> Self {
        Self {
            value,
            prefix: prefix.into(),
        }
    }

    /// Resolve a dotted key relative to this scope.
    fn resolve(&self, key: &str) -> Option<&'v Value> {
        key.split('.').try_fold(self.value, |current, segment| {
            current.as_object().and_then(|map| map.get(segment))
        })
    }

    /// Look up a literal (undotted) key, for names taken from the document.
    fn member(&self, name: &str) -> Option<&'v Value> {
        self.value.as_object().and_then(|map| map.get(name))
    }

    fn path(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.prefix, key)
        }
    }
}

/// Issue accumulator.
#[derive(Debug, Default)]
pub(crate) struct Checker {
    issues: Vec<ValidationIssue>,
}

impl Checker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, code: IssueCode, path: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(code, path, message));
    }

    pub(crate) fn finish(self) -> ValidationReport {
        ValidationReport::from_issues(self.issues)
    }

    // =========================================================================
    // ROOT & HEADER
    // =========================================================================

    /// Enter the document root. `None` means the root is not an object and
    /// the caller must stop: nothing else can be inspected.
    pub(crate) fn root<'v>(&mut self, document: &'v Value) -> Option<Scope<'v>> {
        if document.is_object() {
            Some(Scope::new(document, ""))
        } else {
            self.push(
                IssueCode::RootNotObject,
                "$",
                format!("policy document must be an object, got {}", type_name(document)),
            );
            None
        }
    }

    /// Check `_artifact` and `_config_version`. Failures are recorded, not fatal.
    pub(crate) fn header(&mut self, root: &Scope<'_>, kind: PolicyKind) {
        let expected = kind.artifact();
        match root.resolve("_artifact").and_then(Value::as_str) {
            Some(actual) if actual == expected => {}
            Some(actual) => self.push(
                IssueCode::ArtifactMismatch,
                "_artifact",
                format!("expected _artifact \"{expected}\", got \"{actual}\""),
            ),
            None => self.push(
                IssueCode::ArtifactMismatch,
                "_artifact",
                format!("_artifact must be the string \"{expected}\""),
            ),
        }

        let version = root.resolve("_config_version").and_then(as_integer);
        if !version.is_some_and(|v| v >= 1) {
            self.push(
                IssueCode::ConfigVersionInvalid,
                "_config_version",
                "_config_version must be an integer >= 1",
            );
        }
    }

    // =========================================================================
    // STRUCTURE
    // =========================================================================

    /// Require an object at `key`.
    pub(crate) fn object<'v>(&mut self, scope: &Scope<'v>, key: &str) -> Option<Scope<'v>> {
        let path = scope.path(key);
        self.expect_object(scope.resolve(key), path)
    }

    /// Require an object under a literal member name taken from the document.
    pub(crate) fn member_object<'v>(&mut self, scope: &Scope<'v>, name: &str) -> Option<Scope<'v>> {
        let path = scope.path(name);
        self.expect_object(scope.member(name), path)
    }

    /// Require a list element to be an object.
    pub(crate) fn element_object<'v>(&mut self, value: &'v Value, path: String) -> Option<Scope<'v>> {
        self.expect_object(Some(value), path)
    }

    /// Require a non-empty object at `key` and enter each of its entries.
    pub(crate) fn entries<'v>(&mut self, scope: &Scope<'v>, key: &str) -> Vec<(&'v str, Scope<'v>)> {
        let path = scope.path(key);
        match scope.resolve(key).and_then(Value::as_object) {
            Some(map) if !map.is_empty() => self.enter_entries(map, &path),
            _ => {
                self.push(
                    IssueCode::ObjectRequired,
                    path.clone(),
                    format!("{path} must be a non-empty object"),
                );
                Vec::new()
            }
        }
    }

    /// Like [`Checker::entries`], but an absent field is accepted.
    pub(crate) fn optional_entries<'v>(
        &mut self,
        scope: &Scope<'v>,
        key: &str,
    ) -> Vec<(&'v str, Scope<'v>)> {
        match scope.resolve(key) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Object(map)) => self.enter_entries(map, &scope.path(key)),
            Some(_) => {
                let path = scope.path(key);
                self.push(IssueCode::ObjectRequired, path.clone(), format!("{path} must be an object"));
                Vec::new()
            }
        }
    }

    fn enter_entries<'v>(&mut self, map: &'v Map<String, Value>, path: &str) -> Vec<(&'v str, Scope<'v>)> {
        map.iter()
            .filter_map(|(name, value)| {
                self.expect_object(Some(value), format!("{path}.{name}"))
                    .map(|scope| (name.as_str(), scope))
            })
            .collect()
    }

    fn expect_object<'v>(&mut self, value: Option<&'v Value>, path: String) -> Option<Scope<'v>> {
        match value {
            Some(value) if value.is_object() => Some(Scope::new(value, path)),
            _ => {
                self.push(IssueCode::ObjectRequired, path.clone(), format!("{path} must be an object"));
                None
            }
        }
    }

    // =========================================================================
    // SCALARS
    // =========================================================================

    /// Require a non-empty (after trimming) string.
    pub(crate) fn string<'v>(&mut self, scope: &Scope<'v>, key: &str) -> Option<&'v str> {
        match scope.resolve(key).and_then(Value::as_str) {
            Some(s) if !s.trim().is_empty() => Some(s),
            _ => {
                let path = scope.path(key);
                self.push(IssueCode::StringRequired, path.clone(), format!("{path} must be a non-empty string"));
                None
            }
        }
    }

    pub(crate) fn boolean(&mut self, scope: &Scope<'_>, key: &str) -> Option<bool> {
        let found = scope.resolve(key).and_then(Value::as_bool);
        if found.is_none() {
            let path = scope.path(key);
            self.push(IssueCode::BooleanRequired, path.clone(), format!("{path} must be a boolean"));
        }
        found
    }

    /// Require an integer in `[min, max]`.
    pub(crate) fn integer(&mut self, scope: &Scope<'_>, key: &str, min: i64, max: i64) -> Option<i64> {
        match scope.resolve(key).and_then(as_integer) {
            Some(n) if (min..=max).contains(&n) => Some(n),
            _ => {
                let path = scope.path(key);
                let range = if max == i64::MAX {
                    format!(">= {min}")
                } else {
                    format!("in [{min}, {max}]")
                };
                self.push(
                    IssueCode::IntegerOutOfRange,
                    path.clone(),
                    format!("{path} must be an integer {range}"),
                );
                None
            }
        }
    }

    /// Require an integer `>= min`.
    pub(crate) fn integer_min(&mut self, scope: &Scope<'_>, key: &str, min: i64) -> Option<i64> {
        self.integer(scope, key, min, i64::MAX)
    }

    /// Require a finite number in `[min, max]`.
    pub(crate) fn number(&mut self, scope: &Scope<'_>, key: &str, min: f64, max: f64) -> Option<f64> {
        match scope.resolve(key).and_then(Value::as_f64) {
            Some(n) if n.is_finite() && n >= min && n <= max => Some(n),
            _ => {
                let path = scope.path(key);
                self.push(
                    IssueCode::NumberOutOfRange,
                    path.clone(),
                    format!("{path} must be a number in [{min}, {max}]"),
                );
                None
            }
        }
    }

    /// Require a finite number strictly greater than zero.
    pub(crate) fn positive_number(&mut self, scope: &Scope<'_>, key: &str) -> Option<f64> {
        match scope.resolve(key).and_then(Value::as_f64) {
            Some(n) if n.is_finite() && n > 0.0 => Some(n),
            _ => {
                let path = scope.path(key);
                self.push(IssueCode::NumberOutOfRange, path.clone(), format!("{path} must be a number > 0"));
                None
            }
        }
    }

    // =========================================================================
    // LISTS & ENUMERATIONS
    // =========================================================================

    /// Require a non-empty list of any items.
    pub(crate) fn list<'v>(&mut self, scope: &Scope<'v>, key: &str) -> Option<&'v [Value]> {
        match scope.resolve(key).and_then(Value::as_array) {
            Some(items) if !items.is_empty() => Some(items.as_slice()),
            _ => {
                let path = scope.path(key);
                self.push(IssueCode::ListRequired, path.clone(), format!("{path} must be a non-empty list"));
                None
            }
        }
    }

    /// Require a non-empty list of non-empty strings. Returns the valid items;
    /// an invalid list yields an empty vector.
    pub(crate) fn string_list<'v>(&mut self, scope: &Scope<'v>, key: &str) -> Vec<&'v str> {
        let Some(items) = self.list(scope, key) else {
            return Vec::new();
        };
        let path = scope.path(key);
        let mut strings = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match item.as_str() {
                Some(s) if !s.trim().is_empty() => strings.push(s),
                _ => self.push(
                    IssueCode::StringRequired,
                    format!("{path}[{index}]"),
                    format!("{path}[{index}] must be a non-empty string"),
                ),
            }
        }
        strings
    }

    /// Require a string that is one of `allowed`.
    pub(crate) fn one_of<'v>(&mut self, scope: &Scope<'v>, key: &str, allowed: &[&str]) -> Option<&'v str> {
        let value = self.string(scope, key)?;
        if allowed.contains(&value) {
            Some(value)
        } else {
            let path = scope.path(key);
            self.push(
                IssueCode::ValueNotAllowed,
                path.clone(),
                format!("{path} \"{value}\" must be one of [{}]", allowed.join(", ")),
            );
            None
        }
    }
}

/// Integer view of a JSON number, accepting floats with no fractional part.
fn as_integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
