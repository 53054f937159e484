//! Pre-dispatch validation of form values against field constraints.
//!
//! Failures are returned as data: the caller shows the messages next to the
//! offending inputs and does not send the request.

use fancy_regex::Regex;
use indexmap::IndexMap;
use restbench_types::{Field, FieldKind, NumberConstraints, TextConstraints, scalar_to_string};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::routing::is_blank;

/// Outcome of [`validate_fields`]. `errors` holds one message per failing
/// field, keyed by field name, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: IndexMap<String, String>,
}

/// Fields whose `show_if` rule holds for the current values, plus every field
/// without a rule.
pub fn visible_fields<'a>(fields: &'a [Field], values: &Map<String, Value>) -> Vec<&'a Field> {
    fields
        .iter()
        .filter(|field| match &field.show_if {
            Some(rule) => rule.matches(values.get(&rule.field)),
            None => true,
        })
        .collect()
}

/// Checks `values` against the constraints of `fields`.
///
/// Pass only the fields currently shown (see [`visible_fields`]). Each field
/// reports at most its first failing check: required, then number parsing and
/// bounds, or text length and pattern.
pub fn validate_fields<'a, I>(fields: I, values: &Map<String, Value>) -> ValidationReport
where
    I: IntoIterator<Item = &'a Field>,
{
    let errors: IndexMap<String, String> = fields
        .into_iter()
        .filter_map(|field| validate_field(field, values.get(&field.name)).map(|message| (field.name.clone(), message)))
        .collect();
    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}

fn validate_field(field: &Field, value: Option<&Value>) -> Option<String> {
    let label = &field.label;
    if is_blank(value) {
        return field.required.then(|| format!("{label} ist erforderlich"));
    }
    let value = value?;

    match &field.kind {
        FieldKind::Number(constraints) => check_number(label, value, constraints),
        FieldKind::Text(constraints) | FieldKind::Textarea(constraints) => check_text(label, value, constraints),
        _ => None,
    }
}

fn check_number(label: &str, value: &Value, constraints: &NumberConstraints) -> Option<String> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|number| number.is_finite()),
        _ => None,
    };
    let Some(number) = number else {
        return Some(format!("{label} muss eine Zahl sein"));
    };

    if let Some(min) = constraints.min
        && number < min
    {
        return Some(format!("{label} muss mindestens {} sein", display_number(min)));
    }
    if let Some(max) = constraints.max
        && number > max
    {
        return Some(format!("{label} darf maximal {} sein", display_number(max)));
    }
    None
}

fn check_text(label: &str, value: &Value, constraints: &TextConstraints) -> Option<String> {
    let text = scalar_to_string(value);
    let length = text.chars().count() as u64;

    if let Some(min_length) = constraints.min_length
        && length < min_length
    {
        return Some(format!("{label} muss mindestens {min_length} Zeichen lang sein"));
    }
    if let Some(max_length) = constraints.max_length
        && length > max_length
    {
        return Some(format!("{label} darf maximal {max_length} Zeichen lang sein"));
    }
    if let Some(pattern) = &constraints.pattern {
        let matches = pattern_matches(pattern, &text);
        if !matches {
            return Some(
                constraints
                    .pattern_error
                    .clone()
                    .unwrap_or_else(|| format!("{label} hat ein ungültiges Format")),
            );
        }
    }
    None
}

/// Schema patterns use ECMA-262 syntax, lookaround included. A pattern that
/// does not compile, or that exhausts the backtracking limit, fails the value.
fn pattern_matches(pattern: &str, text: &str) -> bool {
    match Regex::new(pattern) {
        Ok(regex) => regex.is_match(text).unwrap_or(false),
        Err(error) => {
            debug!(pattern = %pattern, error = %error, "field pattern does not compile");
            false
        }
    }
}

/// Renders whole numbers without a fractional part (`5`, not `5.0`).
fn display_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}
