//! Side-by-side reconciliation of referee and reference snapshots.
//!
//! The referee record holds what the requesting user claimed; the reference
//! holds what the referee actually entered. The audit view renders both
//! verbatim so discrepancies are visible, including fields where the two
//! sides agree.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One field of the audit diff: both sides verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldComparison {
    pub from_referee: Value,
    pub from_reference: Value,
}

impl FieldComparison {
    /// Whether both sides hold the same value. Dates are compared by value,
    /// not by display form.
    pub fn matches(&self) -> bool {
        normalize(&self.from_referee) == normalize(&self.from_reference)
    }
}

/// Reconcile two snapshots of overlapping fields into a per-field diff.
///
/// For each requested field name the corresponding value is read from each
/// snapshot, with absent values treated as null. Pure and deterministic;
/// safe to re-run.
pub fn compare(
    fields: &[&str],
    referee_snapshot: &Value,
    reference_snapshot: &Value,
) -> BTreeMap<String, FieldComparison> {
    fields
        .iter()
        .map(|field| {
            (
                (*field).to_string(),
                FieldComparison {
                    from_referee: field_value(referee_snapshot, field),
                    from_reference: field_value(reference_snapshot, field),
                },
            )
        })
        .collect()
}

fn field_value(snapshot: &Value, field: &str) -> Value {
    snapshot.get(field).cloned().unwrap_or(Value::Null)
}

/// Date strings compare by parsed value so `2024-01-01` and an RFC 3339
/// timestamp on the same day do not spuriously differ.
fn normalize(value: &Value) -> Value {
    if let Value::String(s) = value {
        if let Some(date) = parse_date(s) {
            return Value::String(date.format("%Y-%m-%d").to_string());
        }
    }
    value.clone()
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Format a value for the audit table. Dates render as `01 Jan 2024`;
/// non-date values fall back to their raw representation.
pub fn format_date_for_display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => parse_date(s)
            .map(|d| d.format("%d %b %Y").to_string())
            .unwrap_or_else(|| s.clone()),
        other => other.to_string(),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compare_emits_both_sides_verbatim() {
        let diff = compare(
            &["startDate"],
            &json!({"startDate": "2024-01-01"}),
            &json!({"startDate": "2024-02-01"}),
        );
        let comparison = &diff["startDate"];
        assert_eq!(comparison.from_referee, json!("2024-01-01"));
        assert_eq!(comparison.from_reference, json!("2024-02-01"));
        assert!(!comparison.matches());
    }

    #[test]
    fn test_compare_emits_equal_values_too() {
        let diff = compare(
            &["relationship"],
            &json!({"relationship": "Manager"}),
            &json!({"relationship": "Manager"}),
        );
        assert!(diff["relationship"].matches());
        assert_eq!(diff["relationship"].from_referee, json!("Manager"));
    }

    #[test]
    fn test_compare_treats_absent_as_null() {
        let diff = compare(&["salary"], &json!({}), &json!({"salary": "45000"}));
        assert_eq!(diff["salary"].from_referee, Value::Null);
        assert_eq!(diff["salary"].from_reference, json!("45000"));
    }

    #[test]
    fn test_dates_compare_by_value_not_display() {
        let comparison = FieldComparison {
            from_referee: json!("2024-01-01"),
            from_reference: json!("2024-01-01T00:00:00Z"),
        };
        assert!(comparison.matches());
    }

    #[test]
    fn test_compare_is_deterministic() {
        let referee = json!({"a": 1, "b": "x"});
        let reference = json!({"a": 2});
        let first = compare(&["a", "b"], &referee, &reference);
        let second = compare(&["a", "b"], &referee, &reference);
        assert_eq!(first, second);
    }

    #[test]
    fn test_display_formatting() {
        assert_eq!(format_date_for_display(&json!("2024-01-05")), "05 Jan 2024");
        assert_eq!(format_date_for_display(&json!("not a date")), "not a date");
        assert_eq!(format_date_for_display(&Value::Null), "");
    }
}
