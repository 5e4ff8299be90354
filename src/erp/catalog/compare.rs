//! Semantic equality used to decide whether a field needs to change.

use serde::Deserialize;

use crate::erp::catalog::model::FieldValue;

/// How lists are matched against each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Comparison {
    /// Lists are equal when they hold the same elements with the same
    /// multiplicities, in any order.
    #[default]
    Strict,
    /// Lists are equal when they have the same length and every element of
    /// the left list has some equal element in the right one. `[x, x, y]`
    /// and `[x, y, y]` compare equal in this mode.
    Loose,
}

/// Returns whether two field values are semantically equal.
///
/// Text compares case-insensitively, lists ignore order, maps compare per
/// key. Numbers use IEEE equality so NaN never equals anything. Values of
/// different kinds are never equal.
pub fn values_equal(a: &FieldValue, b: &FieldValue, mode: Comparison) -> bool {
    match (a, b) {
        (FieldValue::Text(a), FieldValue::Text(b)) => a == b || a.to_lowercase() == b.to_lowercase(),
        (FieldValue::List(a), FieldValue::List(b)) => {
            a.len() == b.len()
                && match mode {
                    Comparison::Loose => a
                        .iter()
                        .all(|left| b.iter().any(|right| values_equal(left, right, mode))),
                    Comparison::Strict => lists_match_as_multisets(a, b, mode),
                }
        }
        (FieldValue::Map(a), FieldValue::Map(b)) => {
            a.len() == b.len()
                && a.iter().all(|(key, left)| {
                    b.get(key)
                        .is_some_and(|right| values_equal(left, right, mode))
                })
        }
        (FieldValue::Number(a), FieldValue::Number(b)) => a == b,
        (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
        (FieldValue::Null, FieldValue::Null) => true,
        _ => false,
    }
}

// Strict equality is an equivalence relation, so pairing each left element
// with the first unused equal right element finds a matching if one exists.
fn lists_match_as_multisets(a: &[FieldValue], b: &[FieldValue], mode: Comparison) -> bool {
    let mut used = vec![false; b.len()];
    a.iter().all(|left| {
        let matched = b
            .iter()
            .enumerate()
            .position(|(index, right)| !used[index] && values_equal(left, right, mode));
        match matched {
            Some(index) => {
                used[index] = true;
                true
            }
            None => false,
        }
    })
}
