//! Rubric score groups.
//!
//! A visit carries three independent groups (management, teaching,
//! feedback). Each is an opaque key→value map: there is no rubric schema,
//! no required keys, and values are not range-checked. Criteria left
//! unanswered on the form are kept as `null`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Number of criteria per group on the observation form.
pub const MANAGEMENT_CRITERIA: usize = 5;
pub const TEACHING_CRITERIA: usize = 10;
pub const FEEDBACK_CRITERIA: usize = 5;

/// Form field prefixes; criterion `n` of a group is `{prefix}_{n}`.
pub const MANAGEMENT_PREFIX: &str = "management";
pub const TEACHING_PREFIX: &str = "teaching";
pub const FEEDBACK_PREFIX: &str = "feedback";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreSheet(BTreeMap<String, Value>);

impl ScoreSheet {
  pub fn new() -> Self { Self::default() }

  /// Collect `{prefix}_1 ..= {prefix}_{count}` through `lookup`. Keys the
  /// lookup does not know are stored as `null`.
  pub fn from_form(
    prefix: &str,
    count: usize,
    mut lookup: impl FnMut(&str) -> Option<Value>,
  ) -> Self {
    (1..=count)
      .map(|i| {
        let key = format!("{prefix}_{i}");
        let value = lookup(&key).unwrap_or(Value::Null);
        (key, value)
      })
      .collect()
  }

  pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
    self.0.insert(key.into(), value)
  }

  pub fn get(&self, key: &str) -> Option<&Value> { self.0.get(key) }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> { self.0.iter() }

  /// Aggregate the entries that carry a numeric rating.
  pub fn summary(&self) -> ScoreSummary {
    let ratings: Vec<f64> = self.0.values().filter_map(numeric).collect();
    ScoreSummary::from_ratings(self.0.len(), &ratings)
  }
}

impl FromIterator<(String, Value)> for ScoreSheet {
  fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

/// A rating is a JSON number or a string that parses as a finite number
/// (form submissions arrive as strings).
fn numeric(value: &Value) -> Option<f64> {
  match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
    _ => None,
  }
}

/// Aggregate over one or more score groups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
  /// Entries in the group(s), rated or not.
  pub criteria: usize,
  /// Entries with a numeric rating.
  pub rated:    usize,
  pub total:    f64,
  /// `None` when nothing is rated.
  pub mean:     Option<f64>,
}

impl ScoreSummary {
  fn from_ratings(criteria: usize, ratings: &[f64]) -> Self {
    let total: f64 = ratings.iter().sum();
    let rated = ratings.len();
    Self {
      criteria,
      rated,
      total,
      mean: (rated > 0).then(|| total / rated as f64),
    }
  }

  /// Pool several summaries as if their entries were one group.
  pub fn combine(parts: &[ScoreSummary]) -> Self {
    let criteria = parts.iter().map(|s| s.criteria).sum();
    let rated: usize = parts.iter().map(|s| s.rated).sum();
    let total: f64 = parts.iter().map(|s| s.total).sum();
    Self {
      criteria,
      rated,
      total,
      mean: (rated > 0).then(|| total / rated as f64),
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn from_form_fills_missing_criteria_with_null() {
    let sheet = ScoreSheet::from_form(MANAGEMENT_PREFIX, MANAGEMENT_CRITERIA, |k| {
      (k == "management_2").then(|| json!("4"))
    });
    assert_eq!(sheet.len(), 5);
    assert_eq!(sheet.get("management_1"), Some(&Value::Null));
    assert_eq!(sheet.get("management_2"), Some(&json!("4")));
    assert_eq!(sheet.get("management_6"), None);
  }

  #[test]
  fn summary_counts_only_numeric_entries() {
    let sheet: ScoreSheet = [
      ("teaching_1".to_string(), json!("4")),
      ("teaching_2".to_string(), json!(2)),
      ("teaching_3".to_string(), json!("ممتاز")),
      ("teaching_4".to_string(), Value::Null),
      ("teaching_5".to_string(), json!(" 3 ")),
    ]
    .into_iter()
    .collect();

    let s = sheet.summary();
    assert_eq!(s.criteria, 5);
    assert_eq!(s.rated, 3);
    assert_eq!(s.total, 9.0);
    assert_eq!(s.mean, Some(3.0));
  }

  #[test]
  fn non_finite_strings_are_not_ratings() {
    let sheet: ScoreSheet =
      [("a".to_string(), json!("NaN")), ("b".to_string(), json!("inf"))]
        .into_iter()
        .collect();
    assert_eq!(sheet.summary().rated, 0);
    assert_eq!(sheet.summary().mean, None);
  }

  #[test]
  fn combine_pools_groups() {
    let a = ScoreSummary::from_ratings(5, &[4.0, 2.0]);
    let b = ScoreSummary::from_ratings(10, &[5.0]);
    let c = ScoreSummary::from_ratings(5, &[]);
    let all = ScoreSummary::combine(&[a, b, c]);
    assert_eq!(all.criteria, 20);
    assert_eq!(all.rated, 3);
    assert_eq!(all.mean, Some(11.0 / 3.0));
  }

  #[test]
  fn sheet_serialises_as_plain_object() {
    let mut sheet = ScoreSheet::new();
    sheet.insert("feedback_1", json!("5"));
    assert_eq!(serde_json::to_string(&sheet).unwrap(), r#"{"feedback_1":"5"}"#);
  }
}
