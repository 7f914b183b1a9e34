//! Classroom observation visits.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  score::ScoreSheet,
  validate::{Checker, trim, trim_optional},
};

/// Outcome of a visit. Also accepts the Arabic labels used by the
/// original paper forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitStatus {
  #[default]
  #[serde(alias = "مكتملة")]
  Completed,
  #[serde(alias = "معلقة")]
  Pending,
  #[serde(alias = "ملغاة")]
  Cancelled,
}

impl VisitStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Completed => "completed",
      Self::Pending => "pending",
      Self::Cancelled => "cancelled",
    }
  }
}

impl std::str::FromStr for VisitStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim() {
      "completed" | "مكتملة" => Ok(Self::Completed),
      "pending" | "معلقة" => Ok(Self::Pending),
      "cancelled" | "ملغاة" => Ok(Self::Cancelled),
      other => Err(Error::invalid("status", format!("unknown visit status {other:?}"))),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
  pub visit_id:             Uuid,
  pub teacher_id:           Uuid,
  pub supervisor_id:        Uuid,
  pub visit_date:           NaiveDate,
  pub school_name:          String,
  pub subject:              String,
  pub grade:                String,
  pub lesson_title:         String,
  pub management_scores:    ScoreSheet,
  pub teaching_scores:      ScoreSheet,
  pub feedback_scores:      ScoreSheet,
  pub feedback_1:           Option<String>,
  pub feedback_2:           Option<String>,
  pub suggestions:          Option<String>,
  pub follow_up_date:       Option<NaiveDate>,
  pub status:               VisitStatus,
  pub supervisor_signature: Option<String>,
  /// Server-assigned; survives full-record replaces.
  pub created_at:           DateTime<Utc>,
}

/// The full replaceable body of a visit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitInput {
  pub teacher_id:           Uuid,
  pub supervisor_id:        Uuid,
  pub visit_date:           NaiveDate,
  pub school_name:          String,
  pub subject:              String,
  pub grade:                String,
  pub lesson_title:         String,
  #[serde(default)]
  pub management_scores:    ScoreSheet,
  #[serde(default)]
  pub teaching_scores:      ScoreSheet,
  #[serde(default)]
  pub feedback_scores:      ScoreSheet,
  #[serde(default)]
  pub feedback_1:           Option<String>,
  #[serde(default)]
  pub feedback_2:           Option<String>,
  #[serde(default)]
  pub suggestions:          Option<String>,
  #[serde(default)]
  pub follow_up_date:       Option<NaiveDate>,
  #[serde(default)]
  pub status:               VisitStatus,
  #[serde(default)]
  pub supervisor_signature: Option<String>,
}

impl VisitInput {
  pub fn validated(self) -> Result<Self> {
    let input = Self {
      school_name: trim(self.school_name),
      subject: trim(self.subject),
      grade: trim(self.grade),
      lesson_title: trim(self.lesson_title),
      feedback_1: trim_optional(self.feedback_1),
      feedback_2: trim_optional(self.feedback_2),
      suggestions: trim_optional(self.suggestions),
      supervisor_signature: trim_optional(self.supervisor_signature),
      ..self
    };
    Checker::new()
      .required("school_name", &input.school_name, 100)
      .required("subject", &input.subject, 100)
      .required("grade", &input.grade, 50)
      .required("lesson_title", &input.lesson_title, 200)
      .optional("supervisor_signature", input.supervisor_signature.as_deref(), 100)
      .check(
        "follow_up_date",
        input.follow_up_date.is_none_or(|d| d >= input.visit_date),
        "must not be before the visit date",
      )
      .finish()?;
    Ok(input)
  }

  pub fn into_visit(self, visit_id: Uuid, created_at: DateTime<Utc>) -> Visit {
    Visit {
      visit_id,
      teacher_id: self.teacher_id,
      supervisor_id: self.supervisor_id,
      visit_date: self.visit_date,
      school_name: self.school_name,
      subject: self.subject,
      grade: self.grade,
      lesson_title: self.lesson_title,
      management_scores: self.management_scores,
      teaching_scores: self.teaching_scores,
      feedback_scores: self.feedback_scores,
      feedback_1: self.feedback_1,
      feedback_2: self.feedback_2,
      suggestions: self.suggestions,
      follow_up_date: self.follow_up_date,
      status: self.status,
      supervisor_signature: self.supervisor_signature,
      created_at,
    }
  }
}

/// Filters for [`crate::store::RecordStore::list_visits`]. Results are
/// newest visit date first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisitQuery {
  pub teacher_id:    Option<Uuid>,
  pub supervisor_id: Option<Uuid>,
  pub status:        Option<VisitStatus>,
  /// Inclusive lower bound on `visit_date`.
  pub from:          Option<NaiveDate>,
  /// Inclusive upper bound on `visit_date`.
  pub until:         Option<NaiveDate>,
  pub limit:         Option<usize>,
  pub offset:        Option<usize>,
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn input() -> VisitInput {
    VisitInput {
      teacher_id:           Uuid::new_v4(),
      supervisor_id:        Uuid::new_v4(),
      visit_date:           NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
      school_name:          "منارات المدينة المنورة".into(),
      subject:              "العلوم".into(),
      grade:                "الخامس".into(),
      lesson_title:         "دورة الماء".into(),
      management_scores:    ScoreSheet::new(),
      teaching_scores:      ScoreSheet::new(),
      feedback_scores:      ScoreSheet::new(),
      feedback_1:           Some("  ".into()),
      feedback_2:           None,
      suggestions:          Some("استخدام الوسائل".into()),
      follow_up_date:       None,
      status:               VisitStatus::Pending,
      supervisor_signature: None,
    }
  }

  #[test]
  fn status_accepts_arabic_labels() {
    let s: VisitStatus = serde_json::from_value(json!("ملغاة")).unwrap();
    assert_eq!(s, VisitStatus::Cancelled);
    assert_eq!("معلقة".parse::<VisitStatus>().unwrap(), VisitStatus::Pending);
    assert_eq!(serde_json::to_value(VisitStatus::Completed).unwrap(), json!("completed"));
  }

  #[test]
  fn follow_up_before_visit_is_rejected() {
    let mut v = input();
    v.follow_up_date = NaiveDate::from_ymd_opt(2024, 3, 1);
    assert!(matches!(v.validated(), Err(Error::Validation(_))));

    let mut v = input();
    v.follow_up_date = NaiveDate::from_ymd_opt(2024, 3, 10);
    assert!(v.validated().is_ok());
  }

  #[test]
  fn blank_feedback_is_dropped() {
    let v = input().validated().unwrap();
    assert_eq!(v.feedback_1, None);
    assert!(v.suggestions.is_some());
  }

  #[test]
  fn grade_longer_than_fifty_characters_is_rejected() {
    let mut v = input();
    v.grade = "x".repeat(51);
    assert!(v.validated().is_err());
  }

  #[test]
  fn minimal_json_input_uses_defaults() {
    let v: VisitInput = serde_json::from_value(json!({
      "teacher_id": Uuid::nil(),
      "supervisor_id": Uuid::nil(),
      "visit_date": "2024-03-10",
      "school_name": "s",
      "subject": "m",
      "grade": "g",
      "lesson_title": "l",
    }))
    .unwrap();
    assert_eq!(v.status, VisitStatus::Completed);
    assert!(v.teaching_scores.is_empty());
  }
}
