//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings with fixed microsecond precision so they
//! sort lexically. Calendar dates are `YYYY-MM-DD`. Score sheets are compact
//! JSON objects. UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound as _, Utc};
use classvisit_core::{
  score::ScoreSheet,
  supervisor::Supervisor,
  teacher::Teacher,
  user::{Role, User, UserCredentials},
  visit::{Visit, VisitStatus},
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> / NaiveDate ───────────────────────────────────────────────

/// The current time at the precision the store keeps, so a record handed
/// back from a write equals the same record read later.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str { r.as_str() }

pub fn decode_role(s: &str) -> Result<Role> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown role: {s:?}")))
}

pub fn encode_status(s: VisitStatus) -> &'static str { s.as_str() }

pub fn decode_status(s: &str) -> Result<VisitStatus> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown visit status: {s:?}")))
}

// ─── Scores ──────────────────────────────────────────────────────────────────

pub fn encode_scores(sheet: &ScoreSheet) -> Result<String> {
  Ok(serde_json::to_string(sheet)?)
}

pub fn decode_scores(s: &str) -> Result<ScoreSheet> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str =
  "user_id, username, email, name, role, is_active, created_at, password_hash";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub username:      String,
  pub email:         String,
  pub name:          String,
  pub role:          String,
  pub is_active:     bool,
  pub created_at:    String,
  pub password_hash: String,
}

impl RawUser {
  /// Expects the columns in [`USER_COLUMNS`] order.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      username:      row.get(1)?,
      email:         row.get(2)?,
      name:          row.get(3)?,
      role:          row.get(4)?,
      is_active:     row.get(5)?,
      created_at:    row.get(6)?,
      password_hash: row.get(7)?,
    })
  }

  pub fn into_credentials(self) -> Result<UserCredentials> {
    Ok(UserCredentials {
      user:          User {
        user_id:    decode_uuid(&self.user_id)?,
        username:   self.username,
        email:      self.email,
        name:       self.name,
        role:       decode_role(&self.role)?,
        is_active:  self.is_active,
        created_at: decode_dt(&self.created_at)?,
      },
      password_hash: self.password_hash,
    })
  }

  pub fn into_user(self) -> Result<User> { Ok(self.into_credentials()?.user) }
}

pub const TEACHER_COLUMNS: &str =
  "teacher_id, name, email, subject, school, phone, grade";

/// Raw values read directly from a `teachers` row.
#[derive(Debug, PartialEq, Eq)]
pub struct RawTeacher {
  pub teacher_id: String,
  pub name:       String,
  pub email:      String,
  pub subject:    String,
  pub school:     String,
  pub phone:      Option<String>,
  pub grade:      Option<String>,
}

impl RawTeacher {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      teacher_id: row.get(0)?,
      name:       row.get(1)?,
      email:      row.get(2)?,
      subject:    row.get(3)?,
      school:     row.get(4)?,
      phone:      row.get(5)?,
      grade:      row.get(6)?,
    })
  }

  pub fn from_teacher(t: &Teacher) -> Self {
    Self {
      teacher_id: encode_uuid(t.teacher_id),
      name:       t.name.clone(),
      email:      t.email.clone(),
      subject:    t.subject.clone(),
      school:     t.school.clone(),
      phone:      t.phone.clone(),
      grade:      t.grade.clone(),
    }
  }

  pub fn into_teacher(self) -> Result<Teacher> {
    Ok(Teacher {
      teacher_id: decode_uuid(&self.teacher_id)?,
      name:       self.name,
      email:      self.email,
      subject:    self.subject,
      school:     self.school,
      phone:      self.phone,
      grade:      self.grade,
    })
  }
}

pub const SUPERVISOR_COLUMNS: &str =
  "supervisor_id, name, email, specialty, phone";

/// Raw values read directly from a `supervisors` row.
#[derive(Debug, PartialEq, Eq)]
pub struct RawSupervisor {
  pub supervisor_id: String,
  pub name:          String,
  pub email:         String,
  pub specialty:     String,
  pub phone:         Option<String>,
}

impl RawSupervisor {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      supervisor_id: row.get(0)?,
      name:          row.get(1)?,
      email:         row.get(2)?,
      specialty:     row.get(3)?,
      phone:         row.get(4)?,
    })
  }

  pub fn from_supervisor(s: &Supervisor) -> Self {
    Self {
      supervisor_id: encode_uuid(s.supervisor_id),
      name:          s.name.clone(),
      email:         s.email.clone(),
      specialty:     s.specialty.clone(),
      phone:         s.phone.clone(),
    }
  }

  pub fn into_supervisor(self) -> Result<Supervisor> {
    Ok(Supervisor {
      supervisor_id: decode_uuid(&self.supervisor_id)?,
      name:          self.name,
      email:         self.email,
      specialty:     self.specialty,
      phone:         self.phone,
    })
  }
}

pub const VISIT_COLUMNS: &str = "visit_id, teacher_id, supervisor_id, visit_date,
  school_name, subject, grade, lesson_title,
  management_scores, teaching_scores, feedback_scores,
  feedback_1, feedback_2, suggestions, follow_up_date,
  status, supervisor_signature, created_at";

/// Raw values read directly from a `visits` row.
#[derive(Debug, PartialEq, Eq)]
pub struct RawVisit {
  pub visit_id:             String,
  pub teacher_id:           String,
  pub supervisor_id:        String,
  pub visit_date:           String,
  pub school_name:          String,
  pub subject:              String,
  pub grade:                String,
  pub lesson_title:         String,
  pub management_scores:    String,
  pub teaching_scores:      String,
  pub feedback_scores:      String,
  pub feedback_1:           Option<String>,
  pub feedback_2:           Option<String>,
  pub suggestions:          Option<String>,
  pub follow_up_date:       Option<String>,
  pub status:               String,
  pub supervisor_signature: Option<String>,
  pub created_at:           String,
}

impl RawVisit {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      visit_id:             row.get(0)?,
      teacher_id:           row.get(1)?,
      supervisor_id:        row.get(2)?,
      visit_date:           row.get(3)?,
      school_name:          row.get(4)?,
      subject:              row.get(5)?,
      grade:                row.get(6)?,
      lesson_title:         row.get(7)?,
      management_scores:    row.get(8)?,
      teaching_scores:      row.get(9)?,
      feedback_scores:      row.get(10)?,
      feedback_1:           row.get(11)?,
      feedback_2:           row.get(12)?,
      suggestions:          row.get(13)?,
      follow_up_date:       row.get(14)?,
      status:               row.get(15)?,
      supervisor_signature: row.get(16)?,
      created_at:           row.get(17)?,
    })
  }

  pub fn from_visit(v: &Visit) -> Result<Self> {
    Ok(Self {
      visit_id:             encode_uuid(v.visit_id),
      teacher_id:           encode_uuid(v.teacher_id),
      supervisor_id:        encode_uuid(v.supervisor_id),
      visit_date:           encode_date(v.visit_date),
      school_name:          v.school_name.clone(),
      subject:              v.subject.clone(),
      grade:                v.grade.clone(),
      lesson_title:         v.lesson_title.clone(),
      management_scores:    encode_scores(&v.management_scores)?,
      teaching_scores:      encode_scores(&v.teaching_scores)?,
      feedback_scores:      encode_scores(&v.feedback_scores)?,
      feedback_1:           v.feedback_1.clone(),
      feedback_2:           v.feedback_2.clone(),
      suggestions:          v.suggestions.clone(),
      follow_up_date:       v.follow_up_date.map(encode_date),
      status:               encode_status(v.status).to_owned(),
      supervisor_signature: v.supervisor_signature.clone(),
      created_at:           encode_dt(v.created_at),
    })
  }

  pub fn into_visit(self) -> Result<Visit> {
    Ok(Visit {
      visit_id:             decode_uuid(&self.visit_id)?,
      teacher_id:           decode_uuid(&self.teacher_id)?,
      supervisor_id:        decode_uuid(&self.supervisor_id)?,
      visit_date:           decode_date(&self.visit_date)?,
      school_name:          self.school_name,
      subject:              self.subject,
      grade:                self.grade,
      lesson_title:         self.lesson_title,
      management_scores:    decode_scores(&self.management_scores)?,
      teaching_scores:      decode_scores(&self.teaching_scores)?,
      feedback_scores:      decode_scores(&self.feedback_scores)?,
      feedback_1:           self.feedback_1,
      feedback_2:           self.feedback_2,
      suggestions:          self.suggestions,
      follow_up_date:       self
        .follow_up_date
        .as_deref()
        .map(decode_date)
        .transpose()?,
      status:               decode_status(&self.status)?,
      supervisor_signature: self.supervisor_signature,
      created_at:           decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_have_fixed_width() {
    let a = encode_dt(Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap());
    let b = encode_dt(Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
      + chrono::Duration::microseconds(1));
    assert_eq!(a.len(), b.len());
    assert!(a < b);
    assert_eq!(decode_dt(&a).unwrap().timestamp(), 1_704_096_000);
  }

  #[test]
  fn dates_roundtrip_and_reject_garbage() {
    let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    assert_eq!(encode_date(d), "2024-02-29");
    assert_eq!(decode_date("2024-02-29").unwrap(), d);
    assert!(decode_date("29/02/2024").is_err());
  }

  #[test]
  fn unknown_enum_values_are_decode_errors() {
    assert!(matches!(decode_role("root"), Err(Error::Decode(_))));
    assert!(matches!(decode_status("done"), Err(Error::Decode(_))));
  }
}
