//! Teachers: the people whose lessons are observed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  validate::{Checker, trim, trim_optional},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
  pub teacher_id: Uuid,
  pub name:       String,
  pub email:      String,
  pub subject:    String,
  pub school:     String,
  pub phone:      Option<String>,
  /// Free text; a teacher may cover several grades ("الأول, الثاني").
  pub grade:      Option<String>,
}

/// The full replaceable body of a teacher record. Used for both create and
/// replace; there is no partial update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherInput {
  pub name:    String,
  pub email:   String,
  pub subject: String,
  pub school:  String,
  #[serde(default)]
  pub phone:   Option<String>,
  #[serde(default)]
  pub grade:   Option<String>,
}

impl TeacherInput {
  pub fn validated(self) -> Result<Self> {
    let input = Self {
      name:    trim(self.name),
      email:   trim(self.email),
      subject: trim(self.subject),
      school:  trim(self.school),
      phone:   trim_optional(self.phone),
      grade:   trim_optional(self.grade),
    };
    Checker::new()
      .required("name", &input.name, 100)
      .email("email", &input.email, 120)
      .required("subject", &input.subject, 100)
      .required("school", &input.school, 100)
      .optional("phone", input.phone.as_deref(), 20)
      .optional("grade", input.grade.as_deref(), 100)
      .finish()?;
    Ok(input)
  }

  pub fn into_teacher(self, teacher_id: Uuid) -> Teacher {
    Teacher {
      teacher_id,
      name: self.name,
      email: self.email,
      subject: self.subject,
      school: self.school,
      phone: self.phone,
      grade: self.grade,
    }
  }
}
