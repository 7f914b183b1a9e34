//! Supervisors: the people who carry out visits.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  validate::{Checker, trim, trim_optional},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supervisor {
  pub supervisor_id: Uuid,
  pub name:          String,
  pub email:         String,
  pub specialty:     String,
  pub phone:         Option<String>,
}

/// The full replaceable body of a supervisor record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorInput {
  pub name:      String,
  pub email:     String,
  pub specialty: String,
  #[serde(default)]
  pub phone:     Option<String>,
}

impl SupervisorInput {
  pub fn validated(self) -> Result<Self> {
    let input = Self {
      name:      trim(self.name),
      email:     trim(self.email),
      specialty: trim(self.specialty),
      phone:     trim_optional(self.phone),
    };
    Checker::new()
      .required("name", &input.name, 100)
      .email("email", &input.email, 120)
      .required("specialty", &input.specialty, 100)
      .optional("phone", input.phone.as_deref(), 20)
      .finish()?;
    Ok(input)
  }

  pub fn into_supervisor(self, supervisor_id: Uuid) -> Supervisor {
    Supervisor {
      supervisor_id,
      name: self.name,
      email: self.email,
      specialty: self.specialty,
      phone: self.phone,
    }
  }
}
