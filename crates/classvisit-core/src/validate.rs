//! Form-input checks shared by every record type.
//!
//! Lengths are counted in characters, not bytes; most names and school
//! titles are entered in Arabic.

use crate::{Error, FieldError, Result};

/// Collects field errors so a submission reports every problem at once.
#[derive(Debug, Default)]
pub struct Checker {
  errors: Vec<FieldError>,
}

impl Checker {
  pub fn new() -> Self { Self::default() }

  /// A mandatory text field: non-blank and at most `max` characters.
  pub fn required(&mut self, field: &'static str, value: &str, max: usize) -> &mut Self {
    if value.trim().is_empty() {
      self.push(field, "is required");
    } else {
      self.max_len(field, value, max);
    }
    self
  }

  /// An optional text field; only the length is checked when present.
  pub fn optional(&mut self, field: &'static str, value: Option<&str>, max: usize) -> &mut Self {
    if let Some(value) = value {
      self.max_len(field, value, max);
    }
    self
  }

  /// A mandatory email address.
  pub fn email(&mut self, field: &'static str, value: &str, max: usize) -> &mut Self {
    if value.trim().is_empty() {
      self.push(field, "is required");
    } else if !is_email(value) {
      self.push(field, "is not a valid email address");
    } else {
      self.max_len(field, value, max);
    }
    self
  }

  /// Record a rule-specific failure.
  pub fn check(&mut self, field: &'static str, ok: bool, message: &str) -> &mut Self {
    if !ok {
      self.push(field, message);
    }
    self
  }

  pub fn finish(&mut self) -> Result<()> {
    if self.errors.is_empty() {
      Ok(())
    } else {
      Err(Error::Validation(std::mem::take(&mut self.errors)))
    }
  }

  fn max_len(&mut self, field: &'static str, value: &str, max: usize) {
    if value.chars().count() > max {
      self.push(field, format!("must be at most {max} characters"));
    }
  }

  fn push(&mut self, field: &'static str, message: impl Into<String>) {
    self.errors.push(FieldError::new(field, message));
  }
}

/// Shape check only: `local@domain.tld` with no whitespace.
pub fn is_email(s: &str) -> bool {
  let s = s.trim();
  if s.chars().any(char::is_whitespace) {
    return false;
  }
  let Some((local, domain)) = s.split_once('@') else {
    return false;
  };
  !local.is_empty()
    && !domain.contains('@')
    && domain
      .split_once('.')
      .is_some_and(|(head, tail)| !head.is_empty() && !tail.is_empty())
    && !domain.ends_with('.')
}

/// Trim a mandatory field in place.
pub fn trim(s: String) -> String {
  let trimmed = s.trim();
  if trimmed.len() == s.len() { s } else { trimmed.to_owned() }
}

/// Trim an optional field; blank becomes `None`.
pub fn trim_optional(s: Option<String>) -> Option<String> {
  s.map(trim).filter(|s| !s.is_empty())
}
