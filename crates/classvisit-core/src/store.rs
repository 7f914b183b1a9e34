//! The `RecordStore` trait.
//!
//! Implemented by storage backends (e.g. `classvisit-store-sqlite`). The API
//! and server crates depend on this abstraction, not on a concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  StoreError,
  report::{Dashboard, VisitReport},
  supervisor::{Supervisor, SupervisorInput},
  teacher::{Teacher, TeacherInput},
  user::{NewUser, User, UserCredentials},
  visit::{Visit, VisitInput, VisitQuery},
};

/// Abstraction over a visit-records backend.
///
/// Records change only by full replace. Every input is validated before the
/// backend is touched, and unique-email/username and referential checks are
/// the backend's responsibility:
///
/// - duplicate email or username → [`crate::Error::Conflict`]
/// - missing record, or a visit naming a missing teacher/supervisor →
///   [`crate::Error::NotFound`]
/// - deleting a teacher/supervisor that visits still reference →
///   [`crate::Error::InUse`]; nothing is deleted
/// - a replace given an `expected` record that no longer matches the stored
///   one → [`crate::Error::Stale`]; nothing is written. The comparison runs
///   in the same transaction as the write.
///
/// All methods return `Send` futures so the trait can back an axum router.
pub trait RecordStore: Send + Sync {
  type Error: StoreError;

  // ── Users ─────────────────────────────────────────────────────────────

  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look a user up by username *or* email, for login.
  fn find_user<'a>(
    &'a self,
    identifier: &'a str,
  ) -> impl Future<Output = Result<Option<UserCredentials>, Self::Error>> + Send + 'a;

  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Enable or disable an account. Returns the updated user.
  fn set_user_active(
    &self,
    id: Uuid,
    active: bool,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  // ── Teachers ──────────────────────────────────────────────────────────

  fn add_teacher(
    &self,
    input: TeacherInput,
  ) -> impl Future<Output = Result<Teacher, Self::Error>> + Send + '_;

  fn get_teacher(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Teacher>, Self::Error>> + Send + '_;

  /// All teachers, ordered by name.
  fn list_teachers(
    &self,
  ) -> impl Future<Output = Result<Vec<Teacher>, Self::Error>> + Send + '_;

  fn replace_teacher(
    &self,
    id: Uuid,
    input: TeacherInput,
    expected: Option<Teacher>,
  ) -> impl Future<Output = Result<Teacher, Self::Error>> + Send + '_;

  fn delete_teacher(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Supervisors ───────────────────────────────────────────────────────

  fn add_supervisor(
    &self,
    input: SupervisorInput,
  ) -> impl Future<Output = Result<Supervisor, Self::Error>> + Send + '_;

  fn get_supervisor(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Supervisor>, Self::Error>> + Send + '_;

  /// All supervisors, ordered by name.
  fn list_supervisors(
    &self,
  ) -> impl Future<Output = Result<Vec<Supervisor>, Self::Error>> + Send + '_;

  fn replace_supervisor(
    &self,
    id: Uuid,
    input: SupervisorInput,
    expected: Option<Supervisor>,
  ) -> impl Future<Output = Result<Supervisor, Self::Error>> + Send + '_;

  fn delete_supervisor(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Visits ────────────────────────────────────────────────────────────

  /// Record a visit. `created_at` is set by the store.
  fn add_visit(
    &self,
    input: VisitInput,
  ) -> impl Future<Output = Result<Visit, Self::Error>> + Send + '_;

  fn get_visit(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Visit>, Self::Error>> + Send + '_;

  /// Visits matching `query`, newest visit date first (ties: newest
  /// `created_at` first).
  fn list_visits<'a>(
    &'a self,
    query: &'a VisitQuery,
  ) -> impl Future<Output = Result<Vec<Visit>, Self::Error>> + Send + 'a;

  /// Replace every field of a visit except its id and `created_at`.
  fn replace_visit(
    &self,
    id: Uuid,
    input: VisitInput,
    expected: Option<Visit>,
  ) -> impl Future<Output = Result<Visit, Self::Error>> + Send + '_;

  fn count_visits(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Read models ───────────────────────────────────────────────────────

  fn dashboard(
    &self,
  ) -> impl Future<Output = Result<Dashboard, Self::Error>> + Send + '_;

  /// Assemble the report for a visit. Returns `None` if the visit does not
  /// exist.
  fn visit_report(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<VisitReport>, Self::Error>> + Send + '_;
}
