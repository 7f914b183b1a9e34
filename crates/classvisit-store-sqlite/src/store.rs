//! [`SqliteStore`]: the SQLite implementation of [`RecordStore`].
//!
//! Every check-then-write runs inside one transaction on the connection
//! thread, so a uniqueness or reference check cannot go stale before the
//! write that depends on it. Domain failures found inside a transaction are
//! returned as the inner `Err` of a nested result and surface as
//! [`Error::Core`].

use std::path::Path;

use classvisit_core::{
  Entity,
  Error as CoreError,
  report::{Dashboard, RECENT_VISITS, VisitReport},
  store::RecordStore,
  supervisor::{Supervisor, SupervisorInput},
  teacher::{Teacher, TeacherInput},
  user::{NewUser, User, UserCredentials},
  visit::{Visit, VisitInput, VisitQuery},
};
use rusqlite::{OptionalExtension as _, Row, Transaction};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    RawSupervisor, RawTeacher, RawUser, RawVisit, SUPERVISOR_COLUMNS,
    TEACHER_COLUMNS, USER_COLUMNS, VISIT_COLUMNS, decode_dt, encode_date,
    encode_dt, encode_role, now, encode_scores, encode_status, encode_uuid,
  },
  schema::SCHEMA,
};

/// Outcome of work done on the connection thread: the outer error is a
/// database failure, the inner one a domain rule.
type Checked<T> = tokio_rusqlite::Result<Result<T, CoreError>>;

// ─── Directories ─────────────────────────────────────────────────────────────

/// Teachers and supervisors share the same uniqueness and delete rules.
struct Directory {
  entity:   Entity,
  table:    &'static str,
  id_col:   &'static str,
  /// Column in `visits` that references this table.
  visit_fk: &'static str,
}

const TEACHERS: Directory = Directory {
  entity:   Entity::Teacher,
  table:    "teachers",
  id_col:   "teacher_id",
  visit_fk: "teacher_id",
};

const SUPERVISORS: Directory = Directory {
  entity:   Entity::Supervisor,
  table:    "supervisors",
  id_col:   "supervisor_id",
  visit_fk: "supervisor_id",
};

impl Directory {
  fn exists(&self, tx: &Transaction<'_>, id: &str) -> rusqlite::Result<bool> {
    let sql = format!("SELECT 1 FROM {} WHERE {} = ?1", self.table, self.id_col);
    Ok(tx.query_row(&sql, [id], |_| Ok(())).optional()?.is_some())
  }

  /// Whether another record (not `except`) already uses `email`.
  fn email_taken(
    &self,
    tx: &Transaction<'_>,
    email: &str,
    except: Option<&str>,
  ) -> rusqlite::Result<bool> {
    let sql = format!(
      "SELECT 1 FROM {} WHERE email = ?1 AND (?2 IS NULL OR {} != ?2)",
      self.table, self.id_col
    );
    Ok(
      tx.query_row(&sql, rusqlite::params![email, except], |_| Ok(()))
        .optional()?
        .is_some(),
    )
  }

  fn conflict(&self) -> CoreError {
    CoreError::Conflict(format!("a {} with this email already exists", self.entity))
  }

  /// Delete `id` unless any visit references it.
  fn delete_guarded(&self, conn: &mut rusqlite::Connection, id: Uuid) -> Checked<()> {
    let id_str = encode_uuid(id);
    let tx = conn.transaction()?;
    if !self.exists(&tx, &id_str)? {
      return Ok(Err(CoreError::not_found(self.entity, id)));
    }
    let visits: u64 = tx.query_row(
      &format!("SELECT COUNT(*) FROM visits WHERE {} = ?1", self.visit_fk),
      [&id_str],
      |r| r.get(0),
    )?;
    if visits > 0 {
      return Ok(Err(CoreError::InUse { entity: self.entity, id, visits }));
    }
    tx.execute(
      &format!("DELETE FROM {} WHERE {} = ?1", self.table, self.id_col),
      [&id_str],
    )?;
    tx.commit()?;
    Ok(Ok(()))
  }
}

/// Map a UNIQUE violation that slipped past a pre-check to `Conflict`.
fn unique_or(res: rusqlite::Result<usize>, conflict: impl FnOnce() -> CoreError) -> Checked<usize> {
  match res {
    Ok(n) => Ok(Ok(n)),
    Err(rusqlite::Error::SqliteFailure(e, _))
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
    {
      Ok(Err(conflict()))
    }
    Err(e) => Err(e.into()),
  }
}

/// Whether the row selected by `sql` (bound to `id`) still equals what the
/// caller read earlier. A missing row never matches.
fn still_matches<R: PartialEq>(
  tx: &Transaction<'_>,
  sql: &str,
  id: &str,
  from_row: fn(&Row<'_>) -> rusqlite::Result<R>,
  expected: &R,
) -> rusqlite::Result<bool> {
  let current = tx.query_row(sql, [id], from_row).optional()?;
  Ok(current.as_ref() == Some(expected))
}

/// Both people a visit names must exist.
fn check_visit_refs(tx: &Transaction<'_>, teacher_id: Uuid, supervisor_id: Uuid) -> Checked<()> {
  if !TEACHERS.exists(tx, &encode_uuid(teacher_id))? {
    return Ok(Err(CoreError::not_found(Entity::Teacher, teacher_id)));
  }
  if !SUPERVISORS.exists(tx, &encode_uuid(supervisor_id))? {
    return Ok(Err(CoreError::not_found(Entity::Supervisor, supervisor_id)));
  }
  Ok(Ok(()))
}

/// The columns of a visit that a replace may change, encoded for binding.
struct VisitRow {
  teacher_id:           String,
  supervisor_id:        String,
  visit_date:           String,
  school_name:          String,
  subject:              String,
  grade:                String,
  lesson_title:         String,
  management_scores:    String,
  teaching_scores:      String,
  feedback_scores:      String,
  feedback_1:           Option<String>,
  feedback_2:           Option<String>,
  suggestions:          Option<String>,
  follow_up_date:       Option<String>,
  status:               &'static str,
  supervisor_signature: Option<String>,
}

impl VisitRow {
  fn encode(input: &VisitInput) -> Result<Self> {
    Ok(Self {
      teacher_id:           encode_uuid(input.teacher_id),
      supervisor_id:        encode_uuid(input.supervisor_id),
      visit_date:           encode_date(input.visit_date),
      school_name:          input.school_name.clone(),
      subject:              input.subject.clone(),
      grade:                input.grade.clone(),
      lesson_title:         input.lesson_title.clone(),
      management_scores:    encode_scores(&input.management_scores)?,
      teaching_scores:      encode_scores(&input.teaching_scores)?,
      feedback_scores:      encode_scores(&input.feedback_scores)?,
      feedback_1:           input.feedback_1.clone(),
      feedback_2:           input.feedback_2.clone(),
      suggestions:          input.suggestions.clone(),
      follow_up_date:       input.follow_up_date.map(encode_date),
      status:               encode_status(input.status),
      supervisor_signature: input.supervisor_signature.clone(),
    })
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A visit-record store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_user(&self, sql: String, param: String) -> Result<Option<RawUser>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(conn.query_row(&sql, [param], RawUser::from_row).optional()?)
        })
        .await?,
    )
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<User> {
    let input = input.validated()?;
    let user = User {
      user_id:    Uuid::new_v4(),
      username:   input.username,
      email:      input.email,
      name:       input.name,
      role:       input.role,
      is_active:  input.is_active,
      created_at: now(),
    };

    let id_str   = encode_uuid(user.user_id);
    let username = user.username.clone();
    let email    = user.email.clone();
    let name     = user.name.clone();
    let role     = encode_role(user.role);
    let active   = user.is_active;
    let at_str   = encode_dt(user.created_at);
    let hash     = input.password_hash;

    let outcome: Result<(), CoreError> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let taken: Option<String> = tx
          .query_row(
            "SELECT CASE WHEN username = ?1 THEN 'username' ELSE 'email' END
             FROM users WHERE username = ?1 OR email = ?2 LIMIT 1",
            rusqlite::params![username, email],
            |r| r.get(0),
          )
          .optional()?;
        if let Some(field) = taken {
          return Ok(Err(CoreError::Conflict(format!(
            "a user with this {field} already exists"
          ))));
        }
        let inserted = unique_or(
          tx.execute(
            "INSERT INTO users (
               user_id, username, email, password_hash, role, name, is_active, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![id_str, username, email, hash, role, name, active, at_str],
          ),
          || CoreError::Conflict("username or email already in use".into()),
        )?;
        if let Err(e) = inserted {
          return Ok(Err(e));
        }
        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;
    outcome?;

    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1");
    self
      .query_user(sql, encode_uuid(id))
      .await?
      .map(RawUser::into_user)
      .transpose()
  }

  async fn find_user(&self, identifier: &str) -> Result<Option<UserCredentials>> {
    // A username match wins over another account's email.
    let sql = format!(
      "SELECT {USER_COLUMNS} FROM users
       WHERE username = ?1 OR email = ?1
       ORDER BY (username = ?1) DESC
       LIMIT 1"
    );
    self
      .query_user(sql, identifier.trim().to_owned())
      .await?
      .map(RawUser::into_credentials)
      .transpose()
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_COLUMNS} FROM users ORDER BY username"
        ))?;
        let rows = stmt
          .query_map([], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn set_user_active(&self, id: Uuid, active: bool) -> Result<User> {
    let id_str = encode_uuid(id);
    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET is_active = ?2 WHERE user_id = ?1",
          rusqlite::params![id_str, active],
        )?)
      })
      .await?;
    if updated == 0 {
      return Err(CoreError::not_found(Entity::User, id).into());
    }
    self
      .get_user(id)
      .await?
      .ok_or_else(|| CoreError::not_found(Entity::User, id).into())
  }

  // ── Teachers ──────────────────────────────────────────────────────────────

  async fn add_teacher(&self, input: TeacherInput) -> Result<Teacher> {
    let teacher = input.validated()?.into_teacher(Uuid::new_v4());
    let t = teacher.clone();

    let outcome: Result<(), CoreError> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if TEACHERS.email_taken(&tx, &t.email, None)? {
          return Ok(Err(TEACHERS.conflict()));
        }
        let inserted = unique_or(
          tx.execute(
            "INSERT INTO teachers (teacher_id, name, email, subject, school, phone, grade)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
              encode_uuid(t.teacher_id),
              t.name,
              t.email,
              t.subject,
              t.school,
              t.phone,
              t.grade,
            ],
          ),
          || TEACHERS.conflict(),
        )?;
        if let Err(e) = inserted {
          return Ok(Err(e));
        }
        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;
    outcome?;

    Ok(teacher)
  }

  async fn get_teacher(&self, id: Uuid) -> Result<Option<Teacher>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawTeacher> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {TEACHER_COLUMNS} FROM teachers WHERE teacher_id = ?1"),
              [id_str],
              RawTeacher::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTeacher::into_teacher).transpose()
  }

  async fn list_teachers(&self) -> Result<Vec<Teacher>> {
    let raws: Vec<RawTeacher> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {TEACHER_COLUMNS} FROM teachers ORDER BY name, teacher_id"
        ))?;
        let rows = stmt
          .query_map([], RawTeacher::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTeacher::into_teacher).collect()
  }

  async fn replace_teacher(
    &self,
    id: Uuid,
    input: TeacherInput,
    expected: Option<Teacher>,
  ) -> Result<Teacher> {
    let teacher = input.validated()?.into_teacher(id);
    let t = teacher.clone();
    let expected = expected.as_ref().map(RawTeacher::from_teacher);

    let outcome: Result<(), CoreError> = self
      .conn
      .call(move |conn| {
        let id_str = encode_uuid(t.teacher_id);
        let tx = conn.transaction()?;
        if !TEACHERS.exists(&tx, &id_str)? {
          return Ok(Err(CoreError::not_found(Entity::Teacher, t.teacher_id)));
        }
        if let Some(expected) = &expected {
          let sql = format!("SELECT {TEACHER_COLUMNS} FROM teachers WHERE teacher_id = ?1");
          if !still_matches(&tx, &sql, &id_str, RawTeacher::from_row, expected)? {
            return Ok(Err(CoreError::stale(Entity::Teacher, t.teacher_id)));
          }
        }
        if TEACHERS.email_taken(&tx, &t.email, Some(id_str.as_str()))? {
          return Ok(Err(TEACHERS.conflict()));
        }
        let updated = unique_or(
          tx.execute(
            "UPDATE teachers
             SET name = ?2, email = ?3, subject = ?4, school = ?5, phone = ?6, grade = ?7
             WHERE teacher_id = ?1",
            rusqlite::params![id_str, t.name, t.email, t.subject, t.school, t.phone, t.grade],
          ),
          || TEACHERS.conflict(),
        )?;
        if let Err(e) = updated {
          return Ok(Err(e));
        }
        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;
    outcome?;

    Ok(teacher)
  }

  async fn delete_teacher(&self, id: Uuid) -> Result<()> {
    let outcome = self
      .conn
      .call(move |conn| TEACHERS.delete_guarded(conn, id))
      .await?;
    Ok(outcome?)
  }

  // ── Supervisors ───────────────────────────────────────────────────────────

  async fn add_supervisor(&self, input: SupervisorInput) -> Result<Supervisor> {
    let supervisor = input.validated()?.into_supervisor(Uuid::new_v4());
    let s = supervisor.clone();

    let outcome: Result<(), CoreError> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if SUPERVISORS.email_taken(&tx, &s.email, None)? {
          return Ok(Err(SUPERVISORS.conflict()));
        }
        let inserted = unique_or(
          tx.execute(
            "INSERT INTO supervisors (supervisor_id, name, email, specialty, phone)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
              encode_uuid(s.supervisor_id),
              s.name,
              s.email,
              s.specialty,
              s.phone,
            ],
          ),
          || SUPERVISORS.conflict(),
        )?;
        if let Err(e) = inserted {
          return Ok(Err(e));
        }
        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;
    outcome?;

    Ok(supervisor)
  }

  async fn get_supervisor(&self, id: Uuid) -> Result<Option<Supervisor>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawSupervisor> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {SUPERVISOR_COLUMNS} FROM supervisors WHERE supervisor_id = ?1"
              ),
              [id_str],
              RawSupervisor::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSupervisor::into_supervisor).transpose()
  }

  async fn list_supervisors(&self) -> Result<Vec<Supervisor>> {
    let raws: Vec<RawSupervisor> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUPERVISOR_COLUMNS} FROM supervisors ORDER BY name, supervisor_id"
        ))?;
        let rows = stmt
          .query_map([], RawSupervisor::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSupervisor::into_supervisor).collect()
  }

  async fn replace_supervisor(
    &self,
    id: Uuid,
    input: SupervisorInput,
    expected: Option<Supervisor>,
  ) -> Result<Supervisor> {
    let supervisor = input.validated()?.into_supervisor(id);
    let s = supervisor.clone();
    let expected = expected.as_ref().map(RawSupervisor::from_supervisor);

    let outcome: Result<(), CoreError> = self
      .conn
      .call(move |conn| {
        let id_str = encode_uuid(s.supervisor_id);
        let tx = conn.transaction()?;
        if !SUPERVISORS.exists(&tx, &id_str)? {
          return Ok(Err(CoreError::not_found(Entity::Supervisor, s.supervisor_id)));
        }
        if let Some(expected) = &expected {
          let sql =
            format!("SELECT {SUPERVISOR_COLUMNS} FROM supervisors WHERE supervisor_id = ?1");
          if !still_matches(&tx, &sql, &id_str, RawSupervisor::from_row, expected)? {
            return Ok(Err(CoreError::stale(Entity::Supervisor, s.supervisor_id)));
          }
        }
        if SUPERVISORS.email_taken(&tx, &s.email, Some(id_str.as_str()))? {
          return Ok(Err(SUPERVISORS.conflict()));
        }
        let updated = unique_or(
          tx.execute(
            "UPDATE supervisors
             SET name = ?2, email = ?3, specialty = ?4, phone = ?5
             WHERE supervisor_id = ?1",
            rusqlite::params![id_str, s.name, s.email, s.specialty, s.phone],
          ),
          || SUPERVISORS.conflict(),
        )?;
        if let Err(e) = updated {
          return Ok(Err(e));
        }
        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;
    outcome?;

    Ok(supervisor)
  }

  async fn delete_supervisor(&self, id: Uuid) -> Result<()> {
    let outcome = self
      .conn
      .call(move |conn| SUPERVISORS.delete_guarded(conn, id))
      .await?;
    Ok(outcome?)
  }

  // ── Visits ────────────────────────────────────────────────────────────────

  async fn add_visit(&self, input: VisitInput) -> Result<Visit> {
    let input = input.validated()?;
    let row = VisitRow::encode(&input)?;
    let visit = input.into_visit(Uuid::new_v4(), now());
    let (teacher_id, supervisor_id) = (visit.teacher_id, visit.supervisor_id);
    let id_str = encode_uuid(visit.visit_id);
    let at_str = encode_dt(visit.created_at);

    let outcome: Result<(), CoreError> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Err(e) = check_visit_refs(&tx, teacher_id, supervisor_id)? {
          return Ok(Err(e));
        }
        tx.execute(
          &format!(
            "INSERT INTO visits ({VISIT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                     ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
          ),
          rusqlite::params![
            id_str,
            row.teacher_id,
            row.supervisor_id,
            row.visit_date,
            row.school_name,
            row.subject,
            row.grade,
            row.lesson_title,
            row.management_scores,
            row.teaching_scores,
            row.feedback_scores,
            row.feedback_1,
            row.feedback_2,
            row.suggestions,
            row.follow_up_date,
            row.status,
            row.supervisor_signature,
            at_str,
          ],
        )?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;
    outcome?;

    Ok(visit)
  }

  async fn get_visit(&self, id: Uuid) -> Result<Option<Visit>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawVisit> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {VISIT_COLUMNS} FROM visits WHERE visit_id = ?1"),
              [id_str],
              RawVisit::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVisit::into_visit).transpose()
  }

  async fn list_visits(&self, query: &VisitQuery) -> Result<Vec<Visit>> {
    let teacher_id    = query.teacher_id.map(encode_uuid);
    let supervisor_id = query.supervisor_id.map(encode_uuid);
    let status        = query.status.map(encode_status);
    let from          = query.from.map(encode_date);
    let until         = query.until.map(encode_date);
    // SQLite treats a negative LIMIT as "no limit".
    let limit_val     = query.limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
    let offset_val    = query.offset.map_or(0, |o| i64::try_from(o).unwrap_or(i64::MAX));

    let raws: Vec<RawVisit> = self
      .conn
      .call(move |conn| {
        let mut conds: Vec<&'static str> = vec![];
        if teacher_id.is_some() {
          conds.push("teacher_id = ?1");
        }
        if supervisor_id.is_some() {
          conds.push("supervisor_id = ?2");
        }
        if status.is_some() {
          conds.push("status = ?3");
        }
        if from.is_some() {
          conds.push("visit_date >= ?4");
        }
        if until.is_some() {
          conds.push("visit_date <= ?5");
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT {VISIT_COLUMNS} FROM visits
           {where_clause}
           ORDER BY visit_date DESC, created_at DESC
           LIMIT ?6 OFFSET ?7"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              teacher_id,
              supervisor_id,
              status,
              from,
              until,
              limit_val,
              offset_val,
            ],
            RawVisit::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVisit::into_visit).collect()
  }

  async fn replace_visit(
    &self,
    id: Uuid,
    input: VisitInput,
    expected: Option<Visit>,
  ) -> Result<Visit> {
    let input = input.validated()?;
    let row = VisitRow::encode(&input)?;
    let expected = expected.as_ref().map(RawVisit::from_visit).transpose()?;
    let (teacher_id, supervisor_id) = (input.teacher_id, input.supervisor_id);
    let id_str = encode_uuid(id);

    let outcome: Result<String, CoreError> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let created_at: Option<String> = tx
          .query_row(
            "SELECT created_at FROM visits WHERE visit_id = ?1",
            [&id_str],
            |r| r.get(0),
          )
          .optional()?;
        let Some(created_at) = created_at else {
          return Ok(Err(CoreError::not_found(Entity::Visit, id)));
        };
        if let Some(expected) = &expected {
          let sql = format!("SELECT {VISIT_COLUMNS} FROM visits WHERE visit_id = ?1");
          if !still_matches(&tx, &sql, &id_str, RawVisit::from_row, expected)? {
            return Ok(Err(CoreError::stale(Entity::Visit, id)));
          }
        }
        if let Err(e) = check_visit_refs(&tx, teacher_id, supervisor_id)? {
          return Ok(Err(e));
        }
        tx.execute(
          "UPDATE visits SET
             teacher_id = ?2, supervisor_id = ?3, visit_date = ?4,
             school_name = ?5, subject = ?6, grade = ?7, lesson_title = ?8,
             management_scores = ?9, teaching_scores = ?10, feedback_scores = ?11,
             feedback_1 = ?12, feedback_2 = ?13, suggestions = ?14,
             follow_up_date = ?15, status = ?16, supervisor_signature = ?17
           WHERE visit_id = ?1",
          rusqlite::params![
            id_str,
            row.teacher_id,
            row.supervisor_id,
            row.visit_date,
            row.school_name,
            row.subject,
            row.grade,
            row.lesson_title,
            row.management_scores,
            row.teaching_scores,
            row.feedback_scores,
            row.feedback_1,
            row.feedback_2,
            row.suggestions,
            row.follow_up_date,
            row.status,
            row.supervisor_signature,
          ],
        )?;
        tx.commit()?;
        Ok(Ok(created_at))
      })
      .await?;

    let created_at = decode_dt(&outcome?)?;
    Ok(input.into_visit(id, created_at))
  }

  async fn count_visits(&self) -> Result<u64> {
    Ok(
      self
        .conn
        .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM visits", [], |r| r.get(0))?))
        .await?,
    )
  }

  // ── Read models ───────────────────────────────────────────────────────────

  async fn dashboard(&self) -> Result<Dashboard> {
    let (total_visits, teachers_count, supervisors_count, raws) = self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        let count = |table: &str| -> rusqlite::Result<u64> {
          tx.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
        };
        let totals = (count("visits")?, count("teachers")?, count("supervisors")?);
        let recent = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {VISIT_COLUMNS} FROM visits
             ORDER BY visit_date DESC, created_at DESC
             LIMIT ?1"
          ))?;
          stmt
            .query_map([RECENT_VISITS as i64], RawVisit::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok((totals.0, totals.1, totals.2, recent))
      })
      .await?;

    Ok(Dashboard {
      total_visits,
      teachers_count,
      supervisors_count,
      recent_visits: raws
        .into_iter()
        .map(RawVisit::into_visit)
        .collect::<Result<_>>()?,
    })
  }

  async fn visit_report(&self, id: Uuid) -> Result<Option<VisitReport>> {
    let Some(visit) = self.get_visit(id).await? else {
      return Ok(None);
    };
    let teacher = self
      .get_teacher(visit.teacher_id)
      .await?
      .ok_or(CoreError::not_found(Entity::Teacher, visit.teacher_id))?;
    let supervisor = self
      .get_supervisor(visit.supervisor_id)
      .await?
      .ok_or(CoreError::not_found(Entity::Supervisor, visit.supervisor_id))?;

    Ok(Some(VisitReport::new(visit, teacher, supervisor)))
  }
}
