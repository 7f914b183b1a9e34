//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use classvisit_core::{
  Entity, Error as CoreError,
  password::hash_password,
  score::ScoreSheet,
  store::RecordStore,
  supervisor::SupervisorInput,
  teacher::TeacherInput,
  user::{NewUser, Role},
  visit::{VisitInput, VisitQuery, VisitStatus},
};
use serde_json::json;
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn core_err(err: Error) -> CoreError {
  match err {
    Error::Core(e) => e,
    other => panic!("expected a domain error, got {other:?}"),
  }
}

fn teacher(email: &str) -> TeacherInput {
  TeacherInput {
    name:    "أحمد محمد".into(),
    email:   email.into(),
    subject: "الرياضيات".into(),
    school:  "منارات المدينة المنورة".into(),
    phone:   Some("0551234567".into()),
    grade:   Some("الأول ابتدائي, الثاني ابتدائي".into()),
  }
}

fn supervisor(email: &str) -> SupervisorInput {
  SupervisorInput {
    name:      "محمد علي".into(),
    email:     email.into(),
    specialty: "الرياضيات".into(),
    phone:     None,
  }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn visit(teacher_id: Uuid, supervisor_id: Uuid, on: NaiveDate) -> VisitInput {
  VisitInput {
    teacher_id,
    supervisor_id,
    visit_date: on,
    school_name: "منارات المدينة المنورة".into(),
    subject: "الرياضيات".into(),
    grade: "الثاني".into(),
    lesson_title: "الكسور".into(),
    management_scores: [("management_1".to_string(), json!("4"))].into_iter().collect(),
    teaching_scores: [
      ("teaching_1".to_string(), json!("5")),
      ("teaching_2".to_string(), json!(null)),
    ]
    .into_iter()
    .collect(),
    feedback_scores: ScoreSheet::new(),
    feedback_1: Some("شرح واضح".into()),
    feedback_2: None,
    suggestions: None,
    follow_up_date: None,
    status: VisitStatus::Completed,
    supervisor_signature: Some("م. علي".into()),
  }
}

fn new_user(username: &str, email: &str) -> NewUser {
  NewUser {
    username:      username.into(),
    email:         email.into(),
    name:          "مدير النظام".into(),
    role:          Role::Admin,
    password_hash: hash_password("secret").unwrap(),
    is_active:     true,
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_find_user_by_username_or_email() {
  let s = store().await;
  let user = s.add_user(new_user("admin", "admin@school.com")).await.unwrap();

  let by_name = s.find_user("admin").await.unwrap().unwrap();
  assert_eq!(by_name.user.user_id, user.user_id);
  assert!(by_name.verify("secret"));

  let by_email = s.find_user("ADMIN@school.com").await.unwrap().unwrap();
  assert_eq!(by_email.user.user_id, user.user_id);

  assert!(s.find_user("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_or_email_conflicts() {
  let s = store().await;
  s.add_user(new_user("admin", "admin@school.com")).await.unwrap();

  let err = s.add_user(new_user("Admin", "other@school.com")).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::Conflict(m) if m.contains("username")));

  let err = s.add_user(new_user("other", "admin@school.com")).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::Conflict(m) if m.contains("email")));

  assert_eq!(s.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn set_user_active_toggles_flag() {
  let s = store().await;
  let user = s.add_user(new_user("admin", "admin@school.com")).await.unwrap();

  let updated = s.set_user_active(user.user_id, false).await.unwrap();
  assert!(!updated.is_active);
  assert!(!s.get_user(user.user_id).await.unwrap().unwrap().is_active);

  let err = s.set_user_active(Uuid::new_v4(), true).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::NotFound { entity: Entity::User, .. }));
}

// ─── Teachers & supervisors ──────────────────────────────────────────────────

#[tokio::test]
async fn add_get_and_list_teachers() {
  let s = store().await;
  let t = s.add_teacher(teacher("ahmed@school.com")).await.unwrap();

  let fetched = s.get_teacher(t.teacher_id).await.unwrap().unwrap();
  assert_eq!(fetched, t);

  s.add_teacher(TeacherInput { name: "خالد السعدي".into(), ..teacher("khaled@school.com") })
    .await
    .unwrap();
  assert_eq!(s.list_teachers().await.unwrap().len(), 2);
  assert!(s.get_teacher(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn teacher_email_is_unique_case_insensitively() {
  let s = store().await;
  s.add_teacher(teacher("ahmed@school.com")).await.unwrap();
  let err = s.add_teacher(teacher("Ahmed@School.com")).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::Conflict(_)));
}

#[tokio::test]
async fn invalid_teacher_is_rejected_before_storage() {
  let s = store().await;
  let err = s
    .add_teacher(TeacherInput { school: "".into(), ..teacher("ahmed@school.com") })
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::Validation(_)));
  assert!(s.list_teachers().await.unwrap().is_empty());
}

#[tokio::test]
async fn replace_teacher_swaps_the_whole_record() {
  let s = store().await;
  let t = s.add_teacher(teacher("ahmed@school.com")).await.unwrap();

  let replaced = s
    .replace_teacher(t.teacher_id, TeacherInput {
      subject: "العلوم".into(),
      phone: None,
      ..teacher("ahmed@school.com")
    }, None)
    .await
    .unwrap();
  assert_eq!(replaced.teacher_id, t.teacher_id);

  let fetched = s.get_teacher(t.teacher_id).await.unwrap().unwrap();
  assert_eq!(fetched.subject, "العلوم");
  assert_eq!(fetched.phone, None);
}

#[tokio::test]
async fn replace_teacher_cannot_take_another_email() {
  let s = store().await;
  s.add_teacher(teacher("ahmed@school.com")).await.unwrap();
  let other = s.add_teacher(teacher("fatima@school.com")).await.unwrap();

  let err = s
    .replace_teacher(other.teacher_id, teacher("ahmed@school.com"), None)
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::Conflict(_)));
}

#[tokio::test]
async fn replace_missing_teacher_is_not_found() {
  let s = store().await;
  let err = s
    .replace_teacher(Uuid::new_v4(), teacher("ahmed@school.com"), None)
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::NotFound { entity: Entity::Teacher, .. }));
}

#[tokio::test]
async fn replace_teacher_refuses_a_stale_expectation() {
  let s = store().await;
  let read = s.add_teacher(teacher("ahmed@school.com")).await.unwrap();

  // Another writer gets in between our read and our write.
  let theirs = TeacherInput { subject: "العلوم".into(), ..teacher("ahmed@school.com") };
  s.replace_teacher(read.teacher_id, theirs, Some(read.clone())).await.unwrap();

  let ours = TeacherInput { school: "مدرسة أخرى".into(), ..teacher("ahmed@school.com") };
  let err = s
    .replace_teacher(read.teacher_id, ours, Some(read.clone()))
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::Stale { entity: Entity::Teacher, .. }));

  let fetched = s.get_teacher(read.teacher_id).await.unwrap().unwrap();
  assert_eq!(fetched.subject, "العلوم");
  assert_eq!(fetched.school, read.school);
}

#[tokio::test]
async fn delete_unreferenced_teacher() {
  let s = store().await;
  let t = s.add_teacher(teacher("ahmed@school.com")).await.unwrap();
  s.delete_teacher(t.teacher_id).await.unwrap();
  assert!(s.get_teacher(t.teacher_id).await.unwrap().is_none());

  let err = s.delete_teacher(t.teacher_id).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::NotFound { .. }));
}

#[tokio::test]
async fn delete_is_refused_while_visits_reference_the_record() {
  let s = store().await;
  let t = s.add_teacher(teacher("ahmed@school.com")).await.unwrap();
  let v = s.add_supervisor(supervisor("mohamed@edu.sa")).await.unwrap();
  s.add_visit(visit(t.teacher_id, v.supervisor_id, date(2024, 3, 10)))
    .await
    .unwrap();
  s.add_visit(visit(t.teacher_id, v.supervisor_id, date(2024, 4, 10)))
    .await
    .unwrap();

  let err = s.delete_teacher(t.teacher_id).await.unwrap_err();
  assert!(matches!(
    core_err(err),
    CoreError::InUse { entity: Entity::Teacher, visits: 2, .. }
  ));
  let err = s.delete_supervisor(v.supervisor_id).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::InUse { entity: Entity::Supervisor, .. }));

  assert!(s.get_teacher(t.teacher_id).await.unwrap().is_some());
  assert!(s.get_supervisor(v.supervisor_id).await.unwrap().is_some());
}

#[tokio::test]
async fn supervisor_crud() {
  let s = store().await;
  let v = s.add_supervisor(supervisor("sara@edu.sa")).await.unwrap();
  let err = s.add_supervisor(supervisor("sara@edu.sa")).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::Conflict(_)));

  let replaced = s
    .replace_supervisor(v.supervisor_id, SupervisorInput {
      specialty: "اللغة العربية".into(),
      ..supervisor("sara@edu.sa")
    }, None)
    .await
    .unwrap();
  assert_eq!(replaced.specialty, "اللغة العربية");
  assert_eq!(s.list_supervisors().await.unwrap(), vec![replaced]);

  let err = s
    .replace_supervisor(v.supervisor_id, supervisor("sara@edu.sa"), Some(v.clone()))
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::Stale { entity: Entity::Supervisor, .. }));

  s.delete_supervisor(v.supervisor_id).await.unwrap();
  assert!(s.list_supervisors().await.unwrap().is_empty());
}

// ─── Visits ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_visit_and_read_it_back() {
  let s = store().await;
  let t = s.add_teacher(teacher("ahmed@school.com")).await.unwrap();
  let v = s.add_supervisor(supervisor("mohamed@edu.sa")).await.unwrap();

  let mut input = visit(t.teacher_id, v.supervisor_id, date(2024, 3, 10));
  input.follow_up_date = Some(date(2024, 4, 1));
  let added = s.add_visit(input).await.unwrap();

  let fetched = s.get_visit(added.visit_id).await.unwrap().unwrap();
  assert_eq!(fetched, added);
  assert_eq!(fetched.teaching_scores.get("teaching_2"), Some(&json!(null)));
  assert_eq!(fetched.follow_up_date, Some(date(2024, 4, 1)));
}

#[tokio::test]
async fn visit_requires_existing_teacher_and_supervisor() {
  let s = store().await;
  let t = s.add_teacher(teacher("ahmed@school.com")).await.unwrap();
  let v = s.add_supervisor(supervisor("mohamed@edu.sa")).await.unwrap();

  let err = s
    .add_visit(visit(Uuid::new_v4(), v.supervisor_id, date(2024, 3, 10)))
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::NotFound { entity: Entity::Teacher, .. }));

  let err = s
    .add_visit(visit(t.teacher_id, Uuid::new_v4(), date(2024, 3, 10)))
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::NotFound { entity: Entity::Supervisor, .. }));

  assert_eq!(s.count_visits().await.unwrap(), 0);
}

#[tokio::test]
async fn replace_visit_keeps_id_and_created_at() {
  let s = store().await;
  let t = s.add_teacher(teacher("ahmed@school.com")).await.unwrap();
  let v = s.add_supervisor(supervisor("mohamed@edu.sa")).await.unwrap();
  let added = s
    .add_visit(visit(t.teacher_id, v.supervisor_id, date(2024, 3, 10)))
    .await
    .unwrap();

  let mut input = visit(t.teacher_id, v.supervisor_id, date(2024, 3, 11));
  input.status = VisitStatus::Pending;
  input.teaching_scores = ScoreSheet::new();
  let replaced = s.replace_visit(added.visit_id, input, Some(added.clone())).await.unwrap();

  assert_eq!(replaced.visit_id, added.visit_id);
  assert_eq!(replaced.created_at, added.created_at);
  assert_eq!(replaced.status, VisitStatus::Pending);

  let fetched = s.get_visit(added.visit_id).await.unwrap().unwrap();
  assert_eq!(fetched, replaced);
  assert!(fetched.teaching_scores.is_empty());

  // `added` no longer describes the stored visit.
  let err = s
    .replace_visit(
      added.visit_id,
      visit(t.teacher_id, v.supervisor_id, date(2024, 3, 12)),
      Some(added.clone()),
    )
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::Stale { entity: Entity::Visit, .. }));

  let err = s
    .replace_visit(Uuid::new_v4(), visit(t.teacher_id, v.supervisor_id, date(2024, 3, 11)), None)
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::NotFound { entity: Entity::Visit, .. }));
}

#[tokio::test]
async fn list_visits_newest_first_with_filters() {
  let s = store().await;
  let ahmed = s.add_teacher(teacher("ahmed@school.com")).await.unwrap();
  let fatima = s.add_teacher(teacher("fatima@school.com")).await.unwrap();
  let v = s.add_supervisor(supervisor("mohamed@edu.sa")).await.unwrap();

  let march = s
    .add_visit(visit(ahmed.teacher_id, v.supervisor_id, date(2024, 3, 10)))
    .await
    .unwrap();
  let may = s
    .add_visit(visit(ahmed.teacher_id, v.supervisor_id, date(2024, 5, 10)))
    .await
    .unwrap();
  let mut pending = visit(fatima.teacher_id, v.supervisor_id, date(2024, 4, 10));
  pending.status = VisitStatus::Pending;
  let april = s.add_visit(pending).await.unwrap();

  let all = s.list_visits(&VisitQuery::default()).await.unwrap();
  let ids: Vec<_> = all.iter().map(|v| v.visit_id).collect();
  assert_eq!(ids, [may.visit_id, april.visit_id, march.visit_id]);

  let ahmeds = s
    .list_visits(&VisitQuery { teacher_id: Some(ahmed.teacher_id), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(ahmeds.len(), 2);

  let pendings = s
    .list_visits(&VisitQuery { status: Some(VisitStatus::Pending), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(pendings.len(), 1);
  assert_eq!(pendings[0].visit_id, april.visit_id);

  let window = s
    .list_visits(&VisitQuery {
      from: Some(date(2024, 4, 1)),
      until: Some(date(2024, 4, 30)),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(window.len(), 1);

  let page = s
    .list_visits(&VisitQuery { limit: Some(1), offset: Some(1), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(page.len(), 1);
  assert_eq!(page[0].visit_id, april.visit_id);

  // Bounds past i64::MAX clamp instead of wrapping negative.
  let huge = s
    .list_visits(&VisitQuery { limit: Some(usize::MAX), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(huge.len(), 3);
  let skipped = s
    .list_visits(&VisitQuery { offset: Some(usize::MAX), ..Default::default() })
    .await
    .unwrap();
  assert!(skipped.is_empty());
}

// ─── Read models ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn dashboard_counts_and_recent_visits() {
  let s = store().await;
  let t = s.add_teacher(teacher("ahmed@school.com")).await.unwrap();
  s.add_teacher(teacher("fatima@school.com")).await.unwrap();
  let v = s.add_supervisor(supervisor("mohamed@edu.sa")).await.unwrap();
  for day in 1..=7 {
    s.add_visit(visit(t.teacher_id, v.supervisor_id, date(2024, 3, day)))
      .await
      .unwrap();
  }

  let d = s.dashboard().await.unwrap();
  assert_eq!(d.total_visits, 7);
  assert_eq!(d.teachers_count, 2);
  assert_eq!(d.supervisors_count, 1);
  assert_eq!(d.recent_visits.len(), 5);
  assert_eq!(d.recent_visits[0].visit_date, date(2024, 3, 7));
  assert_eq!(d.recent_visits[4].visit_date, date(2024, 3, 3));
}

#[tokio::test]
async fn visit_report_resolves_people_and_scores() {
  let s = store().await;
  let t = s.add_teacher(teacher("ahmed@school.com")).await.unwrap();
  let v = s.add_supervisor(supervisor("mohamed@edu.sa")).await.unwrap();
  let added = s
    .add_visit(visit(t.teacher_id, v.supervisor_id, date(2024, 3, 10)))
    .await
    .unwrap();

  let report = s.visit_report(added.visit_id).await.unwrap().unwrap();
  assert_eq!(report.teacher, t);
  assert_eq!(report.supervisor, v);
  assert_eq!(report.management.mean, Some(4.0));
  assert_eq!(report.teaching.criteria, 2);
  assert_eq!(report.teaching.rated, 1);
  assert_eq!(report.overall.total, 9.0);

  assert!(s.visit_report(Uuid::new_v4()).await.unwrap().is_none());
}
