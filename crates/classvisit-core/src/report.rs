//! Read models assembled from several tables.

use serde::{Deserialize, Serialize};

use crate::{
  score::ScoreSummary, supervisor::Supervisor, teacher::Teacher, visit::Visit,
};

/// Number of visits shown on the dashboard.
pub const RECENT_VISITS: usize = 5;

/// Everything a printed or emailed visit report shows: the visit, the
/// people involved, and per-group score aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitReport {
  pub visit:      Visit,
  pub teacher:    Teacher,
  pub supervisor: Supervisor,
  pub management: ScoreSummary,
  pub teaching:   ScoreSummary,
  pub feedback:   ScoreSummary,
  pub overall:    ScoreSummary,
}

impl VisitReport {
  pub fn new(visit: Visit, teacher: Teacher, supervisor: Supervisor) -> Self {
    let management = visit.management_scores.summary();
    let teaching = visit.teaching_scores.summary();
    let feedback = visit.feedback_scores.summary();
    let overall = ScoreSummary::combine(&[management, teaching, feedback]);
    Self { visit, teacher, supervisor, management, teaching, feedback, overall }
  }
}

/// Landing-page counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
  pub total_visits:      u64,
  pub teachers_count:    u64,
  pub supervisors_count: u64,
  /// At most [`RECENT_VISITS`], newest visit date first.
  pub recent_visits:     Vec<Visit>,
}
