//! SQL schema for the SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Emails and usernames compare case-insensitively. Foreign keys on
/// `visits` back up the delete guard in the store, which runs first and
/// reports how many visits block the delete.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL COLLATE NOCASE UNIQUE,
    email         TEXT NOT NULL COLLATE NOCASE UNIQUE,
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    role          TEXT NOT NULL DEFAULT 'supervisor',  -- 'admin' | 'supervisor' | 'teacher'
    name          TEXT NOT NULL,
    is_active     INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS teachers (
    teacher_id TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    email      TEXT NOT NULL COLLATE NOCASE UNIQUE,
    subject    TEXT NOT NULL,
    school     TEXT NOT NULL,
    phone      TEXT,
    grade      TEXT            -- free text, may list several grades
);

CREATE TABLE IF NOT EXISTS supervisors (
    supervisor_id TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL COLLATE NOCASE UNIQUE,
    specialty     TEXT NOT NULL,
    phone         TEXT
);

CREATE TABLE IF NOT EXISTS visits (
    visit_id             TEXT PRIMARY KEY,
    teacher_id           TEXT NOT NULL REFERENCES teachers(teacher_id),
    supervisor_id        TEXT NOT NULL REFERENCES supervisors(supervisor_id),
    visit_date           TEXT NOT NULL,   -- YYYY-MM-DD
    school_name          TEXT NOT NULL,
    subject              TEXT NOT NULL,
    grade                TEXT NOT NULL,
    lesson_title         TEXT NOT NULL,
    management_scores    TEXT NOT NULL DEFAULT '{}',   -- JSON object
    teaching_scores      TEXT NOT NULL DEFAULT '{}',
    feedback_scores      TEXT NOT NULL DEFAULT '{}',
    feedback_1           TEXT,
    feedback_2           TEXT,
    suggestions          TEXT,
    follow_up_date       TEXT,
    status               TEXT NOT NULL DEFAULT 'completed',
    supervisor_signature TEXT,
    created_at           TEXT NOT NULL    -- RFC 3339 UTC; server-assigned
);

CREATE INDEX IF NOT EXISTS visits_teacher_idx    ON visits(teacher_id);
CREATE INDEX IF NOT EXISTS visits_supervisor_idx ON visits(supervisor_id);
CREATE INDEX IF NOT EXISTS visits_date_idx       ON visits(visit_date);

PRAGMA user_version = 1;
";
