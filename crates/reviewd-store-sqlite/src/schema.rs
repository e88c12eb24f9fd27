//! SQL schema for the reviewd SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS teams (
    team_name   TEXT PRIMARY KEY,
    created_at  TEXT NOT NULL
);

-- Members are listed in rowid order, which survives upserts.
CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    username    TEXT NOT NULL,
    team_name   TEXT NOT NULL REFERENCES teams(team_name),
    is_active   INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS pull_requests (
    pull_request_id    TEXT PRIMARY KEY,
    pull_request_name  TEXT NOT NULL,
    author_id          TEXT NOT NULL REFERENCES users(user_id),
    status             TEXT NOT NULL CHECK (status IN ('OPEN', 'MERGED')),
    created_at         TEXT NOT NULL,   -- RFC 3339 UTC, microsecond precision
    merged_at          TEXT,
    CHECK ((status = 'MERGED') = (merged_at IS NOT NULL))
);

-- `position` is the canonical reviewer order; `assigned_at` is kept for
-- reviewers that survive a list rewrite.
CREATE TABLE IF NOT EXISTS pr_reviewers (
    pull_request_id  TEXT NOT NULL REFERENCES pull_requests(pull_request_id),
    reviewer_id      TEXT NOT NULL REFERENCES users(user_id),
    position         INTEGER NOT NULL,
    assigned_at      TEXT NOT NULL,
    PRIMARY KEY (pull_request_id, reviewer_id)
);

CREATE INDEX IF NOT EXISTS users_team_idx        ON users(team_name, is_active);
CREATE INDEX IF NOT EXISTS pr_reviewers_user_idx ON pr_reviewers(reviewer_id);
CREATE INDEX IF NOT EXISTS pull_requests_status  ON pull_requests(status);

PRAGMA user_version = 1;
";
