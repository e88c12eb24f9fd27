//! [`SqliteStore`], the SQLite implementation of the reviewd storage traits.

use std::{
  collections::{HashMap, HashSet},
  path::Path,
};

use chrono::Utc;
use rusqlite::{OptionalExtension as _, params, params_from_iter};

use reviewd_core::{
  pull_request::{PullRequest, PullRequestShort},
  store::{
    Backend, MassDeactivation, PullRequestStore, ReviewerWrite, StatsStore, TeamStore, UserStore,
  },
  team::Team,
  user::User,
};

use crate::{
  Error, Result,
  encode::{
    RawPullRequest, RawPullRequestShort, RawUser, encode_dt, encode_status, placeholders,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A reviewd store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// are serialised on the connection's thread, and each call that writes more
/// than one row does so inside one transaction.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Outcome of the team insert transaction.
enum TeamInsert {
  Created,
  NameTaken,
  MemberConflict { user: String, team: String },
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
}

/// Read a pull request row and its reviewers in canonical order.
fn read_pull_request(
  conn: &rusqlite::Connection,
  pr_id: &str,
) -> rusqlite::Result<Option<RawPullRequest>> {
  let row = conn
    .query_row(
      "SELECT pull_request_id, pull_request_name, author_id, status, created_at, merged_at
       FROM pull_requests WHERE pull_request_id = ?1",
      params![pr_id],
      |row| {
        Ok(RawPullRequest {
          pull_request_id:   row.get(0)?,
          pull_request_name: row.get(1)?,
          author_id:         row.get(2)?,
          status:            row.get(3)?,
          created_at:        row.get(4)?,
          merged_at:         row.get(5)?,
          reviewers:         Vec::new(),
        })
      },
    )
    .optional()?;

  let Some(mut raw) = row else { return Ok(None) };

  let mut stmt = conn.prepare(
    "SELECT reviewer_id FROM pr_reviewers
     WHERE pull_request_id = ?1
     ORDER BY position, assigned_at",
  )?;
  raw.reviewers = stmt
    .query_map(params![pr_id], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;

  Ok(Some(raw))
}

/// Insert reviewer rows at positions `0..n`, reusing `assigned_at` for
/// reviewers found in `kept`.
fn insert_reviewers(
  tx: &rusqlite::Transaction<'_>,
  pr_id: &str,
  reviewers: &[String],
  kept: &HashMap<String, String>,
  now: &str,
) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(
    "INSERT INTO pr_reviewers (pull_request_id, reviewer_id, position, assigned_at)
     VALUES (?1, ?2, ?3, ?4)",
  )?;
  for (position, reviewer) in reviewers.iter().enumerate() {
    let assigned_at = kept.get(reviewer).map(String::as_str).unwrap_or(now);
    stmt.execute(params![pr_id, reviewer, position as i64, assigned_at])?;
  }
  Ok(())
}

// ─── Backend ─────────────────────────────────────────────────────────────────

impl Backend for SqliteStore {
  type Error = Error;
}

// ─── TeamStore ───────────────────────────────────────────────────────────────

impl TeamStore for SqliteStore {
  async fn team_exists(&self, name: &str) -> Result<bool> {
    let name = name.to_owned();
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row("SELECT 1 FROM teams WHERE team_name = ?1", params![name], |_| Ok(()))
            .optional()?
            .is_some(),
        )
      })
      .await?;
    Ok(exists)
  }

  async fn add_team(&self, team: &Team) -> Result<bool> {
    let team = team.clone();
    let now  = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let inserted = tx.execute(
          "INSERT INTO teams (team_name, created_at) VALUES (?1, ?2)
           ON CONFLICT (team_name) DO NOTHING",
          params![team.team_name, now],
        )?;
        if inserted == 0 {
          return Ok(TeamInsert::NameTaken);
        }

        for member in &team.members {
          let current: Option<String> = tx
            .query_row(
              "SELECT team_name FROM users WHERE user_id = ?1",
              params![member.user_id],
              |r| r.get(0),
            )
            .optional()?;
          if let Some(other) = current
            && other != team.team_name
          {
            // Dropping `tx` rolls back the team row as well.
            return Ok(TeamInsert::MemberConflict { user: member.user_id.clone(), team: other });
          }

          tx.execute(
            "INSERT INTO users (user_id, username, team_name, is_active)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (user_id) DO UPDATE SET
               username  = excluded.username,
               is_active = excluded.is_active",
            params![member.user_id, member.username, team.team_name, member.is_active],
          )?;
        }

        tx.commit()?;
        Ok(TeamInsert::Created)
      })
      .await?;

    match outcome {
      TeamInsert::Created => Ok(true),
      TeamInsert::NameTaken => Ok(false),
      TeamInsert::MemberConflict { user, team } => Err(Error::MemberOfOtherTeam { user, team }),
    }
  }

  async fn get_team(&self, name: &str) -> Result<Option<Team>> {
    let name = name.to_owned();

    let raw: Option<(String, Vec<RawUser>)> = self
      .conn
      .call(move |conn| {
        let found = conn
          .query_row("SELECT team_name FROM teams WHERE team_name = ?1", params![name], |r| {
            r.get::<_, String>(0)
          })
          .optional()?;
        let Some(team_name) = found else { return Ok(None) };

        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM users WHERE team_name = ?1 ORDER BY rowid",
          RawUser::COLUMNS
        ))?;
        let members = stmt
          .query_map(params![team_name], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some((team_name, members)))
      })
      .await?;

    Ok(raw.map(|(team_name, members)| Team {
      team_name,
      members: members.into_iter().map(RawUser::into_member).collect(),
    }))
  }
}

// ─── UserStore ───────────────────────────────────────────────────────────────

impl UserStore for SqliteStore {
  async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
    let user_id = user_id.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM users WHERE user_id = ?1", RawUser::COLUMNS),
              params![user_id],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(RawUser::into_user))
  }

  async fn set_active(&self, user_id: &str, active: bool) -> Result<bool> {
    let user_id = user_id.to_owned();
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET is_active = ?1 WHERE user_id = ?2",
          params![active, user_id],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn active_users_by_team(&self, team: &str, exclude: &[String]) -> Result<Vec<User>> {
    let mut args = Vec::with_capacity(exclude.len() + 1);
    args.push(team.to_owned());
    args.extend(exclude.iter().cloned());

    let sql = if exclude.is_empty() {
      format!(
        "SELECT {} FROM users WHERE team_name = ? AND is_active = 1 ORDER BY rowid",
        RawUser::COLUMNS
      )
    } else {
      format!(
        "SELECT {} FROM users
         WHERE team_name = ? AND is_active = 1 AND user_id NOT IN ({})
         ORDER BY rowid",
        RawUser::COLUMNS,
        placeholders(exclude.len())
      )
    };

    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(args.iter()), RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawUser::into_user).collect())
  }

  async fn prs_for_reviewer(&self, user_id: &str) -> Result<Vec<PullRequestShort>> {
    let user_id = user_id.to_owned();

    let raws: Vec<RawPullRequestShort> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT p.pull_request_id, p.pull_request_name, p.author_id, p.status
           FROM pr_reviewers r
           JOIN pull_requests p ON p.pull_request_id = r.pull_request_id
           WHERE r.reviewer_id = ?1
           ORDER BY p.created_at DESC, p.rowid DESC",
        )?;
        let rows = stmt
          .query_map(params![user_id], |row| {
            Ok(RawPullRequestShort {
              pull_request_id:   row.get(0)?,
              pull_request_name: row.get(1)?,
              author_id:         row.get(2)?,
              status:            row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPullRequestShort::into_short).collect()
  }

  async fn mass_deactivate_and_reassign(
    &self,
    team: &str,
    user_ids: &[String],
  ) -> Result<MassDeactivation> {
    if user_ids.is_empty() {
      return Ok(MassDeactivation::default());
    }

    let team     = team.to_owned();
    let user_ids = user_ids.to_vec();
    let now      = encode_dt(Utc::now());

    let summary = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut summary = MassDeactivation::default();

        // Only users that really belong to `team` are touched.
        let members: HashSet<String> = {
          let sql = format!(
            "SELECT user_id FROM users WHERE team_name = ? AND user_id IN ({})",
            placeholders(user_ids.len())
          );
          let mut stmt = tx.prepare(&sql)?;
          let ids = stmt
            .query_map(
              params_from_iter(std::iter::once(&team).chain(user_ids.iter())),
              |r| r.get(0),
            )?
            .collect::<rusqlite::Result<_>>()?;
          ids
        };
        let scoped: Vec<String> =
          user_ids.into_iter().filter(|id| members.contains(id)).collect();
        if scoped.is_empty() {
          return Ok(summary);
        }
        let in_list = placeholders(scoped.len());

        tx.execute(
          &format!("UPDATE users SET is_active = 0 WHERE user_id IN ({in_list})"),
          params_from_iter(scoped.iter()),
        )?;

        let affected: Vec<(String, String)> = {
          let mut stmt = tx.prepare(&format!(
            "SELECT DISTINCT p.pull_request_id, p.author_id
             FROM pr_reviewers r
             JOIN pull_requests p ON p.pull_request_id = r.pull_request_id
             WHERE p.status = 'OPEN' AND r.reviewer_id IN ({in_list})
             ORDER BY p.created_at, p.rowid"
          ))?;
          let prs = stmt
            .query_map(params_from_iter(scoped.iter()), |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<rusqlite::Result<_>>()?;
          prs
        };
        summary.prs_touched = affected.len();

        tx.execute(
          &format!(
            "DELETE FROM pr_reviewers
             WHERE reviewer_id IN ({in_list})
               AND pull_request_id IN (SELECT pull_request_id FROM pull_requests WHERE status = 'OPEN')"
          ),
          params_from_iter(scoped.iter()),
        )?;

        for (pr_id, author_id) in &affected {
          let remaining: i64 = tx.query_row(
            "SELECT COUNT(*) FROM pr_reviewers WHERE pull_request_id = ?1",
            params![pr_id],
            |r| r.get(0),
          )?;
          if remaining > 0 {
            continue;
          }

          match backfill_one(&tx, pr_id, author_id, &team, &now) {
            Ok(Some(reviewer)) => {
              tracing::debug!(pr = %pr_id, reviewer = %reviewer, "backfilled reviewer");
              summary.prs_backfilled += 1;
            }
            Ok(None) => summary.prs_left_empty += 1,
            Err(err) => {
              tracing::warn!(pr = %pr_id, error = %err, "reviewer backfill failed");
              summary.prs_left_empty += 1;
            }
          }
        }

        tx.commit()?;
        summary.deactivated = scoped;
        Ok(summary)
      })
      .await?;

    Ok(summary)
  }
}

/// Assign one random active member of `team` (not the author) to an empty
/// pull request. Deactivated users are already inactive at this point.
fn backfill_one(
  tx: &rusqlite::Transaction<'_>,
  pr_id: &str,
  author_id: &str,
  team: &str,
  now: &str,
) -> rusqlite::Result<Option<String>> {
  let candidate: Option<String> = tx
    .query_row(
      "SELECT user_id FROM users
       WHERE team_name = ?1 AND is_active = 1 AND user_id != ?2
       ORDER BY RANDOM() LIMIT 1",
      params![team, author_id],
      |r| r.get(0),
    )
    .optional()?;

  if let Some(reviewer) = &candidate {
    tx.execute(
      "INSERT INTO pr_reviewers (pull_request_id, reviewer_id, position, assigned_at)
       VALUES (?1, ?2, 0, ?3)",
      params![pr_id, reviewer, now],
    )?;
  }
  Ok(candidate)
}

// ─── PullRequestStore ────────────────────────────────────────────────────────

impl PullRequestStore for SqliteStore {
  async fn pr_exists(&self, pr_id: &str) -> Result<bool> {
    let pr_id = pr_id.to_owned();
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM pull_requests WHERE pull_request_id = ?1",
              params![pr_id],
              |_| Ok(()),
            )
            .optional()?
            .is_some(),
        )
      })
      .await?;
    Ok(exists)
  }

  async fn create_pr(&self, pr: &PullRequest) -> Result<bool> {
    let created_at = encode_dt(pr.created_at.unwrap_or_else(Utc::now));
    let merged_at  = pr.merged_at.map(encode_dt);
    let status     = encode_status(pr.status);
    let pr         = pr.clone();

    let created = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let inserted = tx.execute(
          "INSERT INTO pull_requests
             (pull_request_id, pull_request_name, author_id, status, created_at, merged_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (pull_request_id) DO NOTHING",
          params![
            pr.pull_request_id,
            pr.pull_request_name,
            pr.author_id,
            status,
            created_at,
            merged_at,
          ],
        )?;
        if inserted == 0 {
          return Ok(false);
        }

        insert_reviewers(
          &tx,
          &pr.pull_request_id,
          &pr.assigned_reviewers,
          &HashMap::new(),
          &created_at,
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;
    Ok(created)
  }

  async fn get_pr(&self, pr_id: &str) -> Result<Option<PullRequest>> {
    let pr_id = pr_id.to_owned();
    let raw = self
      .conn
      .call(move |conn| Ok(read_pull_request(conn, &pr_id)?))
      .await?;
    raw.map(RawPullRequest::into_pull_request).transpose()
  }

  async fn update_pr(&self, pr: &PullRequest) -> Result<bool> {
    let pr_id     = pr.pull_request_id.clone();
    let name      = pr.pull_request_name.clone();
    let status    = encode_status(pr.status);
    let merged_at = pr.merged_at.map(encode_dt);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE pull_requests
           SET pull_request_name = ?1, status = ?2, merged_at = ?3
           WHERE pull_request_id = ?4 AND status = 'OPEN'",
          params![name, status, merged_at, pr_id],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn update_reviewers(
    &self,
    pr_id: &str,
    expected: &[String],
    reviewer_ids: &[String],
  ) -> Result<ReviewerWrite> {
    let pr_id     = pr_id.to_owned();
    let expected  = expected.to_vec();
    let reviewers = reviewer_ids.to_vec();
    let now       = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let status: Option<String> = tx
          .query_row(
            "SELECT status FROM pull_requests WHERE pull_request_id = ?1",
            params![pr_id],
            |r| r.get(0),
          )
          .optional()?;
        if status.as_deref() != Some("OPEN") {
          return Ok(ReviewerWrite::Closed);
        }

        let current: Vec<(String, String)> = {
          let mut stmt = tx.prepare(
            "SELECT reviewer_id, assigned_at FROM pr_reviewers
             WHERE pull_request_id = ?1
             ORDER BY position, assigned_at",
          )?;
          let rows = stmt
            .query_map(params![pr_id], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<rusqlite::Result<_>>()?;
          rows
        };
        if !current.iter().map(|(id, _)| id).eq(expected.iter()) {
          return Ok(ReviewerWrite::Stale);
        }

        let kept: HashMap<String, String> = current.into_iter().collect();
        tx.execute("DELETE FROM pr_reviewers WHERE pull_request_id = ?1", params![pr_id])?;
        insert_reviewers(&tx, &pr_id, &reviewers, &kept, &now)?;
        tx.commit()?;
        Ok(ReviewerWrite::Written)
      })
      .await?;
    Ok(outcome)
  }

  async fn open_prs_by_reviewer(&self, user_id: &str) -> Result<Vec<String>> {
    let user_id = user_id.to_owned();
    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT p.pull_request_id
           FROM pr_reviewers r
           JOIN pull_requests p ON p.pull_request_id = r.pull_request_id
           WHERE r.reviewer_id = ?1 AND p.status = 'OPEN'
           ORDER BY p.created_at, p.rowid",
        )?;
        let rows = stmt
          .query_map(params![user_id], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(ids)
  }
}

// ─── StatsStore ──────────────────────────────────────────────────────────────

impl StatsStore for SqliteStore {
  async fn reviewers_per_open_pr(&self) -> Result<HashMap<String, usize>> {
    self
      .count_query(
        "SELECT p.pull_request_id, COUNT(r.reviewer_id)
         FROM pull_requests p
         LEFT JOIN pr_reviewers r ON r.pull_request_id = p.pull_request_id
         WHERE p.status = 'OPEN'
         GROUP BY p.pull_request_id",
      )
      .await
  }

  async fn open_prs_per_reviewer(&self) -> Result<HashMap<String, usize>> {
    self
      .count_query(
        "SELECT r.reviewer_id, COUNT(DISTINCT p.pull_request_id)
         FROM pr_reviewers r
         JOIN pull_requests p ON p.pull_request_id = r.pull_request_id
         WHERE p.status = 'OPEN'
         GROUP BY r.reviewer_id",
      )
      .await
  }
}

impl SqliteStore {
  /// Run a two-column `(key, count)` aggregate.
  async fn count_query(&self, sql: &'static str) -> Result<HashMap<String, usize>> {
    let rows: Vec<(String, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows.into_iter().map(|(k, n)| (k, n.max(0) as usize)).collect())
  }
}
