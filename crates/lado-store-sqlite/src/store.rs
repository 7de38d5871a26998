//! [`SqliteStore`] — the SQLite implementation of [`PlatformStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use lado_core::{
  audit::{AgeVerificationLog, ModerationAction, ModerationLogEntry},
  compliance::VerifiedRecord,
  content::{Content, ContentSnapshot, NewContent},
  moderation::{ModerationOutcome, Selection},
  store::PlatformStore,
  subscription::Subscription,
  user::{NewUser, ProfileView, User},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    CONTENT_COLUMNS, RawAgeLog, RawContent, RawModerationLog, RawProfile,
    RawSnapshot, RawSubscription, RawUser, SUBSCRIPTION_COLUMNS, USER_COLUMNS,
    encode_action, encode_date, encode_dt, encode_surface, encode_uuid,
    encode_uuids,
  },
  schema::SCHEMA,
};

/// Outcome of a guarded write on a single subscription row.
enum SubscriptionWrite {
  Written(RawSubscription),
  NotFound,
  Cancelled,
}

/// Outcome of inserting a subscription.
enum SubscribeWrite {
  Inserted,
  Duplicate,
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

fn other(e: impl std::error::Error + Send + Sync + 'static) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Lado entity store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All calls
/// run one at a time on the connection's thread, and every multi-row write
/// runs in its own transaction.
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

  /// Open an in-memory store — useful for testing.
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

  /// Run raw DDL against the connection, e.g. to install failing triggers.
  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a guarded update against a subscription owned by `fan_id`.
  ///
  /// `sql` receives `?1 = subscription_id` and must only touch active rows;
  /// `extra` supplies `?2`.
  async fn write_subscription(
    &self,
    subscription_id: Uuid,
    fan_id: Uuid,
    sql: &'static str,
    extra: rusqlite::types::Value,
  ) -> Result<SubscriptionWrite> {
    let sub_str = encode_uuid(subscription_id);
    let fan_str = encode_uuid(fan_id);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let select = format!(
          "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
           WHERE subscription_id = ?1 AND fan_id = ?2"
        );
        let Some(raw) = tx
          .query_row(
            &select,
            rusqlite::params![sub_str, fan_str],
            RawSubscription::from_row,
          )
          .optional()?
        else {
          return Ok(SubscriptionWrite::NotFound);
        };
        if !raw.is_active {
          return Ok(SubscriptionWrite::Cancelled);
        }

        tx.execute(sql, rusqlite::params![sub_str, extra])?;
        let updated = tx.query_row(
          &select,
          rusqlite::params![sub_str, fan_str],
          RawSubscription::from_row,
        )?;
        tx.commit()?;
        Ok(SubscriptionWrite::Written(updated))
      })
      .await?;

    Ok(outcome)
  }

  /// Apply one bulk moderation statement to every selected id and append
  /// the audit entry, all in one transaction.
  async fn apply_bulk(
    &self,
    actor_id: Uuid,
    selection: Selection,
    action: ModerationAction,
    reason: Option<String>,
    now: DateTime<Utc>,
  ) -> Result<ModerationOutcome> {
    let sql = match action {
      ModerationAction::Censor => {
        "UPDATE content SET is_censored = 1, censor_reason = ?2
         WHERE content_id = ?1"
      }
      ModerationAction::Uncensor => {
        "UPDATE content SET is_censored = 0, censor_reason = NULL
         WHERE content_id = ?1"
      }
      ModerationAction::Delete => "DELETE FROM content WHERE content_id = ?1",
    };

    let ids: Vec<(Uuid, String)> = selection
      .into_ids()
      .into_iter()
      .map(|id| (id, encode_uuid(id)))
      .collect();
    let log_id_str = encode_uuid(Uuid::new_v4());
    let actor_str = encode_uuid(actor_id);
    let action_str = encode_action(action);
    let at_str = encode_dt(now);

    let (affected, not_found) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut affected = Vec::new();
        let mut not_found = Vec::new();

        {
          let mut stmt = tx.prepare(sql)?;
          for (id, id_str) in &ids {
            let changed = match &reason {
              Some(r) => stmt.execute(rusqlite::params![id_str, r])?,
              None => stmt.execute(rusqlite::params![id_str])?,
            };
            if changed > 0 {
              affected.push(*id);
            } else {
              not_found.push(*id);
            }
          }
        }

        let ids_json = encode_uuids(&affected).map_err(other)?;
        tx.execute(
          "INSERT INTO moderation_log
             (log_id, actor_id, action, content_ids, reason, recorded_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            log_id_str, actor_str, action_str, ids_json, reason, at_str,
          ],
        )?;
        tx.commit()?;
        Ok((affected, not_found))
      })
      .await?;

    Ok(ModerationOutcome { affected: affected.len(), not_found })
  }
}

// ─── PlatformStore impl ──────────────────────────────────────────────────────

impl PlatformStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser, now: DateTime<Utc>) -> Result<User> {
    let user = User {
      user_id:          Uuid::new_v4(),
      user_name:        input.user_name,
      pseudonym:        input.pseudonym,
      is_active:        true,
      is_creator:       input.is_creator,
      creator_verified: input.creator_verified,
      birth_date:       None,
      country:          None,
      age_verified:     false,
      age_verified_at:  None,
      is_moderator:     input.is_moderator,
      created_at:       now,
    };

    let id_str = encode_uuid(user.user_id);
    let at_str = encode_dt(now);
    let user_name = user.user_name.clone();
    let pseudonym = user.pseudonym.clone();
    let flags = (user.is_creator, user.creator_verified, user.is_moderator);

    let taken: Option<String> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let handles = std::iter::once(&user_name).chain(pseudonym.as_ref());
        for handle in handles {
          let exists = tx
            .query_row(
              "SELECT 1 FROM users
               WHERE lower(user_name) = lower(?1) OR lower(pseudonym) = lower(?1)",
              rusqlite::params![handle],
              |_| Ok(()),
            )
            .optional()?
            .is_some();
          if exists {
            return Ok(Some(handle.clone()));
          }
        }

        tx.execute(
          "INSERT INTO users
             (user_id, user_name, pseudonym, is_creator, creator_verified,
              is_moderator, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str, user_name, pseudonym, flags.0, flags.1, flags.2, at_str,
          ],
        )?;
        tx.commit()?;
        Ok(None)
      })
      .await?;

    if let Some(handle) = taken {
      return Err(lado_core::Error::HandleTaken(handle).into());
    }
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {USER_COLUMNS} FROM users u
                 WHERE u.user_id = ?1 AND u.is_active = 1"
              ),
              rusqlite::params![id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_profile(&self, handle: String) -> Result<Option<ProfileView>> {
    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {USER_COLUMNS},
                   EXISTS (
                     SELECT 1 FROM content c
                     WHERE c.owner_id = u.user_id
                       AND c.surface = 'restricted'
                       AND c.is_active = 1
                       AND c.is_draft = 0
                   )
                 FROM users u
                 WHERE u.is_active = 1
                   AND (lower(u.user_name) = lower(?1)
                        OR lower(u.pseudonym) = lower(?1))
                 LIMIT 1"
              ),
              rusqlite::params![handle],
              |row| {
                Ok(RawProfile {
                  user:                   RawUser::from_row(row)?,
                  has_restricted_surface: row.get(12)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn deactivate_user(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET is_active = 0 WHERE user_id = ?1 AND is_active = 1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(lado_core::Error::UserNotFound(id).into());
    }
    Ok(())
  }

  async fn set_creator_verified(&self, id: Uuid, verified: bool) -> Result<User> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE users SET creator_verified = ?2
           WHERE user_id = ?1 AND is_active = 1 AND is_creator = 1",
          rusqlite::params![id_str, verified],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let raw = tx.query_row(
          &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.user_id = ?1"),
          rusqlite::params![id_str],
          RawUser::from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    match raw {
      Some(raw) => raw.into_user(),
      None => Err(lado_core::Error::CreatorNotFound(id).into()),
    }
  }

  async fn record_age_verification(
    &self,
    record: VerifiedRecord,
    source_ip: Option<String>,
  ) -> Result<AgeVerificationLog> {
    let entry = AgeVerificationLog {
      log_id:              Uuid::new_v4(),
      user_id:             record.user_id,
      verified_at:         record.verified_at,
      country:             record.country.clone(),
      age_at_verification: record.age,
      source_ip,
    };

    let log_id_str = encode_uuid(entry.log_id);
    let user_id_str = encode_uuid(entry.user_id);
    let at_str = encode_dt(entry.verified_at);
    let birth_str = encode_date(record.birth_date);
    let country = entry.country.clone();
    let age = entry.age_at_verification;
    let source_ip = entry.source_ip.clone();

    let applied = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE users
           SET birth_date = ?2, country = ?3, age_verified = 1, age_verified_at = ?4
           WHERE user_id = ?1 AND is_active = 1",
          rusqlite::params![user_id_str, birth_str, country, at_str],
        )?;
        if changed == 0 {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO age_verification_log
             (log_id, user_id, verified_at, country, age_at_verification, source_ip)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![log_id_str, user_id_str, at_str, country, age, source_ip],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !applied {
      return Err(lado_core::Error::UserNotFound(record.user_id).into());
    }
    Ok(entry)
  }

  async fn age_verification_log(&self, user_id: Uuid) -> Result<Vec<AgeVerificationLog>> {
    let id_str = encode_uuid(user_id);

    let raws: Vec<RawAgeLog> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT log_id, user_id, verified_at, country, age_at_verification, source_ip
           FROM age_verification_log
           WHERE user_id = ?1
           ORDER BY verified_at DESC, rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawAgeLog {
              log_id:              row.get(0)?,
              user_id:             row.get(1)?,
              verified_at:         row.get(2)?,
              country:             row.get(3)?,
              age_at_verification: row.get(4)?,
              source_ip:           row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAgeLog::into_entry).collect()
  }

  // ── Content ───────────────────────────────────────────────────────────────

  async fn add_content(&self, input: NewContent, now: DateTime<Utc>) -> Result<Content> {
    let content = Content {
      content_id:    Uuid::new_v4(),
      owner_id:      input.owner_id,
      file_path:     input.file_path,
      thumbnail:     input.thumbnail,
      surface:       input.surface,
      is_active:     true,
      is_draft:      input.is_draft,
      is_censored:   false,
      censor_reason: None,
      is_private:    input.is_private,
      is_sensitive:  input.is_sensitive,
      like_count:    0,
      view_count:    0,
      created_at:    now,
    };

    let id_str = encode_uuid(content.content_id);
    let owner_str = encode_uuid(content.owner_id);
    let file_path = content.file_path.clone();
    let thumbnail = content.thumbnail.clone();
    let surface = encode_surface(content.surface);
    let flags = (content.is_draft, content.is_private, content.is_sensitive);
    let at_str = encode_dt(now);

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let owner_exists = tx
          .query_row(
            "SELECT 1 FROM users WHERE user_id = ?1 AND is_active = 1",
            rusqlite::params![owner_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !owner_exists {
          return Ok(false);
        }

        tx.execute(
          "INSERT INTO content (
             content_id, owner_id, file_path, thumbnail, surface,
             is_draft, is_private, is_sensitive, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str, owner_str, file_path, thumbnail, surface,
            flags.0, flags.1, flags.2, at_str,
          ],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(lado_core::Error::UserNotFound(content.owner_id).into());
    }
    Ok(content)
  }

  async fn get_content(&self, id: Uuid) -> Result<Option<ContentSnapshot>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSnapshot> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {CONTENT_COLUMNS}, u.creator_verified
                 FROM content c
                 JOIN users u ON u.user_id = c.owner_id
                 WHERE c.content_id = ?1 AND u.is_active = 1"
              ),
              rusqlite::params![id_str],
              |row| {
                Ok(RawSnapshot {
                  content:                RawContent::from_row(row)?,
                  owner_creator_verified: row.get(14)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSnapshot::into_snapshot).transpose()
  }

  // ── Subscriptions ─────────────────────────────────────────────────────────

  async fn subscribe(
    &self,
    fan_id: Uuid,
    creator_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<Subscription> {
    if fan_id == creator_id {
      return Err(lado_core::Error::SelfSubscription.into());
    }

    let sub = Subscription {
      subscription_id: Uuid::new_v4(),
      fan_id,
      creator_id,
      started_at: now,
      cancelled_at: None,
      is_active: true,
      auto_renew: true,
    };

    let id_str = encode_uuid(sub.subscription_id);
    let fan_str = encode_uuid(fan_id);
    let creator_str = encode_uuid(creator_id);
    let at_str = encode_dt(now);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let existing = tx
          .query_row(
            "SELECT 1 FROM subscriptions
             WHERE fan_id = ?1 AND creator_id = ?2 AND is_active = 1",
            rusqlite::params![fan_str, creator_str],
            |_| Ok(()),
          )
          .optional()?;
        if existing.is_some() {
          return Ok(SubscribeWrite::Duplicate);
        }

        let inserted = tx.execute(
          "INSERT INTO subscriptions
             (subscription_id, fan_id, creator_id, started_at, is_active, auto_renew)
           VALUES (?1, ?2, ?3, ?4, 1, 1)",
          rusqlite::params![id_str, fan_str, creator_str, at_str],
        );
        match inserted {
          Ok(_) => {
            tx.commit()?;
            Ok(SubscribeWrite::Inserted)
          }
          Err(e) if is_unique_violation(&e) => Ok(SubscribeWrite::Duplicate),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    match outcome {
      SubscribeWrite::Inserted => Ok(sub),
      SubscribeWrite::Duplicate => Err(
        lado_core::Error::DuplicateActiveSubscription { fan_id, creator_id }.into(),
      ),
    }
  }

  async fn cancel_subscription(
    &self,
    subscription_id: Uuid,
    fan_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<Subscription> {
    let outcome = self
      .write_subscription(
        subscription_id,
        fan_id,
        "UPDATE subscriptions
         SET is_active = 0, cancelled_at = ?2, auto_renew = 0
         WHERE subscription_id = ?1 AND is_active = 1",
        rusqlite::types::Value::Text(encode_dt(now)),
      )
      .await?;

    match outcome {
      SubscriptionWrite::Written(raw) => raw.into_subscription(),
      SubscriptionWrite::NotFound => {
        Err(lado_core::Error::SubscriptionNotFound(subscription_id).into())
      }
      SubscriptionWrite::Cancelled => {
        Err(lado_core::Error::AlreadyCancelled(subscription_id).into())
      }
    }
  }

  async fn set_auto_renew(
    &self,
    subscription_id: Uuid,
    fan_id: Uuid,
    enabled: bool,
  ) -> Result<Subscription> {
    let outcome = self
      .write_subscription(
        subscription_id,
        fan_id,
        "UPDATE subscriptions SET auto_renew = ?2
         WHERE subscription_id = ?1 AND is_active = 1",
        rusqlite::types::Value::Integer(i64::from(enabled)),
      )
      .await?;

    match outcome {
      SubscriptionWrite::Written(raw) => raw.into_subscription(),
      SubscriptionWrite::NotFound => {
        Err(lado_core::Error::SubscriptionNotFound(subscription_id).into())
      }
      SubscriptionWrite::Cancelled => {
        Err(lado_core::Error::AlreadyCancelled(subscription_id).into())
      }
    }
  }

  async fn active_subscriptions_of(&self, fan_id: Uuid) -> Result<Vec<Subscription>> {
    let fan_str = encode_uuid(fan_id);

    let raws: Vec<RawSubscription> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
           WHERE fan_id = ?1 AND is_active = 1
             AND creator_id IN (SELECT user_id FROM users WHERE is_active = 1)
           ORDER BY started_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![fan_str], RawSubscription::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubscription::into_subscription).collect()
  }

  // ── Moderation ────────────────────────────────────────────────────────────

  async fn censor_bulk(
    &self,
    actor_id: Uuid,
    selection: Selection,
    reason: String,
    now: DateTime<Utc>,
  ) -> Result<ModerationOutcome> {
    self
      .apply_bulk(actor_id, selection, ModerationAction::Censor, Some(reason), now)
      .await
  }

  async fn uncensor_bulk(
    &self,
    actor_id: Uuid,
    selection: Selection,
    now: DateTime<Utc>,
  ) -> Result<ModerationOutcome> {
    self
      .apply_bulk(actor_id, selection, ModerationAction::Uncensor, None, now)
      .await
  }

  async fn delete_bulk(
    &self,
    actor_id: Uuid,
    selection: Selection,
    now: DateTime<Utc>,
  ) -> Result<ModerationOutcome> {
    self
      .apply_bulk(actor_id, selection, ModerationAction::Delete, None, now)
      .await
  }

  async fn moderation_log(&self, limit: usize) -> Result<Vec<ModerationLogEntry>> {
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawModerationLog> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT log_id, actor_id, action, content_ids, reason, recorded_at
           FROM moderation_log
           ORDER BY recorded_at DESC, rowid DESC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], |row| {
            Ok(RawModerationLog {
              log_id:      row.get(0)?,
              actor_id:    row.get(1)?,
              action:      row.get(2)?,
              content_ids: row.get(3)?,
              reason:      row.get(4)?,
              recorded_at: row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawModerationLog::into_entry).collect()
  }
}
