//! SQL schema for the Lado SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Users are never deleted; is_active = 0 is a soft delete.
CREATE TABLE IF NOT EXISTS users (
    user_id          TEXT PRIMARY KEY,
    user_name        TEXT NOT NULL,
    pseudonym        TEXT,
    is_active        INTEGER NOT NULL DEFAULT 1,
    is_creator       INTEGER NOT NULL DEFAULT 0,
    creator_verified INTEGER NOT NULL DEFAULT 0,
    birth_date       TEXT,             -- YYYY-MM-DD
    country          TEXT,             -- ISO 3166-1 alpha-2
    age_verified     INTEGER NOT NULL DEFAULT 0,
    age_verified_at  TEXT,
    is_moderator     INTEGER NOT NULL DEFAULT 0,
    created_at       TEXT NOT NULL,
    CHECK (age_verified = 0
           OR (birth_date IS NOT NULL AND country IS NOT NULL
               AND age_verified_at IS NOT NULL))
);

CREATE UNIQUE INDEX IF NOT EXISTS users_name_idx
    ON users(lower(user_name));
CREATE UNIQUE INDEX IF NOT EXISTS users_pseudonym_idx
    ON users(lower(pseudonym)) WHERE pseudonym IS NOT NULL;

CREATE TABLE IF NOT EXISTS content (
    content_id    TEXT PRIMARY KEY,
    owner_id      TEXT NOT NULL REFERENCES users(user_id),
    file_path     TEXT NOT NULL,
    thumbnail     TEXT,
    surface       TEXT NOT NULL,       -- 'public' | 'restricted'
    is_active     INTEGER NOT NULL DEFAULT 1,
    is_draft      INTEGER NOT NULL DEFAULT 0,
    is_censored   INTEGER NOT NULL DEFAULT 0,
    censor_reason TEXT,
    is_private    INTEGER NOT NULL DEFAULT 0,
    is_sensitive  INTEGER NOT NULL DEFAULT 0,
    like_count    INTEGER NOT NULL DEFAULT 0,
    view_count    INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL,
    CHECK (censor_reason IS NULL OR is_censored = 1)
);

CREATE INDEX IF NOT EXISTS content_owner_idx ON content(owner_id, surface);

CREATE TABLE IF NOT EXISTS subscriptions (
    subscription_id TEXT PRIMARY KEY,
    fan_id          TEXT NOT NULL REFERENCES users(user_id),
    creator_id      TEXT NOT NULL REFERENCES users(user_id),
    started_at      TEXT NOT NULL,
    cancelled_at    TEXT,
    is_active       INTEGER NOT NULL DEFAULT 1,
    auto_renew      INTEGER NOT NULL DEFAULT 1,
    CHECK ((is_active = 1 AND cancelled_at IS NULL)
        OR (is_active = 0 AND cancelled_at IS NOT NULL)),
    CHECK (fan_id != creator_id)
);

-- At most one active subscription per (fan, creator).
CREATE UNIQUE INDEX IF NOT EXISTS subscriptions_active_pair_idx
    ON subscriptions(fan_id, creator_id) WHERE is_active = 1;
CREATE INDEX IF NOT EXISTS subscriptions_fan_idx
    ON subscriptions(fan_id, started_at);

-- Append-only. No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS age_verification_log (
    log_id              TEXT PRIMARY KEY,
    user_id             TEXT NOT NULL REFERENCES users(user_id),
    verified_at         TEXT NOT NULL,
    country             TEXT NOT NULL,
    age_at_verification INTEGER NOT NULL,
    source_ip           TEXT
);

CREATE INDEX IF NOT EXISTS age_log_user_idx
    ON age_verification_log(user_id, verified_at);

-- Append-only. content_ids is a JSON array; no foreign key so entries
-- survive deletion of the content they describe.
CREATE TABLE IF NOT EXISTS moderation_log (
    log_id      TEXT PRIMARY KEY,
    actor_id    TEXT NOT NULL,
    action      TEXT NOT NULL,        -- 'censor' | 'uncensor' | 'delete'
    content_ids TEXT NOT NULL,
    reason      TEXT,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS moderation_log_recorded_idx
    ON moderation_log(recorded_at);

PRAGMA user_version = 1;
";
