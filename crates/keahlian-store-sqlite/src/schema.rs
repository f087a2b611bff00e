//! SQL schema for the Keahlian SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- No uniqueness on name / ic_no / phone: duplicates are a reviewer decision.
CREATE TABLE IF NOT EXISTS members (
    member_id    TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    name_key     TEXT NOT NULL,            -- trimmed, case-folded name
    ic_no        TEXT NOT NULL DEFAULT '', -- digits only; '' when unknown
    phone        TEXT NOT NULL DEFAULT '', -- digits only; '' when unknown
    email        TEXT,
    address      TEXT,
    city         TEXT,
    state        TEXT,
    postcode     TEXT,
    gender       TEXT,                     -- 'M' | 'F' | NULL
    age          INTEGER,
    status       TEXT NOT NULL DEFAULT 'pending',
    uploaded_by  TEXT NOT NULL,
    source_file  TEXT NOT NULL,
    source_row   INTEGER NOT NULL,
    created_at   TEXT NOT NULL,            -- RFC 3339 UTC; server-assigned
    reviewed_by  TEXT,
    reviewed_at  TEXT
);

CREATE INDEX IF NOT EXISTS members_name_key_idx ON members(name_key);
CREATE INDEX IF NOT EXISTS members_ic_idx       ON members(ic_no);
CREATE INDEX IF NOT EXISTS members_phone_idx    ON members(phone);
CREATE INDEX IF NOT EXISTS members_status_idx   ON members(status);

PRAGMA user_version = 1;
";
