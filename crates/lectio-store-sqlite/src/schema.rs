//! SQL schema for the Lectio SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Ordered book catalog. `position` is the display order.
CREATE TABLE IF NOT EXISTS books (
    position  INTEGER PRIMARY KEY,
    name      TEXT NOT NULL UNIQUE
);

-- Verse content, keyed by identity.
CREATE TABLE IF NOT EXISTS verses (
    book     TEXT    NOT NULL,
    chapter  INTEGER NOT NULL CHECK (chapter > 0),
    verse    INTEGER NOT NULL CHECK (verse > 0),
    text     TEXT    NOT NULL,
    PRIMARY KEY (book, chapter, verse)
);

-- Study state. Rewritten wholesale on every save.
CREATE TABLE IF NOT EXISTS favorites (
    position  INTEGER NOT NULL,
    book      TEXT    NOT NULL,
    chapter   INTEGER NOT NULL,
    verse     INTEGER NOT NULL,
    text      TEXT    NOT NULL,
    PRIMARY KEY (book, chapter, verse)
);

CREATE TABLE IF NOT EXISTS topics (
    topic_id     TEXT PRIMARY KEY,
    position     INTEGER NOT NULL,
    title        TEXT NOT NULL CHECK (length(trim(title)) > 0),
    description  TEXT NOT NULL DEFAULT '',
    created_at   TEXT NOT NULL      -- RFC 3339 UTC
);

CREATE TABLE IF NOT EXISTS topic_verses (
    topic_id  TEXT    NOT NULL REFERENCES topics(topic_id) ON DELETE CASCADE,
    position  INTEGER NOT NULL,
    book      TEXT    NOT NULL,
    chapter   INTEGER NOT NULL,
    verse     INTEGER NOT NULL,
    text      TEXT    NOT NULL,
    UNIQUE (topic_id, book, chapter, verse)
);

CREATE INDEX IF NOT EXISTS topic_verses_topic_idx ON topic_verses(topic_id);

PRAGMA user_version = 1;
";
