//! Database schema and migrations for postadm.
//!
//! Table and column names are read by the mail transfer and delivery agents
//! and must not be renamed.

/// Database migrations.
///
/// Each migration is a SQL script executed in order. The schema_version
/// table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Domains, admins and grants
    r#"
CREATE TABLE domain (
    domain      TEXT NOT NULL PRIMARY KEY,
    description TEXT NOT NULL DEFAULT '',
    aliases     INTEGER NOT NULL DEFAULT 0,    -- 0 = unlimited, -1 = disabled
    mailboxes   INTEGER NOT NULL DEFAULT 0,
    maxquota    INTEGER NOT NULL DEFAULT 0,    -- MB per mailbox
    transport   TEXT NOT NULL DEFAULT 'virtual',
    created     TEXT NOT NULL DEFAULT (datetime('now')),
    modified    TEXT NOT NULL DEFAULT (datetime('now')),
    active      INTEGER NOT NULL DEFAULT 1
);

-- Grant target meaning "every domain"
INSERT INTO domain (domain, description, aliases, mailboxes, maxquota, transport)
VALUES ('ALL', '', 0, 0, 0, '');

CREATE TABLE admin (
    username    TEXT NOT NULL PRIMARY KEY COLLATE NOCASE,
    password    TEXT NOT NULL,
    superadmin  INTEGER NOT NULL DEFAULT 0,
    created     TEXT NOT NULL DEFAULT (datetime('now')),
    modified    TEXT NOT NULL DEFAULT (datetime('now')),
    active      INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE domain_admins (
    username    TEXT NOT NULL REFERENCES admin(username),
    domain      TEXT NOT NULL REFERENCES domain(domain),
    created     TEXT NOT NULL DEFAULT (datetime('now')),
    active      INTEGER NOT NULL DEFAULT 1,
    PRIMARY KEY (username, domain)
);

CREATE INDEX idx_domain_admins_domain ON domain_admins(domain);
"#,
    // v2: Mailboxes and aliases
    r#"
CREATE TABLE mailbox (
    username    TEXT NOT NULL PRIMARY KEY COLLATE NOCASE,
    password    TEXT NOT NULL,
    name        TEXT NOT NULL DEFAULT '',
    maildir     TEXT NOT NULL,
    quota       INTEGER NOT NULL DEFAULT 0,    -- storage units, 0 = unlimited
    local_part  TEXT NOT NULL,
    domain      TEXT NOT NULL REFERENCES domain(domain),
    created     TEXT NOT NULL DEFAULT (datetime('now')),
    modified    TEXT NOT NULL DEFAULT (datetime('now')),
    active      INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX idx_mailbox_domain ON mailbox(domain);

CREATE TABLE alias (
    address     TEXT NOT NULL PRIMARY KEY COLLATE NOCASE,
    goto        TEXT NOT NULL,
    domain      TEXT NOT NULL REFERENCES domain(domain),
    created     TEXT NOT NULL DEFAULT (datetime('now')),
    modified    TEXT NOT NULL DEFAULT (datetime('now')),
    active      INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX idx_alias_domain ON alias(domain);
"#,
    // v3: Quota usage written by the delivery agent
    r#"
CREATE TABLE quota2 (
    username    TEXT NOT NULL PRIMARY KEY COLLATE NOCASE,
    bytes       INTEGER NOT NULL DEFAULT 0,
    messages    INTEGER NOT NULL DEFAULT 0
);
"#,
    // v4: Audit log
    r#"
CREATE TABLE log (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp   TEXT NOT NULL,
    username    TEXT NOT NULL DEFAULT '',
    domain      TEXT NOT NULL DEFAULT '',
    action      TEXT NOT NULL,
    data        TEXT NOT NULL DEFAULT ''
);

CREATE INDEX idx_log_timestamp ON log(timestamp);
CREATE INDEX idx_log_domain_timestamp ON log(domain, timestamp);
"#,
];
