//! Schema migrations for the notes, version history, tag and snippet tables.
//!
//! # Responsibility
//! - Keep the ordered list of schema steps shipped with this build.
//! - Bring a database from its recorded `PRAGMA user_version` to the latest
//!   step in one transaction.
//!
//! # Invariants
//! - Step versions start at 1 and increase by exactly one.
//! - Either every pending step lands or none does; `user_version` always
//!   names the last step whose SQL fully ran.
//! - A failing step is reported by version and name.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, Transaction};

/// One schema step.
#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "notes_versions",
        sql: include_str!("0001_notes_versions.sql"),
    },
    SchemaStep {
        version: 2,
        name: "tags",
        sql: include_str!("0002_tags.sql"),
    },
    SchemaStep {
        version: 3,
        name: "code_snippets",
        sql: include_str!("0003_code_snippets.sql"),
    },
];

/// Returns the schema version this build migrates to.
pub fn latest_version() -> u32 {
    latest_of(SCHEMA_STEPS)
}

/// Brings `conn` up to [`latest_version`].
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file was written by a newer build.
/// - `Migration` naming the step whose SQL failed; nothing is applied then.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    migrate(conn, SCHEMA_STEPS)
}

fn latest_of(steps: &[SchemaStep]) -> u32 {
    steps.last().map_or(0, |step| step.version)
}

fn migrate(conn: &mut Connection, steps: &[SchemaStep]) -> DbResult<()> {
    let from_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let target = latest_of(steps);

    if from_version > target {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: target,
        });
    }
    if from_version == target {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in steps.iter().filter(|step| step.version > from_version) {
        if let Err(source) = run_step(&tx, step) {
            error!(
                "event=db_migrate module=db status=error version={} name={} error={}",
                step.version, step.name, source
            );
            return Err(DbError::Migration {
                version: step.version,
                name: step.name,
                source,
            });
        }
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={from_version} to_version={target} steps={}",
        target - from_version
    );
    Ok(())
}

fn run_step(tx: &Transaction<'_>, step: &SchemaStep) -> rusqlite::Result<()> {
    tx.execute_batch(step.sql)?;
    tx.pragma_update(None, "user_version", step.version)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_version(conn: &Connection) -> u32 {
        conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn shipped_steps_are_contiguous_from_one() {
        for (idx, step) in SCHEMA_STEPS.iter().enumerate() {
            assert_eq!(step.version as usize, idx + 1, "step {}", step.name);
        }
    }

    #[test]
    fn failing_step_is_named_and_nothing_is_applied() {
        let steps = [
            SchemaStep {
                version: 1,
                name: "widgets",
                sql: "CREATE TABLE widgets (id INTEGER PRIMARY KEY);",
            },
            SchemaStep {
                version: 2,
                name: "broken",
                sql: "CREATE TABLE widgets (id INTEGER PRIMARY KEY);",
            },
        ];
        let mut conn = Connection::open_in_memory().unwrap();

        let err = migrate(&mut conn, &steps).unwrap_err();

        assert!(matches!(
            err,
            DbError::Migration {
                version: 2,
                name: "broken",
                ..
            }
        ));
        assert!(err.to_string().contains("broken"));
        assert_eq!(user_version(&conn), 0);
        let widgets: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'widgets';",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(widgets, 0);
    }

    #[test]
    fn only_pending_steps_run() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn, &SCHEMA_STEPS[..1]).unwrap();
        assert_eq!(user_version(&conn), 1);

        migrate(&mut conn, SCHEMA_STEPS).unwrap();
        assert_eq!(user_version(&conn), latest_version());
    }
}
