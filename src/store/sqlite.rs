//! SQLite-backed template store.

use std::path::Path;

use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row};

use crate::fingerprint::Fingerprint;
use crate::store::TemplateStore;
use crate::template::{
    validate_duration, AdTemplate, CachedFingerprint, IdClock, Rect, Region, TemplateDraft,
    TemplateId,
};
use crate::trace::trace_event;
use crate::util::{AdSkipError, AdSkipResult};

/// Current on-disk schema version (`PRAGMA user_version`).
///
/// Version 1 tables have no region or fingerprint columns; they are migrated
/// in place and their rows read back with `region = None`.
pub const SCHEMA_VERSION: i64 = 2;

const CREATE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS ad_templates (
    id INTEGER PRIMARY KEY,
    host TEXT NOT NULL,
    image_data BLOB NOT NULL,
    width INTEGER NOT NULL,
    height INTEGER NOT NULL,
    duration_ms INTEGER NOT NULL,
    region_x INTEGER,
    region_y INTEGER,
    region_width INTEGER,
    region_height INTEGER,
    frame_width INTEGER,
    frame_height INTEGER,
    fingerprint INTEGER,
    fingerprint_version INTEGER
);

CREATE INDEX IF NOT EXISTS idx_ad_templates_host ON ad_templates(host);
"#;

const MIGRATE_V1_SQL: &str = r#"
ALTER TABLE ad_templates ADD COLUMN region_x INTEGER;
ALTER TABLE ad_templates ADD COLUMN region_y INTEGER;
ALTER TABLE ad_templates ADD COLUMN region_width INTEGER;
ALTER TABLE ad_templates ADD COLUMN region_height INTEGER;
ALTER TABLE ad_templates ADD COLUMN frame_width INTEGER;
ALTER TABLE ad_templates ADD COLUMN frame_height INTEGER;
ALTER TABLE ad_templates ADD COLUMN fingerprint INTEGER;
ALTER TABLE ad_templates ADD COLUMN fingerprint_version INTEGER;
CREATE INDEX IF NOT EXISTS idx_ad_templates_host ON ad_templates(host);
"#;

const COLUMNS: &str = "id, host, image_data, width, height, duration_ms, \
     region_x, region_y, region_width, region_height, frame_width, frame_height, \
     fingerprint, fingerprint_version";

/// Persistent store in a single SQLite table with a non-unique host index.
pub struct SqliteTemplateStore {
    conn: Connection,
    clock: IdClock,
}

impl SqliteTemplateStore {
    /// Opens or creates the database at `path` and runs migrations.
    pub fn open(path: impl AsRef<Path>) -> AdSkipResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(AdSkipError::storage)?;
            }
        }
        Self::from_connection(Connection::open(path)?)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> AdSkipResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wraps an existing connection, migrating its schema if needed.
    pub fn from_connection(mut conn: Connection) -> AdSkipResult<Self> {
        migrate(&mut conn)?;
        let last = max_id(&conn)?;
        Ok(Self {
            conn,
            clock: IdClock::starting_after(last.unwrap_or(0)),
        })
    }

    /// Returns the schema version recorded in the database.
    pub fn schema_version(&self) -> AdSkipResult<i64> {
        Ok(self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }
}

fn migrate(conn: &mut Connection) -> AdSkipResult<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version >= SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    let table_exists: bool = tx.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = 'ad_templates'",
        [],
        |row| row.get(0),
    )?;
    if table_exists {
        tx.execute_batch(MIGRATE_V1_SQL)?;
    } else {
        tx.execute_batch(CREATE_SQL)?;
    }
    tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    tx.commit()?;
    trace_event!(debug, "schema_migrated", from = version, to = SCHEMA_VERSION);
    Ok(())
}

fn max_id(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    conn.query_row("SELECT MAX(id) FROM ad_templates", [], |row| row.get(0))
}

fn to_i64(value: usize, field: &'static str) -> AdSkipResult<i64> {
    i64::try_from(value).map_err(|_| AdSkipError::storage(format!("{field} out of range")))
}

fn column_usize(row: &Row<'_>, idx: usize) -> rusqlite::Result<usize> {
    let value: i64 = row.get(idx)?;
    usize::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, value))
}

fn column_usize_opt(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<usize>> {
    let value: Option<i64> = row.get(idx)?;
    value
        .map(|v| usize::try_from(v).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, v)))
        .transpose()
}

fn decode_row(row: &Row<'_>) -> rusqlite::Result<AdTemplate> {
    let duration: i64 = row.get(5)?;
    let duration_ms =
        u64::try_from(duration).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(5, duration))?;

    let region = match (
        column_usize_opt(row, 6)?,
        column_usize_opt(row, 7)?,
        column_usize_opt(row, 8)?,
        column_usize_opt(row, 9)?,
        column_usize_opt(row, 10)?,
        column_usize_opt(row, 11)?,
    ) {
        (Some(x), Some(y), Some(width), Some(height), Some(frame_width), Some(frame_height)) => {
            Some(Region {
                rect: Rect::new(x, y, width, height),
                frame_width,
                frame_height,
            })
        }
        _ => None,
    };

    let bits: Option<i64> = row.get(12)?;
    let version: Option<i64> = row.get(13)?;
    let fingerprint = match (bits, version.and_then(|v| u32::try_from(v).ok())) {
        (Some(bits), Some(version)) => Some(CachedFingerprint {
            version,
            value: Fingerprint(bits as u64),
        }),
        _ => None,
    };

    Ok(AdTemplate {
        id: TemplateId(row.get(0)?),
        host: row.get(1)?,
        image_data: row.get(2)?,
        width: column_usize(row, 3)?,
        height: column_usize(row, 4)?,
        region,
        duration_ms,
        fingerprint,
    })
}

/// Attempts `insert` makes before giving up on finding a free id.
const INSERT_ATTEMPTS: usize = 8;

fn write_sql(verb: &str) -> String {
    format!(
        "{verb} INTO ad_templates ({COLUMNS}) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
    )
}

/// Validates `template` and lays it out in `COLUMNS` order.
fn encode_row(template: &AdTemplate) -> AdSkipResult<Vec<ToSqlOutput<'_>>> {
    template.validate()?;
    let duration = i64::try_from(template.duration_ms)
        .map_err(|_| AdSkipError::InvalidInput("duration out of range"))?;
    let mut row = vec![
        ToSqlOutput::from(template.id.0),
        ToSqlOutput::Borrowed(ValueRef::Text(template.host.as_bytes())),
        ToSqlOutput::Borrowed(ValueRef::Blob(&template.image_data)),
        ToSqlOutput::from(to_i64(template.width, "width")?),
        ToSqlOutput::from(to_i64(template.height, "height")?),
        ToSqlOutput::from(duration),
    ];
    match &template.region {
        Some(r) => {
            let columns = [
                (r.rect.x, "region_x"),
                (r.rect.y, "region_y"),
                (r.rect.width, "region_width"),
                (r.rect.height, "region_height"),
                (r.frame_width, "frame_width"),
                (r.frame_height, "frame_height"),
            ];
            for (value, field) in columns {
                row.push(ToSqlOutput::from(to_i64(value, field)?));
            }
        }
        None => row.extend((0..6).map(|_| ToSqlOutput::Owned(Value::Null))),
    }
    match template.fingerprint {
        Some(cached) => {
            row.push(ToSqlOutput::from(cached.value.bits() as i64));
            row.push(ToSqlOutput::from(i64::from(cached.version)));
        }
        None => row.extend((0..2).map(|_| ToSqlOutput::Owned(Value::Null))),
    }
    Ok(row)
}

/// Column contents that cannot be turned into a template.
fn is_corrupt_row(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::IntegralValueOutOfRange(..)
            | rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..)
    )
}

impl TemplateStore for SqliteTemplateStore {
    fn put(&mut self, template: AdTemplate) -> AdSkipResult<TemplateId> {
        let row = encode_row(&template)?;
        self.conn
            .execute(&write_sql("INSERT OR REPLACE"), params_from_iter(row.iter()))?;
        self.clock.observe(template.id);
        trace_event!(debug, "template_stored", id = template.id.0);
        Ok(template.id)
    }

    /// Never overwrites: when another connection already used the id, the
    /// clock is moved past the largest stored id and the insert retried.
    fn insert(&mut self, draft: TemplateDraft) -> AdSkipResult<AdTemplate> {
        let sql = write_sql("INSERT");
        let mut template = draft.into_template(self.clock.next_id())?;
        for _ in 0..INSERT_ATTEMPTS {
            let written = {
                let row = encode_row(&template)?;
                self.conn.execute(&sql, params_from_iter(row.iter()))
            };
            match written {
                Ok(_) => {
                    self.clock.observe(template.id);
                    trace_event!(debug, "template_stored", id = template.id.0);
                    return Ok(template);
                }
                Err(err) if err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) => {
                    trace_event!(debug, "template_id_taken", id = template.id.0);
                    let last = max_id(&self.conn)?;
                    self.clock.observe(TemplateId(last.unwrap_or(0)));
                    template.id = self.clock.next_id();
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(AdSkipError::storage("no free template id after repeated conflicts"))
    }

    fn get(&self, id: TemplateId) -> AdSkipResult<Option<AdTemplate>> {
        let sql = format!("SELECT {COLUMNS} FROM ad_templates WHERE id = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![id.0], decode_row)
            .optional()?)
    }

    /// Rows whose columns no longer decode (negative sizes or durations,
    /// wrongly typed values) are logged and left out so the remaining
    /// templates of the host stay usable.
    fn query_by_host(&self, host: &str) -> AdSkipResult<Vec<AdTemplate>> {
        let sql = format!("SELECT {COLUMNS} FROM ad_templates WHERE host = ?1 ORDER BY id");
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params![host], decode_row)?;
        let mut out = Vec::new();
        for row in rows {
            match row {
                Ok(template) => out.push(template),
                Err(err) if is_corrupt_row(&err) => {
                    trace_event!(
                        warn,
                        "corrupt_row_skipped",
                        host = host,
                        reason = err.to_string().as_str()
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(out)
    }

    fn update_duration(&mut self, id: TemplateId, duration_ms: i64) -> AdSkipResult<()> {
        let duration_ms = validate_duration(duration_ms)?;
        let changed = self.conn.execute(
            "UPDATE ad_templates SET duration_ms = ?2 WHERE id = ?1",
            params![id.0, duration_ms as i64],
        )?;
        if changed == 0 {
            return Err(AdSkipError::NotFound(id));
        }
        trace_event!(debug, "duration_updated", id = id.0, duration_ms = duration_ms);
        Ok(())
    }

    fn delete_by_host(&mut self, host: &str) -> AdSkipResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM ad_templates WHERE host = ?1", params![host])?;
        trace_event!(debug, "host_cleaned", count = removed);
        Ok(removed)
    }
}
