// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use homekeep_app::{
    House, HouseId, HouseSystem, MaintenanceBackend, MaintenanceCategory, MaintenanceItem,
    MaintenanceItemId, MaintenancePriority, MaintenanceStatus, PersistenceError, RetrievalError,
    UserId,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime};

pub const APP_NAME: &str = "homekeep";

const DEMO_HOUSE_NAME: &str = "Demo House";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    ("houses", &["id", "name", "created_at", "updated_at"]),
    (
        "maintenance_items",
        &[
            "id",
            "house_id",
            "title",
            "description",
            "category",
            "priority",
            "status",
            "due_date",
            "related_system",
            "notes",
            "created_by",
            "created_at",
            "updated_at",
            "completed_at",
        ],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[
    RequiredIndex {
        name: "idx_maintenance_items_house_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_maintenance_items_house_id ON maintenance_items (house_id);",
    },
    RequiredIndex {
        name: "idx_maintenance_items_due_date",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_maintenance_items_due_date ON maintenance_items (due_date);",
    },
];

const ITEM_COLUMNS: &str = "
    id, house_id, title, description, category, priority, status,
    due_date, related_system, notes, created_by,
    created_at, updated_at, completed_at
";

/// Demo rows: title, category, priority, status, system, due offset in days.
const DEMO_ITEMS: [(
    &str,
    MaintenanceCategory,
    MaintenancePriority,
    MaintenanceStatus,
    Option<HouseSystem>,
    Option<i64>,
); 8] = [
    (
        "Replace HVAC filter",
        MaintenanceCategory::Routine,
        MaintenancePriority::High,
        MaintenanceStatus::Pending,
        Some(HouseSystem::Hvac),
        Some(-10),
    ),
    (
        "Clean gutters",
        MaintenanceCategory::Seasonal,
        MaintenancePriority::Medium,
        MaintenanceStatus::Pending,
        Some(HouseSystem::Roof),
        Some(21),
    ),
    (
        "Fix leaky kitchen faucet",
        MaintenanceCategory::Repair,
        MaintenancePriority::Urgent,
        MaintenanceStatus::InProgress,
        Some(HouseSystem::Plumbing),
        Some(-2),
    ),
    (
        "Test smoke detectors",
        MaintenanceCategory::Safety,
        MaintenancePriority::High,
        MaintenanceStatus::Completed,
        Some(HouseSystem::Security),
        Some(-30),
    ),
    (
        "Inspect foundation cracks",
        MaintenanceCategory::Inspection,
        MaintenancePriority::Low,
        MaintenanceStatus::Pending,
        Some(HouseSystem::Foundation),
        None,
    ),
    (
        "Vacuum refrigerator coils",
        MaintenanceCategory::Cleaning,
        MaintenancePriority::Low,
        MaintenanceStatus::Pending,
        Some(HouseSystem::Appliances),
        Some(45),
    ),
    (
        "Install smart thermostat",
        MaintenanceCategory::Upgrade,
        MaintenancePriority::Medium,
        MaintenanceStatus::Completed,
        Some(HouseSystem::Hvac),
        None,
    ),
    (
        "Sort garage storage",
        MaintenanceCategory::Other,
        MaintenancePriority::Low,
        MaintenanceStatus::Pending,
        None,
        None,
    ),
];

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        tracing::debug!(path = %path.display(), "opened database");
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
            tracing::info!("created database schema");
        }

        ensure_required_indexes(&self.conn)
    }

    pub fn list_houses(&self) -> Result<Vec<House>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, name, created_at, updated_at
                FROM houses
                ORDER BY id ASC
                ",
            )
            .context("prepare houses query")?;
        let rows = stmt
            .query_map([], house_from_row)
            .context("query houses")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect houses")
    }

    pub fn get_house(&self, house_id: HouseId) -> Result<House> {
        self.conn
            .query_row(
                "
                SELECT id, name, created_at, updated_at
                FROM houses
                WHERE id = ?
                ",
                params![house_id.get()],
                house_from_row,
            )
            .optional()
            .with_context(|| format!("load house {house_id}"))?
            .ok_or_else(|| {
                anyhow!("house {house_id} not found -- run `homekeep houses` and pick an id")
            })
    }

    pub fn create_house(&self, name: &str) -> Result<HouseId> {
        let name = name.trim();
        if name.is_empty() {
            bail!("house name is required -- pass a non-empty name and retry");
        }

        let now = now_rfc3339()?;
        self.conn
            .execute(
                "INSERT INTO houses (name, created_at, updated_at) VALUES (?, ?, ?)",
                params![name, now, now],
            )
            .context("insert house")?;
        let id = HouseId::new(self.conn.last_insert_rowid());
        tracing::info!(house_id = %id, "created house");
        Ok(id)
    }

    /// Items for one house, soonest due first; undated items trail.
    pub fn list_maintenance_items(&self, house_id: HouseId) -> Result<Vec<MaintenanceItem>> {
        let sql = format!(
            "
            SELECT {ITEM_COLUMNS}
            FROM maintenance_items
            WHERE house_id = ?
            ORDER BY due_date IS NULL, due_date ASC, id ASC
            "
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("prepare maintenance items query")?;
        let rows = stmt
            .query_map(params![house_id.get()], item_from_row)
            .context("query maintenance items")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect maintenance items")
    }

    pub fn get_maintenance_item(&self, item_id: MaintenanceItemId) -> Result<MaintenanceItem> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM maintenance_items WHERE id = ?");
        self.conn
            .query_row(&sql, params![item_id.get()], item_from_row)
            .optional()
            .with_context(|| format!("load maintenance item {item_id}"))?
            .ok_or_else(|| {
                anyhow!("maintenance item {item_id} not found -- choose an existing item and retry")
            })
    }

    pub fn create_maintenance_item(&self, item: &MaintenanceItem) -> Result<MaintenanceItemId> {
        check_item(item)?;
        self.require_house(item.house_id)?;

        self.conn
            .execute(
                "
                INSERT INTO maintenance_items (
                  house_id, title, description, category, priority, status,
                  due_date, related_system, notes, created_by,
                  created_at, updated_at, completed_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    item.house_id.get(),
                    item.title,
                    item.description,
                    item.category.as_str(),
                    item.priority.as_str(),
                    item.status.as_str(),
                    item.due_date.map(format_date),
                    item.related_system.map(HouseSystem::as_str),
                    item.notes,
                    item.created_by.get(),
                    format_datetime(item.created_at)?,
                    format_datetime(item.updated_at)?,
                    item.completed_at.map(format_datetime).transpose()?,
                ],
            )
            .context("insert maintenance item")?;
        Ok(MaintenanceItemId::new(self.conn.last_insert_rowid()))
    }

    /// Writes every mutable column. `house_id`, `created_by` and
    /// `created_at` are fixed at creation and left untouched.
    pub fn update_maintenance_item(
        &self,
        item_id: MaintenanceItemId,
        item: &MaintenanceItem,
    ) -> Result<()> {
        check_item(item)?;

        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE maintenance_items
                SET
                  title = ?,
                  description = ?,
                  category = ?,
                  priority = ?,
                  status = ?,
                  due_date = ?,
                  related_system = ?,
                  notes = ?,
                  updated_at = ?,
                  completed_at = ?
                WHERE id = ?
                ",
                params![
                    item.title,
                    item.description,
                    item.category.as_str(),
                    item.priority.as_str(),
                    item.status.as_str(),
                    item.due_date.map(format_date),
                    item.related_system.map(HouseSystem::as_str),
                    item.notes,
                    format_datetime(item.updated_at)?,
                    item.completed_at.map(format_datetime).transpose()?,
                    item_id.get(),
                ],
            )
            .context("update maintenance item")?;
        if rows_affected == 0 {
            bail!("maintenance item {item_id} not found -- choose an existing item and retry");
        }
        Ok(())
    }

    /// Inserts when the item has no id, otherwise updates in place.
    pub fn upsert_maintenance_item(&self, item: &MaintenanceItem) -> Result<MaintenanceItemId> {
        match item.id {
            Some(item_id) => {
                self.update_maintenance_item(item_id, item)?;
                Ok(item_id)
            }
            None => self.create_maintenance_item(item),
        }
    }

    pub fn delete_maintenance_item(&self, item_id: MaintenanceItemId) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "DELETE FROM maintenance_items WHERE id = ?",
                params![item_id.get()],
            )
            .with_context(|| format!("delete maintenance item {item_id}"))?;
        if rows_affected == 0 {
            bail!("maintenance item {item_id} not found -- choose an existing item and retry");
        }
        Ok(())
    }

    /// Creates a demo house with a spread of items around `now` and returns
    /// its id.
    pub fn seed_demo_data(&self, created_by: UserId, now: OffsetDateTime) -> Result<HouseId> {
        let house_id = self.create_house(DEMO_HOUSE_NAME)?;
        let created_at = now - Duration::days(60);

        for (title, category, priority, status, related_system, due_offset) in DEMO_ITEMS {
            let item = MaintenanceItem {
                id: None,
                house_id,
                title: title.to_owned(),
                description: None,
                category,
                priority,
                status,
                due_date: due_offset.map(|days| (now + Duration::days(days)).date()),
                related_system,
                notes: None,
                created_by,
                created_at,
                updated_at: created_at,
                completed_at: status.is_completed().then_some(created_at),
            };
            self.create_maintenance_item(&item)
                .with_context(|| format!("seed demo item {title:?}"))?;
        }

        tracing::info!(house_id = %house_id, items = DEMO_ITEMS.len(), "seeded demo data");
        Ok(house_id)
    }

    fn require_house(&self, house_id: HouseId) -> Result<()> {
        let exists = self
            .conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM houses WHERE id = ?)",
                params![house_id.get()],
                |row| row.get::<_, i64>(0),
            )
            .with_context(|| format!("check house {house_id}"))?;
        if exists != 1 {
            bail!("house {house_id} not found -- run `homekeep houses` and pick an id");
        }
        Ok(())
    }
}

impl MaintenanceBackend for Store {
    fn fetch_items(&mut self, house_id: HouseId) -> Result<Vec<MaintenanceItem>, RetrievalError> {
        self.list_maintenance_items(house_id)
            .map_err(|error| RetrievalError::new(house_id, format!("{error:#}")))
    }

    fn save_item(&mut self, item: &MaintenanceItem) -> Result<MaintenanceItemId, PersistenceError> {
        if item.title.trim().is_empty() {
            return Err(PersistenceError::EmptyTitle);
        }
        if let Some(item_id) = item.id
            && !self.item_exists(item_id).map_err(save_error)?
        {
            return Err(PersistenceError::NotFound(item_id));
        }
        self.upsert_maintenance_item(item).map_err(save_error)
    }

    fn delete_item(&mut self, id: MaintenanceItemId) -> Result<(), PersistenceError> {
        if !self
            .item_exists(id)
            .map_err(|error| delete_error(id, error))?
        {
            return Err(PersistenceError::NotFound(id));
        }
        self.delete_maintenance_item(id)
            .map_err(|error| delete_error(id, error))
    }
}

impl Store {
    fn item_exists(&self, item_id: MaintenanceItemId) -> Result<bool> {
        let exists = self
            .conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM maintenance_items WHERE id = ?)",
                params![item_id.get()],
                |row| row.get::<_, i64>(0),
            )
            .with_context(|| format!("check maintenance item {item_id}"))?;
        Ok(exists == 1)
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("HOMEKEEP_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set HOMEKEEP_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("homekeep.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn check_item(item: &MaintenanceItem) -> Result<()> {
    if item.title.trim().is_empty() {
        bail!("maintenance item title is required -- enter a title and retry");
    }
    if !item.completion_is_consistent() {
        bail!(
            "maintenance item {:?} has status {} but completion stamp {}; complete or reopen it through the list",
            item.title,
            item.status.as_str(),
            if item.completed_at.is_some() {
                "set"
            } else {
                "missing"
            }
        );
    }
    Ok(())
}

fn save_error(error: anyhow::Error) -> PersistenceError {
    tracing::debug!(error = %format!("{error:#}"), "store save failed");
    PersistenceError::Save(format!("{error:#}"))
}

fn delete_error(id: MaintenanceItemId, error: anyhow::Error) -> PersistenceError {
    PersistenceError::Delete {
        id,
        detail: format!("{error:#}"),
    }
}

fn house_from_row(row: &Row<'_>) -> rusqlite::Result<House> {
    let created_at_raw: String = row.get(2)?;
    let updated_at_raw: String = row.get(3)?;
    Ok(House {
        id: HouseId::new(row.get(0)?),
        name: row.get(1)?,
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
        updated_at: parse_datetime(&updated_at_raw).map_err(to_sql_error)?,
    })
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<MaintenanceItem> {
    let category_raw: String = row.get(4)?;
    let priority_raw: String = row.get(5)?;
    let status_raw: String = row.get(6)?;
    let due_date_raw: Option<String> = row.get(7)?;
    let related_system_raw: Option<String> = row.get(8)?;
    let created_at_raw: String = row.get(11)?;
    let updated_at_raw: String = row.get(12)?;
    let completed_at_raw: Option<String> = row.get(13)?;

    Ok(MaintenanceItem {
        id: Some(MaintenanceItemId::new(row.get(0)?)),
        house_id: HouseId::new(row.get(1)?),
        title: row.get(2)?,
        description: row.get(3)?,
        category: parse_stored(&category_raw, "category", MaintenanceCategory::parse)?,
        priority: parse_stored(&priority_raw, "priority", MaintenancePriority::parse)?,
        status: parse_stored(&status_raw, "status", MaintenanceStatus::parse)?,
        due_date: parse_opt_date(due_date_raw).map_err(to_sql_error)?,
        related_system: related_system_raw
            .as_deref()
            .map(|raw| parse_stored(raw, "related system", HouseSystem::parse))
            .transpose()?,
        notes: row.get(9)?,
        created_by: UserId::new(row.get(10)?),
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
        updated_at: parse_datetime(&updated_at_raw).map_err(to_sql_error)?,
        completed_at: parse_opt_datetime(completed_at_raw).map_err(to_sql_error)?,
    })
}

fn parse_stored<T>(raw: &str, field: &str, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    parse(raw).ok_or_else(|| to_sql_error(anyhow!("unknown stored {field} {raw:?}")))
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; point [storage].db_path at a homekeep database"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; recreate the database or restore a backup",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    for index in REQUIRED_INDEXES {
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("ensure required index `{}`", index.name))?;
    }

    let existing_indexes = index_names(conn)?;
    let missing = REQUIRED_INDEXES
        .iter()
        .filter(|index| !existing_indexes.contains(index.name))
        .map(|index| index.name)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!("database is missing required indexes: {}", missing.join(", "));
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))
}

fn index_names(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(
            "
            SELECT name
            FROM sqlite_master
            WHERE type = 'index'
              AND name NOT LIKE 'sqlite_%'
            ORDER BY name ASC
            ",
        )
        .context("prepare index names query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query index names")?;
    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .context("collect index names")
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn now_rfc3339() -> Result<String> {
    format_datetime(OffsetDateTime::now_utc())
}

fn format_datetime(value: OffsetDateTime) -> Result<String> {
    value.format(&Rfc3339).context("format timestamp")
}

fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(value);
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    bail!("unsupported datetime format {raw:?}")
}

fn parse_date(raw: &str) -> Result<Date> {
    if let Ok(value) = Date::parse(raw, &format_description!("[year]-[month]-[day]")) {
        return Ok(value);
    }

    // Full timestamps in a date column keep only their date.
    let date_time = parse_datetime(raw)?;
    Ok(date_time.date())
}

fn parse_opt_datetime(raw: Option<String>) -> Result<Option<OffsetDateTime>> {
    raw.as_deref().map(parse_datetime).transpose()
}

fn parse_opt_date(raw: Option<String>) -> Result<Option<Date>> {
    raw.as_deref().map(parse_date).transpose()
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            error.to_string(),
        )),
    )
}

fn format_date(value: Date) -> String {
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| "1970-01-01".to_owned())
}
