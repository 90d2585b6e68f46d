use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::{Connection, params, params_from_iter};

use crate::models::{CategoryFilter, DuplicateName, MenuEntry, NewMenuEntry};

const MENU_TABLE: &str = "CREATE TABLE IF NOT EXISTS menu (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT,
        price REAL,
        description TEXT,
        image TEXT,
        category TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_menu_category ON menu(category);";

const MENU_COLUMNS: &str = "id, name, price, description, image, category";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(&format!(
                "{MENU_TABLE}

                CREATE TABLE IF NOT EXISTS user_settings (
                    key TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                PRAGMA user_version = 1;"
            ))?;
        }

        Ok(())
    }

    fn menu_entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<MenuEntry> {
        Ok(MenuEntry {
            id: row.get(0)?,
            name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            price: row.get::<_, Option<f64>>(2)?.unwrap_or_default(),
            description: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            image: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            category: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        })
    }

    // --- Menu ---

    pub fn ensure_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(MENU_TABLE)
            .context("Failed to create menu table")
    }

    /// Delete every cached menu row, returning how many were removed.
    pub fn clear_menu(&self) -> Result<usize> {
        self.conn
            .execute("DELETE FROM menu", [])
            .context("Failed to clear menu table")
    }

    /// Insert the whole batch in one transaction. Values are bound, never spliced
    /// into the statement, so quotes in text fields are stored verbatim.
    pub fn insert_menu_entries(&self, entries: &[NewMenuEntry]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO menu (name, price, description, image, category)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for entry in entries {
                stmt.execute(params![
                    entry.name,
                    entry.price,
                    entry.description,
                    entry.image,
                    entry.category,
                ])
                .with_context(|| format!("Failed to insert menu entry '{}'", entry.name))?;
            }
        }
        tx.commit().context("Failed to commit menu batch")?;
        Ok(entries.len())
    }

    /// Rows matching the filter, cheapest first. Equal prices fall back to
    /// insertion order so repeated calls return the same sequence.
    pub fn menu_by_category(&self, filter: &CategoryFilter) -> Result<Vec<MenuEntry>> {
        let (where_clause, tags) = category_clause(filter);
        let sql =
            format!("SELECT {MENU_COLUMNS} FROM menu{where_clause} ORDER BY price ASC, id ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params_from_iter(tags), Self::menu_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn search_menu(&self, query: &str, filter: &CategoryFilter) -> Result<Vec<MenuEntry>> {
        let escaped = query
            .trim()
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("%{escaped}%");

        let (where_clause, tags) = category_clause(filter);
        let name_clause = if where_clause.is_empty() {
            " WHERE name LIKE ? ESCAPE '\\'"
        } else {
            " AND name LIKE ? ESCAPE '\\'"
        };
        let sql = format!(
            "SELECT {MENU_COLUMNS} FROM menu{where_clause}{name_clause} ORDER BY price ASC, id ASC"
        );

        let mut bound = tags;
        bound.push(pattern);
        let mut stmt = self.conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params_from_iter(bound), Self::menu_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn count_menu(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM menu", [], |row| row.get(0))
            .context("Failed to count menu rows")
    }

    pub fn duplicate_names(&self) -> Result<Vec<DuplicateName>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, COUNT(*) AS count FROM menu
             GROUP BY name HAVING count > 1
             ORDER BY name",
        )?;
        let dups = stmt
            .query_map([], |row| {
                Ok(DuplicateName {
                    name: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(dups)
    }

    #[cfg(test)]
    pub(crate) fn drop_menu_table_for_test(&self) {
        self.conn.execute_batch("DROP TABLE menu").unwrap();
    }

    // --- User Settings ---

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO user_settings (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM user_settings WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    pub fn delete_setting(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM user_settings WHERE key = ?1", params![key])?;
        Ok(rows > 0)
    }
}

/// Build the `WHERE category IN (...)` clause with one placeholder per tag.
fn category_clause(filter: &CategoryFilter) -> (String, Vec<String>) {
    if filter.is_unfiltered() {
        return (String::new(), Vec::new());
    }
    let tags: Vec<String> = filter.tags().map(str::to_string).collect();
    let placeholders = vec!["?"; tags.len()].join(", ");
    (format!(" WHERE category IN ({placeholders})"), tags)
}
