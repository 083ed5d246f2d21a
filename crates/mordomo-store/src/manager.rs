use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::db::init_db;
use crate::error::{Result, StoreError};
use crate::types::{
    display_phone, hash_phone, AuditEntry, Event, List, ListItem, User, MAX_EVENT_NAME_LEN,
    MAX_ITEM_TEXT_LEN, MAX_LIST_NAME_LEN,
};

/// Thread-safe handle over the single SQLite connection.
pub struct Store {
    db: Mutex<Connection>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        init_db(&conn)?;
        Ok(Self { db: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_db(&conn)?;
        Ok(Self { db: Mutex::new(conn) })
    }

    // --- users -------------------------------------------------------------

    /// Return the user for this chat id, creating it lazily on first contact.
    pub fn get_or_create_user(&self, chat_id: &str, default_lang: &str) -> Result<User> {
        if let Some(user) = self.get_user(chat_id)? {
            return Ok(user);
        }
        let hash = hash_phone(chat_id);
        let display = display_phone(chat_id);
        let now = Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT OR IGNORE INTO users (phone_hash, phone_display, lang, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![hash, display, default_lang, now],
        )?;
        drop(db);
        self.get_user(chat_id)?
            .ok_or_else(|| StoreError::NotFound(format!("user {display}")))
    }

    pub fn get_user(&self, chat_id: &str) -> Result<Option<User>> {
        let hash = hash_phone(chat_id);
        let db = self.db.lock().unwrap();
        let user = db
            .query_row(
                "SELECT id, phone_hash, phone_display, preferred_name, lang, tz_iana, city,
                        quiet_start, quiet_end, default_lead_seconds, extra_lead_seconds,
                        created_at, updated_at
                 FROM users WHERE phone_hash = ?1",
                params![hash],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn set_language(&self, user_id: i64, lang: &str) -> Result<()> {
        self.touch_user(user_id, "lang", lang)
    }

    pub fn set_timezone(&self, user_id: i64, tz_iana: &str, city: Option<&str>) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE users SET tz_iana = ?1, city = COALESCE(?2, city), updated_at = ?3 WHERE id = ?4",
            params![tz_iana, city, now, user_id],
        )?;
        Ok(())
    }

    pub fn set_preferred_name(&self, user_id: i64, name: &str) -> Result<()> {
        self.touch_user(user_id, "preferred_name", name)
    }

    pub fn set_quiet_window(&self, user_id: i64, start: &str, end: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE users SET quiet_start = ?1, quiet_end = ?2, updated_at = ?3 WHERE id = ?4",
            params![start, end, now, user_id],
        )?;
        Ok(())
    }

    pub fn set_lead_preferences(
        &self,
        user_id: i64,
        default_secs: Option<i64>,
        extra_secs: &[i64],
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let extra_json = serde_json::to_string(extra_secs)?;
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE users SET default_lead_seconds = ?1, extra_lead_seconds = ?2, updated_at = ?3
             WHERE id = ?4",
            params![default_secs.map(|s| s.to_string()), extra_json, now, user_id],
        )?;
        Ok(())
    }

    /// `reset` clears optional fields only; the record itself is never deleted.
    pub fn reset_profile(&self, user_id: i64) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE users SET preferred_name = NULL, tz_iana = NULL, city = NULL,
                    quiet_start = NULL, quiet_end = NULL,
                    default_lead_seconds = NULL, extra_lead_seconds = NULL,
                    updated_at = ?1
             WHERE id = ?2",
            params![now, user_id],
        )?;
        Ok(())
    }

    pub fn list_users(&self, limit: usize) -> Result<Vec<User>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, phone_hash, phone_display, preferred_name, lang, tz_iana, city,
                    quiet_start, quiet_end, default_lead_seconds, extra_lead_seconds,
                    created_at, updated_at
             FROM users ORDER BY created_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], row_to_user)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn count_users(&self) -> Result<i64> {
        let db = self.db.lock().unwrap();
        Ok(db.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?)
    }

    fn touch_user(&self, user_id: i64, column: &str, value: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let sql = format!("UPDATE users SET {column} = ?1, updated_at = ?2 WHERE id = ?3");
        let db = self.db.lock().unwrap();
        let n = db.execute(&sql, params![value, now, user_id])?;
        if n == 0 {
            return Err(StoreError::NotFound(format!("user #{user_id}")));
        }
        Ok(())
    }

    // --- lists -------------------------------------------------------------

    /// Add an item, creating the list on first use. Item insert and audit row
    /// commit together.
    pub fn add_list_item(&self, user_id: i64, list_name: &str, text: &str) -> Result<(List, ListItem)> {
        let name = normalize_list_name(list_name)?;
        let text = text.trim();
        if text.is_empty() || text.len() > MAX_ITEM_TEXT_LEN {
            return Err(StoreError::InvalidInput("item text empty or too long".into()));
        }
        let now = Utc::now().to_rfc3339();
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;
        tx.execute(
            "INSERT INTO lists (user_id, name, created_at)
             SELECT ?1, ?2, ?3
             WHERE NOT EXISTS (SELECT 1 FROM lists WHERE user_id = ?1 AND name = ?2)",
            params![user_id, name, now],
        )?;
        let list = tx.query_row(
            "SELECT id, user_id, name, project, created_at FROM lists
             WHERE user_id = ?1 AND name = ?2",
            params![user_id, name],
            row_to_list,
        )?;
        let position: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position), 0) + 1 FROM list_items WHERE list_id = ?1",
            params![list.id],
            |r| r.get(0),
        )?;
        tx.execute(
            "INSERT INTO list_items (list_id, text, done, position, created_at)
             VALUES (?1, ?2, 0, ?3, ?4)",
            params![list.id, text, position, now],
        )?;
        let item_id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO audit_log (user_id, action, resource, payload, created_at)
             VALUES (?1, 'list_add', ?2, ?3, ?4)",
            params![
                user_id,
                name,
                serde_json::json!({ "item": text, "item_id": item_id }).to_string(),
                now
            ],
        )?;
        tx.commit()?;
        debug!(user_id, list = %name, "list item added");
        Ok((
            list.clone(),
            ListItem {
                id: item_id,
                list_id: list.id,
                text: text.to_string(),
                done: false,
                position,
                created_at: now,
            },
        ))
    }

    pub fn get_list_items(&self, user_id: i64, list_name: &str) -> Result<Vec<ListItem>> {
        let name = normalize_list_name(list_name)?;
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT i.id, i.list_id, i.text, i.done, i.position, i.created_at
             FROM list_items i JOIN lists l ON l.id = i.list_id
             WHERE l.user_id = ?1 AND l.name = ?2 AND i.done = 0
             ORDER BY i.position",
        )?;
        let rows = stmt.query_map(params![user_id, name], row_to_item)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn list_lists(&self, user_id: i64) -> Result<Vec<(List, i64)>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT l.id, l.user_id, l.name, l.project, l.created_at,
                    (SELECT COUNT(*) FROM list_items i WHERE i.list_id = l.id AND i.done = 0)
             FROM lists l WHERE l.user_id = ?1 ORDER BY l.name",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                List {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    name: row.get(2)?,
                    project: row.get(3)?,
                    created_at: row.get(4)?,
                },
                row.get::<_, i64>(5)?,
            ))
        })?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Completion is `done = 1` plus an audit row; the text is never mutated.
    pub fn mark_item_done(&self, user_id: i64, item_id: i64) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;
        let n = tx.execute(
            "UPDATE list_items SET done = 1
             WHERE id = ?1 AND list_id IN (SELECT id FROM lists WHERE user_id = ?2)",
            params![item_id, user_id],
        )?;
        if n > 0 {
            tx.execute(
                "INSERT INTO audit_log (user_id, action, resource, payload, created_at)
                 VALUES (?1, 'list_feito', ?2, NULL, ?3)",
                params![user_id, item_id.to_string(), now],
            )?;
        }
        tx.commit()?;
        Ok(n > 0)
    }

    pub fn remove_item(&self, user_id: i64, item_id: i64) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;
        let n = tx.execute(
            "DELETE FROM list_items
             WHERE id = ?1 AND list_id IN (SELECT id FROM lists WHERE user_id = ?2)",
            params![item_id, user_id],
        )?;
        if n > 0 {
            tx.execute(
                "INSERT INTO audit_log (user_id, action, resource, payload, created_at)
                 VALUES (?1, 'list_remove', ?2, NULL, ?3)",
                params![user_id, item_id.to_string(), now],
            )?;
        }
        tx.commit()?;
        Ok(n > 0)
    }

    // --- events ------------------------------------------------------------

    /// Add an event. Events of type `evento` must carry an absolute instant.
    pub fn add_event(
        &self,
        user_id: i64,
        tipo: &str,
        payload: serde_json::Value,
        data_at: Option<DateTime<Utc>>,
    ) -> Result<Event> {
        let nome = payload.get("nome").and_then(|v| v.as_str()).unwrap_or("");
        if nome.is_empty() || nome.len() > MAX_EVENT_NAME_LEN {
            return Err(StoreError::InvalidInput("event payload needs a 'nome'".into()));
        }
        if tipo == "evento" && data_at.is_none() {
            return Err(StoreError::InvalidInput(
                "events of type 'evento' require an absolute date".into(),
            ));
        }
        let now = Utc::now().to_rfc3339();
        let data_str = data_at.map(|d| d.to_rfc3339());
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;
        tx.execute(
            "INSERT INTO events (user_id, tipo, payload, data_at, deleted, created_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5)",
            params![user_id, tipo, payload.to_string(), data_str, now],
        )?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO audit_log (user_id, action, resource, payload, created_at)
             VALUES (?1, 'event_add', ?2, ?3, ?4)",
            params![user_id, id.to_string(), payload.to_string(), now],
        )?;
        tx.commit()?;
        info!(user_id, tipo, "event added");
        Ok(Event {
            id,
            user_id,
            tipo: tipo.to_string(),
            payload,
            data_at: data_str,
            deleted: false,
            created_at: now,
        })
    }

    pub fn upcoming_events(&self, user_id: i64, from: DateTime<Utc>, limit: usize) -> Result<Vec<Event>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, user_id, tipo, payload, data_at, deleted, created_at
             FROM events
             WHERE user_id = ?1 AND deleted = 0 AND data_at IS NOT NULL AND data_at >= ?2
             ORDER BY data_at LIMIT ?3",
        )?;
        let rows = stmt.query_map(params![user_id, from.to_rfc3339(), limit as i64], row_to_event)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn events_between(
        &self,
        user_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, user_id, tipo, payload, data_at, deleted, created_at
             FROM events
             WHERE user_id = ?1 AND deleted = 0 AND data_at IS NOT NULL
               AND data_at >= ?2 AND data_at <= ?3
             ORDER BY data_at",
        )?;
        let rows = stmt.query_map(
            params![user_id, start.to_rfc3339(), end.to_rfc3339()],
            row_to_event,
        )?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn events_by_tipo(&self, user_id: i64, tipo: &str, limit: usize) -> Result<Vec<Event>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, user_id, tipo, payload, data_at, deleted, created_at
             FROM events WHERE user_id = ?1 AND deleted = 0 AND tipo = ?2
             ORDER BY created_at DESC LIMIT ?3",
        )?;
        let rows = stmt.query_map(params![user_id, tipo, limit as i64], row_to_event)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn count_events_between(
        &self,
        user_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64> {
        let db = self.db.lock().unwrap();
        Ok(db.query_row(
            "SELECT COUNT(*) FROM events
             WHERE user_id = ?1 AND deleted = 0 AND data_at IS NOT NULL
               AND data_at >= ?2 AND data_at <= ?3",
            params![user_id, start.to_rfc3339(), end.to_rfc3339()],
            |r| r.get(0),
        )?)
    }

    pub fn soft_delete_event(&self, user_id: i64, event_id: i64) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;
        let n = tx.execute(
            "UPDATE events SET deleted = 1 WHERE id = ?1 AND user_id = ?2",
            params![event_id, user_id],
        )?;
        if n > 0 {
            tx.execute(
                "INSERT INTO audit_log (user_id, action, resource, payload, created_at)
                 VALUES (?1, 'event_remove', ?2, NULL, ?3)",
                params![user_id, event_id.to_string(), now],
            )?;
        }
        tx.commit()?;
        Ok(n > 0)
    }

    // --- audit -------------------------------------------------------------

    pub fn audit(
        &self,
        user_id: i64,
        action: &str,
        resource: Option<&str>,
        payload: Option<serde_json::Value>,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO audit_log (user_id, action, resource, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user_id, action, resource, payload.map(|p| p.to_string()), now],
        )?;
        Ok(())
    }

    /// Used for recap idempotence: one row per (action, period id).
    pub fn audit_exists(&self, user_id: i64, action: &str, resource: &str) -> Result<bool> {
        let db = self.db.lock().unwrap();
        let n: i64 = db.query_row(
            "SELECT COUNT(*) FROM audit_log WHERE user_id = ?1 AND action = ?2 AND resource = ?3",
            params![user_id, action, resource],
            |r| r.get(0),
        )?;
        Ok(n > 0)
    }

    pub fn recent_audit(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, user_id, action, resource, payload, created_at
             FROM audit_log ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            let payload_str: Option<String> = row.get(4)?;
            Ok(AuditEntry {
                id: row.get(0)?,
                user_id: row.get(1)?,
                action: row.get(2)?,
                resource: row.get(3)?,
                payload: payload_str.and_then(|p| serde_json::from_str(&p).ok()),
                created_at: row.get(5)?,
            })
        })?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn count_audit_since(&self, user_id: i64, action: &str, since: DateTime<Utc>) -> Result<i64> {
        let db = self.db.lock().unwrap();
        Ok(db.query_row(
            "SELECT COUNT(*) FROM audit_log
             WHERE user_id = ?1 AND action = ?2 AND created_at >= ?3",
            params![user_id, action, since.to_rfc3339()],
            |r| r.get(0),
        )?)
    }

    // --- reminder history ---------------------------------------------------

    pub fn add_reminder_history(
        &self,
        user_id: i64,
        kind: &str,
        message: &str,
        job_id: Option<&str>,
        schedule_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO reminder_history (user_id, kind, message, job_id, schedule_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![user_id, kind, message, job_id, schedule_at.map(|d| d.to_rfc3339()), now],
        )?;
        Ok(())
    }

    pub fn recent_reminder_history(
        &self,
        user_id: i64,
        kind: Option<&str>,
        limit: usize,
    ) -> Result<Vec<(String, String, Option<String>)>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT kind, message, schedule_at FROM reminder_history
             WHERE user_id = ?1 AND (?2 IS NULL OR kind = ?2)
             ORDER BY id DESC LIMIT ?3",
        )?;
        let rows = stmt.query_map(params![user_id, kind, limit as i64], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    // --- bookmarks / notes / organisation ----------------------------------

    pub fn add_bookmark(&self, user_id: i64, title: &str, url: Option<&str>) -> Result<i64> {
        let now = Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO bookmarks (user_id, title, url, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![user_id, title, url, now],
        )?;
        Ok(db.last_insert_rowid())
    }

    pub fn find_bookmarks(&self, user_id: i64, query: &str, limit: usize) -> Result<Vec<(String, Option<String>)>> {
        let like = format!("%{}%", query.trim());
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT title, url FROM bookmarks
             WHERE user_id = ?1 AND title LIKE ?2 ORDER BY id DESC LIMIT ?3",
        )?;
        let rows = stmt.query_map(params![user_id, like, limit as i64], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn list_bookmarks(&self, user_id: i64, limit: usize) -> Result<Vec<(String, Option<String>)>> {
        self.find_bookmarks(user_id, "", limit)
    }

    pub fn add_note(&self, user_id: i64, text: &str) -> Result<i64> {
        let now = Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO notes (user_id, text, created_at) VALUES (?1, ?2, ?3)",
            params![user_id, text, now],
        )?;
        Ok(db.last_insert_rowid())
    }

    pub fn list_notes(&self, user_id: i64, limit: usize) -> Result<Vec<String>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT text FROM notes WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit as i64], |row| row.get(0))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn add_habit(&self, user_id: i64, name: &str) -> Result<i64> {
        let now = Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO habits (user_id, name, created_at) VALUES (?1, ?2, ?3)",
            params![user_id, name, now],
        )?;
        Ok(db.last_insert_rowid())
    }

    pub fn list_habits(&self, user_id: i64) -> Result<Vec<(i64, String, i64)>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT h.id, h.name,
                    (SELECT COUNT(*) FROM habit_checks c WHERE c.habit_id = h.id)
             FROM habits h WHERE h.user_id = ?1 ORDER BY h.name",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn check_habit(&self, user_id: i64, habit_id: i64, day: &str) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        let owned: i64 = db.query_row(
            "SELECT COUNT(*) FROM habits WHERE id = ?1 AND user_id = ?2",
            params![habit_id, user_id],
            |r| r.get(0),
        )?;
        if owned == 0 {
            return Ok(false);
        }
        db.execute(
            "INSERT INTO habit_checks (habit_id, checked_on, created_at) VALUES (?1, ?2, ?3)",
            params![habit_id, day, now],
        )?;
        Ok(true)
    }

    pub fn add_goal(&self, user_id: i64, text: &str) -> Result<i64> {
        let now = Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO goals (user_id, text, created_at) VALUES (?1, ?2, ?3)",
            params![user_id, text, now],
        )?;
        Ok(db.last_insert_rowid())
    }

    pub fn list_goals(&self, user_id: i64) -> Result<Vec<(i64, String, bool)>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, text, done FROM goals WHERE user_id = ?1 ORDER BY done, id",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get::<_, i64>(2)? != 0))
        })?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn add_project(&self, user_id: i64, name: &str) -> Result<i64> {
        let now = Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO projects (user_id, name, created_at) VALUES (?1, ?2, ?3)",
            params![user_id, name, now],
        )?;
        Ok(db.last_insert_rowid())
    }

    pub fn list_projects(&self, user_id: i64) -> Result<Vec<String>> {
        let db = self.db.lock().unwrap();
        let mut stmt =
            db.prepare("SELECT name FROM projects WHERE user_id = ?1 ORDER BY name")?;
        let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn save_template(&self, user_id: i64, name: &str, items: &[String]) -> Result<i64> {
        let now = Utc::now().to_rfc3339();
        let items_json = serde_json::to_string(items)?;
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO list_templates (user_id, name, items, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![user_id, name, items_json, now],
        )?;
        Ok(db.last_insert_rowid())
    }

    pub fn list_templates(&self, user_id: i64) -> Result<Vec<(String, Vec<String>)>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT name, items FROM list_templates WHERE user_id = ?1 ORDER BY name",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            let items_json: String = row.get(1)?;
            Ok((row.get::<_, String>(0)?, items_json))
        })?;
        Ok(rows
            .filter_map(|r| r.ok())
            .map(|(name, json)| (name, serde_json::from_str(&json).unwrap_or_default()))
            .collect())
    }

    // --- export / wipe ------------------------------------------------------

    /// Plain-text export of the user's lists and events, for `/exportar`.
    pub fn export_user_data(&self, user_id: i64) -> Result<String> {
        let mut out = String::new();
        for (list, _count) in self.list_lists(user_id)? {
            out.push_str(&format!("# {}\n", list.name));
            for item in self.list_items_for(list.id)? {
                let mark = if item.done { "x" } else { " " };
                out.push_str(&format!("- [{}] {}\n", mark, item.text));
            }
        }
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT tipo, payload, data_at FROM events
             WHERE user_id = ?1 AND deleted = 0 ORDER BY data_at",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;
        let mut events_section = String::new();
        for r in rows.filter_map(|r| r.ok()) {
            let (tipo, payload, data_at) = r;
            let nome = serde_json::from_str::<serde_json::Value>(&payload)
                .ok()
                .and_then(|v| v.get("nome").and_then(|n| n.as_str()).map(String::from))
                .unwrap_or_default();
            events_section.push_str(&format!(
                "- {} {} {}\n",
                tipo,
                nome,
                data_at.unwrap_or_default()
            ));
        }
        if !events_section.is_empty() {
            out.push_str("# eventos\n");
            out.push_str(&events_section);
        }
        Ok(out)
    }

    fn list_items_for(&self, list_id: i64) -> Result<Vec<ListItem>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, list_id, text, done, position, created_at
             FROM list_items WHERE list_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![list_id], row_to_item)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Remove all of a user's lists, items, and events. The user row and the
    /// audit trail survive.
    pub fn delete_all_user_data(&self, user_id: i64) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;
        tx.execute(
            "DELETE FROM list_items WHERE list_id IN (SELECT id FROM lists WHERE user_id = ?1)",
            params![user_id],
        )?;
        tx.execute("DELETE FROM lists WHERE user_id = ?1", params![user_id])?;
        tx.execute("DELETE FROM events WHERE user_id = ?1", params![user_id])?;
        tx.execute("DELETE FROM bookmarks WHERE user_id = ?1", params![user_id])?;
        tx.execute("DELETE FROM notes WHERE user_id = ?1", params![user_id])?;
        tx.execute(
            "INSERT INTO audit_log (user_id, action, resource, payload, created_at)
             VALUES (?1, 'delete_all', NULL, NULL, ?2)",
            params![user_id, now],
        )?;
        tx.commit()?;
        info!(user_id, "all user data deleted");
        Ok(())
    }
}

fn normalize_list_name(name: &str) -> Result<String> {
    let n = name.trim().to_lowercase();
    if n.is_empty() || n.len() > MAX_LIST_NAME_LEN {
        return Err(StoreError::InvalidInput("list name empty or too long".into()));
    }
    Ok(n)
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let default_lead: Option<String> = row.get(9)?;
    let extra_lead: Option<String> = row.get(10)?;
    Ok(User {
        id: row.get(0)?,
        phone_hash: row.get(1)?,
        phone_display: row.get(2)?,
        preferred_name: row.get(3)?,
        lang: row.get(4)?,
        tz_iana: row.get(5)?,
        city: row.get(6)?,
        quiet_start: row.get(7)?,
        quiet_end: row.get(8)?,
        default_lead_seconds: default_lead.and_then(|s| s.parse().ok()),
        extra_lead_seconds: extra_lead
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default(),
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn row_to_list(row: &rusqlite::Row<'_>) -> rusqlite::Result<List> {
    Ok(List {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        project: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<ListItem> {
    Ok(ListItem {
        id: row.get(0)?,
        list_id: row.get(1)?,
        text: row.get(2)?,
        done: row.get::<_, i64>(3)? != 0,
        position: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<Event> {
    let payload_str: String = row.get(3)?;
    Ok(Event {
        id: row.get(0)?,
        user_id: row.get(1)?,
        tipo: row.get(2)?,
        payload: serde_json::from_str(&payload_str).unwrap_or(serde_json::Value::Null),
        data_at: row.get(4)?,
        deleted: row.get::<_, i64>(5)? != 0,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn store() -> Store {
        Store::open_in_memory().unwrap()
    }

    #[test]
    fn user_is_created_lazily_and_once() {
        let s = store();
        let a = s.get_or_create_user("5511999998888@s.whatsapp.net", "pt-BR").unwrap();
        let b = s.get_or_create_user("5511999998888@s.whatsapp.net", "en").unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(b.lang, "pt-BR"); // second call does not overwrite
        assert_eq!(s.count_users().unwrap(), 1);
    }

    #[test]
    fn reset_clears_optional_fields_only() {
        let s = store();
        let u = s.get_or_create_user("351912345678", "pt-PT").unwrap();
        s.set_timezone(u.id, "Europe/Lisbon", Some("Lisboa")).unwrap();
        s.set_preferred_name(u.id, "Ana").unwrap();
        s.reset_profile(u.id).unwrap();
        let u = s.get_user("351912345678").unwrap().unwrap();
        assert!(u.tz_iana.is_none());
        assert!(u.preferred_name.is_none());
        assert_eq!(u.lang, "pt-PT"); // language survives reset
    }

    #[test]
    fn list_add_creates_list_and_audit_row() {
        let s = store();
        let u = s.get_or_create_user("5511988887777", "pt-BR").unwrap();
        let (list, item) = s.add_list_item(u.id, "Compras", "arroz").unwrap();
        assert_eq!(list.name, "compras"); // lowercased for matching
        assert!(!item.done);
        let audit = s.recent_audit(10).unwrap();
        assert!(audit.iter().any(|a| a.action == "list_add"));
    }

    #[test]
    fn item_completion_is_soft() {
        let s = store();
        let u = s.get_or_create_user("5511988887777", "pt-BR").unwrap();
        let (_, item) = s.add_list_item(u.id, "compras", "arroz").unwrap();
        assert!(s.mark_item_done(u.id, item.id).unwrap());
        // Completed items disappear from the active view
        assert!(s.get_list_items(u.id, "compras").unwrap().is_empty());
        // but the row survives for the audit trail
        let audit = s.recent_audit(10).unwrap();
        assert!(audit.iter().any(|a| a.action == "list_feito"));
    }

    #[test]
    fn evento_requires_absolute_instant() {
        let s = store();
        let u = s.get_or_create_user("5511988887777", "pt-BR").unwrap();
        let err = s.add_event(u.id, "evento", serde_json::json!({"nome": "consulta"}), None);
        assert!(err.is_err());
        let ok = s.add_event(
            u.id,
            "filme",
            serde_json::json!({"nome": "Oppenheimer"}),
            None,
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn event_counting_respects_window() {
        let s = store();
        let u = s.get_or_create_user("5511988887777", "pt-BR").unwrap();
        let now = Utc::now();
        s.add_event(
            u.id,
            "evento",
            serde_json::json!({"nome": "reunião"}),
            Some(now + Duration::hours(2)),
        )
        .unwrap();
        let n = s
            .count_events_between(u.id, now, now + Duration::days(1))
            .unwrap();
        assert_eq!(n, 1);
        let none = s
            .count_events_between(u.id, now + Duration::days(2), now + Duration::days(3))
            .unwrap();
        assert_eq!(none, 0);
    }

    #[test]
    fn delete_all_keeps_user_and_audit() {
        let s = store();
        let u = s.get_or_create_user("5511988887777", "pt-BR").unwrap();
        s.add_list_item(u.id, "compras", "arroz").unwrap();
        s.delete_all_user_data(u.id).unwrap();
        assert!(s.list_lists(u.id).unwrap().is_empty());
        assert!(s.get_user("5511988887777").unwrap().is_some());
        assert!(s.recent_audit(10).unwrap().iter().any(|a| a.action == "delete_all"));
    }

    #[test]
    fn recap_idempotence_marker() {
        let s = store();
        let u = s.get_or_create_user("5511988887777", "pt-BR").unwrap();
        assert!(!s.audit_exists(u.id, "recap_weekly_delivered", "2026-W05").unwrap());
        s.audit(u.id, "recap_weekly_delivered", Some("2026-W05"), None).unwrap();
        assert!(s.audit_exists(u.id, "recap_weekly_delivered", "2026-W05").unwrap());
    }
}
