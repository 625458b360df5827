use super::{NewMenuItem, OrderLine, StoredMenuItem};
use crate::{Error, Result};
use chrono::Utc;
use libsql::{Builder, Connection, Database, Value};
use tracing::{debug, info};
use uuid::Uuid;

/// Restaurant menu and the team's pending selections, backed by libSQL.
pub struct MenuStore {
    _db: Database,
    conn: Connection,
}

impl MenuStore {
    pub async fn new(db_path: &str) -> Result<Self> {
        let db = Builder::new_local(db_path).build().await?;
        // A single connection keeps `:memory:` databases alive across calls.
        let conn = db.connect()?;
        // Selections cascade with their menu item.
        conn.execute("PRAGMA foreign_keys = ON", ()).await?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS menu_items (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                price TEXT NOT NULL,
                description TEXT,
                category TEXT,
                created_at DATETIME NOT NULL
            )
            "#,
            (),
        )
        .await?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS selections (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                member TEXT NOT NULL,
                item_id TEXT NOT NULL REFERENCES menu_items (id) ON DELETE CASCADE,
                created_at DATETIME NOT NULL,
                UNIQUE (member, item_id)
            )
            "#,
            (),
        )
        .await?;

        info!("Menu store initialized: {}", db_path);
        Ok(Self { _db: db, conn })
    }

    pub async fn create_item(&self, item: NewMenuItem) -> Result<StoredMenuItem> {
        let name = required("name", &item.name)?;
        let price = required("price", &item.price)?;

        let stored = StoredMenuItem {
            id: Uuid::new_v4().to_string(),
            name,
            price,
            description: optional(item.description),
            category: optional(item.category),
            created_at: Utc::now(),
        };

        self.conn
            .execute(
                "INSERT INTO menu_items (id, name, price, description, category, created_at) VALUES (?, ?, ?, ?, ?, ?)",
                (
                    stored.id.as_str(),
                    stored.name.as_str(),
                    stored.price.as_str(),
                    text_or_null(&stored.description),
                    text_or_null(&stored.category),
                    stored.created_at.to_rfc3339(),
                ),
            )
            .await?;

        debug!("Menu item created: {} ({})", stored.name, stored.id);
        Ok(stored)
    }

    /// Saves a batch of items in the given order. Stops at the first invalid item.
    pub async fn import_items(&self, items: Vec<NewMenuItem>) -> Result<Vec<StoredMenuItem>> {
        let mut stored = Vec::with_capacity(items.len());
        for item in items {
            stored.push(self.create_item(item).await?);
        }
        info!("Imported {} menu items", stored.len());
        Ok(stored)
    }

    pub async fn list_items(&self) -> Result<Vec<StoredMenuItem>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, price, description, category, created_at FROM menu_items ORDER BY rowid ASC",
                (),
            )
            .await?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            let created_at_str: String = row.get(5)?;
            let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
                .map_err(|e| Error::internal(format!("Failed to parse timestamp: {e}")))?
                .with_timezone(&Utc);

            items.push(StoredMenuItem {
                id: row.get(0)?,
                name: row.get(1)?,
                price: row.get(2)?,
                description: row.get(3)?,
                category: row.get(4)?,
                created_at,
            });
        }

        debug!("Retrieved {} menu items", items.len());
        Ok(items)
    }

    pub async fn delete_item(&self, item_id: &str) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM menu_items WHERE id = ?", [item_id])
            .await?;
        if deleted == 0 {
            return Err(Error::item_not_found(item_id));
        }
        debug!("Menu item deleted: {}", item_id);
        Ok(())
    }

    /// Records that `member` wants `item_id`. Selecting twice is a no-op.
    pub async fn select_item(&self, member: &str, item_id: &str) -> Result<()> {
        let member = required("member", member)?;

        // The existence check and the insert are one statement.
        let inserted = self
            .conn
            .execute(
                r#"
                INSERT OR IGNORE INTO selections (member, item_id, created_at)
                SELECT ?, id, ? FROM menu_items WHERE id = ?
                "#,
                (member.as_str(), Utc::now().to_rfc3339(), item_id),
            )
            .await?;
        if inserted == 0 && !self.item_exists(item_id).await? {
            return Err(Error::item_not_found(item_id));
        }
        debug!("{} selected {}", member, item_id);
        Ok(())
    }

    pub async fn deselect_item(&self, member: &str, item_id: &str) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM selections WHERE member = ? AND item_id = ?",
                (member.trim(), item_id),
            )
            .await?;
        Ok(())
    }

    /// Consolidated order, one line per selected item, in menu order.
    pub async fn order_summary(&self) -> Result<Vec<OrderLine>> {
        let mut rows = self
            .conn
            .query(
                r#"
                SELECT m.id, m.name, m.price, s.member
                FROM selections s
                JOIN menu_items m ON m.id = s.item_id
                ORDER BY m.rowid ASC, s.id ASC
                "#,
                (),
            )
            .await?;

        let mut lines: Vec<OrderLine> = Vec::new();
        while let Some(row) = rows.next().await? {
            let item_id: String = row.get(0)?;
            let member: String = row.get(3)?;

            match lines.last_mut() {
                Some(line) if line.item_id == item_id => {
                    line.quantity += 1;
                    line.members.push(member);
                }
                _ => lines.push(OrderLine {
                    item_id,
                    name: row.get(1)?,
                    price: row.get(2)?,
                    quantity: 1,
                    members: vec![member],
                }),
            }
        }

        Ok(lines)
    }

    pub async fn clear_order(&self) -> Result<()> {
        let cleared = self.conn.execute("DELETE FROM selections", ()).await?;
        info!("Cleared {} order selections", cleared);
        Ok(())
    }

    async fn item_exists(&self, item_id: &str) -> Result<bool> {
        let mut rows = self
            .conn
            .query("SELECT 1 FROM menu_items WHERE id = ?", [item_id])
            .await?;
        Ok(rows.next().await?.is_some())
    }
}

fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::validation(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn text_or_null(value: &Option<String>) -> Value {
    match value {
        Some(v) => Value::Text(v.clone()),
        None => Value::Null,
    }
}
