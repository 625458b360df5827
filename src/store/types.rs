use crate::inference::MenuItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct NewMenuItem {
    pub name: String,
    pub price: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMenuItem {
    pub id: String,
    pub name: String,
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Selection {
    pub member: String,
    pub item_id: String,
}

/// One line of the consolidated team order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: String,
    pub name: String,
    pub price: String,
    pub quantity: usize,
    pub members: Vec<String>,
}

impl From<MenuItem> for NewMenuItem {
    fn from(item: MenuItem) -> Self {
        Self {
            name: item.name,
            price: item.price,
            description: item.description,
            category: item.category,
        }
    }
}
