//! Realtime change notification port.
//!
//! Consumers register a callback for a table (optionally narrowed by a column
//! equality) and receive a [`Subscription`] handle. Dropping or cancelling
//! the handle unregisters the callback.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A row change on a backend table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,
    pub kind: ChangeKind,
    pub record_id: String,
    /// Column values of the new row (old row for deletes).
    pub columns: serde_json::Map<String, serde_json::Value>,
}

impl ChangeEvent {
    pub fn new(table: impl Into<String>, kind: ChangeKind, record_id: impl ToString) -> Self {
        Self {
            table: table.into(),
            kind,
            record_id: record_id.to_string(),
            columns: serde_json::Map::new(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>, value: serde_json::Value) -> Self {
        self.columns.insert(column.into(), value);
        self
    }
}

/// `column = value` narrowing of a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFilter {
    pub column: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeTopic {
    pub table: String,
    pub filter: Option<ColumnFilter>,
}

impl ChangeTopic {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filter: None,
        }
    }

    pub fn where_eq(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filter = Some(ColumnFilter {
            column: column.into(),
            value: value.to_string(),
        });
        self
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if self.table != event.table {
            return false;
        }
        let Some(filter) = &self.filter else {
            return true;
        };
        match event.columns.get(&filter.column) {
            Some(serde_json::Value::String(s)) => *s == filter.value,
            Some(serde_json::Value::Null) | None => false,
            Some(other) => other.to_string() == filter.value,
        }
    }
}

pub type ChangeCallback = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Registration handle returned by [`RealtimePort::subscribe`].
pub struct Subscription {
    id: Uuid,
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(id: Uuid, cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            id,
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Unregister now. Equivalent to dropping the handle.
    pub fn cancel(mut self) {
        self.unregister();
    }

    fn unregister(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unregister();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

pub trait RealtimePort: Send + Sync {
    fn subscribe(&self, topic: ChangeTopic, callback: ChangeCallback) -> Subscription;

    /// Deliver `event` to every matching subscription; returns the number of
    /// callbacks invoked.
    fn publish(&self, event: &ChangeEvent) -> usize;
}
