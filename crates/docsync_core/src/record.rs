//! Business records and the fixed collection names.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// A business record: an opaque JSON object with a unique string `id`.
///
/// The store never interprets fields other than `id`. Records are
/// serialized as the underlying JSON object.
///
/// # Invariants
///
/// - `id` is present, is a string, and is not empty
///
/// # Example
///
/// ```rust
/// use docsync_core::Record;
/// use serde_json::json;
///
/// let record = Record::from_value(json!({"id": "c1", "name": "Acme"})).unwrap();
/// assert_eq!(record.id(), "c1");
/// assert!(Record::from_value(json!({"name": "no id"})).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Creates a record holding only `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRecord`] if `id` is empty.
    pub fn new(id: impl Into<String>) -> CoreResult<Self> {
        let mut fields = Map::new();
        fields.insert("id".into(), Value::String(id.into()));
        Self::try_from(fields)
    }

    /// Converts a JSON value into a record.
    ///
    /// Returns `None` if the value is not an object or has no valid `id`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Self::try_from(fields).ok(),
            _ => None,
        }
    }

    /// Returns the record id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.fields
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Returns a field by name.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Sets a field, returning the updated record.
    ///
    /// Setting `id` is ignored so the invariant cannot be broken.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        if field != "id" {
            self.fields.insert(field, value.into());
        }
        self
    }

    /// Returns all fields, including `id`.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Converts the record back into a JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl TryFrom<Map<String, Value>> for Record {
    type Error = CoreError;

    fn try_from(fields: Map<String, Value>) -> CoreResult<Self> {
        match fields.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => Ok(Self { fields }),
            _ => Err(CoreError::InvalidRecord),
        }
    }
}

impl From<Record> for Map<String, Value> {
    fn from(record: Record) -> Self {
        record.fields
    }
}

/// The fixed logical collections kept by the store.
///
/// Each collection is persisted under the file name the existing
/// deployment uses, so remote folders written by earlier clients are
/// picked up unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectionName {
    /// Customers.
    Customers,
    /// Delivery notes.
    DeliveryNotes,
    /// Invoices.
    Invoices,
    /// Waybills.
    Waybills,
    /// Product catalogue.
    Products,
}

impl CollectionName {
    /// All collections in hydration order.
    pub const ALL: [CollectionName; 5] = [
        CollectionName::Customers,
        CollectionName::DeliveryNotes,
        CollectionName::Invoices,
        CollectionName::Waybills,
        CollectionName::Products,
    ];

    /// Returns the logical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CollectionName::Customers => "customers",
            CollectionName::DeliveryNotes => "delivery-notes",
            CollectionName::Invoices => "invoices",
            CollectionName::Waybills => "waybills",
            CollectionName::Products => "products",
        }
    }

    /// Returns the storage key (remote file name and local namespace key).
    #[must_use]
    pub const fn file_name(&self) -> &'static str {
        match self {
            CollectionName::Customers => "customers.json",
            CollectionName::DeliveryNotes => "albaranes.json",
            CollectionName::Invoices => "facturas.json",
            CollectionName::Waybills => "cartaportes.json",
            CollectionName::Products => "products.json",
        }
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionName {
    type Err = CoreError;

    /// Accepts either the logical name or the file name.
    fn from_str(s: &str) -> CoreResult<Self> {
        CollectionName::ALL
            .into_iter()
            .find(|name| name.as_str() == s || name.file_name() == s)
            .ok_or_else(|| CoreError::UnknownCollection { name: s.into() })
    }
}
