use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::format::format_day_month_year;

/// A pantry entry as returned by the inventory endpoint.
///
/// The server computes the expiry flags and display dates; the client only
/// renders them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    pub name: String,
    #[serde(default = "default_quantity", deserialize_with = "deserialize_quantity")]
    pub quantity: String,
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    pub barcode: Option<String>,
    #[serde(default)]
    pub formatted_expiry_date: Option<String>,
    #[serde(default)]
    pub formatted_date_added: Option<String>,
    #[serde(default)]
    pub days_in_inventory: Option<f64>,
    #[serde(default)]
    pub is_expired: bool,
    #[serde(default)]
    pub expires_soon: bool,
}

/// Coarse expiry state used to pick a highlight colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
    Expired,
    ExpiresSoon,
    Fresh,
}

impl InventoryItem {
    pub fn expiry_status(&self) -> ExpiryStatus {
        if self.is_expired {
            ExpiryStatus::Expired
        } else if self.expires_soon {
            ExpiryStatus::ExpiresSoon
        } else {
            ExpiryStatus::Fresh
        }
    }

    /// Name with the first letter capitalised, as shown on item cards.
    pub fn display_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Whole days the item has been stored, if the server reported it.
    pub fn days_stored(&self) -> Option<i64> {
        self.days_in_inventory.map(|d| d.floor() as i64)
    }

    /// Form contents pre-filled from this item, for editing.
    pub fn to_new_item(&self) -> NewItem {
        NewItem {
            name: self.name.clone(),
            quantity: self.quantity.clone(),
            barcode: self.barcode.clone(),
            expiry_date: self
                .formatted_expiry_date
                .as_deref()
                .and_then(crate::utils::format::parse_day_month_year),
        }
    }
}

/// Add/edit form for an inventory entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewItem {
    pub name: String,
    pub quantity: String,
    pub barcode: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

impl NewItem {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_quantity(mut self, quantity: impl Into<String>) -> Self {
        self.quantity = quantity.into();
        self
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    pub fn with_expiry(mut self, date: NaiveDate) -> Self {
        self.expiry_date = Some(date);
        self
    }

    /// Trimmed name, or `None` when the form has no usable name.
    pub fn trimmed_name(&self) -> Option<&str> {
        let name = self.name.trim();
        (!name.is_empty()).then_some(name)
    }

    /// Request body for the add/edit endpoints.
    ///
    /// Blank quantities are sent as "1" and blank barcodes as null; the
    /// expiry date goes over the wire as dd/mm/yyyy.
    pub fn to_payload(&self) -> ItemPayload {
        let quantity = self.quantity.trim();
        ItemPayload {
            name: self.name.trim().to_string(),
            quantity: if quantity.is_empty() { "1".to_string() } else { quantity.to_string() },
            barcode: self
                .barcode
                .as_deref()
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(str::to_string),
            expiry_date: self.expiry_date.map(format_day_month_year),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemPayload {
    pub name: String,
    pub quantity: String,
    pub barcode: Option<String>,
    pub expiry_date: Option<String>,
}

fn default_quantity() -> String {
    "1".to_string()
}

fn deserialize_quantity<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(deserialize_string_or_number(deserializer)?.unwrap_or_else(default_quantity))
}

// Helper to deserialize string or number as Option<String>
fn deserialize_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct StringOrNumberVisitor;

    impl<'de> de::Visitor<'de> for StringOrNumberVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or number")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
            if v.is_empty() {
                Ok(None)
            } else {
                Ok(Some(v.to_string()))
            }
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(StringOrNumberVisitor)
}
