//! Issuing company profile printed on every document.

use crate::error::CoreResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Storage key of the seller profile.
pub const SELLER_FILE: &str = "seller.json";

/// The issuing company's identity.
///
/// This is a plain value. Updates produce a new profile; nothing holds a
/// shared mutable copy. Fields unknown to this version are kept in
/// `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerProfile {
    /// Legal name.
    pub name: String,
    /// Tax identification number.
    pub nif: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// Postal code.
    pub postal_code: String,
    /// Country.
    pub country: String,
    /// Contact email.
    pub email: String,
    /// Contact phone.
    pub phone: String,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for SellerProfile {
    fn default() -> Self {
        Self {
            name: "Tu Empresa S.L.".into(),
            nif: "B00000000".into(),
            address: "C/ Ejemplo 123".into(),
            city: "Madrid".into(),
            postal_code: "28000".into(),
            country: "España".into(),
            email: "info@tuempresa.com".into(),
            phone: "+34 600 000 000".into(),
            extra: Map::new(),
        }
    }
}

impl SellerProfile {
    /// Returns a new profile with the fields of `patch` applied.
    ///
    /// Keys in `patch` replace the matching fields; everything else is
    /// taken from `self`.
    ///
    /// # Errors
    ///
    /// Returns an error if a patched field has the wrong JSON type.
    pub fn patched(&self, patch: &Map<String, Value>) -> CoreResult<Self> {
        let mut base = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in patch {
            base.insert(key.clone(), value.clone());
        }
        Ok(serde_json::from_value(Value::Object(base))?)
    }

    /// Parses a stored profile, filling missing fields from the default.
    ///
    /// Returns `None` if the value is not an object or has mistyped fields.
    pub fn from_value(value: &Value) -> Option<Self> {
        let patch = value.as_object()?;
        Self::default().patched(patch).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_camel_case_keys() {
        let value = serde_json::to_value(SellerProfile::default()).unwrap();
        assert_eq!(value["postalCode"], json!("28000"));
        assert!(value.get("postal_code").is_none());
    }

    #[test]
    fn patched_returns_new_value() {
        let original = SellerProfile::default();
        let patch = json!({"name": "Transportes Norte S.L.", "city": "Bilbao"});
        let updated = original.patched(patch.as_object().unwrap()).unwrap();

        assert_eq!(updated.name, "Transportes Norte S.L.");
        assert_eq!(updated.city, "Bilbao");
        assert_eq!(updated.nif, original.nif);
        assert_eq!(original.name, "Tu Empresa S.L.");
    }

    #[test]
    fn unknown_fields_survive() {
        let stored = json!({"name": "Acme", "iban": "ES00 0000"});
        let profile = SellerProfile::from_value(&stored).unwrap();
        assert_eq!(profile.name, "Acme");
        assert_eq!(profile.extra.get("iban"), Some(&json!("ES00 0000")));

        let back = serde_json::to_value(&profile).unwrap();
        assert_eq!(back["iban"], json!("ES00 0000"));
    }

    #[test]
    fn mistyped_profile_rejected() {
        assert!(SellerProfile::from_value(&json!({"name": 5})).is_none());
        assert!(SellerProfile::from_value(&json!("Acme")).is_none());
    }
}
