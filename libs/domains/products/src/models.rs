use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// How an update request body is applied to a stored product
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum UpdateMode {
    /// Only the supplied fields change; the rest keep their stored values
    #[default]
    Merge,
    /// The body must carry every field and replaces the stored product
    Replace,
}

/// Product as exposed over HTTP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    /// Store-assigned identifier
    #[schema(example = "65f1c0a2e4b0a1b2c3d4e5f6")]
    pub id: String,
    #[schema(example = "Pen")]
    pub name: String,
    #[schema(example = 10)]
    pub quantity: i64,
    #[schema(example = 1.5)]
    pub price: f64,
}

/// DTO for creating a product; every field is required
///
/// Field values are cast the way the store casts them: numeric strings are
/// accepted for `quantity` and `price`, numbers for `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreateProduct {
    #[serde(deserialize_with = "cast::text")]
    pub name: String,
    #[serde(deserialize_with = "cast::integer")]
    pub quantity: i64,
    #[serde(deserialize_with = "cast::number")]
    pub price: f64,
}

/// DTO for updating a product; absent (or null) fields are left alone in merge mode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UpdateProduct {
    #[serde(
        default,
        deserialize_with = "cast::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "cast::optional_integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub quantity: Option<i64>,
    #[serde(
        default,
        deserialize_with = "cast::optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<f64>,
}

/// Loose casts applied to incoming field values.
mod cast {
    use serde::{Deserialize, Deserializer, de::Error};
    use serde_json::Value;

    fn to_text(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn to_number(value: &Value) -> Option<f64> {
        let n = match value {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        n.is_finite().then_some(n)
    }

    fn to_integer(value: &Value) -> Option<i64> {
        if let Some(i) = value.as_i64() {
            return Some(i);
        }
        if let Some(i) = value.as_str().and_then(|s| s.trim().parse().ok()) {
            return Some(i);
        }
        let n = to_number(value)?;
        (n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64).then_some(n as i64)
    }

    fn cast<'de, D, T>(
        deserializer: D,
        kind: &str,
        f: fn(&Value) -> Option<T>,
    ) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            value => f(&value)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("Cast to {kind} failed for value {value}"))),
        }
    }

    fn required<E: Error>(kind: &str) -> E {
        E::custom(format!("{kind} value is required"))
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        cast(d, "string", to_text)?.ok_or_else(|| required("string"))
    }

    pub fn integer<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        cast(d, "integer", to_integer)?.ok_or_else(|| required("integer"))
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        cast(d, "number", to_number)?.ok_or_else(|| required("number"))
    }

    pub fn optional_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        cast(d, "string", to_text)
    }

    pub fn optional_integer<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        cast(d, "integer", to_integer)
    }

    pub fn optional_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        cast(d, "number", to_number)
    }
}

impl UpdateProduct {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.quantity.is_none() && self.price.is_none()
    }

    /// The full replacement this body describes, if it names every field.
    pub fn into_replacement(self) -> Option<CreateProduct> {
        Some(CreateProduct {
            name: self.name?,
            quantity: self.quantity?,
            price: self.price?,
        })
    }
}

/// A resolved change handed to the store
#[derive(Debug, Clone, PartialEq)]
pub enum ProductUpdate {
    Merge(UpdateProduct),
    Replace(CreateProduct),
}

impl Product {
    /// Build a product from a creation DTO and an id assigned by the store
    pub fn new(id: impl Into<String>, input: CreateProduct) -> Self {
        Self {
            id: id.into(),
            name: input.name,
            quantity: input.quantity,
            price: input.price,
        }
    }

    /// Apply a resolved change in place, keeping the id
    pub fn apply_update(&mut self, update: ProductUpdate) {
        match update {
            ProductUpdate::Merge(patch) => {
                if let Some(name) = patch.name {
                    self.name = name;
                }
                if let Some(quantity) = patch.quantity {
                    self.quantity = quantity;
                }
                if let Some(price) = patch.price {
                    self.price = price;
                }
            }
            ProductUpdate::Replace(input) => {
                self.name = input.name;
                self.quantity = input.quantity;
                self.price = input.price;
            }
        }
    }
}

/// Body of a successful delete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Product deleted successfully")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn pen() -> Product {
        Product {
            id: "p1".to_string(),
            name: "Pen".to_string(),
            quantity: 10,
            price: 1.5,
        }
    }

    #[test]
    fn test_merge_keeps_unspecified_fields() {
        let mut product = pen();
        product.apply_update(ProductUpdate::Merge(UpdateProduct {
            quantity: Some(5),
            ..Default::default()
        }));

        assert_eq!(product.name, "Pen");
        assert_eq!(product.quantity, 5);
        assert_eq!(product.price, 1.5);
        assert_eq!(product.id, "p1");
    }

    #[test]
    fn test_replace_overwrites_everything_but_id() {
        let mut product = pen();
        product.apply_update(ProductUpdate::Replace(CreateProduct {
            name: "Pencil".to_string(),
            quantity: 1,
            price: 0.25,
        }));

        assert_eq!(product.id, "p1");
        assert_eq!(product.name, "Pencil");
        assert_eq!(product.price, 0.25);
    }

    #[test]
    fn test_into_replacement_requires_all_fields() {
        let partial = UpdateProduct {
            name: Some("Pen".to_string()),
            quantity: Some(1),
            price: None,
        };
        assert!(partial.into_replacement().is_none());

        let full = UpdateProduct {
            name: Some("Pen".to_string()),
            quantity: Some(1),
            price: Some(2.0),
        };
        assert_eq!(full.into_replacement().unwrap().price, 2.0);
    }

    #[test]
    fn test_update_product_deserializes_partial_body() {
        let patch: UpdateProduct = serde_json::from_str(r#"{"quantity":5}"#).unwrap();
        assert_eq!(patch.quantity, Some(5));
        assert!(patch.name.is_none());
        assert!(!patch.is_empty());
        assert!(UpdateProduct::default().is_empty());
    }

    #[test]
    fn test_create_product_requires_every_field() {
        let err = serde_json::from_str::<CreateProduct>(r#"{"name":"Pen","quantity":1}"#)
            .unwrap_err();
        assert!(err.to_string().contains("price"));
        assert!(
            serde_json::from_str::<CreateProduct>(r#"{"name":"Pen","quantity":1,"price":null}"#)
                .is_err()
        );
    }

    #[test]
    fn test_numeric_strings_are_cast() {
        let input: CreateProduct =
            serde_json::from_str(r#"{"name":"Pen","quantity":"20","price":" 1.25 "}"#).unwrap();
        assert_eq!(input.quantity, 20);
        assert_eq!(input.price, 1.25);

        let patch: UpdateProduct =
            serde_json::from_str(r#"{"quantity":"7","price":3,"name":42}"#).unwrap();
        assert_eq!(patch.quantity, Some(7));
        assert_eq!(patch.price, Some(3.0));
        assert_eq!(patch.name.as_deref(), Some("42"));
    }

    #[test]
    fn test_integral_float_quantity_is_cast() {
        let patch: UpdateProduct = serde_json::from_str(r#"{"quantity":4.0}"#).unwrap();
        assert_eq!(patch.quantity, Some(4));
    }

    #[test]
    fn test_uncastable_values_fail() {
        for body in [
            r#"{"quantity":"twenty"}"#,
            r#"{"quantity":1.5}"#,
            r#"{"price":"abc"}"#,
            r#"{"name":{"first":"Pen"}}"#,
        ] {
            let err = serde_json::from_str::<UpdateProduct>(body).unwrap_err();
            assert!(err.to_string().starts_with("Cast to"), "{body}: {err}");
        }
    }

    #[test]
    fn test_null_in_patch_means_unchanged() {
        let patch: UpdateProduct = serde_json::from_str(r#"{"price":null}"#).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_update_mode_parsing() {
        assert_eq!(UpdateMode::from_str("merge").unwrap(), UpdateMode::Merge);
        assert_eq!(UpdateMode::from_str("REPLACE").unwrap(), UpdateMode::Replace);
        assert!(UpdateMode::from_str("upsert").is_err());
        assert_eq!(UpdateMode::default(), UpdateMode::Merge);
        assert_eq!(UpdateMode::Replace.to_string(), "replace");
    }

    #[test]
    fn test_product_json_uses_id_key() {
        let json = serde_json::to_value(pen()).unwrap();
        assert_eq!(json["id"], "p1");
        assert!(json.get("_id").is_none());
    }
}
