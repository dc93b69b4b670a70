//! Product documents and the field validation applied before they are written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::money::Money;

/// Errors raised when product fields fail validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductValidationError {
    /// One or more of name, description, price, category are absent or blank.
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    /// Price is zero or negative.
    #[error("price must be greater than zero")]
    InvalidPrice,
    /// Price does not fit the stored `NUMERIC(12, 2)` column.
    #[error("price must be below 10000000000")]
    PriceTooLarge,
    /// Price has fractions of a cent.
    #[error("price can have at most two decimal places")]
    PricePrecision,
}

/// Exclusive upper bound on a product price.
const PRICE_CEILING: i64 = 10_000_000_000;

fn check_price(price: Money) -> Result<(), ProductValidationError> {
    if price <= Money::ZERO {
        return Err(ProductValidationError::InvalidPrice);
    }
    if price >= Money::from(PRICE_CEILING) {
        return Err(ProductValidationError::PriceTooLarge);
    }
    if price.amount().normalize().scale() > 2 {
        return Err(ProductValidationError::PricePrecision);
    }
    Ok(())
}

/// A product record as stored and served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category: String,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub weight: String,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub premium: bool,
    /// Set by the store on insert; absent for seed products.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Set by the store on every write; absent for seed products.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

const fn default_in_stock() -> bool {
    true
}

impl Product {
    /// First image, used as the cart thumbnail.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Apply a validated patch, refreshing `updated_at`.
    ///
    /// Call [`ProductFields::validate_patch`] first; blank required fields in
    /// an unvalidated patch would be written as-is.
    pub fn apply_patch(&mut self, patch: ProductFields, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_owned();
        }
        if let Some(description) = patch.description {
            self.description = description.trim().to_owned();
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(category) = patch.category {
            self.category = category.trim().to_owned();
        }
        if let Some(in_stock) = patch.in_stock {
            self.in_stock = in_stock;
        }
        if let Some(images) = patch.images {
            self.images = non_blank(images);
        }
        if let Some(ingredients) = patch.ingredients {
            self.ingredients = non_blank(ingredients);
        }
        if let Some(allergens) = patch.allergens {
            self.allergens = non_blank(allergens);
        }
        if let Some(features) = patch.features {
            self.features = Some(non_blank(features));
        }
        if let Some(weight) = patch.weight {
            self.weight = weight.trim().to_owned();
        }
        if let Some(origin) = patch.origin {
            self.origin = origin.trim().to_owned();
        }
        if let Some(premium) = patch.premium {
            self.premium = premium;
        }
        self.updated_at = Some(now);
    }
}

/// Product fields as submitted by the admin panel.
///
/// Every field is optional on the wire: creation requires name, description,
/// price and category; updates treat absent fields as "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub category: Option<String>,
    pub in_stock: Option<bool>,
    pub images: Option<Vec<String>>,
    pub ingredients: Option<Vec<String>>,
    pub allergens: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
    pub weight: Option<String>,
    pub origin: Option<String>,
    pub premium: Option<bool>,
}

/// Validated fields for a product that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category: String,
    pub in_stock: bool,
    pub images: Vec<String>,
    pub ingredients: Vec<String>,
    pub allergens: Vec<String>,
    pub features: Option<Vec<String>>,
    pub weight: String,
    pub origin: String,
    pub premium: bool,
}

impl NewProduct {
    /// Stamp an identifier and creation time onto the fields.
    #[must_use]
    pub fn into_product(self, id: ProductId, now: DateTime<Utc>) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            category: self.category,
            in_stock: self.in_stock,
            images: self.images,
            ingredients: self.ingredients,
            allergens: self.allergens,
            features: self.features,
            weight: self.weight,
            origin: self.origin,
            premium: self.premium,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

impl ProductFields {
    /// Validate the fields for creating a product.
    ///
    /// # Errors
    ///
    /// Returns [`ProductValidationError::MissingFields`] naming every blank or
    /// absent required field, or a price error when the price is not positive,
    /// too large for storage or finer than a cent.
    pub fn into_new(self) -> Result<NewProduct, ProductValidationError> {
        let name = present(self.name.as_deref());
        let description = present(self.description.as_deref());
        let category = present(self.category.as_deref());

        let mut missing = Vec::new();
        if name.is_none() {
            missing.push("name");
        }
        if description.is_none() {
            missing.push("description");
        }
        if self.price.is_none() {
            missing.push("price");
        }
        if category.is_none() {
            missing.push("category");
        }

        let (Some(name), Some(description), Some(price), Some(category)) =
            (name, description, self.price, category)
        else {
            return Err(ProductValidationError::MissingFields(missing));
        };

        check_price(price)?;

        Ok(NewProduct {
            name,
            description,
            price,
            category,
            in_stock: self.in_stock.unwrap_or(true),
            images: non_blank(self.images.unwrap_or_default()),
            ingredients: non_blank(self.ingredients.unwrap_or_default()),
            allergens: non_blank(self.allergens.unwrap_or_default()),
            features: self.features.map(non_blank),
            weight: self.weight.map(|w| w.trim().to_owned()).unwrap_or_default(),
            origin: self.origin.map(|o| o.trim().to_owned()).unwrap_or_default(),
            premium: self.premium.unwrap_or(false),
        })
    }

    /// Validate the fields as a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`ProductValidationError::MissingFields`] for required fields
    /// that are present but blank, or a price error as for [`Self::into_new`].
    pub fn validate_patch(&self) -> Result<(), ProductValidationError> {
        let blank = |field: &Option<String>| field.as_deref().is_some_and(|v| v.trim().is_empty());

        let mut missing = Vec::new();
        if blank(&self.name) {
            missing.push("name");
        }
        if blank(&self.description) {
            missing.push("description");
        }
        if blank(&self.category) {
            missing.push("category");
        }
        if !missing.is_empty() {
            return Err(ProductValidationError::MissingFields(missing));
        }

        self.price.map_or(Ok(()), check_price)
    }
}

fn present(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn non_blank(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .collect()
}
