//! Catalog assembly: merging store products with the seed catalog, and
//! filtering the result for display.

use serde::{Deserialize, Serialize};

use crate::types::{Product, ProductId};

/// Merge store-backed products with the bundled seed catalog.
///
/// Store products come first, newest `createdAt` first (products without a
/// timestamp sort after dated ones, in store order). The seed catalog follows
/// in its bundled order. A seed product whose id also appears in the store is
/// skipped; the store copy wins.
///
/// Every catalog view uses this ordering.
#[must_use]
pub fn merge_catalog(mut store: Vec<Product>, seed: &[Product]) -> Vec<Product> {
    // Stable sort keeps store order among equal timestamps.
    store.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let seeds: Vec<Product> = seed
        .iter()
        .filter(|s| !store.iter().any(|p| p.id == s.id))
        .cloned()
        .collect();

    store.extend(seeds);
    store
}

/// Find a product by id in a merged listing.
#[must_use]
pub fn find_product<'a>(products: &'a [Product], id: &ProductId) -> Option<&'a Product> {
    products.iter().find(|p| &p.id == id)
}

/// Filters accepted by the catalog listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    /// Category name, matched case-insensitively. `all` or empty disables it.
    #[serde(default)]
    pub category: Option<String>,
    /// Free-text search over name and description.
    #[serde(default)]
    pub q: Option<String>,
    /// Only premium products when `true`.
    #[serde(default)]
    pub premium: Option<bool>,
}

impl CatalogQuery {
    /// Whether a product passes every active filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let category_ok = match self.category.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(c) if c.eq_ignore_ascii_case("all") => true,
            Some(c) => product.category.trim().to_lowercase() == c.to_lowercase(),
        };

        let search_ok = match self.q.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(q) => {
                let needle = q.to_lowercase();
                product.name.to_lowercase().contains(&needle)
                    || product.description.to_lowercase().contains(&needle)
            }
        };

        let premium_ok = !self.premium.unwrap_or(false) || product.premium;

        category_ok && search_ok && premium_ok
    }

    /// Keep the products that match, preserving order.
    #[must_use]
    pub fn filter(&self, products: &[Product]) -> Vec<Product> {
        products.iter().filter(|p| self.matches(p)).cloned().collect()
    }
}

/// Number of products in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

/// Count products per category, in order of first appearance.
#[must_use]
pub fn category_counts(products: &[Product]) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Vec::new();
    for product in products {
        match counts.iter_mut().find(|c| c.name == product.category) {
            Some(entry) => entry.count += 1,
            None => counts.push(CategoryCount {
                name: product.category.clone(),
                count: 1,
            }),
        }
    }
    counts
}

/// A catalog listing as served to the shop and collections pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogView {
    pub products: Vec<Product>,
    pub categories: Vec<CategoryCount>,
    /// Set when the listing was built without a live store response.
    pub degraded: bool,
}

impl CatalogView {
    /// Filter a merged listing; facet counts cover the unfiltered list.
    #[must_use]
    pub fn build(merged: &[Product], query: &CatalogQuery, degraded: bool) -> Self {
        Self {
            products: query.filter(merged),
            categories: category_counts(merged),
            degraded,
        }
    }
}
