//! Bundled seed catalog.
//!
//! The four house collections ship inside the binary so the shop is never
//! empty, even before the first product is created or while the store is down.

use savron_core::{Product, SEED_ID_PREFIX};

const SEED_JSON: &str = include_str!("../../data/seed_products.json");

/// Errors loading the bundled seed catalog.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("seed catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("seed product id {0} does not start with {SEED_ID_PREFIX}")]
    BadId(String),
}

/// Parse the bundled seed catalog, in display order.
///
/// # Errors
///
/// Returns [`SeedError`] if the bundled file is malformed.
pub fn seed_products() -> Result<Vec<Product>, SeedError> {
    let products: Vec<Product> = serde_json::from_str(SEED_JSON)?;
    if let Some(bad) = products.iter().find(|p| !p.id.is_seed()) {
        return Err(SeedError::BadId(bad.id.to_string()));
    }
    Ok(products)
}
