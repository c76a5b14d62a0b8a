use async_trait::async_trait;

use crate::error::ProductResult;
use crate::models::{CreateProduct, Product, ProductUpdate};

/// Repository trait for Product persistence
///
/// Identifiers are opaque: an id the backend cannot resolve (for MongoDB, one
/// that is not a valid ObjectId) behaves like an id with no stored product.
/// Every method is a single round-trip to the store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All stored products, in store order
    async fn find_all(&self) -> ProductResult<Vec<Product>>;

    async fn find_by_id(&self, id: &str) -> ProductResult<Option<Product>>;

    /// Persist a new product; the store assigns its id
    async fn insert(&self, input: CreateProduct) -> ProductResult<Product>;

    /// Apply `update` and return the product as it is after the change
    async fn update_by_id(
        &self,
        id: &str,
        update: ProductUpdate,
    ) -> ProductResult<Option<Product>>;

    /// Remove a product and return what was removed
    async fn delete_by_id(&self, id: &str) -> ProductResult<Option<Product>>;
}
