//! Product Service - Business logic layer

use std::sync::Arc;
use tracing::instrument;

use crate::error::{ProductError, ProductResult};
use crate::models::{CreateProduct, Product, ProductUpdate, UpdateMode, UpdateProduct};
use crate::repository::ProductRepository;

/// Product service orchestrating repository calls.
///
/// Absent products become [`ProductError::NotFound`]; store failures are
/// passed through untouched and never retried.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
    update_mode: UpdateMode,
}

impl<R: ProductRepository> ProductService<R> {
    /// Create a new ProductService using [`UpdateMode::Merge`]
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
            update_mode: UpdateMode::default(),
        }
    }

    pub fn with_update_mode(mut self, update_mode: UpdateMode) -> Self {
        self.update_mode = update_mode;
        self
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self) -> ProductResult<Vec<Product>> {
        self.repository.find_all().await
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: &str) -> ProductResult<Product> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ProductError::NotFound(id.to_string()))
    }

    #[instrument(skip(self, input), fields(product_name = %input.name))]
    pub async fn create_product(&self, input: CreateProduct) -> ProductResult<Product> {
        self.repository.insert(input).await
    }

    /// Update a product according to the service's [`UpdateMode`]
    #[instrument(skip(self, input), fields(update_mode = %self.update_mode))]
    pub async fn update_product(&self, id: &str, input: UpdateProduct) -> ProductResult<Product> {
        let update = match self.update_mode {
            UpdateMode::Merge => ProductUpdate::Merge(input),
            UpdateMode::Replace => ProductUpdate::Replace(input.into_replacement().ok_or_else(
                || {
                    ProductError::Validation(
                        "Replacing a product requires name, quantity and price".to_string(),
                    )
                },
            )?),
        };

        self.repository
            .update_by_id(id, update)
            .await?
            .ok_or_else(|| ProductError::NotFound(id.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: &str) -> ProductResult<Product> {
        self.repository
            .delete_by_id(id)
            .await?
            .ok_or_else(|| ProductError::NotFound(id.to_string()))
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            update_mode: self.update_mode,
        }
    }
}
