//! In-memory implementation of ProductRepository

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::error::{ProductError, ProductResult};
use crate::models::{CreateProduct, Product, ProductUpdate};
use crate::repository::ProductRepository;

/// Insertion-ordered product store kept in process memory.
///
/// Ids are ObjectId hex strings so they look like the ones MongoDB hands out.
/// [`set_available`](Self::set_available) simulates an outage: while
/// unavailable every call fails with [`ProductError::Database`] and leaves
/// the stored products untouched.
#[derive(Clone, Default)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<Vec<Product>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.products.read().await.is_empty()
    }

    fn ensure_available(&self) -> ProductResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ProductError::Database(
                "document store unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_all(&self) -> ProductResult<Vec<Product>> {
        self.ensure_available()?;
        Ok(self.products.read().await.clone())
    }

    async fn find_by_id(&self, id: &str) -> ProductResult<Option<Product>> {
        self.ensure_available()?;
        let products = self.products.read().await;
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, input: CreateProduct) -> ProductResult<Product> {
        self.ensure_available()?;
        let product = Product::new(ObjectId::new().to_hex(), input);
        self.products.write().await.push(product.clone());

        tracing::info!(product_id = %product.id, "Created product");
        Ok(product)
    }

    async fn update_by_id(
        &self,
        id: &str,
        update: ProductUpdate,
    ) -> ProductResult<Option<Product>> {
        self.ensure_available()?;
        let mut products = self.products.write().await;

        Ok(products.iter_mut().find(|p| p.id == id).map(|product| {
            product.apply_update(update);
            product.clone()
        }))
    }

    async fn delete_by_id(&self, id: &str) -> ProductResult<Option<Product>> {
        self.ensure_available()?;
        let mut products = self.products.write().await;

        Ok(products
            .iter()
            .position(|p| p.id == id)
            .map(|index| products.remove(index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UpdateProduct;

    fn input(name: &str, quantity: i64, price: f64) -> CreateProduct {
        CreateProduct {
            name: name.to_string(),
            quantity,
            price,
        }
    }

    #[tokio::test]
    async fn test_find_all_keeps_insertion_order() {
        let repo = InMemoryProductRepository::new();
        repo.insert(input("A", 1, 1.0)).await.unwrap();
        repo.insert(input("B", 2, 2.0)).await.unwrap();

        let names: Vec<_> = repo
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_insert_assigns_distinct_ids() {
        let repo = InMemoryProductRepository::new();
        let a = repo.insert(input("A", 1, 1.0)).await.unwrap();
        let b = repo.insert(input("A", 1, 1.0)).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 24);
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_id() {
        let repo = InMemoryProductRepository::new();
        repo.insert(input("A", 1, 1.0)).await.unwrap();

        let update = ProductUpdate::Merge(UpdateProduct::default());
        assert!(repo.update_by_id("missing", update).await.unwrap().is_none());
        assert!(repo.delete_by_id("missing").await.unwrap().is_none());
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_returns_removed_product() {
        let repo = InMemoryProductRepository::new();
        let created = repo.insert(input("A", 1, 1.0)).await.unwrap();

        let deleted = repo.delete_by_id(&created.id).await.unwrap();
        assert_eq!(deleted, Some(created.clone()));
        assert!(repo.find_by_id(&created.id).await.unwrap().is_none());
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_without_side_effects() {
        let repo = InMemoryProductRepository::new();
        let created = repo.insert(input("A", 1, 1.0)).await.unwrap();

        repo.set_available(false);
        assert!(matches!(
            repo.insert(input("B", 1, 1.0)).await,
            Err(ProductError::Database(_))
        ));
        assert!(matches!(
            repo.delete_by_id(&created.id).await,
            Err(ProductError::Database(_))
        ));

        repo.set_available(true);
        assert_eq!(repo.find_all().await.unwrap(), vec![created]);
    }
}
