//! MongoDB implementation of ProductRepository

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database,
    bson::{Document, doc, oid::ObjectId},
    options::ReturnDocument,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::ProductResult;
use crate::models::{CreateProduct, Product, ProductUpdate, UpdateProduct};
use crate::repository::ProductRepository;

pub const COLLECTION_NAME: &str = "products";

/// Stored form of a product
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProductDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    quantity: i64,
    price: f64,
}

impl ProductDocument {
    fn new(id: ObjectId, input: CreateProduct) -> Self {
        Self {
            id,
            name: input.name,
            quantity: input.quantity,
            price: input.price,
        }
    }
}

impl From<ProductDocument> for Product {
    fn from(doc: ProductDocument) -> Self {
        Product {
            id: doc.id.to_hex(),
            name: doc.name,
            quantity: doc.quantity,
            price: doc.price,
        }
    }
}

/// MongoDB implementation of the ProductRepository
pub struct MongoProductRepository {
    collection: Collection<ProductDocument>,
}

impl MongoProductRepository {
    /// Create a repository over the `products` collection
    ///
    /// # Example
    /// ```ignore
    /// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
    /// let repo = MongoProductRepository::new(client.database("shop"));
    /// ```
    pub fn new(db: Database) -> Self {
        Self::with_collection(db, COLLECTION_NAME)
    }

    /// Create a repository over a custom collection name
    pub fn with_collection(db: Database, collection_name: &str) -> Self {
        let collection = db.collection::<ProductDocument>(collection_name);
        Self { collection }
    }

    /// Ids that are not a 24-hex ObjectId cannot name a stored product
    fn parse_id(id: &str) -> Option<ObjectId> {
        ObjectId::parse_str(id).ok()
    }

    /// `$set` body for a merge patch; empty when the patch names no fields
    fn set_document(patch: &UpdateProduct) -> Document {
        let mut set = doc! {};

        if let Some(ref name) = patch.name {
            set.insert("name", name);
        }
        if let Some(quantity) = patch.quantity {
            set.insert("quantity", quantity);
        }
        if let Some(price) = patch.price {
            set.insert("price", price);
        }

        set
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self))]
    async fn find_all(&self) -> ProductResult<Vec<Product>> {
        let cursor = self.collection.find(doc! {}).await?;
        let docs: Vec<ProductDocument> = cursor.try_collect().await?;

        Ok(docs.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> ProductResult<Option<Product>> {
        let Some(oid) = Self::parse_id(id) else {
            return Ok(None);
        };
        let filter = doc! { "_id": oid };

        let doc = self.collection.find_one(filter).await?;
        Ok(doc.map(Product::from))
    }

    #[instrument(skip(self, input), fields(product_name = %input.name))]
    async fn insert(&self, input: CreateProduct) -> ProductResult<Product> {
        let doc = ProductDocument::new(ObjectId::new(), input);

        self.collection.insert_one(&doc).await?;

        tracing::info!(product_id = %doc.id, "Product created");
        Ok(doc.into())
    }

    #[instrument(skip(self, update))]
    async fn update_by_id(
        &self,
        id: &str,
        update: ProductUpdate,
    ) -> ProductResult<Option<Product>> {
        let Some(oid) = Self::parse_id(id) else {
            return Ok(None);
        };
        let filter = doc! { "_id": oid };

        let updated = match update {
            ProductUpdate::Merge(patch) => {
                let set = Self::set_document(&patch);
                // `$set: {}` is rejected by the server
                if set.is_empty() {
                    self.collection.find_one(filter).await?
                } else {
                    self.collection
                        .find_one_and_update(filter, doc! { "$set": set })
                        .return_document(ReturnDocument::After)
                        .await?
                }
            }
            ProductUpdate::Replace(input) => {
                self.collection
                    .find_one_and_replace(filter, ProductDocument::new(oid, input))
                    .return_document(ReturnDocument::After)
                    .await?
            }
        };

        if updated.is_some() {
            tracing::info!(product_id = %id, "Product updated");
        }
        Ok(updated.map(Product::from))
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: &str) -> ProductResult<Option<Product>> {
        let Some(oid) = Self::parse_id(id) else {
            return Ok(None);
        };
        let filter = doc! { "_id": oid };

        let deleted = self.collection.find_one_and_delete(filter).await?;

        if deleted.is_some() {
            tracing::info!(product_id = %id, "Product deleted");
        }
        Ok(deleted.map(Product::from))
    }
}
