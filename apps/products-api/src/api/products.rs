//! Products API routes

use axum::Router;
use domain_products::{MongoProductRepository, ProductService, handlers};

use crate::state::AppState;

/// Create products router
pub fn router(state: &AppState) -> Router {
    let repository = MongoProductRepository::new(state.db.clone());
    let service = ProductService::new(repository).with_update_mode(state.config.update_mode);
    handlers::router(service)
}
