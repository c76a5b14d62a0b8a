use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use axum_helpers::{
    AppJson,
    errors::responses::{BadRequestResponse, InternalServerErrorResponse, NotFoundResponse},
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::ProductResult;
use crate::models::{CreateProduct, MessageResponse, Product, UpdateMode, UpdateProduct};
use crate::repository::ProductRepository;
use crate::service::ProductService;

pub const PRODUCT_DELETED: &str = "Product deleted successfully";

/// OpenAPI documentation for Products API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        create_product,
        get_product,
        update_product,
        patch_product,
        delete_product,
    ),
    components(
        schemas(Product, CreateProduct, UpdateProduct, UpdateMode, MessageResponse),
        responses(NotFoundResponse, BadRequestResponse, InternalServerErrorResponse)
    ),
    tags(
        (name = "Products", description = "Product inventory endpoints (MongoDB)")
    )
)]
pub struct ApiDoc;

/// Create the products router with all HTTP endpoints
pub fn router<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/{id}",
            get(get_product)
                .put(update_product)
                .patch(patch_product)
                .delete(delete_product),
        )
        .with_state(shared_service)
}

/// List all products
#[utoipa::path(
    get,
    path = "",
    tag = "Products",
    responses(
        (status = 200, description = "Every stored product", body = Vec<Product>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
) -> ProductResult<Json<Vec<Product>>> {
    let products = service.list_products().await?;
    Ok(Json(products))
}

/// Create a product
#[utoipa::path(
    post,
    path = "",
    tag = "Products",
    request_body = CreateProduct,
    responses(
        (status = 200, description = "Product created", body = Product),
        (status = 400, response = BadRequestResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    AppJson(input): AppJson<CreateProduct>,
) -> ProductResult<Json<Product>> {
    let product = service.create_product(input).await?;
    Ok(Json(product))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Path(id): Path<String>,
) -> ProductResult<Json<Product>> {
    let product = service.get_product(&id).await?;
    Ok(Json(product))
}

/// Update a product
///
/// In `merge` mode (default) only the supplied fields change. In `replace`
/// mode the body must carry every field.
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    request_body = UpdateProduct,
    responses(
        (status = 200, description = "Product as stored after the update", body = Product),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Path(id): Path<String>,
    AppJson(input): AppJson<UpdateProduct>,
) -> ProductResult<Json<Product>> {
    let product = service.update_product(&id, input).await?;
    Ok(Json(product))
}

/// Update a product (same semantics as PUT)
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    request_body = UpdateProduct,
    responses(
        (status = 200, description = "Product as stored after the update", body = Product),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn patch_product<R: ProductRepository>(
    state: State<Arc<ProductService<R>>>,
    id: Path<String>,
    input: AppJson<UpdateProduct>,
) -> ProductResult<Json<Product>> {
    update_product(state, id, input).await
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product deleted", body = MessageResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Path(id): Path<String>,
) -> ProductResult<Json<MessageResponse>> {
    service.delete_product(&id).await?;
    Ok(Json(MessageResponse::new(PRODUCT_DELETED)))
}
