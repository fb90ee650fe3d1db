use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::{
    auth::AuthUser,
    errors::ApiError,
    handlers::common::{
        created_response, no_content_response, success_response, validate_input,
        PaginatedResponse, PaginationParams,
    },
    services::products::{NewProduct, ProductUpdate},
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 25))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub model: String,
    pub released_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 25))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub model: String,
    pub released_at: DateTime<Utc>,
}

pub fn product_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

async fn create_product(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let created = state
        .services
        .products
        .create(NewProduct {
            name: payload.name,
            model: payload.model,
            released_at: payload.released_at,
        })
        .await?;

    Ok(created_response(created))
}

async fn get_product(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .products
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product {}", id)))?;

    Ok(success_response(product))
}

async fn list_products(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = pagination.clamped_limit();
    let (products, total) = state
        .services
        .products
        .list(limit, pagination.offset())
        .await?;

    Ok(success_response(PaginatedResponse {
        items: products,
        total,
        page: pagination.page,
        limit,
    }))
}

async fn update_product(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let updated = state
        .services
        .products
        .update(
            id,
            ProductUpdate {
                name: payload.name,
                model: payload.model,
                released_at: payload.released_at,
            },
        )
        .await?;

    Ok(success_response(updated))
}

async fn delete_product(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.products.delete(id).await?;
    Ok(no_content_response())
}
