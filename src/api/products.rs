use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::api::state::AppState;
use crate::error::{AppError, Result};
use crate::models::ProductRequest;

/// Decodes a product body regardless of its Content-Type header.
fn decode(body: &[u8]) -> Result<ProductRequest> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "Rejected product body");
        AppError::BadRequest
    })
}

/// List all products
async fn list_products(State(state): State<AppState>) -> Result<Json<Value>> {
    let products = state.store.list_products().await?;
    Ok(Json(json!({ "products": products })))
}

/// Fetch one product. Unknown ids are reported as a server error, same as a
/// backend failure.
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let product = state.store.get_product(&id).await?;
    Ok(Json(json!({ "product": product })))
}

async fn create_product(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>)> {
    let req = decode(&body)?;
    state.store.create_product(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Product created" })),
    ))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>> {
    let req = decode(&body)?;
    state.store.update_product(&id, req).await?;

    Ok(Json(json!({ "message": "Product updated" })))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    state.store.delete_product(&id).await?;
    Ok(Json(json!({ "message": "Product deleted" })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}
