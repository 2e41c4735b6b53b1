//! Catalog read endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;
use store::{Category, CommerceStore, Product, ProductFilter};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            id: c.id.to_string(),
            name: c.name,
            slug: c.slug,
            description: c.description,
            image_url: c.image_url,
        }
    }
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub old_price_cents: Option<i64>,
    pub category_id: String,
    pub image_url: String,
    pub additional_images: Vec<String>,
    pub stock: i32,
    pub color_options: Vec<String>,
    pub size_options: Vec<String>,
    pub is_featured: bool,
    pub created_at: String,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id.to_string(),
            name: p.name,
            description: p.description,
            price_cents: p.price.cents(),
            old_price_cents: p.old_price.map(|m| m.cents()),
            category_id: p.category_id.to_string(),
            image_url: p.image_url,
            additional_images: p.additional_images,
            stock: p.stock,
            color_options: p.color_options,
            size_options: p.size_options,
            is_featured: p.is_featured,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

/// GET /api/categories — list all categories.
#[tracing::instrument(skip(state))]
pub async fn list_categories<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = state
        .store
        .list_categories()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// GET /api/categories/{slug} — look up one category.
#[tracing::instrument(skip(state))]
pub async fn get_category<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category = state
        .store
        .find_category_by_slug(&slug)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("category not found".to_string()))?;
    Ok(Json(category.into()))
}

/// GET /api/categories/{slug}/products — products in a category.
#[tracing::instrument(skip(state))]
pub async fn list_category_products<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let category = state
        .store
        .find_category_by_slug(&slug)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("category not found".to_string()))?;
    let products = state
        .store
        .list_products(ProductFilter::Category(category.id))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// GET /api/products — list every product.
#[tracing::instrument(skip(state))]
pub async fn list_products<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state
        .store
        .list_products(ProductFilter::All)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// GET /api/products/featured — featured products only.
#[tracing::instrument(skip(state))]
pub async fn list_featured_products<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state
        .store
        .list_products(ProductFilter::Featured)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// GET /api/products/{id} — product detail.
#[tracing::instrument(skip(state))]
pub async fn get_product<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .store
        .find_product(id.into())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("product not found".to_string()))?;
    Ok(Json(product.into()))
}
