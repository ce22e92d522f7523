//! Item registry API handlers

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::item::{Item, NewItem, UpdateItem};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::ApiResponse;
use crate::state::AppState;

/// List a new item
pub async fn create_item(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<NewItem>,
) -> Result<Json<ApiResponse<Item>>, ApiError> {
    body.validate()?;

    let item = app_state.item_service.create_item(&user, body).await?;

    Ok(Json(ApiResponse::ok(item)))
}

/// Caller's items
pub async fn list_items(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<Item>>>, ApiError> {
    let items = app_state.item_service.list_items(&user).await?;

    Ok(Json(ApiResponse::ok(items)))
}

/// Get a single item
pub async fn get_item(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Item>>, ApiError> {
    let item = app_state.item_service.get_item(id, &user).await?;

    Ok(Json(ApiResponse::ok(item)))
}

/// Update an item
pub async fn update_item(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateItem>,
) -> Result<Json<ApiResponse<Item>>, ApiError> {
    body.validate()?;

    let item = app_state.item_service.update_item(id, &user, body).await?;

    Ok(Json(ApiResponse::ok(item)))
}

/// Delete an item
pub async fn delete_item(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    app_state.item_service.delete_item(id, &user).await?;

    Ok(Json(ApiResponse::ok(())))
}
