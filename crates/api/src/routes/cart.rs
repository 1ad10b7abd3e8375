//! Cart route handlers.
//!
//! The surface the storefront's cart engine consumes: list, add-or-increment,
//! set quantity, remove, clear, and bulk sync. Everything speaks JSON and
//! returns conventional statuses; clients treat any non-2xx uniformly.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use tracing::instrument;

use axle_core::{CartRow, CartRowId, CartSyncRequest, CartUpsert, UserId};

use crate::db::cart::CartRepository;
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Body for `PUT /api/cart/{row_id}`.
///
/// The quantity is signed on the wire: anything at or below zero means the
/// row must go away, mirroring the cart invariant.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityBody {
    pub quantity: i64,
}

/// `GET /api/cart/{user_id}` - all rows for a user.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<CartRow>>> {
    let repo = CartRepository::new(state.pool());
    let rows = repo.rows_for_user(&UserId::new(user_id)).await?;
    Ok(Json(rows))
}

/// `POST /api/cart` - add a product or increment the existing row.
#[instrument(skip(state, body), fields(user = %body.user_id, product = %body.product_id))]
pub async fn add(
    State(state): State<AppState>,
    Json(body): Json<CartUpsert>,
) -> Result<(StatusCode, Json<CartRow>)> {
    if body.quantity == 0 {
        return Err(ApiError::BadRequest("quantity must be positive".to_owned()));
    }
    if body.user_id.as_str().is_empty()
        || body.product_id.as_str().is_empty()
        || body.name.is_empty()
    {
        return Err(ApiError::BadRequest(
            "userId, productId, and name are required".to_owned(),
        ));
    }

    let repo = CartRepository::new(state.pool());
    let row = repo.upsert(&body).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `PUT /api/cart/{row_id}` - set a row's quantity (non-positive deletes).
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path(row_id): Path<i64>,
    Json(body): Json<UpdateQuantityBody>,
) -> Result<StatusCode> {
    let repo = CartRepository::new(state.pool());
    let row = CartRowId::new(row_id);

    let found = if body.quantity <= 0 {
        repo.delete_row(row).await?
    } else {
        let quantity = u32::try_from(body.quantity).unwrap_or(u32::MAX);
        repo.update_quantity(row, quantity).await?
    };

    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("cart row {row_id}")))
    }
}

/// `DELETE /api/cart/{row_id}` - remove one row.
#[instrument(skip(state))]
pub async fn remove(State(state): State<AppState>, Path(row_id): Path<i64>) -> Result<StatusCode> {
    let repo = CartRepository::new(state.pool());
    if repo.delete_row(CartRowId::new(row_id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("cart row {row_id}")))
    }
}

/// `DELETE /api/cart/user/{user_id}` - clear a user's cart.
///
/// Clearing an already-empty cart succeeds; the caller wants the end state,
/// not an existence check.
#[instrument(skip(state))]
pub async fn clear(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode> {
    let repo = CartRepository::new(state.pool());
    repo.clear_user(&UserId::new(user_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/cart/sync` - bulk replace a user's cart.
#[instrument(skip(state, body), fields(user = %body.user_id, lines = body.lines.len()))]
pub async fn sync(
    State(state): State<AppState>,
    Json(body): Json<CartSyncRequest>,
) -> Result<Json<Vec<CartRow>>> {
    if body.user_id.as_str().is_empty() {
        return Err(ApiError::BadRequest("userId is required".to_owned()));
    }

    let repo = CartRepository::new(state.pool());
    let rows = repo.replace_all(&body.user_id, &body.lines).await?;
    Ok(Json(rows))
}
