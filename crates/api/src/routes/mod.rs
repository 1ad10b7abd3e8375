//! Route definitions for the cart service.

pub mod cart;

use axum::Router;
use axum::routing::{delete, get, post};

use crate::state::AppState;

/// Build the cart API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/cart", post(cart::add))
        .route("/api/cart/sync", post(cart::sync))
        .route("/api/cart/user/{user_id}", delete(cart::clear))
        .route(
            "/api/cart/{id}",
            get(cart::list).put(cart::update).delete(cart::remove),
        )
}
