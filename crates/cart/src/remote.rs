//! Remote cart store client.
//!
//! The cart REST service keeps one row per (user, product); this module
//! provides the [`RemoteCart`] seam the engine talks through plus the
//! production HTTP implementation. The service returns denormalized rows
//! (name, price, image, category) so a cart can be hydrated without catalog
//! lookups.
//!
//! No retry or backoff here: the engine treats every failure as "log and
//! move on", and divergence heals on the next load.

use async_trait::async_trait;
use axle_core::{CartLine, CartRow, CartRowId, CartSyncRequest, CartUpsert, UserId};
use tracing::instrument;

use crate::error::CartSyncError;

/// Operations the engine needs from the remote cart store.
#[async_trait]
pub trait RemoteCart: Send + Sync {
    /// Fetch all cart rows for a user.
    async fn rows_for_user(&self, user: &UserId) -> Result<Vec<CartRow>, CartSyncError>;

    /// Add a product to the user's cart, or increment the existing row.
    /// Returns the resulting row (and thus its server-issued id).
    async fn add_line(&self, user: &UserId, line: &CartLine) -> Result<CartRow, CartSyncError>;

    /// Set the quantity of an existing row.
    async fn update_quantity(&self, row: CartRowId, quantity: u32) -> Result<(), CartSyncError>;

    /// Delete one row.
    async fn delete_row(&self, row: CartRowId) -> Result<(), CartSyncError>;

    /// Delete every row belonging to a user.
    async fn clear_user(&self, user: &UserId) -> Result<(), CartSyncError>;

    /// Replace the user's entire cart with the given lines.
    async fn sync_all(&self, user: &UserId, lines: &[CartLine]) -> Result<(), CartSyncError>;
}

/// HTTP client for the cart REST service.
#[derive(Debug, Clone)]
pub struct HttpRemoteCart {
    client: reqwest::Client,
    base: String,
}

impl HttpRemoteCart {
    /// Create a client for the service at `base_url`.
    #[must_use]
    pub fn new(base_url: &url::Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base_url.as_str().trim_end_matches('/').to_owned(),
        }
    }

    /// Turn a non-2xx response into a uniform API error.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, CartSyncError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(CartSyncError::Api {
            status: status.as_u16(),
            message: message.chars().take(200).collect(),
        })
    }
}

#[async_trait]
impl RemoteCart for HttpRemoteCart {
    #[instrument(skip(self), fields(user = %user))]
    async fn rows_for_user(&self, user: &UserId) -> Result<Vec<CartRow>, CartSyncError> {
        let url = format!("{}/api/cart/{user}", self.base);
        let response = Self::check(self.client.get(&url).send().await?).await?;
        Ok(response.json().await?)
    }

    #[instrument(skip(self, line), fields(user = %user, product = %line.product_id))]
    async fn add_line(&self, user: &UserId, line: &CartLine) -> Result<CartRow, CartSyncError> {
        let url = format!("{}/api/cart", self.base);
        let body = CartUpsert {
            user_id: user.clone(),
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            price: line.price,
            image: line.image.clone(),
            category: line.category.clone(),
            quantity: line.quantity,
        };
        let response = Self::check(self.client.post(&url).json(&body).send().await?).await?;
        Ok(response.json().await?)
    }

    #[instrument(skip(self))]
    async fn update_quantity(&self, row: CartRowId, quantity: u32) -> Result<(), CartSyncError> {
        let url = format!("{}/api/cart/{row}", self.base);
        let body = serde_json::json!({ "quantity": quantity });
        Self::check(self.client.put(&url).json(&body).send().await?).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_row(&self, row: CartRowId) -> Result<(), CartSyncError> {
        let url = format!("{}/api/cart/{row}", self.base);
        Self::check(self.client.delete(&url).send().await?).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(user = %user))]
    async fn clear_user(&self, user: &UserId) -> Result<(), CartSyncError> {
        let url = format!("{}/api/cart/user/{user}", self.base);
        Self::check(self.client.delete(&url).send().await?).await?;
        Ok(())
    }

    #[instrument(skip(self, lines), fields(user = %user, lines = lines.len()))]
    async fn sync_all(&self, user: &UserId, lines: &[CartLine]) -> Result<(), CartSyncError> {
        let url = format!("{}/api/cart/sync", self.base);
        let body = CartSyncRequest {
            user_id: user.clone(),
            lines: lines.to_vec(),
        };
        Self::check(self.client.post(&url).json(&body).send().await?).await?;
        Ok(())
    }
}
