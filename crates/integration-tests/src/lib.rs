//! Integration test support for Axle.
//!
//! The tests in `tests/` drive the full cart engine the way storefront
//! consumers do: real [`axle_cart::service::CartService`] instances over a
//! real local store, with the remote cart service replaced by
//! [`ScriptedRemote`] - an in-process implementation of the wire semantics
//! whose failures can be scripted and whose calls are recorded.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p axle-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axle_cart::error::CartSyncError;
use axle_cart::remote::RemoteCart;
use axle_core::{CartLine, CartRow, CartRowId, ProductId, UserId};
use chrono::Utc;
use rust_decimal::Decimal;

/// In-process remote cart store with scriptable failures and a call log.
///
/// Implements the same semantics as the real service: one row per
/// (user, product), add-or-increment, bulk replace.
#[derive(Debug, Default)]
pub struct ScriptedRemote {
    rows: Mutex<Vec<CartRow>>,
    next_id: AtomicI64,
    failing: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRemote {
    /// Create an empty, healthy remote.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Self::default()
        }
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Insert a row directly, bypassing the call log. Returns its id.
    pub fn seed_row(&self, user: &str, product: &str, price: Decimal, quantity: u32) -> CartRowId {
        let id = CartRowId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let now = Utc::now();
        self.lock_rows().push(CartRow {
            id,
            user_id: UserId::new(user),
            product_id: ProductId::new(product),
            name: format!("{product} name"),
            price,
            image: None,
            category: None,
            quantity,
            created_at: now,
            updated_at: now,
        });
        id
    }

    /// Snapshot of all rows across all users.
    #[must_use]
    pub fn rows(&self) -> Vec<CartRow> {
        self.lock_rows().clone()
    }

    /// The calls made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn lock_rows(&self) -> std::sync::MutexGuard<'_, Vec<CartRow>> {
        self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn record(&self, call: String) -> Result<(), CartSyncError> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(CartSyncError::Api {
                status: 503,
                message: "scripted failure".to_owned(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteCart for ScriptedRemote {
    async fn rows_for_user(&self, user: &UserId) -> Result<Vec<CartRow>, CartSyncError> {
        self.record(format!("rows_for_user:{user}"))?;
        Ok(self
            .lock_rows()
            .iter()
            .filter(|r| &r.user_id == user)
            .cloned()
            .collect())
    }

    async fn add_line(&self, user: &UserId, line: &CartLine) -> Result<CartRow, CartSyncError> {
        self.record(format!("add_line:{}", line.product_id))?;
        let mut rows = self.lock_rows();
        if let Some(existing) = rows
            .iter_mut()
            .find(|r| &r.user_id == user && r.product_id == line.product_id)
        {
            existing.quantity += line.quantity;
            existing.updated_at = Utc::now();
            return Ok(existing.clone());
        }

        let id = CartRowId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let now = Utc::now();
        let row = CartRow {
            id,
            user_id: user.clone(),
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            price: line.price,
            image: line.image.clone(),
            category: line.category.clone(),
            quantity: line.quantity,
            created_at: now,
            updated_at: now,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn update_quantity(&self, row: CartRowId, quantity: u32) -> Result<(), CartSyncError> {
        self.record(format!("update_quantity:{row}={quantity}"))?;
        let mut rows = self.lock_rows();
        if let Some(existing) = rows.iter_mut().find(|r| r.id == row) {
            existing.quantity = quantity;
            existing.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_row(&self, row: CartRowId) -> Result<(), CartSyncError> {
        self.record(format!("delete_row:{row}"))?;
        self.lock_rows().retain(|r| r.id != row);
        Ok(())
    }

    async fn clear_user(&self, user: &UserId) -> Result<(), CartSyncError> {
        self.record(format!("clear_user:{user}"))?;
        self.lock_rows().retain(|r| &r.user_id != user);
        Ok(())
    }

    async fn sync_all(&self, user: &UserId, lines: &[CartLine]) -> Result<(), CartSyncError> {
        self.record(format!("sync_all:{user}:{}", lines.len()))?;
        let mut rows = self.lock_rows();
        rows.retain(|r| &r.user_id != user);
        let now = Utc::now();
        for line in lines.iter().filter(|l| l.quantity > 0) {
            let id = CartRowId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
            rows.push(CartRow {
                id,
                user_id: user.clone(),
                product_id: line.product_id.clone(),
                name: line.name.clone(),
                price: line.price,
                image: line.image.clone(),
                category: line.category.clone(),
                quantity: line.quantity,
                created_at: now,
                updated_at: now,
            });
        }
        Ok(())
    }
}

/// Poll `condition` until it holds, panicking after two seconds.
///
/// Background sync is fire-and-forget; tests observe its effects rather
/// than awaiting the tasks directly.
pub async fn eventually(what: &str, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if condition() {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
