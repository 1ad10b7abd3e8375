//! The cart synchronization engine.
//!
//! [`CartService`] owns the in-memory cart for the whole session. Consumers
//! mutate it through synchronous operations and read derived totals; the
//! service persists in the background to whichever store the current
//! authentication state makes authoritative. Constructed once at app start
//! via [`CartService::start`] (or [`CartService::from_config`]); shut down
//! with [`CartService::shutdown`], which flushes the pending local write.
//!
//! Every mutation is optimistic: the in-memory change lands before any I/O
//! is attempted, and a failed background sync never rolls it back.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axle_core::{Cart, CartLine, CartRow, ProductId, UserId};
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::sync::watch;
use tracing::warn;

use crate::auth::AuthState;
use crate::config::CartConfig;
use crate::debounce::DebouncedWriter;
use crate::error::CartSyncError;
use crate::remote::{HttpRemoteCart, RemoteCart};
use crate::store::{JsonFileStore, LocalStore};

/// Product data handed to [`CartService::add`].
///
/// Mirrors what the catalog UI actually has in hand, which is untrusted:
/// every field is optional and the engine validates before touching the
/// cart. Deserializes from catalog JSON (camelCase).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItem {
    pub product_id: Option<ProductId>,
    pub name: Option<String>,
    pub price: Option<Decimal>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// The cart synchronization engine. Cheaply cloneable; all clones share
/// the same in-memory cart.
#[derive(Clone)]
pub struct CartService {
    inner: Arc<CartServiceInner>,
}

struct CartServiceInner {
    state: Mutex<Cart>,
    local: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteCart>,
    auth: watch::Receiver<AuthState>,
    writer: DebouncedWriter,
}

impl CartServiceInner {
    fn lock(&self) -> MutexGuard<'_, Cart> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CartService {
    /// Create the engine and spawn its background tasks (the debounced
    /// local writer and the auth watcher). Must be called within a tokio
    /// runtime.
    ///
    /// The cart starts empty; call [`Self::load`] once on mount. Subsequent
    /// authentication transitions reload automatically.
    #[must_use]
    pub fn start(
        local: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteCart>,
        auth: watch::Receiver<AuthState>,
        debounce: Duration,
    ) -> Self {
        let writer = DebouncedWriter::spawn(Arc::clone(&local), debounce);
        let service = Self {
            inner: Arc::new(CartServiceInner {
                state: Mutex::new(Cart::new()),
                local,
                remote,
                auth,
                writer,
            }),
        };
        service.spawn_auth_watcher();
        service
    }

    /// Convenience constructor wiring the production stores from config.
    #[must_use]
    pub fn from_config(config: &CartConfig, auth: watch::Receiver<AuthState>) -> Self {
        Self::start(
            Arc::new(JsonFileStore::new(config.storage_path.clone())),
            Arc::new(HttpRemoteCart::new(&config.api_base_url)),
            auth,
            config.debounce,
        )
    }

    /// Reload the cart from the authoritative store for the current
    /// authentication state.
    ///
    /// Signed in: the remote cart replaces in-memory state; if the fetch
    /// fails the local copy is used instead of leaving the cart empty.
    /// Guest: the local store is read; corrupt or unreadable data means an
    /// empty cart. Never surfaces an error.
    pub async fn load(&self) {
        match self.auth_state() {
            AuthState::SignedIn(user) => match self.inner.remote.rows_for_user(&user).await {
                Ok(rows) => {
                    let cart = Cart::from_lines(rows.into_iter().map(CartRow::into_line));
                    *self.inner.lock() = cart;
                }
                Err(e) => {
                    warn!(error = %e, user = %user, "remote cart fetch failed, falling back to local copy");
                    self.load_from_local();
                }
            },
            AuthState::Guest => self.load_from_local(),
        }
    }

    /// Add a product to the cart, merging with an existing line.
    ///
    /// Incomplete product data (missing id, name, or price) or a zero
    /// quantity is logged and dropped without touching the cart. The
    /// in-memory update is visible before persistence is even scheduled.
    pub fn add(&self, item: AddItem, quantity: u32) {
        let (Some(product_id), Some(name), Some(price)) = (item.product_id, item.name, item.price)
        else {
            warn!("discarding cart add with incomplete product data");
            return;
        };
        if product_id.as_str().is_empty() || name.is_empty() {
            warn!("discarding cart add with empty product id or name");
            return;
        }
        if quantity == 0 {
            warn!(product = %product_id, "discarding cart add with zero quantity");
            return;
        }

        let line = CartLine {
            product_id,
            remote_id: None,
            name,
            price,
            image: item.image,
            category: item.category,
            quantity,
        };

        let snapshot = {
            let mut cart = self.inner.lock();
            cart.add_line(line.clone());
            cart.lines().to_vec()
        };

        match self.auth_state() {
            AuthState::Guest => self.inner.writer.save(snapshot),
            AuthState::SignedIn(user) => {
                let inner = Arc::clone(&self.inner);
                tokio::spawn(async move {
                    // Add-or-increment with the delta quantity; the returned
                    // row carries the server-issued id for this line.
                    match inner.remote.add_line(&user, &line).await {
                        Ok(row) => {
                            inner.lock().set_remote_id(&line.product_id, row.id);
                        }
                        Err(e) => {
                            warn!(error = %e, product = %line.product_id, "background cart add failed");
                        }
                    }
                });
            }
        }
    }

    /// Remove a product's line. Removing something not in the cart is a
    /// silent no-op.
    pub fn remove(&self, product_id: &ProductId) {
        let (removed, snapshot) = {
            let mut cart = self.inner.lock();
            let removed = cart.remove_line(product_id);
            (removed, cart.lines().to_vec())
        };
        let Some(removed) = removed else {
            return;
        };

        match self.auth_state() {
            AuthState::Guest => self.inner.writer.save(snapshot),
            AuthState::SignedIn(user) => {
                let inner = Arc::clone(&self.inner);
                tokio::spawn(async move {
                    let result = match removed.remote_id {
                        Some(row) => inner.remote.delete_row(row).await,
                        // No recorded row id: locate the row by product
                        // association rather than guessing at id spaces.
                        None => {
                            delete_by_product(
                                inner.remote.as_ref(),
                                &user,
                                &removed.product_id,
                            )
                            .await
                        }
                    };
                    if let Err(e) = result {
                        warn!(error = %e, product = %removed.product_id, "background cart remove failed");
                    }
                });
            }
        }
    }

    /// Set a line's quantity; anything <= 0 behaves exactly like
    /// [`Self::remove`]. Updating a product not in the cart is a no-op.
    pub fn update_quantity(&self, product_id: &ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove(product_id);
            return;
        }
        let qty = u32::try_from(quantity).unwrap_or(u32::MAX);

        let mut cart = self.inner.lock();
        if cart.get(product_id).is_none() {
            return;
        }
        cart.set_quantity(product_id, quantity);
        let remote_id = cart.get(product_id).and_then(|l| l.remote_id);
        let snapshot = cart.lines().to_vec();
        drop(cart);

        match self.auth_state() {
            AuthState::Guest => self.inner.writer.save(snapshot),
            AuthState::SignedIn(user) => {
                let inner = Arc::clone(&self.inner);
                let product = product_id.clone();
                tokio::spawn(async move {
                    let result = match remote_id {
                        Some(row) => inner.remote.update_quantity(row, qty).await,
                        None => {
                            update_by_product(inner.remote.as_ref(), &user, &product, qty).await
                        }
                    };
                    if let Err(e) = result {
                        warn!(error = %e, product = %product, "background quantity update failed");
                    }
                });
            }
        }
    }

    /// Empty the cart. The in-memory state empties immediately; clearing
    /// the backing store is best-effort and never reverts it.
    pub fn clear(&self) {
        self.inner.lock().clear();

        match self.auth_state() {
            AuthState::Guest => self.inner.writer.clear(),
            AuthState::SignedIn(user) => {
                let inner = Arc::clone(&self.inner);
                tokio::spawn(async move {
                    if let Err(e) = inner.remote.clear_user(&user).await {
                        warn!(error = %e, user = %user, "background cart clear failed");
                    }
                });
            }
        }
    }

    /// Push the entire in-memory cart to the remote store (bulk replace).
    ///
    /// A no-op for guests. Best-effort like every other remote write; used
    /// when the application explicitly wants the server to match the local
    /// view, e.g. right before checkout.
    pub async fn sync_remote(&self) {
        let AuthState::SignedIn(user) = self.auth_state() else {
            return;
        };
        let snapshot = self.lines();
        if let Err(e) = self.inner.remote.sync_all(&user, &snapshot).await {
            warn!(error = %e, user = %user, "remote cart sync failed");
        }
    }

    /// Snapshot of the current lines.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.inner.lock().lines().to_vec()
    }

    /// Whether the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Total item count: the sum of all quantities. Derived on every call.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.inner.lock().total_items()
    }

    /// Total price over all lines. Derived on every call.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.inner.lock().total_price()
    }

    /// Force the pending debounced local write without waiting for it.
    pub fn force_save(&self) {
        self.inner.writer.force_save();
    }

    /// Force the pending debounced local write and wait until it landed.
    /// Used before navigating away (e.g. proceeding to checkout) so the
    /// next page reads what the shopper last saw.
    pub async fn wait_for_save(&self) {
        self.inner.writer.flush().await;
    }

    /// Flush pending persistence. Call at application shutdown.
    pub async fn shutdown(&self) {
        self.wait_for_save().await;
    }

    fn auth_state(&self) -> AuthState {
        self.inner.auth.borrow().clone()
    }

    fn load_from_local(&self) {
        let cart = match self.inner.local.load() {
            Ok(Some(lines)) => Cart::from_lines(lines),
            Ok(None) => Cart::new(),
            Err(e) => {
                warn!(error = %e, "unreadable local cart, starting empty");
                Cart::new()
            }
        };
        *self.inner.lock() = cart;
    }

    fn spawn_auth_watcher(&self) {
        let service = self.clone();
        let mut rx = self.inner.auth.clone();
        tokio::spawn(async move {
            // Reload from the newly authoritative store on every
            // transition; ends when the auth handle is dropped.
            while rx.changed().await.is_ok() {
                service.load().await;
            }
        });
    }
}

/// Delete a user's row for a product when no row id was ever recorded.
async fn delete_by_product(
    remote: &dyn RemoteCart,
    user: &UserId,
    product: &ProductId,
) -> Result<(), CartSyncError> {
    let rows = remote.rows_for_user(user).await?;
    match rows.into_iter().find(|r| &r.product_id == product) {
        Some(row) => remote.delete_row(row.id).await,
        None => Ok(()),
    }
}

/// Update a user's row for a product when no row id was ever recorded.
/// A row that never made it to the server stays absent; the next load
/// reconciles.
async fn update_by_product(
    remote: &dyn RemoteCart,
    user: &UserId,
    product: &ProductId,
    quantity: u32,
) -> Result<(), CartSyncError> {
    let rows = remote.rows_for_user(user).await?;
    match rows.into_iter().find(|r| &r.product_id == product) {
        Some(row) => remote.update_quantity(row.id, quantity).await,
        None => Ok(()),
    }
}
