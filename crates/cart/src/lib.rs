//! Axle cart synchronization engine.
//!
//! Single source of truth for the shopper's cart during a browsing session.
//! The engine mediates between UI consumers and two backing stores - a local
//! key-value store for guests and the cart REST service for signed-in users -
//! and guarantees that consumers never block on persistence I/O.
//!
//! # Architecture
//!
//! - In-memory [`axle_core::Cart`] state, mutated synchronously
//! - Optimistic updates: the mutation is visible to consumers before any I/O
//! - Guest persistence: debounced whole-cart writes to a [`store::LocalStore`]
//! - Signed-in persistence: fire-and-forget requests against a
//!   [`remote::RemoteCart`], with server row ids recorded per line
//! - Auth transitions reload the cart from whichever store is authoritative
//!   for the new state; the two stores are never merged
//!
//! Background sync failures are logged and swallowed - the visible cart is
//! always right from the shopper's perspective, and server divergence heals
//! on the next load.
//!
//! # Example
//!
//! ```rust,ignore
//! use axle_cart::auth::auth_channel;
//! use axle_cart::config::CartConfig;
//! use axle_cart::service::CartService;
//!
//! let config = CartConfig::from_env()?;
//! let (auth, auth_rx) = auth_channel();
//! let cart = CartService::from_config(&config, auth_rx);
//! cart.load().await;
//!
//! cart.add(item, 1);
//! auth.sign_in("user-42".into()); // engine reloads from the remote cart
//! cart.wait_for_save().await;     // flush before navigating to checkout
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod config;
mod debounce;
pub mod error;
pub mod remote;
pub mod service;
pub mod store;

pub use auth::{AuthHandle, AuthState, auth_channel};
pub use error::CartSyncError;
pub use service::{AddItem, CartService};
