//! Storefront Domain Module
//!
//! This module contains the cart and wishlist engine, including:
//! - Domain models (Product, CartItem, API views)
//! - Store notifications and sinks
//! - The per-session `Store` and the shared `AppState`
//! - REST API handlers

pub mod events;
pub mod handlers;
pub mod helpers;
pub mod models;
pub mod state;

// Re-export commonly used types for convenience
pub use events::{NotificationSink, StoreEvent};
pub use handlers::routes;
pub use models::{CartItem, Money, Product, ProductId};
pub use state::{spawn_session_sweeper, AppState, Session, SharedState, Store};
