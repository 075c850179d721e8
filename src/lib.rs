//! Storefront Library
//!
//! Client-side storefront state for an electronics shop: the cart and
//! wishlist engine, currency display settings, checkout flow and catalog
//! listing, served over a small REST API.

// Domain modules
pub mod catalog;
pub mod checkout;
pub mod settings;
pub mod store;

// Infrastructure
pub mod config;
pub mod errors;
pub mod router;

pub use crate::config::AppConfig;
pub use crate::errors::{Result, StorefrontError};
