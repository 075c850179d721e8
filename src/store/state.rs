//! Cart and Wishlist State
//!
//! [`Store`] owns the cart line items and the wishlist of one shopping
//! session. Every mutation is a single synchronous transition that returns the
//! [`StoreEvent`] describing it; forwarding that event to a notification sink
//! is up to the caller. Aggregates are recomputed on each read.
//!
//! [`AppState`] holds one [`Session`] (store + settings) per shopper for the
//! HTTP layer. Reads never create a session, and sessions left idle are
//! dropped by a background sweep.

use super::events::StoreEvent;
use super::models::{CartItem, Money, Product, ProductId};
use crate::catalog::{Catalog, InMemoryCatalog};
use crate::config::AppConfig;
use crate::errors::{self, StorefrontError};
use crate::settings::Settings;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

// =============================================================================
// Store
// =============================================================================

/// Cart and wishlist for one session
///
/// Both collections are keyed by product id, so a duplicate id cannot exist,
/// and iterate in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    cart: IndexMap<ProductId, CartItem>,
    wishlist: IndexMap<ProductId, Product>,
}

impl Store {
    /// Creates a store with an empty cart and wishlist
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Cart mutations
    // -------------------------------------------------------------------------

    /// Adds one unit of `product`, merging into an existing line item if the
    /// id is already in the cart.
    pub fn add_to_cart(&mut self, product: &Product) -> StoreEvent {
        if let Some(existing) = self.cart.get_mut(&product.id) {
            existing.quantity = existing.quantity.saturating_add(1);
            return StoreEvent::CartQuantityIncremented {
                product_id: product.id,
                name: existing.product.name.clone(),
                quantity: existing.quantity,
            };
        }

        self.cart.insert(product.id, CartItem::new(product.clone()));
        StoreEvent::CartItemAdded {
            product_id: product.id,
            name: product.name.clone(),
        }
    }

    /// Removes the line item for `product_id`. Absent ids are a silent no-op.
    pub fn remove_from_cart(&mut self, product_id: ProductId) -> Option<StoreEvent> {
        let removed = self.cart.shift_remove(&product_id)?;
        Some(StoreEvent::CartItemRemoved {
            product_id,
            name: removed.product.name,
        })
    }

    /// Sets the quantity of a line item to exactly `quantity`.
    ///
    /// A quantity of zero or less removes the line item instead. Ids not in
    /// the cart are left alone and produce no event.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: i64) -> Option<StoreEvent> {
        if quantity <= 0 {
            return self.remove_from_cart(product_id);
        }

        let item = self.cart.get_mut(&product_id)?;
        item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        Some(StoreEvent::CartQuantityUpdated {
            product_id,
            name: item.product.name.clone(),
            quantity: item.quantity,
        })
    }

    /// Empties the cart. Emits `CartCleared` even when already empty.
    pub fn clear_cart(&mut self) -> StoreEvent {
        self.cart.clear();
        StoreEvent::CartCleared
    }

    // -------------------------------------------------------------------------
    // Cart reads
    // -------------------------------------------------------------------------

    /// Line items in insertion order
    pub fn cart_items(&self) -> impl ExactSizeIterator<Item = &CartItem> {
        self.cart.values()
    }

    pub fn cart_item(&self, product_id: ProductId) -> Option<&CartItem> {
        self.cart.get(&product_id)
    }

    pub fn is_cart_empty(&self) -> bool {
        self.cart.is_empty()
    }

    /// Number of distinct line items
    pub fn line_count(&self) -> usize {
        self.cart.len()
    }

    /// Σ price × quantity over the cart, in base currency
    pub fn cart_total(&self) -> Money {
        self.cart.values().map(CartItem::line_total).sum()
    }

    /// Total number of units in the cart
    pub fn cart_count(&self) -> u64 {
        self.cart.values().map(|item| u64::from(item.quantity)).sum()
    }

    // -------------------------------------------------------------------------
    // Wishlist
    // -------------------------------------------------------------------------

    /// Adds `product` unless its id is already wishlisted
    pub fn add_to_wishlist(&mut self, product: &Product) -> StoreEvent {
        if self.wishlist.contains_key(&product.id) {
            return StoreEvent::WishlistItemAlreadyPresent {
                product_id: product.id,
                name: product.name.clone(),
            };
        }

        self.wishlist.insert(product.id, product.clone());
        StoreEvent::WishlistItemAdded {
            product_id: product.id,
            name: product.name.clone(),
        }
    }

    /// Removes the wishlist entry for `product_id`, if any
    pub fn remove_from_wishlist(&mut self, product_id: ProductId) -> Option<StoreEvent> {
        let removed = self.wishlist.shift_remove(&product_id)?;
        Some(StoreEvent::WishlistItemRemoved {
            product_id,
            name: removed.name,
        })
    }

    pub fn is_in_wishlist(&self, product_id: ProductId) -> bool {
        self.wishlist.contains_key(&product_id)
    }

    /// Wishlisted products in insertion order
    pub fn wishlist_items(&self) -> impl ExactSizeIterator<Item = &Product> {
        self.wishlist.values()
    }
}

// =============================================================================
// Application State
// =============================================================================

/// Shared application state that can be safely passed between threads
pub type SharedState = Arc<AppState>;

/// Everything one shopper owns: their store and their display settings
#[derive(Debug, Clone)]
pub struct Session {
    pub store: Store,
    pub settings: Settings,
    last_seen: Instant,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self {
            store: Store::new(),
            settings,
            last_seen: Instant::now(),
        }
    }

    /// Records activity on the session
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// Whether the session has gone unused for longer than `max_idle` at `now`
    pub fn is_idle(&self, now: Instant, max_idle: Duration) -> bool {
        now.saturating_duration_since(self.last_seen) > max_idle
    }
}

/// Core application state: per-session stores and the catalog they draw from
pub struct AppState {
    /// Sessions keyed by the `cart_session` cookie.
    /// A session's entry stays locked for the whole of one transition.
    pub sessions: DashMap<String, Session>,

    pub catalog: Arc<dyn Catalog>,

    pub config: AppConfig,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryCatalog::demo()), AppConfig::default())
    }
}

impl AppState {
    pub fn new(catalog: Arc<dyn Catalog>, config: AppConfig) -> Self {
        tracing::info!(
            products = catalog.products().len(),
            currency = config.default_currency.code(),
            "Initialising storefront state"
        );
        Self {
            sessions: DashMap::new(),
            catalog,
            config,
        }
    }

    /// Runs `f` against the session, creating it on first use
    pub fn with_session<R>(&self, session_id: &str, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut session = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(session_id, "Opening new session");
                self.new_session()
            });
        session.touch();
        f(&mut session)
    }

    /// Runs a fallible transition. A session that does not exist yet is only
    /// stored when `f` succeeds.
    pub fn try_with_session<R, E>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut Session) -> Result<R, E>,
    ) -> Result<R, E> {
        match self.sessions.entry(session_id.to_string()) {
            Entry::Occupied(mut entry) => {
                let session = entry.get_mut();
                session.touch();
                f(session)
            }
            Entry::Vacant(entry) => {
                let mut session = self.new_session();
                let result = f(&mut session)?;
                tracing::debug!(session_id, "Opening new session");
                entry.insert(session);
                Ok(result)
            }
        }
    }

    /// Runs `f` against the session without creating it. An unknown id sees
    /// a fresh session that is thrown away afterwards.
    pub fn read_session<R>(&self, session_id: &str, f: impl FnOnce(&Session) -> R) -> R {
        match self.sessions.get_mut(session_id) {
            Some(mut session) => {
                session.touch();
                f(&session)
            }
            None => f(&self.new_session()),
        }
    }

    fn new_session(&self) -> Session {
        Session::new(self.config.session_settings())
    }

    /// Drops every session idle for longer than `max_idle` at `now` and
    /// returns how many went
    pub fn evict_idle_sessions(&self, now: Instant, max_idle: Duration) -> usize {
        let mut evicted = 0;
        self.sessions.retain(|_, session| {
            let keep = !session.is_idle(now, max_idle);
            if !keep {
                evicted += 1;
            }
            keep
        });
        evicted
    }

    /// Looks up a catalog product, failing with `ProductNotFound`
    pub fn product(&self, product_id: ProductId) -> errors::Result<Product> {
        self.catalog
            .product(product_id)
            .ok_or(StorefrontError::ProductNotFound(product_id))
    }
}

/// Spawns the task that evicts idle sessions every `every`
pub fn spawn_session_sweeper(
    state: SharedState,
    every: Duration,
    max_idle: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let evicted = state.evict_idle_sessions(Instant::now(), max_idle);
            if evicted > 0 {
                tracing::info!(
                    evicted,
                    remaining = state.sessions.len(),
                    "Evicted idle sessions"
                );
            }
        }
    })
}
