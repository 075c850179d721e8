//! Store Notifications
//!
//! Every mutation of the store describes what happened as a [`StoreEvent`].
//! Turning an event into a toast or snackbar is the presentation layer's job;
//! the store only hands events to a [`NotificationSink`].

use super::models::ProductId;
use serde::Serialize;
use std::sync::Mutex;

/// How the presentation layer should style a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
}

/// Semantic description of a completed store transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreEvent {
    /// A new line item was created with quantity 1
    CartItemAdded { product_id: ProductId, name: String },

    /// An existing line item was merged into (quantity + 1)
    CartQuantityIncremented {
        product_id: ProductId,
        name: String,
        quantity: u32,
    },

    /// A line item's quantity was set to an absolute value
    CartQuantityUpdated {
        product_id: ProductId,
        name: String,
        quantity: u32,
    },

    CartItemRemoved { product_id: ProductId, name: String },

    CartCleared,

    WishlistItemAdded { product_id: ProductId, name: String },

    /// Add was a no-op because the product is already wishlisted
    WishlistItemAlreadyPresent { product_id: ProductId, name: String },

    WishlistItemRemoved { product_id: ProductId, name: String },

    OrderPlaced { order_number: String },
}

impl StoreEvent {
    /// Human-readable message for a toast
    pub fn message(&self) -> String {
        match self {
            StoreEvent::CartItemAdded { name, .. } => format!("Added {} to the cart", name),
            StoreEvent::CartQuantityIncremented { name, quantity, .. } => {
                format!("Updated quantity of {} in the cart ({})", name, quantity)
            }
            StoreEvent::CartQuantityUpdated { name, quantity, .. } => {
                format!("Quantity of {} set to {}", name, quantity)
            }
            StoreEvent::CartItemRemoved { name, .. } => format!("Removed {} from the cart", name),
            StoreEvent::CartCleared => "Cart cleared".to_string(),
            StoreEvent::WishlistItemAdded { name, .. } => {
                format!("Added {} to the wishlist", name)
            }
            StoreEvent::WishlistItemAlreadyPresent { name, .. } => {
                format!("{} is already in the wishlist", name)
            }
            StoreEvent::WishlistItemRemoved { name, .. } => {
                format!("Removed {} from the wishlist", name)
            }
            StoreEvent::OrderPlaced { order_number } => {
                format!("Order {} confirmed", order_number)
            }
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            StoreEvent::CartItemAdded { .. }
            | StoreEvent::CartQuantityIncremented { .. }
            | StoreEvent::WishlistItemAdded { .. }
            | StoreEvent::OrderPlaced { .. } => Severity::Success,
            StoreEvent::CartQuantityUpdated { .. }
            | StoreEvent::CartItemRemoved { .. }
            | StoreEvent::CartCleared
            | StoreEvent::WishlistItemAlreadyPresent { .. }
            | StoreEvent::WishlistItemRemoved { .. } => Severity::Info,
        }
    }

    /// Event plus its rendered message, as sent to the front end
    pub fn to_notification(&self) -> Notification {
        Notification {
            event: self.clone(),
            message: self.message(),
            severity: self.severity(),
        }
    }
}

/// Wire form of an event for the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    #[serde(flatten)]
    pub event: StoreEvent,
    pub message: String,
    pub severity: Severity,
}

// =============================================================================
// Sinks
// =============================================================================

/// Receiver of store events (toast layer, log, test recorder)
pub trait NotificationSink {
    fn notify(&self, event: &StoreEvent);

    /// Forwards an optional event; no-op transitions produce `None`
    fn notify_opt(&self, event: Option<&StoreEvent>) {
        if let Some(event) = event {
            self.notify(event);
        }
    }
}

/// Logs every event through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, event: &StoreEvent) {
        tracing::info!(
            severity = ?event.severity(),
            event = ?event,
            "{}",
            event.message()
        );
    }
}

/// Collects events in memory, in emission order
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<StoreEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains and returns everything recorded so far
    pub fn take(&self) -> Vec<StoreEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, event: &StoreEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

/// Fans out to two sinks, `first` before `second`
pub struct Tee<'a, A: ?Sized, B: ?Sized> {
    pub first: &'a A,
    pub second: &'a B,
}

impl<A, B> NotificationSink for Tee<'_, A, B>
where
    A: NotificationSink + ?Sized,
    B: NotificationSink + ?Sized,
{
    fn notify(&self, event: &StoreEvent) {
        self.first.notify(event);
        self.second.notify(event);
    }
}
