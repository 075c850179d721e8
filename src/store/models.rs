//! Storefront Domain Models
//!
//! Catalog products, the cart line items built from them, and the request and
//! response shapes of the HTTP API.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::events::{Notification, StoreEvent};
use super::state::Store;
use crate::settings::{Currency, Settings};

/// Catalog identifier of a product
pub type ProductId = u64;

/// Monetary amount. Catalog prices are expressed in the base currency (AED).
pub type Money = Decimal;

// =============================================================================
// Catalog Models
// =============================================================================

/// Immutable catalog entry, owned by the catalog provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,

    /// Display name (plain or localized)
    pub name: String,

    /// URL of the display image
    #[serde(default)]
    pub image: String,

    /// Price in base currency
    pub price: Money,

    /// Pre-discount price, never below `price` when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Money>,

    /// Average rating in [0, 5]
    #[serde(default)]
    pub rating: f32,

    #[serde(default)]
    pub review_count: u32,

    /// Advertised discount percentage. Display data only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<u8>,

    #[serde(default)]
    pub free_shipping: bool,

    #[serde(default)]
    pub fast_delivery: bool,

    /// Listing category (e.g. "laptops")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Product {
    /// Creates a product with only the fields the cart needs; the rest default
    pub fn new(id: ProductId, name: impl Into<String>, price: Money) -> Self {
        Self {
            id,
            name: name.into(),
            image: String::new(),
            price,
            original_price: None,
            rating: 0.0,
            review_count: 0,
            discount: None,
            free_shipping: false,
            fast_delivery: false,
            category: None,
        }
    }

    /// First catalog rule the record breaks, if any: a non-negative price, a
    /// rating in [0, 5] and an original price no lower than the price
    pub fn invariant_violation(&self) -> Option<&'static str> {
        if self.price < Decimal::ZERO {
            return Some("price is negative");
        }
        if !(0.0..=5.0).contains(&self.rating) {
            return Some("rating is outside [0, 5]");
        }
        if self.original_price.is_some_and(|original| original < self.price) {
            return Some("original price is below price");
        }
        None
    }

    /// Whether the product is marked as on sale
    pub fn is_on_sale(&self) -> bool {
        self.discount.is_some_and(|d| d > 0)
    }

    /// Discount percentage implied by `original_price` and `price`, rounded to
    /// the nearest whole percent. `None` without a usable original price.
    pub fn derived_discount_percent(&self) -> Option<u8> {
        let original = self.original_price?;
        if original <= Decimal::ZERO || original < self.price {
            return None;
        }
        let percent = ((original - self.price) / original * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        percent.to_u8()
    }
}

// =============================================================================
// Cart Models
// =============================================================================

/// A product in the cart together with its quantity. `quantity >= 1` always.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,

    pub quantity: u32,
}

impl CartItem {
    pub(crate) fn new(product: Product) -> Self {
        Self {
            product,
            quantity: 1,
        }
    }

    pub fn id(&self) -> ProductId {
        self.product.id
    }

    pub fn name(&self) -> &str {
        &self.product.name
    }

    /// `price × quantity` in base currency
    pub fn line_total(&self) -> Money {
        self.product.price * Decimal::from(self.quantity)
    }
}

// =============================================================================
// API Models
// =============================================================================

/// Body of `POST /cart/items` and `POST /wishlist/items`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    pub product_id: ProductId,
}

/// Body of `PATCH /cart/items/:id`. Zero or negative removes the line item.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityInput {
    pub quantity: i64,
}

/// Body of `PUT /settings`
#[derive(Debug, Default, Deserialize)]
pub struct SettingsInput {
    pub currency: Option<Currency>,
    pub location: Option<String>,
}

/// Product as displayed, prices already converted to the session currency
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub display_price: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_original_price: Option<Money>,
    pub in_wishlist: bool,
}

impl ProductView {
    pub fn new(product: &Product, store: &Store, settings: &Settings) -> Self {
        Self {
            display_price: settings.convert_price(product.price),
            display_original_price: product.original_price.map(|p| settings.convert_price(p)),
            in_wishlist: store.is_in_wishlist(product.id),
            product: product.clone(),
        }
    }
}

/// One cart line as displayed
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    #[serde(flatten)]
    pub item: CartItem,
    pub unit_price: Money,
    pub line_total: Money,
}

/// Cart contents and aggregates in the session currency
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub total: Money,
    pub count: u64,
    pub line_count: usize,
    pub currency: Currency,
    pub currency_symbol: &'static str,
}

impl CartView {
    pub fn new(store: &Store, settings: &Settings) -> Self {
        Self {
            items: store
                .cart_items()
                .map(|item| CartLineView {
                    unit_price: settings.convert_price(item.product.price),
                    line_total: settings.convert_price(item.line_total()),
                    item: item.clone(),
                })
                .collect(),
            total: settings.convert_price(store.cart_total()),
            count: store.cart_count(),
            line_count: store.line_count(),
            currency: settings.currency(),
            currency_symbol: settings.currency_symbol(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WishlistView {
    pub items: Vec<ProductView>,
}

impl WishlistView {
    pub fn new(store: &Store, settings: &Settings) -> Self {
        Self {
            items: store
                .wishlist_items()
                .map(|product| ProductView::new(product, store, settings))
                .collect(),
        }
    }
}

/// Response of a mutating call: the new state plus the notifications it raised
#[derive(Debug, Serialize)]
pub struct MutationResponse<T> {
    #[serde(flatten)]
    pub view: T,
    pub notifications: Vec<Notification>,
}

impl<T> MutationResponse<T> {
    pub fn new(view: T, events: Vec<StoreEvent>) -> Self {
        Self {
            view,
            notifications: events.iter().map(StoreEvent::to_notification).collect(),
        }
    }
}
