//! REST API handlers for the storefront
//!
//! Each request resolves the shopper's session from the `cart_session` cookie,
//! applies one transition to that session's store and answers with the
//! resulting view. Mutations also return the notifications they raised so the
//! front end can show toasts. Read-only endpoints never store a session; a
//! session is stored by the first mutation that succeeds.

use super::events::{NotificationSink, RecordingSink, Tee, TracingSink};
use super::helpers::{resolve_session_id, session_cookie};
use super::models::*;
use super::state::SharedState;
use crate::catalog::{list_products, max_price_bucket, ProductFilter, SortBy};
use crate::checkout::{Checkout, CheckoutStep, OrderQuote, ShippingInfo, ShippingMethod};
use crate::errors::Result;
use crate::settings::{Currency, Settings, DELIVERY_LOCATIONS};
use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{header, request::Parts, HeaderValue},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

/// Creates routes for store operations
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/items", post(add_to_cart))
        .route(
            "/cart/items/:id",
            patch(update_quantity).delete(remove_from_cart),
        )
        .route("/wishlist", get(get_wishlist))
        .route("/wishlist/items", post(add_to_wishlist))
        .route("/wishlist/items/:id", delete(remove_from_wishlist))
        .route("/settings", get(get_settings).put(update_settings))
        .route("/products", get(list_catalog))
        .route("/checkout/quote", post(checkout_quote))
        .route("/checkout", post(place_order))
}

// =============================================================================
// Session plumbing
// =============================================================================

/// Session id of the caller, and whether it was minted for this request
pub struct SessionId {
    pub id: String,
    pub is_new: bool,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SessionId {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let (id, is_new) = resolve_session_id(&parts.headers);
        Ok(SessionId { id, is_new })
    }
}

/// Serializes `body` and sets the session cookie for new sessions
fn respond(session: &SessionId, body: impl Serialize) -> Response {
    let mut response = Json(body).into_response();

    if session.is_new {
        match HeaderValue::from_str(&session_cookie(&session.id)) {
            Ok(cookie) => {
                response.headers_mut().insert(header::SET_COOKIE, cookie);
            }
            Err(e) => tracing::warn!(error = %e, "Could not encode session cookie"),
        }
    }

    response
}

/// Per-request sink: logs every event and keeps a copy for the response
struct RequestSink {
    recorded: RecordingSink,
}

impl RequestSink {
    fn new() -> Self {
        Self {
            recorded: RecordingSink::new(),
        }
    }

    fn sink(&self) -> Tee<'_, TracingSink, RecordingSink> {
        Tee {
            first: &TracingSink,
            second: &self.recorded,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// Endpoint: GET /cart
async fn get_cart(State(state): State<SharedState>, session: SessionId) -> Response {
    let view = state.read_session(&session.id, |s| CartView::new(&s.store, &s.settings));
    respond(&session, view)
}

/// Endpoint: POST /cart/items
/// Adds one unit of a catalog product, merging with an existing line.
async fn add_to_cart(
    State(state): State<SharedState>,
    session: SessionId,
    Json(payload): Json<ProductRef>,
) -> Result<Response> {
    let product = state.product(payload.product_id)?;
    let events = RequestSink::new();

    let view = state.with_session(&session.id, |s| {
        events.sink().notify(&s.store.add_to_cart(&product));
        CartView::new(&s.store, &s.settings)
    });

    Ok(respond(&session, MutationResponse::new(view, events.recorded.take())))
}

/// Endpoint: PATCH /cart/items/:id
async fn update_quantity(
    State(state): State<SharedState>,
    session: SessionId,
    Path(product_id): Path<ProductId>,
    Json(payload): Json<UpdateQuantityInput>,
) -> Response {
    let events = RequestSink::new();

    let view = state.with_session(&session.id, |s| {
        let event = s.store.update_quantity(product_id, payload.quantity);
        events.sink().notify_opt(event.as_ref());
        CartView::new(&s.store, &s.settings)
    });

    respond(&session, MutationResponse::new(view, events.recorded.take()))
}

/// Endpoint: DELETE /cart/items/:id
async fn remove_from_cart(
    State(state): State<SharedState>,
    session: SessionId,
    Path(product_id): Path<ProductId>,
) -> Response {
    let events = RequestSink::new();

    let view = state.with_session(&session.id, |s| {
        let event = s.store.remove_from_cart(product_id);
        events.sink().notify_opt(event.as_ref());
        CartView::new(&s.store, &s.settings)
    });

    respond(&session, MutationResponse::new(view, events.recorded.take()))
}

/// Endpoint: DELETE /cart
async fn clear_cart(State(state): State<SharedState>, session: SessionId) -> Response {
    let events = RequestSink::new();

    let view = state.with_session(&session.id, |s| {
        events.sink().notify(&s.store.clear_cart());
        CartView::new(&s.store, &s.settings)
    });

    respond(&session, MutationResponse::new(view, events.recorded.take()))
}

// =============================================================================
// Wishlist
// =============================================================================

/// Endpoint: GET /wishlist
async fn get_wishlist(State(state): State<SharedState>, session: SessionId) -> Response {
    let view = state.read_session(&session.id, |s| WishlistView::new(&s.store, &s.settings));
    respond(&session, view)
}

/// Endpoint: POST /wishlist/items
async fn add_to_wishlist(
    State(state): State<SharedState>,
    session: SessionId,
    Json(payload): Json<ProductRef>,
) -> Result<Response> {
    let product = state.product(payload.product_id)?;
    let events = RequestSink::new();

    let view = state.with_session(&session.id, |s| {
        events.sink().notify(&s.store.add_to_wishlist(&product));
        WishlistView::new(&s.store, &s.settings)
    });

    Ok(respond(&session, MutationResponse::new(view, events.recorded.take())))
}

/// Endpoint: DELETE /wishlist/items/:id
async fn remove_from_wishlist(
    State(state): State<SharedState>,
    session: SessionId,
    Path(product_id): Path<ProductId>,
) -> Response {
    let events = RequestSink::new();

    let view = state.with_session(&session.id, |s| {
        let event = s.store.remove_from_wishlist(product_id);
        events.sink().notify_opt(event.as_ref());
        WishlistView::new(&s.store, &s.settings)
    });

    respond(&session, MutationResponse::new(view, events.recorded.take()))
}

// =============================================================================
// Settings
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SettingsView {
    currency: Currency,
    currency_symbol: &'static str,
    exchange_rate: Decimal,
    location: String,
    locations: [&'static str; 7],
}

impl SettingsView {
    fn new(settings: &Settings) -> Self {
        Self {
            currency: settings.currency(),
            currency_symbol: settings.currency_symbol(),
            exchange_rate: settings.exchange_rate(),
            location: settings.location().to_string(),
            locations: DELIVERY_LOCATIONS,
        }
    }
}

/// Endpoint: GET /settings
async fn get_settings(State(state): State<SharedState>, session: SessionId) -> Response {
    let view = state.read_session(&session.id, |s| SettingsView::new(&s.settings));
    respond(&session, view)
}

/// Endpoint: PUT /settings
/// Switches display currency and/or delivery location.
async fn update_settings(
    State(state): State<SharedState>,
    session: SessionId,
    Json(payload): Json<SettingsInput>,
) -> Response {
    let view = state.with_session(&session.id, |s| {
        if let Some(currency) = payload.currency {
            tracing::debug!(currency = currency.code(), "Switching currency");
            s.settings.set_currency(currency);
        }
        if let Some(location) = payload.location {
            s.settings.set_location(location);
        }
        SettingsView::new(&s.settings)
    });
    respond(&session, view)
}

// =============================================================================
// Catalog
// =============================================================================

/// Query of `GET /products`; `categories` is comma separated
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ListQuery {
    sort: SortBy,
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
    categories: Option<String>,
    min_rating: Option<f32>,
    free_shipping: bool,
    fast_delivery: bool,
    on_sale: bool,
}

impl ListQuery {
    fn filter(&self) -> ProductFilter {
        ProductFilter {
            min_price: self.min_price,
            max_price: self.max_price,
            categories: self
                .categories
                .iter()
                .flat_map(|c| c.split(','))
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect(),
            min_rating: self.min_rating.unwrap_or(0.0),
            free_shipping: self.free_shipping,
            fast_delivery: self.fast_delivery,
            on_sale: self.on_sale,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductListView {
    products: Vec<ProductView>,
    /// Price slider ceiling, base currency
    max_price: Decimal,
}

/// Endpoint: GET /products
async fn list_catalog(
    State(state): State<SharedState>,
    session: SessionId,
    Query(query): Query<ListQuery>,
) -> Response {
    let all = state.catalog.products();
    let max_price = max_price_bucket(&all);
    let listed = list_products(all, &query.filter(), query.sort);

    let products: Vec<ProductView> = state.read_session(&session.id, |s| {
        listed
            .iter()
            .map(|p| ProductView::new(p, &s.store, &s.settings))
            .collect()
    });

    respond(
        &session,
        ProductListView {
            products,
            max_price,
        },
    )
}

// =============================================================================
// Checkout
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteInput {
    #[serde(default)]
    shipping_method: ShippingMethod,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutInput {
    #[serde(default)]
    shipping_method: ShippingMethod,
    shipping_info: ShippingInfo,
}

/// Quote converted to the session currency
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QuoteView {
    subtotal: Decimal,
    shipping: Decimal,
    total: Decimal,
    currency: Currency,
    currency_symbol: &'static str,
}

impl QuoteView {
    fn new(quote: &OrderQuote, settings: &Settings) -> Self {
        Self {
            subtotal: settings.convert_price(quote.subtotal),
            shipping: settings.convert_price(quote.shipping),
            total: settings.convert_price(quote.total),
            currency: settings.currency(),
            currency_symbol: settings.currency_symbol(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderView {
    order_number: String,
    step: CheckoutStep,
    lines: Vec<CartLineView>,
    shipping_method: ShippingMethod,
    #[serde(flatten)]
    quote: QuoteView,
}

/// Endpoint: POST /checkout/quote
async fn checkout_quote(
    State(state): State<SharedState>,
    session: SessionId,
    Json(payload): Json<QuoteInput>,
) -> Response {
    let mut checkout = Checkout::new(state.config.express_shipping_fee);
    checkout.set_shipping_method(payload.shipping_method);

    let view = state.read_session(&session.id, |s| {
        QuoteView::new(&checkout.quote(&s.store), &s.settings)
    });
    respond(&session, view)
}

/// Endpoint: POST /checkout
/// Runs the whole checkout flow for the session's cart and places the order.
async fn place_order(
    State(state): State<SharedState>,
    session: SessionId,
    Json(payload): Json<CheckoutInput>,
) -> Result<Response> {
    let events = RequestSink::new();
    let mut checkout = Checkout::new(state.config.express_shipping_fee);
    checkout.set_shipping_method(payload.shipping_method);

    let view = state.try_with_session(&session.id, |s| -> Result<OrderView> {
        checkout.proceed_to_shipping(&s.store)?;
        checkout.submit_shipping(payload.shipping_info)?;
        let order = checkout.place_order(&mut s.store, &events.sink())?.clone();

        Ok(OrderView {
            order_number: order.order_number.clone(),
            step: checkout.step(),
            lines: order
                .lines
                .iter()
                .map(|item| CartLineView {
                    unit_price: s.settings.convert_price(item.product.price),
                    line_total: s.settings.convert_price(item.line_total()),
                    item: item.clone(),
                })
                .collect(),
            shipping_method: order.shipping_method,
            quote: QuoteView::new(&order.quote, &s.settings),
        })
    })?;

    Ok(respond(&session, MutationResponse::new(view, events.recorded.take())))
}
