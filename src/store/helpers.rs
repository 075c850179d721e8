//! Storefront Helpers
//!
//! Small pure functions shared by the handlers: session identification and
//! cart formatting.

use super::models::CartItem;
use axum::http::{header, HeaderMap};
use uuid::Uuid;

/// Name of the cookie carrying the shopping session id
pub const SESSION_COOKIE: &str = "cart_session";

/// Returns the session id from the `cart_session` cookie, or mints a new one.
///
/// Only UUIDs are accepted as ids; any other cookie value is ignored. The
/// boolean is `true` when the id was freshly created and the response must
/// set the cookie.
pub fn resolve_session_id(headers: &HeaderMap) -> (String, bool) {
    match session_from_cookies(headers) {
        Some(id) => (id, false),
        None => (new_session_id(), true),
    }
}

fn session_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::try_parse(value).ok())
        .map(|id| id.simple().to_string())
}

pub fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// `Set-Cookie` value for a freshly created session
pub fn session_cookie(session_id: &str) -> String {
    format!("{}={}; Path=/; HttpOnly", SESSION_COOKIE, session_id)
}

/// Produces a human-readable one-line summary for a list of cart items.
///
/// Example output: `"2x Laptop, 1x Mouse"`.
pub fn format_item_summary<'a>(items: impl IntoIterator<Item = &'a CartItem>) -> String {
    items
        .into_iter()
        .map(|i| format!("{}x {}", i.quantity, i.name()))
        .collect::<Vec<_>>()
        .join(", ")
}
