//! Product Catalog
//!
//! Read-only source of [`Product`] records plus the listing-page filter and
//! sort rules.

use crate::store::models::{Money, Product, ProductId};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashSet;

/// Supplies catalog products to the store
pub trait Catalog: Send + Sync {
    fn product(&self, id: ProductId) -> Option<Product>;

    /// All products in listing order
    fn products(&self) -> Vec<Product>;
}

/// Catalog held in memory, in insertion order
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: IndexMap<ProductId, Product>,
}

impl InMemoryCatalog {
    /// Builds a catalog; a later product replaces an earlier one with the same
    /// id. Records that break a catalog rule are skipped.
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products
            .into_iter()
            .filter(|p| match p.invariant_violation() {
                Some(reason) => {
                    tracing::warn!(
                        product_id = p.id,
                        reason,
                        "Skipping invalid catalog product"
                    );
                    false
                }
                None => true,
            })
            .map(|p| (p.id, p))
            .collect();
        Self { products }
    }

    /// Small demonstration catalog used by the binary
    pub fn demo() -> Self {
        let mut products = vec![
            demo_product(
                1,
                "Apple MacBook Air 13 M3",
                4599,
                Some(4999),
                4.8,
                1250,
                "laptops",
            ),
            demo_product(
                2,
                "Samsung Galaxy S24 Ultra",
                4299,
                Some(5099),
                4.7,
                3400,
                "phones",
            ),
            demo_product(
                3,
                "Sony WH-1000XM5",
                1199,
                Some(1499),
                4.6,
                2100,
                "headphones",
            ),
            demo_product(
                4,
                "NVIDIA GeForce RTX 4070 Super",
                2699,
                None,
                4.9,
                860,
                "graphicsCards",
            ),
            demo_product(
                5,
                "AMD Ryzen 7 7800X3D",
                1649,
                Some(1899),
                4.9,
                1530,
                "processors",
            ),
            demo_product(
                6,
                "LG UltraGear 27\" 165Hz",
                999,
                Some(1299),
                4.5,
                740,
                "monitors",
            ),
            demo_product(
                7,
                "Samsung 990 PRO 2TB",
                749,
                None,
                4.8,
                2900,
                "storage",
            ),
            demo_product(
                8,
                "Apple Watch Series 9",
                1599,
                Some(1699),
                4.6,
                1180,
                "smartwatches",
            ),
        ];
        for product in &mut products {
            product.discount = product.derived_discount_percent();
            product.free_shipping = product.price >= Decimal::from(1000);
            product.fast_delivery = product.id % 2 == 1;
        }
        Self::new(products)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

fn demo_product(
    id: ProductId,
    name: &str,
    price: i64,
    original_price: Option<i64>,
    rating: f32,
    review_count: u32,
    category: &str,
) -> Product {
    Product {
        image: format!("/images/products/{}.jpg", id),
        original_price: original_price.map(Decimal::from),
        rating,
        review_count,
        category: Some(category.to_string()),
        ..Product::new(id, name, Decimal::from(price))
    }
}

impl Catalog for InMemoryCatalog {
    fn product(&self, id: ProductId) -> Option<Product> {
        self.products.get(&id).cloned()
    }

    fn products(&self) -> Vec<Product> {
        self.products.values().cloned().collect()
    }
}

// =============================================================================
// Filtering and sorting
// =============================================================================

/// Listing filters. An unset field lets every product through.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    /// Inclusive lower price bound, base currency
    pub min_price: Option<Money>,
    /// Inclusive upper price bound, base currency
    pub max_price: Option<Money>,
    /// Empty means all categories
    pub categories: HashSet<String>,
    /// Only applied when above zero
    pub min_rating: f32,
    pub free_shipping: bool,
    pub fast_delivery: bool,
    pub on_sale: bool,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if self.min_price.is_some_and(|min| product.price < min)
            || self.max_price.is_some_and(|max| product.price > max)
        {
            return false;
        }
        if !self.categories.is_empty()
            && !product
                .category
                .as_ref()
                .is_some_and(|c| self.categories.contains(c))
        {
            return false;
        }
        if self.min_rating > 0.0 && product.rating < self.min_rating {
            return false;
        }
        if self.free_shipping && !product.free_shipping {
            return false;
        }
        if self.fast_delivery && !product.fast_delivery {
            return false;
        }
        if self.on_sale && !product.is_on_sale() {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortBy {
    /// Most reviewed first
    #[default]
    Popular,
    PriceLow,
    PriceHigh,
    Rating,
    /// Highest id first
    Newest,
}

impl SortBy {
    pub fn sort(self, products: &mut [Product]) {
        match self {
            SortBy::Popular => products.sort_by(|a, b| b.review_count.cmp(&a.review_count)),
            SortBy::PriceLow => products.sort_by(|a, b| a.price.cmp(&b.price)),
            SortBy::PriceHigh => products.sort_by(|a, b| b.price.cmp(&a.price)),
            SortBy::Rating => products.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
            SortBy::Newest => products.sort_by(|a, b| b.id.cmp(&a.id)),
        }
    }
}

/// Filters then sorts `products` for a listing page
pub fn list_products(products: Vec<Product>, filter: &ProductFilter, sort: SortBy) -> Vec<Product> {
    let mut listed: Vec<_> = products.into_iter().filter(|p| filter.matches(p)).collect();
    sort.sort(&mut listed);
    listed
}

/// Upper bound for the price slider: the highest price rounded up to the next
/// thousand
pub fn max_price_bucket<'a>(products: impl IntoIterator<Item = &'a Product>) -> Money {
    let thousand = Decimal::ONE_THOUSAND;
    products
        .into_iter()
        .map(|p| p.price)
        .max()
        .map(|max| (max / thousand).ceil() * thousand)
        .unwrap_or(Decimal::ZERO)
}
