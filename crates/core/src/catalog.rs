//! Product catalog, category derivation and product filtering.
//!
//! The catalog is read-only once loaded. Filtering never reorders products:
//! results always follow the order of the source list.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// Synthetic category label that selects every product.
pub const ALL_CATEGORIES: &str = "Todos";

/// A product as published by the catalog source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price. Absent for products priced per variant ("a partir de").
    #[serde(default)]
    pub price: Option<Decimal>,
    pub category: String,
    /// Image reference (URL or path relative to the site root).
    #[serde(rename = "img")]
    pub image: String,
    #[serde(default)]
    pub options: Option<ProductOptions>,
}

/// Selectable variants of a product (e.g., flavors).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOptions {
    /// Label shown above the variant selector.
    pub title: String,
    /// Variant labels in display order.
    #[serde(default)]
    pub flavors: Vec<String>,
}

impl Product {
    /// Unit price in the default currency, if the product has one.
    #[must_use]
    pub fn unit_price(&self) -> Option<Price> {
        self.price.map(Price::from_amount)
    }

    /// Variant labels offered for this product, empty when it has none.
    #[must_use]
    pub fn variants(&self) -> &[String] {
        match &self.options {
            Some(options) => &options.flavors,
            None => &[],
        }
    }

    /// Whether `label` is one of this product's variants.
    #[must_use]
    pub fn has_variant(&self, label: &str) -> bool {
        self.variants().iter().any(|v| v == label)
    }

    /// Case-insensitive substring match on name or description.
    ///
    /// `needle` must already be lowercased.
    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle))
    }
}

/// The in-memory product set for one running storefront.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    #[must_use]
    pub const fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Parse a catalog from a JSON array of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not a JSON array of products.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes).map(Self::new)
    }

    /// All products in source order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Look up a product by ID. The first match wins if IDs repeat.
    #[must_use]
    pub fn find(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Category labels for the filter control, `ALL_CATEGORIES` first.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        derive_categories(&self.products)
    }

    /// Products whose name or description contains `term`, ignoring case.
    ///
    /// A blank term returns every product. Otherwise the term is matched as
    /// typed, surrounding whitespace included.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&Product> {
        if term.trim().is_empty() {
            return self.products.iter().collect();
        }
        let needle = term.to_lowercase();
        self.products.iter().filter(|p| p.matches(&needle)).collect()
    }

    /// Products with exactly this category label.
    ///
    /// `ALL_CATEGORIES` returns every product.
    #[must_use]
    pub fn in_category(&self, category: &str) -> Vec<&Product> {
        if category == ALL_CATEGORIES {
            return self.products.iter().collect();
        }
        self.products
            .iter()
            .filter(|p| p.category == category)
            .collect()
    }

    /// Apply a [`ProductFilter`].
    #[must_use]
    pub fn filter(&self, filter: &ProductFilter) -> Vec<&Product> {
        match filter {
            ProductFilter::All => self.products.iter().collect(),
            ProductFilter::Search(term) => self.search(term),
            ProductFilter::Category(category) => self.in_category(category),
        }
    }
}

/// Distinct category labels in first-seen order, with `ALL_CATEGORIES`
/// prepended.
#[must_use]
pub fn derive_categories(products: &[Product]) -> Vec<String> {
    let mut categories = vec![ALL_CATEGORIES.to_string()];
    for product in products {
        if !categories.contains(&product.category) {
            categories.push(product.category.clone());
        }
    }
    categories
}

/// The filter currently applied to the product grid.
///
/// Search and category selection are mutually exclusive: choosing a category
/// drops the search term, and searching resets the category to
/// `ALL_CATEGORIES`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProductFilter {
    #[default]
    All,
    Search(String),
    Category(String),
}

impl ProductFilter {
    /// Build the filter from the `q` and `category` request parameters.
    ///
    /// A specific category takes precedence over a search term when both are
    /// present.
    #[must_use]
    pub fn from_params(search: Option<&str>, category: Option<&str>) -> Self {
        match (search, category.map(str::trim)) {
            (_, Some(category)) if !category.is_empty() && category != ALL_CATEGORIES => {
                Self::Category(category.to_string())
            }
            (Some(term), _) if !term.trim().is_empty() => Self::Search(term.to_string()),
            _ => Self::All,
        }
    }

    /// The category button that should render as selected.
    #[must_use]
    pub fn active_category(&self) -> &str {
        match self {
            Self::Category(category) => category,
            Self::All | Self::Search(_) => ALL_CATEGORIES,
        }
    }

    /// The search term to echo back into the search input.
    #[must_use]
    pub fn search_term(&self) -> &str {
        match self {
            Self::Search(term) => term,
            Self::All | Self::Category(_) => "",
        }
    }
}
