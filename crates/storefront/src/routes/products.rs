//! Product grid route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use cardapio_core::{ALL_CATEGORIES, Product, ProductFilter};
use serde::Deserialize;
use tracing::instrument;

use crate::catalog::CatalogStatus;
use crate::state::AppState;

/// Shown instead of a price for products priced per variant.
const VARIABLE_PRICE_LABEL: &str = "A partir de";

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image: String,
    /// `false` for products without a price; they cannot be added online.
    pub orderable: bool,
    pub has_options: bool,
    pub options_title: String,
    pub variants: Vec<String>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        let (options_title, variants) = product
            .options
            .as_ref()
            .map(|options| (options.title.clone(), options.flavors.clone()))
            .unwrap_or_default();

        let unit_price = product.unit_price();

        Self {
            id: product.id.as_i32(),
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: unit_price.map_or_else(|| VARIABLE_PRICE_LABEL.to_string(), |p| p.to_string()),
            image: product.image.clone(),
            orderable: unit_price.is_some(),
            has_options: product.options.is_some(),
            options_title,
            variants,
        }
    }
}

/// One button of the category filter.
#[derive(Clone)]
pub struct CategoryView {
    pub label: String,
    pub href: String,
    pub active: bool,
}

/// Everything the product grid renders from.
#[derive(Clone)]
pub struct ProductGridView {
    /// `false` when the catalog failed to load.
    pub available: bool,
    pub products: Vec<ProductView>,
    pub categories: Vec<CategoryView>,
    pub search_term: String,
    pub active_category: String,
}

impl ProductGridView {
    /// Project the catalog through `filter` into display data.
    #[must_use]
    pub fn render(status: &CatalogStatus, filter: &ProductFilter) -> Self {
        let active_category = filter.active_category().to_string();
        let Some(catalog) = status.catalog() else {
            return Self {
                available: false,
                products: Vec::new(),
                categories: Vec::new(),
                search_term: String::new(),
                active_category,
            };
        };

        let categories = catalog
            .categories()
            .into_iter()
            .map(|label| CategoryView {
                href: category_href(&label),
                active: label == active_category,
                label,
            })
            .collect();

        Self {
            available: true,
            products: catalog
                .filter(filter)
                .into_iter()
                .map(ProductView::from)
                .collect(),
            categories,
            search_term: filter.search_term().to_string(),
            active_category,
        }
    }
}

fn category_href(label: &str) -> String {
    if label == ALL_CATEGORIES {
        "/".to_string()
    } else {
        format!("/?category={}", urlencoding::encode(label))
    }
}

/// Grid query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub q: Option<String>,
    pub category: Option<String>,
}

impl ProductQuery {
    #[must_use]
    pub fn filter(&self) -> ProductFilter {
        ProductFilter::from_params(self.q.as_deref(), self.category.as_deref())
    }
}

/// Product grid fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/product_grid.html")]
pub struct ProductGridTemplate {
    pub grid: ProductGridView,
}

/// Render the filtered product grid (HTMX search).
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> impl IntoResponse {
    ProductGridTemplate {
        grid: ProductGridView::render(state.catalog(), &query.filter()),
    }
}
