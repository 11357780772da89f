//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::models::load_cart;
use crate::routes::products::{ProductGridView, ProductQuery};
use crate::state::AppState;

/// Home page template: search box, category filter and product grid.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub store_name: String,
    pub cart_count: u32,
    pub grid: ProductGridView,
}

/// Display the home page.
#[instrument(skip(state, session))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse> {
    let cart = load_cart(&session).await?;

    Ok(HomeTemplate {
        store_name: state.config().order.store_name.clone(),
        cart_count: cart.totals().item_count,
        grid: ProductGridView::render(state.catalog(), &query.filter()),
    })
}
