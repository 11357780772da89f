//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Every mutation loads the session cart, applies the change, stores it back
//! and re-renders the whole cart fragment from the new state.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse},
};
use cardapio_core::{Cart, CartLine, LineKey, ProductId, QuantityChange};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::{load_cart, store_cart};
use crate::state::AppState;

/// HTMX event fired after the cart changes, refreshing the count badge.
const CART_UPDATED_TRIGGER: (&str, &str) = ("HX-Trigger", "cart-updated");

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub key: String,
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub item_count: u32,
    pub is_empty: bool,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            key: line.key.to_string(),
            name: line.name.clone(),
            quantity: line.quantity(),
            price: line.unit_price.to_string(),
            line_price: line.line_total().to_string(),
            image: line.image.clone(),
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        let totals = cart.totals();
        Self {
            items: cart.lines().iter().map(CartItemView::from).collect(),
            total: totals.total.to_string(),
            item_count: totals.item_count,
            is_empty: cart.is_empty(),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub variant: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_key: String,
    pub delta: i32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_key: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub store_name: String,
    pub cart_count: u32,
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let cart = load_cart(&session).await?;

    Ok(CartShowTemplate {
        store_name: state.config().order.store_name.clone(),
        cart_count: cart.totals().item_count,
        cart: CartView::from(&cart),
    })
}

/// Add item to cart (HTMX).
///
/// Unknown products, unknown variants and unpriced products are logged and
/// ignored; the response is the unchanged count.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<impl IntoResponse> {
    let catalog = state
        .catalog()
        .catalog()
        .ok_or(AppError::CatalogUnavailable)?;
    let mut cart = load_cart(&session).await?;

    match cart.add(catalog, form.product_id, form.variant.as_deref()) {
        Ok(key) => {
            store_cart(&session, &cart).await?;
            tracing::debug!(line_key = %key, "Added to cart");
            add_breadcrumb("cart", "Added to cart", Some(&[("line_key", key.as_str())]));
        }
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring add to cart");
        }
    }

    Ok((
        AppendHeaders([CART_UPDATED_TRIGGER]),
        CartCountTemplate {
            count: cart.totals().item_count,
        },
    ))
}

/// Change a line's quantity by a signed delta (HTMX).
#[instrument(skip(session))]
pub async fn update(session: Session, Form(form): Form<UpdateCartForm>) -> Result<impl IntoResponse> {
    let mut cart = load_cart(&session).await?;
    let key = LineKey::from(form.line_key);

    match cart.change_quantity(&key, form.delta) {
        QuantityChange::NotInCart => {
            tracing::debug!(line_key = %key, "Quantity change for missing line");
        }
        change => {
            store_cart(&session, &cart).await?;
            tracing::debug!(line_key = %key, ?change, "Cart quantity changed");
        }
    }

    Ok((
        AppendHeaders([CART_UPDATED_TRIGGER]),
        CartItemsTemplate {
            cart: CartView::from(&cart),
        },
    ))
}

/// Remove item from cart (HTMX).
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<impl IntoResponse> {
    let mut cart = load_cart(&session).await?;
    let key = LineKey::from(form.line_key);

    if cart.remove(&key) {
        store_cart(&session, &cart).await?;
        tracing::debug!(line_key = %key, "Removed from cart");
    }

    Ok((
        AppendHeaders([CART_UPDATED_TRIGGER]),
        CartItemsTemplate {
            cart: CartView::from(&cart),
        },
    ))
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<impl IntoResponse> {
    let cart = load_cart(&session).await?;

    Ok(CartCountTemplate {
        count: cart.totals().item_count,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cardapio_core::Catalog;

    use super::*;

    #[test]
    fn test_cart_view_from_cart() {
        let catalog = Catalog::from_json(
            br#"[
                {"id": 1, "name": "X-Burguer", "price": 10, "category": "Lanches", "img": "a.jpg"},
                {"id": 2, "name": "Milkshake", "price": 5.5, "category": "Bebidas", "img": "b.jpg",
                 "options": {"title": "Sabor", "flavors": ["Doce de Leite"]}}
            ]"#,
        )
        .unwrap();
        let mut cart = Cart::new();
        cart.add(&catalog, ProductId::new(1), None).unwrap();
        cart.add(&catalog, ProductId::new(1), None).unwrap();
        cart.add(&catalog, ProductId::new(2), Some("Doce de Leite"))
            .unwrap();

        let view = CartView::from(&cart);
        assert!(!view.is_empty);
        assert_eq!(view.item_count, 3);
        assert_eq!(view.total, "R$ 25.50");

        let keys: Vec<&str> = view.items.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, ["1", "2-Doce-de-Leite"]);

        let burger = view.items.first().unwrap();
        assert_eq!(burger.price, "R$ 10.00");
        assert_eq!(burger.line_price, "R$ 20.00");
        assert_eq!(burger.quantity, 2);
    }

    #[test]
    fn test_empty_cart_view() {
        let view = CartView::from(&Cart::new());
        assert!(view.is_empty);
        assert_eq!(view.total, "R$ 0.00");
        assert_eq!(view.item_count, 0);
    }
}
