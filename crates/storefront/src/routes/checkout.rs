//! Checkout route handlers.
//!
//! The checkout form collects the delivery address and payment method, builds
//! the order message and redirects the customer to the messaging deep link.
//! The cart is discarded once the link is issued; nothing confirms delivery.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use cardapio_core::{HandoffLink, OrderError, OrderRequest, PaymentMethod, build_order_message};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::{clear_cart, load_cart};
use crate::routes::cart::CartView;
use crate::state::AppState;

/// Checkout form data.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub reference: String,
    pub payment: Option<String>,
    #[serde(default)]
    pub observations: String,
}

impl CheckoutForm {
    /// Convert into an order request.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::UnknownPaymentMethod` if the payment value is not
    /// one of [`PaymentMethod::ALL`]. A missing or blank payment value is
    /// left for [`OrderRequest::validate`] to report.
    pub fn to_request(&self) -> std::result::Result<OrderRequest, OrderError> {
        let payment_method = self
            .payment
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::parse::<PaymentMethod>)
            .transpose()?;

        Ok(OrderRequest {
            address: self.address.clone(),
            reference: Some(self.reference.clone()),
            payment_method,
            observations: Some(self.observations.clone()),
        })
    }

    fn selected_payment(&self) -> Option<PaymentMethod> {
        self.payment.as_deref().and_then(|value| value.parse().ok())
    }
}

/// A payment radio button.
#[derive(Clone)]
pub struct PaymentOptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub checked: bool,
}

fn payment_options(selected: Option<PaymentMethod>) -> Vec<PaymentOptionView> {
    PaymentMethod::ALL
        .into_iter()
        .map(|method| PaymentOptionView {
            value: method.as_str(),
            label: method.label(),
            checked: selected == Some(method),
        })
        .collect()
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub store_name: String,
    pub cart_count: u32,
    pub cart: CartView,
    pub address: String,
    pub reference: String,
    pub observations: String,
    pub payment_options: Vec<PaymentOptionView>,
    /// Validation message; empty when there is none.
    pub error: String,
}

/// Display the checkout form. An empty cart goes back to the cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Response> {
    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    Ok(CheckoutTemplate {
        store_name: state.config().order.store_name.clone(),
        cart_count: cart.totals().item_count,
        cart: CartView::from(&cart),
        address: String::new(),
        reference: String::new(),
        observations: String::new(),
        payment_options: payment_options(None),
        error: String::new(),
    }
    .into_response())
}

/// Build the order and hand it off.
///
/// Redirects (303) to the messaging deep link on success. Validation
/// failures re-render the form with the message and status 422.
#[instrument(skip(state, session))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let cart = load_cart(&session).await?;
    let order = &state.config().order;

    let message = form
        .to_request()
        .and_then(|request| build_order_message(&cart, &request, &order.store_name));

    match message {
        Ok(message) => {
            let link = HandoffLink::new(&order.destination, &message);
            clear_cart(&session).await?;

            let totals = cart.totals();
            tracing::info!(
                lines = cart.lines().len(),
                items = totals.item_count,
                total = %totals.total,
                "Order handed off"
            );
            add_breadcrumb("checkout", "Order handed off", None);

            Ok(Redirect::to(link.as_str()).into_response())
        }
        Err(OrderError::EmptyCart) => Ok(Redirect::to("/cart").into_response()),
        Err(e) if e.is_validation() => {
            tracing::debug!(error = %e, "Checkout rejected");
            let page = CheckoutTemplate {
                store_name: order.store_name.clone(),
                cart_count: cart.totals().item_count,
                cart: CartView::from(&cart),
                address: form.address.clone(),
                reference: form.reference.clone(),
                observations: form.observations.clone(),
                payment_options: payment_options(form.selected_payment()),
                error: e.to_string(),
            };
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
        Err(e) => Err(AppError::Internal(e.to_string())),
    }
}
