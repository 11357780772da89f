//! Order serialization and the messaging handoff link.
//!
//! The order is delivered as a WhatsApp-formatted text message through a
//! `wa.me` deep link. Building the link is the last thing this crate does;
//! delivery is not observed.

use std::fmt::{self, Write as _};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::Cart;

/// Base URL of the messaging deep link.
const HANDOFF_BASE_URL: &str = "https://wa.me";

/// Characters `urlencoding` escapes that a URI component may carry as-is.
const URI_COMPONENT_MARKS: [(&str, &str); 5] = [
    ("%21", "!"),
    ("%27", "'"),
    ("%28", "("),
    ("%29", ")"),
    ("%2A", "*"),
];

/// Reasons an order message cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("Por favor, informe seu endereço.")]
    MissingAddress,
    #[error("Por favor, escolha a forma de pagamento.")]
    MissingPaymentMethod,
    #[error("Forma de pagamento desconhecida: {0}")]
    UnknownPaymentMethod(String),
    #[error("O carrinho está vazio.")]
    EmptyCart,
    #[error("Invalid destination number: {0:?}")]
    InvalidDestination(String),
}

impl OrderError {
    /// Whether the customer can fix this by correcting the checkout form.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingAddress | Self::MissingPaymentMethod | Self::UnknownPaymentMethod(_)
        )
    }
}

/// Payment methods offered at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Pix,
    Cartao,
    Dinheiro,
}

impl PaymentMethod {
    /// Every method, in the order the form lists them.
    pub const ALL: [Self; 3] = [Self::Pix, Self::Cartao, Self::Dinheiro];

    /// Form value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pix => "pix",
            Self::Cartao => "cartao",
            Self::Dinheiro => "dinheiro",
        }
    }

    /// Label shown to the customer and written into the order.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pix => "Pix",
            Self::Cartao => "Cartão",
            Self::Dinheiro => "Dinheiro",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentMethod {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        Self::ALL
            .into_iter()
            .find(|method| {
                method.as_str().eq_ignore_ascii_case(value) || method.label() == value
            })
            .ok_or_else(|| OrderError::UnknownPaymentMethod(value.to_string()))
    }
}

/// Checkout details collected from the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderRequest {
    pub address: String,
    pub reference: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub observations: Option<String>,
}

impl OrderRequest {
    /// Check the required fields without building anything.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::MissingAddress` for a blank address and
    /// `OrderError::MissingPaymentMethod` when no method was chosen.
    pub fn validate(&self) -> Result<PaymentMethod, OrderError> {
        if self.address.trim().is_empty() {
            return Err(OrderError::MissingAddress);
        }
        self.payment_method.ok_or(OrderError::MissingPaymentMethod)
    }
}

/// Render the order text sent to the shop.
///
/// # Errors
///
/// Returns the first failing check of [`OrderRequest::validate`], or
/// `OrderError::EmptyCart` when there is nothing to order.
pub fn build_order_message(
    cart: &Cart,
    request: &OrderRequest,
    store_name: &str,
) -> Result<String, OrderError> {
    let payment_method = request.validate()?;
    if cart.is_empty() {
        return Err(OrderError::EmptyCart);
    }

    let mut message = format!("*🍔 NOVO PEDIDO - {store_name} 🍔*\n\n*Itens do Pedido:*\n");
    for line in cart.lines() {
        let _ = writeln!(
            message,
            "{}x {} - {}",
            line.quantity(),
            line.name,
            line.line_total()
        );
    }

    let _ = write!(
        message,
        "\n*Total:* {}\n\n*Endereço de Entrega:*\n{}\n",
        cart.totals().total,
        request.address.trim()
    );
    if let Some(reference) = non_blank(request.reference.as_deref()) {
        let _ = writeln!(message, "*Referência:* {reference}");
    }
    let _ = write!(message, "\n*Forma de Pagamento:* {payment_method}\n");
    if let Some(observations) = non_blank(request.observations.as_deref()) {
        let _ = writeln!(message, "*Observações:* {observations}");
    }

    Ok(message)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Phone number that receives orders, digits only (country code included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination(String);

impl Destination {
    /// Accepts digits with optional `+`, spaces, dashes and parentheses.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::InvalidDestination` if anything else remains or
    /// no digits are left.
    pub fn parse(raw: &str) -> Result<Self, OrderError> {
        let digits: String = raw
            .chars()
            .filter(|c| !matches!(c, '+' | ' ' | '-' | '(' | ')'))
            .collect();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(OrderError::InvalidDestination(raw.to_string()));
        }
        Ok(Self(digits))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A `wa.me` deep link carrying a pre-filled message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffLink(String);

impl HandoffLink {
    #[must_use]
    pub fn new(destination: &Destination, message: &str) -> Self {
        Self(format!(
            "{HANDOFF_BASE_URL}/{destination}?text={}",
            encode_uri_component(message)
        ))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandoffLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Percent-encode `value` the way `encodeURIComponent` does.
///
/// A literal `%` is escaped to `%25` first, so the marks restored here can
/// only come from the escaped characters themselves.
fn encode_uri_component(value: &str) -> String {
    URI_COMPONENT_MARKS
        .iter()
        .fold(urlencoding::encode(value).into_owned(), |encoded, (escaped, mark)| {
            encoded.replace(escaped, mark)
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::types::ProductId;

    fn cart() -> Cart {
        let catalog = Catalog::from_json(
            br#"[
                {"id": 1, "name": "X-Burguer", "price": 10.00, "category": "Lanches", "img": "a.jpg"},
                {"id": 2, "name": "Milkshake", "price": 5.50, "category": "Bebidas", "img": "b.jpg",
                 "options": {"title": "Tamanho", "flavors": ["Grande"]}}
            ]"#,
        )
        .unwrap();
        let mut cart = Cart::new();
        cart.add(&catalog, ProductId::new(1), None).unwrap();
        cart.add(&catalog, ProductId::new(1), None).unwrap();
        cart.add(&catalog, ProductId::new(2), Some("Grande")).unwrap();
        cart
    }

    fn request() -> OrderRequest {
        OrderRequest {
            address: "Rua das Flores, 123".to_string(),
            reference: None,
            payment_method: Some(PaymentMethod::Pix),
            observations: None,
        }
    }

    #[test]
    fn test_message_layout() {
        let message = build_order_message(&cart(), &request(), "JS BURGUER").unwrap();
        assert_eq!(
            message,
            "*🍔 NOVO PEDIDO - JS BURGUER 🍔*\n\n\
             *Itens do Pedido:*\n\
             2x X-Burguer - R$ 20.00\n\
             1x Milkshake (Grande) - R$ 5.50\n\
             \n*Total:* R$ 25.50\n\n\
             *Endereço de Entrega:*\nRua das Flores, 123\n\
             \n*Forma de Pagamento:* Pix\n"
        );
    }

    #[test]
    fn test_message_optional_sections() {
        let request = OrderRequest {
            reference: Some("Perto da praça".to_string()),
            observations: Some("Sem cebola".to_string()),
            payment_method: Some(PaymentMethod::Cartao),
            ..request()
        };
        let message = build_order_message(&cart(), &request, "JS BURGUER").unwrap();
        assert!(message.contains("Rua das Flores, 123\n*Referência:* Perto da praça\n"));
        assert!(message.contains("*Forma de Pagamento:* Cartão\n"));
        assert!(message.ends_with("*Observações:* Sem cebola\n"));
    }

    #[test]
    fn test_blank_optional_sections_are_omitted() {
        let request = OrderRequest {
            reference: Some("   ".to_string()),
            observations: Some(String::new()),
            ..request()
        };
        let message = build_order_message(&cart(), &request, "JS BURGUER").unwrap();
        assert!(!message.contains("Referência"));
        assert!(!message.contains("Observações"));
    }

    #[test]
    fn test_empty_address_refused() {
        for address in ["", "   "] {
            let request = OrderRequest {
                address: address.to_string(),
                ..request()
            };
            assert_eq!(
                build_order_message(&cart(), &request, "JS BURGUER"),
                Err(OrderError::MissingAddress)
            );
        }
    }

    #[test]
    fn test_missing_payment_method_refused() {
        let request = OrderRequest {
            payment_method: None,
            ..request()
        };
        let err = build_order_message(&cart(), &request, "JS BURGUER").unwrap_err();
        assert_eq!(err, OrderError::MissingPaymentMethod);
        assert!(err.is_validation());
    }

    #[test]
    fn test_empty_cart_refused() {
        assert_eq!(
            build_order_message(&Cart::new(), &request(), "JS BURGUER"),
            Err(OrderError::EmptyCart)
        );
    }

    #[test]
    fn test_payment_method_from_str() {
        assert_eq!("pix".parse::<PaymentMethod>().unwrap(), PaymentMethod::Pix);
        assert_eq!(
            "Cartão".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::Cartao
        );
        assert_eq!(
            " DINHEIRO ".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::Dinheiro
        );
        assert!(matches!(
            "boleto".parse::<PaymentMethod>(),
            Err(OrderError::UnknownPaymentMethod(_))
        ));
    }

    #[test]
    fn test_destination_parse() {
        let destination = Destination::parse("+55 (98) 99187-5270").unwrap();
        assert_eq!(destination.as_str(), "5598991875270");
        assert!(Destination::parse("").is_err());
        assert!(Destination::parse("call me").is_err());
    }

    #[test]
    fn test_handoff_link_encodes_message() {
        let destination = Destination::parse("5598991875270").unwrap();
        let link = HandoffLink::new(&destination, "*Total:* R$ 5.50\nok&done");
        assert_eq!(
            link.as_str(),
            "https://wa.me/5598991875270?text=*Total%3A*%20R%24%205.50%0Aok%26done"
        );
    }

    #[test]
    fn test_encode_uri_component_keeps_marks() {
        assert_eq!(
            encode_uri_component("Milkshake (Morango)!"),
            "Milkshake%20(Morango)!"
        );
        assert_eq!(encode_uri_component("it's *5*"), "it's%20*5*");
        assert_eq!(encode_uri_component("100%2A off"), "100%252A%20off");
        assert_eq!(
            encode_uri_component("Referência: ~a_b-c.d"),
            "Refer%C3%AAncia%3A%20~a_b-c.d"
        );
    }
}
