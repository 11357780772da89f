//! Session-related types.
//!
//! The cart is stored whole under a single session key and written back after
//! every mutation.

use cardapio_core::Cart;
use tower_sessions::Session;

/// Session keys.
pub mod keys {
    /// Key for storing the shopping cart.
    pub const CART: &str = "cart";
}

/// Get the session's cart, empty if none was stored yet.
///
/// # Errors
///
/// Returns an error if the session store fails or the stored value does not
/// deserialize.
pub async fn load_cart(session: &Session) -> Result<Cart, tower_sessions::session::Error> {
    Ok(session.get::<Cart>(keys::CART).await?.unwrap_or_default())
}

/// Store the cart in the session.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn store_cart(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CART, cart).await
}

/// Discard the session's cart.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear_cart(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<Cart>(keys::CART).await.map(|_| ())
}
