//! Locally cached checkout choices that must not outlive the session.

use super::cookies::CookieJar;
use std::sync::Arc;

pub const SELECTED_ADDRESS_COOKIE: &str = "selected_address_id";
pub const LAST_ORDER_COOKIE: &str = "last_order_id";

pub struct CheckoutSelection<J> {
    jar: Arc<J>,
}

impl<J> Clone for CheckoutSelection<J> {
    fn clone(&self) -> Self {
        Self {
            jar: Arc::clone(&self.jar),
        }
    }
}

impl<J: CookieJar> CheckoutSelection<J> {
    #[must_use]
    pub fn new(jar: Arc<J>) -> Self {
        Self { jar }
    }

    /// Remember the shipping address picked on the address step.
    pub fn select_address(&self, address_id: &str) {
        self.jar.set_all(&[(SELECTED_ADDRESS_COOKIE, address_id)]);
    }

    #[must_use]
    pub fn selected_address(&self) -> Option<String> {
        self.jar
            .get(SELECTED_ADDRESS_COOKIE)
            .filter(|value| !value.is_empty())
    }

    /// Remember the order shown on the confirmation page.
    pub fn record_order(&self, order_id: &str) {
        self.jar.set_all(&[(LAST_ORDER_COOKIE, order_id)]);
    }

    #[must_use]
    pub fn last_order(&self) -> Option<String> {
        self.jar
            .get(LAST_ORDER_COOKIE)
            .filter(|value| !value.is_empty())
    }

    pub fn clear(&self) {
        self.jar
            .remove_all(&[SELECTED_ADDRESS_COOKIE, LAST_ORDER_COOKIE]);
    }
}
