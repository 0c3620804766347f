//! Checkout capture: the first contact record of the funnel.

use crate::model::{CheckoutData, session_keys};
use crate::store::Session;

/// Reads and writes the checkout contact record.
pub struct CheckoutCapture {
    session: Session,
    onboarding_route: String,
}

impl CheckoutCapture {
    pub fn new(session: Session, onboarding_route: &str) -> Self {
        Self {
            session,
            onboarding_route: onboarding_route.to_string(),
        }
    }

    /// Values to show in the checkout form.
    pub fn prefill(&self) -> CheckoutData {
        self.session.load(session_keys::CHECKOUT)
    }

    /// Store the contact details and return the route to continue to.
    /// Blank values are stored as absent.
    pub fn submit(&self, email: &str, whatsapp: &str) -> String {
        let data = CheckoutData {
            email: present(email),
            whatsapp: present(whatsapp),
        };
        self.session.save(session_keys::CHECKOUT, &data);
        tracing::info!(
            has_email = data.email.is_some(),
            has_whatsapp = data.whatsapp.is_some(),
            "Checkout captured"
        );
        self.onboarding_route.clone()
    }
}

fn present(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
