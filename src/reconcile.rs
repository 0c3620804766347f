//! Merge the funnel's three sources into the record posted at submit.
//!
//! Precedence for a top-level field: the current form value, then the prior
//! onboarding snapshot, then the checkout capture. Chat answers are attached
//! whole under `chat_qualificacao` and never compete with top-level fields,
//! even where names coincide.

use crate::api::OnboardingSubmission;
use crate::model::{ChatState, CheckoutData, FieldValue, OnboardingData};

/// Contact fields the checkout page can supply.
pub const CONTACT_FIELDS: [&str; 2] = ["email", "whatsapp"];

/// Build the submission from every source.
///
/// `chat` is attached only once the scripted chat has started.
pub fn reconcile(
    form: &OnboardingData,
    prior: &OnboardingData,
    checkout: &CheckoutData,
    chat: Option<&ChatState>,
) -> OnboardingSubmission {
    let mut fields = form.clone();

    for (name, value) in fields.iter_mut() {
        if !value.is_empty() {
            continue;
        }
        if let Some(earlier) = prior.get(name) {
            if !earlier.is_empty() && same_kind(value, earlier) {
                tracing::debug!(field = %name, "Filling empty form field from prior snapshot");
                *value = earlier.clone();
            }
        }
    }

    for name in CONTACT_FIELDS {
        let missing = fields.get(name).is_none_or(FieldValue::is_empty);
        if !missing {
            continue;
        }
        if let Some(contact) = checkout.contact(name) {
            tracing::debug!(field = name, "Filling contact field from checkout");
            fields.insert(name.to_string(), FieldValue::from(contact));
        }
    }

    let chat_qualificacao = chat
        .filter(|state| state.stage > 0)
        .map(|state| state.data.clone());

    OnboardingSubmission {
        fields,
        chat_qualificacao,
    }
}

fn same_kind(a: &FieldValue, b: &FieldValue) -> bool {
    matches!(
        (a, b),
        (FieldValue::Text(_), FieldValue::Text(_)) | (FieldValue::Multi(_), FieldValue::Multi(_))
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn record(pairs: &[(&str, &str)]) -> OnboardingData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), FieldValue::from(*v)))
            .collect()
    }

    fn checkout(email: &str) -> CheckoutData {
        CheckoutData {
            email: Some(email.to_string()),
            whatsapp: Some("5511988887777".to_string()),
        }
    }

    #[test]
    fn empty_form_email_takes_checkout() {
        let form = record(&[("email", ""), ("nome", "Ana")]);
        let merged = reconcile(&form, &OnboardingData::new(), &checkout("a@x.com"), None);
        assert_eq!(merged.fields["email"], FieldValue::from("a@x.com"));
        assert_eq!(merged.fields["whatsapp"], FieldValue::from("5511988887777"));
    }

    #[test]
    fn explicit_form_email_wins_over_checkout() {
        let form = record(&[("email", "b@y.com")]);
        let merged = reconcile(&form, &OnboardingData::new(), &checkout("a@x.com"), None);
        assert_eq!(merged.fields["email"], FieldValue::from("b@y.com"));
    }

    #[test]
    fn prior_snapshot_beats_checkout() {
        let form = record(&[("email", ""), ("nome", "")]);
        let prior = record(&[("email", "prior@x.com"), ("nome", "Ana")]);
        let merged = reconcile(&form, &prior, &checkout("a@x.com"), None);
        assert_eq!(merged.fields["email"], FieldValue::from("prior@x.com"));
        assert_eq!(merged.fields["nome"], FieldValue::from("Ana"));
    }

    #[test]
    fn chat_answers_stay_nested() {
        let mut form = record(&[("email", "b@y.com")]);
        form.insert(
            "objetivo".to_string(),
            FieldValue::Multi(vec!["vendas".to_string()]),
        );
        let chat = ChatState {
            stage: 7,
            data: BTreeMap::from([("objetivo".to_string(), "suporte".to_string())]),
        };

        let merged = reconcile(&form, &OnboardingData::new(), &CheckoutData::default(), Some(&chat));
        assert_eq!(
            merged.fields["objetivo"],
            FieldValue::Multi(vec!["vendas".to_string()])
        );
        assert_eq!(merged.chat_qualificacao.unwrap()["objetivo"], "suporte");
    }

    #[test]
    fn dormant_chat_is_not_attached() {
        let merged = reconcile(
            &OnboardingData::new(),
            &OnboardingData::new(),
            &CheckoutData::default(),
            Some(&ChatState::default()),
        );
        assert!(merged.chat_qualificacao.is_none());
        assert!(merged.fields.is_empty());
    }
}
