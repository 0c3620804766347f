//! Current values of the onboarding form.

use std::collections::BTreeMap;

use super::schema::{FieldSpec, FormSchema};
use crate::error::WizardError;
use crate::model::{FieldValue, OnboardingData};

/// Values for every declared field of a [`FormSchema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    values: BTreeMap<String, FieldValue>,
}

impl FormState {
    /// A blank form: empty text for scalars, no selection for multis.
    pub fn empty(schema: &FormSchema) -> Self {
        let values = schema
            .fields()
            .map(|field| {
                let value = if field.is_multi() {
                    FieldValue::Multi(Vec::new())
                } else {
                    FieldValue::Text(String::new())
                };
                (field.name.clone(), value)
            })
            .collect();
        Self { values }
    }

    /// Fill the form from a stored record.
    ///
    /// Undeclared fields are ignored. Multi-valued fields apply one selection
    /// per stored value; values the schema doesn't offer are dropped.
    pub fn populate(schema: &FormSchema, record: &OnboardingData) -> Self {
        let mut form = Self::empty(schema);
        for (name, stored) in record {
            let Some(field) = schema.field(name) else {
                tracing::debug!(field = %name, "Skipping undeclared onboarding field");
                continue;
            };
            match (field.is_multi(), stored) {
                (true, FieldValue::Multi(values)) => {
                    for value in values {
                        if let Err(e) = form.toggle_option(field, value, true) {
                            tracing::warn!("Dropping stored selection: {}", e);
                        }
                    }
                }
                // A lone string for a multi field is a single selection.
                (true, FieldValue::Text(value)) => {
                    if !value.is_empty() {
                        if let Err(e) = form.toggle_option(field, value, true) {
                            tracing::warn!("Dropping stored selection: {}", e);
                        }
                    }
                }
                (false, FieldValue::Text(value)) => {
                    form.values.insert(name.clone(), FieldValue::Text(value.clone()));
                }
                (false, FieldValue::Multi(values)) => {
                    tracing::warn!(field = %name, "Stored list for a single-valued field; keeping first entry");
                    if let Some(first) = values.first() {
                        form.values.insert(name.clone(), FieldValue::Text(first.clone()));
                    }
                }
            }
        }
        form
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Text of a scalar field ("" when empty or not scalar).
    pub fn text(&self, name: &str) -> &str {
        self.values
            .get(name)
            .and_then(FieldValue::as_text)
            .unwrap_or("")
    }

    /// Selected options of a multi field.
    pub fn selected(&self, name: &str) -> &[String] {
        match self.values.get(name) {
            Some(FieldValue::Multi(values)) => values,
            _ => &[],
        }
    }

    pub(crate) fn set_text(&mut self, field: &FieldSpec, value: &str) -> Result<(), WizardError> {
        if field.is_multi() {
            return Err(WizardError::WrongKind {
                name: field.name.clone(),
                expected: field.kind.describe(),
                actual: "single-valued",
            });
        }
        self.values
            .insert(field.name.clone(), FieldValue::Text(value.to_string()));
        Ok(())
    }

    /// Select or deselect `option`, keeping declared option order.
    pub(crate) fn toggle_option(
        &mut self,
        field: &FieldSpec,
        option: &str,
        selected: bool,
    ) -> Result<(), WizardError> {
        if !field.is_multi() {
            return Err(WizardError::WrongKind {
                name: field.name.clone(),
                expected: field.kind.describe(),
                actual: "multi-valued",
            });
        }
        if !field.accepts_option(option) {
            return Err(WizardError::UnknownOption {
                name: field.name.clone(),
                option: option.to_string(),
            });
        }

        if !matches!(self.values.get(&field.name), Some(FieldValue::Multi(_))) {
            self.values
                .insert(field.name.clone(), FieldValue::Multi(Vec::new()));
        }
        let Some(FieldValue::Multi(values)) = self.values.get_mut(&field.name) else {
            return Ok(());
        };

        let present = values.iter().any(|v| v == option);
        match (selected, present) {
            (true, false) => {
                values.push(option.to_string());
                // Open option lists keep selection order.
                values.sort_by_key(|v| field.option_index(v).unwrap_or(usize::MAX));
            }
            (false, true) => values.retain(|v| v != option),
            _ => {}
        }
        Ok(())
    }

    /// Whether a field has a non-blank value.
    pub fn is_filled(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(|v| !v.is_empty())
    }

    /// First required field in `fields` that is still empty.
    pub fn first_missing<'a>(&self, fields: &'a [FieldSpec]) -> Option<&'a FieldSpec> {
        fields
            .iter()
            .find(|field| field.required && !self.is_filled(&field.name))
    }

    /// The whole form as a storable record.
    pub fn snapshot(&self) -> OnboardingData {
        self.values.clone()
    }
}
