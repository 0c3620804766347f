//! Explicit form schema for the onboarding wizard.
//!
//! The page declares its steps and fields up front; everything the wizard
//! reads or writes is matched against this schema instead of being inferred
//! from whatever happens to be on the page.

use std::collections::HashSet;

use crate::error::SchemaError;

/// Fields that always hold an ordered multi-selection.
pub const MULTI_VALUED_FIELDS: [&str; 2] = ["canal", "objetivo"];

/// Whether a field holds one string or a multi-selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    /// Multi-select. An empty option list accepts any value.
    Multi { options: Vec<String> },
}

impl FieldKind {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Scalar => "single-valued",
            Self::Multi { .. } => "multi-valued",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub fn text(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Scalar,
            required: false,
        }
    }

    pub fn multi(name: &str, options: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Multi {
                options: options.iter().map(|o| o.to_string()).collect(),
            },
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn is_multi(&self) -> bool {
        matches!(self.kind, FieldKind::Multi { .. })
    }

    /// Position of `option` in the declared option list, if declared.
    pub(crate) fn option_index(&self, option: &str) -> Option<usize> {
        match &self.kind {
            FieldKind::Multi { options } => options.iter().position(|o| o == option),
            FieldKind::Scalar => None,
        }
    }

    /// Whether `option` may be selected on this field.
    pub(crate) fn accepts_option(&self, option: &str) -> bool {
        match &self.kind {
            FieldKind::Multi { options } => options.is_empty() || options.iter().any(|o| o == option),
            FieldKind::Scalar => false,
        }
    }
}

/// Ordered steps, each an ordered list of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSchema {
    steps: Vec<Vec<FieldSpec>>,
}

impl FormSchema {
    /// Validate and build a schema.
    pub fn new(steps: Vec<Vec<FieldSpec>>) -> Result<Self, SchemaError> {
        if steps.is_empty() {
            return Err(SchemaError::NoSteps);
        }

        let mut seen = HashSet::new();
        for (step, fields) in steps.iter().enumerate() {
            if fields.is_empty() {
                return Err(SchemaError::EmptyStep { step });
            }
            for field in fields {
                if !seen.insert(field.name.as_str()) {
                    return Err(SchemaError::DuplicateField {
                        name: field.name.clone(),
                    });
                }
                if MULTI_VALUED_FIELDS.contains(&field.name.as_str()) && !field.is_multi() {
                    return Err(SchemaError::MustBeMulti {
                        name: field.name.clone(),
                    });
                }
                if let FieldKind::Multi { options } = &field.kind {
                    let mut unique = HashSet::new();
                    for option in options {
                        if !unique.insert(option.as_str()) {
                            return Err(SchemaError::DuplicateOption {
                                name: field.name.clone(),
                                option: option.clone(),
                            });
                        }
                    }
                }
            }
        }

        Ok(Self { steps })
    }

    /// The landing page's onboarding form.
    pub fn landing() -> Self {
        Self {
            steps: vec![
                vec![
                    FieldSpec::text("nome").required(),
                    FieldSpec::text("email").required(),
                    FieldSpec::text("whatsapp").required(),
                ],
                vec![
                    FieldSpec::text("empresa").required(),
                    FieldSpec::text("segmento").required(),
                    FieldSpec::text("site"),
                ],
                vec![
                    FieldSpec::multi(
                        "canal",
                        &["whatsapp", "instagram", "site", "email", "telefone"],
                    ),
                    FieldSpec::text("volume").required(),
                ],
                vec![
                    FieldSpec::multi(
                        "objetivo",
                        &["vendas", "atendimento", "agendamento", "suporte"],
                    ),
                    FieldSpec::text("urgencia").required(),
                    FieldSpec::text("observacoes"),
                ],
            ],
        }
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Fields of `step`, empty when out of range.
    pub fn step(&self, step: usize) -> &[FieldSpec] {
        self.steps.get(step).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields().find(|f| f.name == name)
    }

    /// Every declared field in page order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.steps.iter().flatten()
    }
}
