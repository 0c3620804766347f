//! OnboardingWizard: step cursor, validation, persistence and submit.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::form::FormState;
use super::schema::FormSchema;
use crate::api::FunnelApi;
use crate::config::FunnelConfig;
use crate::error::{Result, WizardError};
use crate::funnel::normalize_path;
use crate::model::session_keys;
use crate::reconcile::{CONTACT_FIELDS, reconcile};
use crate::store::Session;
use crate::view::{Progress, WizardView};

/// Shown when the onboarding endpoint fails.
pub const SUBMIT_ERROR_MESSAGE: &str = "Erro ao enviar formulário. Tente novamente.";

/// Result of a forward transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Moved to the contained step.
    Advanced(usize),
    /// A required field of the current step is empty.
    Blocked { field: String },
    /// Valid, but already on the last step.
    AtLastStep,
}

/// A field currently marked invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFlag {
    pub field: String,
    pub raised_at: Instant,
    pub clear_after: Duration,
}

impl FieldFlag {
    pub fn is_active_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.raised_at) < self.clear_after
    }
}

/// The onboarding wizard for one page visit.
pub struct OnboardingWizard {
    session: Session,
    api: Arc<dyn FunnelApi>,
    view: Arc<dyn WizardView>,
    schema: FormSchema,
    form: FormState,
    step: usize,
    flag: Option<FieldFlag>,
    error_flash: Duration,
    success_route: String,
}

impl OnboardingWizard {
    /// Initialize from the session: the prior snapshot, with checkout
    /// contacts filling whatever it left empty. Renders step 0.
    pub fn new(
        session: Session,
        api: Arc<dyn FunnelApi>,
        view: Arc<dyn WizardView>,
        schema: FormSchema,
        config: &FunnelConfig,
    ) -> Self {
        let mut saved = session.load(session_keys::ONBOARDING);
        let checkout = session.load(session_keys::CHECKOUT);

        for name in CONTACT_FIELDS {
            let empty = saved.get(name).is_none_or(|v| v.is_empty());
            if let (true, Some(contact)) = (empty, checkout.contact(name)) {
                saved.insert(name.to_string(), contact.into());
            }
        }

        let form = FormState::populate(&schema, &saved);
        let wizard = Self {
            session,
            api,
            view,
            schema,
            form,
            step: 0,
            flag: None,
            error_flash: config.error_flash,
            success_route: config.success_route.clone(),
        };
        tracing::info!(steps = wizard.schema.step_count(), "Onboarding wizard ready");
        wizard.render();
        wizard
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn step_count(&self) -> usize {
        self.schema.step_count()
    }

    pub fn is_final_step(&self) -> bool {
        self.step + 1 == self.schema.step_count()
    }

    pub fn progress(&self) -> Progress {
        Progress::new(self.step, self.schema.step_count())
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    /// The field still flagged at `now`, if any.
    pub fn flagged_field(&self, now: Instant) -> Option<&str> {
        self.flag
            .as_ref()
            .filter(|flag| flag.is_active_at(now))
            .map(|flag| flag.field.as_str())
    }

    /// Advance one step if every required field of the current step is
    /// filled.
    pub fn next(&mut self) -> StepOutcome {
        if let Some(field) = self.check_current_step() {
            return StepOutcome::Blocked { field };
        }
        if self.is_final_step() {
            return StepOutcome::AtLastStep;
        }
        self.step += 1;
        tracing::debug!(step = self.step, "Wizard advanced");
        self.render();
        StepOutcome::Advanced(self.step)
    }

    /// Go back one step; stays on the first step.
    pub fn back(&mut self) -> usize {
        if self.step > 0 {
            self.step -= 1;
            tracing::debug!(step = self.step, "Wizard went back");
            self.render();
        }
        self.step
    }

    // ── Field changes ───────────────────────────────────────────────

    /// Set a single-valued field.
    pub fn set_text(&mut self, name: &str, value: &str) -> std::result::Result<(), WizardError> {
        let field = self.declared(name)?.clone();
        self.form.set_text(&field, value)?;
        self.persist();
        Ok(())
    }

    /// Select or deselect one option of a multi-valued field.
    pub fn toggle_option(
        &mut self,
        name: &str,
        option: &str,
        selected: bool,
    ) -> std::result::Result<(), WizardError> {
        let field = self.declared(name)?.clone();
        self.form.toggle_option(&field, option, selected)?;
        self.persist();
        Ok(())
    }

    /// Replace the whole selection of a multi-valued field.
    pub fn select_options(
        &mut self,
        name: &str,
        options: &[&str],
    ) -> std::result::Result<(), WizardError> {
        let field = self.declared(name)?.clone();
        let mut next = self.form.clone();
        for current in self.form.selected(name) {
            next.toggle_option(&field, current, false)?;
        }
        for option in options {
            next.toggle_option(&field, option, true)?;
        }
        self.form = next;
        self.persist();
        Ok(())
    }

    // ── Submit ──────────────────────────────────────────────────────

    /// Merge every source and post the record.
    ///
    /// On success the onboarding snapshot is cleared and the view navigates
    /// to the returned path. On failure nothing is cleared so the user can
    /// simply retry.
    pub async fn submit(&mut self) -> Result<String> {
        if !self.is_final_step() {
            return Err(WizardError::NotOnFinalStep {
                step: self.step,
                total: self.schema.step_count(),
            }
            .into());
        }
        if let Some(name) = self.check_current_step() {
            return Err(WizardError::MissingRequired { name }.into());
        }

        let snapshot = self.form.snapshot();
        let prior = self.session.load(session_keys::ONBOARDING);
        let checkout = self.session.load(session_keys::CHECKOUT);
        let chat = self.session.try_load(session_keys::CHAT_STATE);
        let submission = reconcile(&snapshot, &prior, &checkout, chat.as_ref());

        match self.api.submit_onboarding(&submission).await {
            Ok(receipt) => {
                self.session.clear(session_keys::ONBOARDING);
                let path = receipt
                    .redirect
                    .filter(|r| !r.trim().is_empty())
                    .map(|r| normalize_path(&r))
                    .unwrap_or_else(|| self.success_route.clone());
                tracing::info!(redirect = %path, "Onboarding submitted");
                self.view.navigate(&path);
                Ok(path)
            }
            Err(e) => {
                tracing::warn!("Onboarding submit failed: {}", e);
                self.view.show_error(SUBMIT_ERROR_MESSAGE);
                Err(e.into())
            }
        }
    }

    fn declared(&self, name: &str) -> std::result::Result<&super::schema::FieldSpec, WizardError> {
        self.schema.field(name).ok_or_else(|| WizardError::UnknownField {
            name: name.to_string(),
        })
    }

    /// Flag the first empty required field of the current step, if any.
    fn check_current_step(&mut self) -> Option<String> {
        let missing = self
            .form
            .first_missing(self.schema.step(self.step))
            .map(|field| field.name.clone())?;
        tracing::debug!(field = %missing, step = self.step, "Required field empty");
        self.view.flag_field(&missing, self.error_flash);
        self.flag = Some(FieldFlag {
            field: missing.clone(),
            raised_at: Instant::now(),
            clear_after: self.error_flash,
        });
        Some(missing)
    }

    fn persist(&self) {
        self.session
            .save(session_keys::ONBOARDING, &self.form.snapshot());
    }

    fn render(&self) {
        self.view.render(&self.progress());
    }
}
