//! Rendering seams.
//!
//! Components never touch a concrete UI. The host hands each one the view it
//! renders through at construction time.

use std::time::Duration;

/// Wizard progress as shown above the form.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// Zero-based active step.
    pub step: usize,
    pub total: usize,
    pub percent: f64,
    pub label: String,
}

impl Progress {
    pub fn new(step: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0.0
        } else {
            (step + 1) as f64 / total as f64 * 100.0
        };
        Self {
            step,
            total,
            percent,
            label: format!("Etapa {} de {}", step + 1, total),
        }
    }
}

/// What the onboarding wizard renders through.
pub trait WizardView: Send + Sync {
    /// Show `progress.step` as the active step and update the progress bar.
    fn render(&self, progress: &Progress);

    /// Mark `field` as invalid; the mark clears itself after `clear_after`.
    fn flag_field(&self, field: &str, clear_after: Duration);

    /// Surface a user-visible error.
    fn show_error(&self, message: &str);

    /// Leave the page for `path`.
    fn navigate(&self, path: &str);
}

/// Who a transcript bubble belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// What the chat widget renders through.
pub trait ChatView: Send + Sync {
    /// Show or hide the widget.
    fn set_visible(&self, visible: bool);

    /// Append a complete bubble to the transcript.
    fn append(&self, sender: Sender, text: &str);

    /// Start an empty bot bubble that [`ChatView::update_reveal`] will fill.
    fn begin_reveal(&self);

    /// Replace the text of the bubble opened by the last `begin_reveal`.
    ///
    /// Reveals must not overlap; queue turns through a
    /// [`Playback`](crate::chat::Playback) rather than playing them
    /// concurrently.
    fn update_reveal(&self, partial: &str);
}

/// What the login form renders through.
pub trait LoginView: Send + Sync {
    fn show_error(&self, message: &str);

    fn navigate(&self, path: &str);
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording views for unit tests.

    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum WizardEvent {
        Render(usize),
        Flag(String),
        Error(String),
        Navigate(String),
    }

    #[derive(Default)]
    pub struct RecordingWizardView {
        pub events: Mutex<Vec<WizardEvent>>,
    }

    impl RecordingWizardView {
        pub fn events(&self) -> Vec<WizardEvent> {
            self.events.lock().unwrap().clone()
        }

        pub fn flags(&self) -> Vec<String> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    WizardEvent::Flag(field) => Some(field),
                    _ => None,
                })
                .collect()
        }
    }

    impl WizardView for RecordingWizardView {
        fn render(&self, progress: &Progress) {
            self.events.lock().unwrap().push(WizardEvent::Render(progress.step));
        }
        fn flag_field(&self, field: &str, _clear_after: Duration) {
            self.events.lock().unwrap().push(WizardEvent::Flag(field.to_string()));
        }
        fn show_error(&self, message: &str) {
            self.events.lock().unwrap().push(WizardEvent::Error(message.to_string()));
        }
        fn navigate(&self, path: &str) {
            self.events.lock().unwrap().push(WizardEvent::Navigate(path.to_string()));
        }
    }

    /// Chat view that keeps the transcript as finished bubbles.
    #[derive(Default)]
    pub struct RecordingChatView {
        pub bubbles: Mutex<Vec<(Sender, String)>>,
        pub reveal_frames: Mutex<usize>,
        pub visible: Mutex<bool>,
    }

    impl RecordingChatView {
        pub fn bubbles(&self) -> Vec<(Sender, String)> {
            self.bubbles.lock().unwrap().clone()
        }
    }

    impl ChatView for RecordingChatView {
        fn set_visible(&self, visible: bool) {
            *self.visible.lock().unwrap() = visible;
        }
        fn append(&self, sender: Sender, text: &str) {
            self.bubbles.lock().unwrap().push((sender, text.to_string()));
        }
        fn begin_reveal(&self) {
            self.bubbles.lock().unwrap().push((Sender::Bot, String::new()));
        }
        fn update_reveal(&self, partial: &str) {
            *self.reveal_frames.lock().unwrap() += 1;
            if let Some(last) = self.bubbles.lock().unwrap().last_mut() {
                last.1 = partial.to_string();
            }
        }
    }

    #[derive(Default)]
    pub struct RecordingLoginView {
        pub errors: Mutex<Vec<String>>,
        pub navigations: Mutex<Vec<String>>,
    }

    impl LoginView for RecordingLoginView {
        fn show_error(&self, message: &str) {
            self.errors.lock().unwrap().push(message.to_string());
        }
        fn navigate(&self, path: &str) {
            self.navigations.lock().unwrap().push(path.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_percent_and_label() {
        let p = Progress::new(0, 4);
        assert_eq!(p.percent, 25.0);
        assert_eq!(p.label, "Etapa 1 de 4");

        let p = Progress::new(3, 4);
        assert_eq!(p.percent, 100.0);
        assert_eq!(p.label, "Etapa 4 de 4");
    }
}
