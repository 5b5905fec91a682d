use client_core::Alerter;

/// Blocking native message box, shown on the UI thread.
pub struct DialogAlerter {
    title: String,
}

impl DialogAlerter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl Alerter for DialogAlerter {
    fn alert(&self, message: &str) {
        tracing::info!("alert: {message}");
        let _ = rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Warning)
            .set_title(&self.title)
            .set_description(message)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}
