use client_core::Alerter;

/// Terminal stand-in for a blocking alert.
pub struct StderrAlerter;

impl Alerter for StderrAlerter {
    fn alert(&self, message: &str) {
        tracing::warn!("alert: {message}");
        eprintln!("{message}");
    }
}
