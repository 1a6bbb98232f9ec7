pub mod types;

pub use types::{BlockingProvider, Notifier};

use crate::error::AppResult;
use crate::models::AppSelection;
use log::info;

/// Stand-in provider for hosts without an OS blocking backend. Only logs.
#[derive(Debug, Default)]
pub struct LoggingBlocker;

impl BlockingProvider for LoggingBlocker {
    fn block(&self, selection: &AppSelection) -> AppResult<()> {
        info!(
            "Blocking {} app(s), {} categorie(s), {} domain(s)",
            selection.application_tokens.len(),
            selection.category_tokens.len(),
            selection.web_domain_tokens.len()
        );
        Ok(())
    }

    fn unblock(&self) -> AppResult<()> {
        info!("Clearing all blocks");
        Ok(())
    }
}

/// Notifier that writes to the log instead of the system notification center.
#[derive(Debug, Default)]
pub struct LoggingNotifier;

impl Notifier for LoggingNotifier {
    fn send_info(&self, title: &str, body: &str) {
        info!("[notification] {title}: {body}");
    }
}
