use crate::error::AppResult;
use crate::models::AppSelection;

/// OS-level app restriction. Calls are idempotent.
pub trait BlockingProvider: Send + Sync {
    fn block(&self, selection: &AppSelection) -> AppResult<()>;
    fn unblock(&self) -> AppResult<()>;
}

/// Best-effort user notifications. Delivery failures are swallowed by the implementation.
pub trait Notifier: Send + Sync {
    fn send_info(&self, title: &str, body: &str);
}
