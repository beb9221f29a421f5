//! Where pagination failures go

use crate::error::Error;

/// Shared error-reporting collaborator.
///
/// Failures never reach the user as dialogs; they are degraded to manual
/// pages and surfaced here for diagnostics.
pub trait ErrorReporter {
    fn report(&self, error: &Error);
}

/// Reports through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, error: &Error) {
        log::error!("Pagination failed, falling back to manual breaks: {}", error);
    }
}

impl<F> ErrorReporter for F
where
    F: Fn(&Error),
{
    fn report(&self, error: &Error) {
        self(error)
    }
}
