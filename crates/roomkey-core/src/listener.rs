//! Token change notifications.
//!
//! The SDK never persists tokens. The embedding application registers a
//! [`TokenListener`] and is told about every installed pair and every clear.

use crate::tokens::{AccessToken, RefreshToken};

/// Receives the current tokens after every change.
///
/// Both arguments are `None` after a clear. Called synchronously from the
/// task that changed the tokens, so implementations should not block for
/// long.
pub trait TokenListener: Send + Sync {
    fn tokens_changed(&self, access: Option<&AccessToken>, refresh: Option<&RefreshToken>);
}

impl<F> TokenListener for F
where
    F: Fn(Option<&AccessToken>, Option<&RefreshToken>) + Send + Sync,
{
    fn tokens_changed(&self, access: Option<&AccessToken>, refresh: Option<&RefreshToken>) {
        self(access, refresh)
    }
}

/// Listener that ignores every change.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl TokenListener for NoopListener {
    fn tokens_changed(&self, _access: Option<&AccessToken>, _refresh: Option<&RefreshToken>) {}
}
