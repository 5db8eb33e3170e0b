use std::sync::{Arc, RwLock};

/// Accessor for the current bearer credential.
///
/// `None` is the signed-out state, not an error.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Option<String>;
}

impl<F> TokenSource for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> Option<String> {
        self()
    }
}

/// Shared, replaceable token slot.
///
/// Clones share the same slot, so the session can clear a token that the
/// store reads on its next call.
#[derive(Clone, Default)]
pub struct TokenCell {
    inner: Arc<RwLock<Option<String>>>,
}

impl TokenCell {
    pub fn new(token: Option<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(token.filter(|t| !t.is_empty()))),
        }
    }

    pub fn set(&self, token: impl Into<String>) {
        let token = token.into();
        let mut slot = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *slot = (!token.is_empty()).then_some(token);
    }

    pub fn clear(&self) {
        let mut slot = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }
}

impl TokenSource for TokenCell {
    fn token(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
