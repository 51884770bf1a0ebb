//! Ordered provider fallback.
//!
//! [`FallbackChain`] expresses primary/fallback behavior for both pipeline
//! capabilities: synthesis chains invoke `synthesize` per provider, the
//! recognition chain attempts bridge establishment per provider name. The
//! chain stops at the first success and reports the last error when every
//! provider has failed.

use std::future::Future;

use tracing::warn;

/// An ordered, non-empty chain of providers.
///
/// The primary provider is tried first; fallbacks follow in configuration
/// order. The chain is immutable after construction and shared read-only.
pub struct FallbackChain<T> {
    /// Capability label used in log lines ("stt", "tts")
    label: &'static str,
    primary: T,
    fallbacks: Vec<T>,
}

impl<T> FallbackChain<T> {
    /// Build a chain from an explicit primary and ordered fallbacks.
    pub fn new(label: &'static str, primary: T, fallbacks: Vec<T>) -> Self {
        Self {
            label,
            primary,
            fallbacks,
        }
    }

    /// Build a chain from an ordered provider list.
    ///
    /// Returns `None` for an empty list; the first element becomes the
    /// primary.
    pub fn from_providers(label: &'static str, providers: Vec<T>) -> Option<Self> {
        let mut providers = providers.into_iter();
        let primary = providers.next()?;

        Some(Self {
            label,
            primary,
            fallbacks: providers.collect(),
        })
    }

    /// Number of providers in the chain.
    pub fn len(&self) -> usize {
        1 + self.fallbacks.len()
    }

    /// A chain always holds at least a primary.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate providers in invocation order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        std::iter::once(&self.primary).chain(self.fallbacks.iter())
    }

    /// Invoke `op` on each provider in order, returning the first success.
    ///
    /// Intermediate failures are logged at warn level; when every provider
    /// fails, the last error is returned.
    pub async fn invoke<R, E, Op, Fut>(&self, mut op: Op) -> Result<R, E>
    where
        Op: FnMut(usize, &T) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: std::fmt::Display,
    {
        let total = self.len();

        let mut last_error = match op(0, &self.primary).await {
            Ok(value) => return Ok(value),
            Err(error) => {
                warn!(
                    chain = self.label,
                    attempt = 1,
                    total,
                    "Provider failed: {error}"
                );
                error
            }
        };

        for (offset, provider) in self.fallbacks.iter().enumerate() {
            match op(offset + 1, provider).await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    warn!(
                        chain = self.label,
                        attempt = offset + 2,
                        total,
                        "Provider failed: {error}"
                    );
                    last_error = error;
                }
            }
        }

        Err(last_error)
    }
}
