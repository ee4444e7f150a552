//! Post-commit effect queue.
//!
//! Work that mutates a live runtime in ways a render pass must not observe
//! (language changes) is scheduled here during render and run by the host
//! once the render/commit phase is over.

use std::fmt;

use futures::future::BoxFuture;

use crate::error::I18nError;

/// Deferred unit of work run after commit.
pub type Effect = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), I18nError>> + Send>;

/// What: FIFO of effects scheduled during render.
#[derive(Default)]
pub struct EffectQueue {
    /// Pending effects with a label for logs.
    pending: Vec<(String, Effect)>,
}

impl EffectQueue {
    /// Empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// What: Schedule `effect`; it does not run until [`EffectQueue::flush`].
    pub fn schedule(&mut self, label: impl Into<String>, effect: Effect) {
        let label = label.into();
        tracing::trace!(effect = %label, "scheduled post-commit effect");
        self.pending.push((label, effect));
    }

    /// What: Schedule `effect` in place of every pending effect with the same label.
    ///
    /// Details:
    /// - The new effect goes to the back of the queue
    pub fn replace(&mut self, label: impl Into<String>, effect: Effect) {
        let label = label.into();
        self.cancel(&label);
        self.schedule(label, effect);
    }

    /// What: Drop pending effects labelled `label`.
    ///
    /// Output:
    /// - Number of effects dropped
    pub fn cancel(&mut self, label: &str) -> usize {
        let before = self.pending.len();
        self.pending.retain(|(pending, _)| pending != label);
        let dropped = before - self.pending.len();
        if dropped > 0 {
            tracing::trace!(effect = %label, dropped, "cancelled post-commit effect");
        }
        dropped
    }

    /// Whether an effect labelled `label` is pending.
    #[must_use]
    pub fn is_scheduled(&self, label: &str) -> bool {
        self.pending.iter().any(|(pending, _)| pending == label)
    }

    /// Number of pending effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// What: Run pending effects in scheduling order.
    ///
    /// # Errors
    /// - Stops at the first failing effect; effects after it are dropped
    pub async fn flush(&mut self) -> Result<(), I18nError> {
        for (label, effect) in std::mem::take(&mut self.pending) {
            tracing::trace!(effect = %label, "running post-commit effect");
            if let Err(e) = effect().await {
                tracing::warn!(effect = %label, error = %e, "post-commit effect failed");
                return Err(e);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for EffectQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.pending.iter().map(|(label, _)| label))
            .finish()
    }
}
