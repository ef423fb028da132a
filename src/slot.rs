use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// The single cell holding the most recently produced value.
///
/// Readers take a snapshot with [`ValueSlot::load`] without locking. The writer
/// publishes a fully built value with one atomic pointer swap, so a reader
/// observes either the previous value or the new one in its entirety.
pub struct ValueSlot<T> {
    value: ArcSwapOption<T>,
}

impl<T> ValueSlot<T> {
    /// Create an empty slot.
    pub fn new() -> Self {
        ValueSlot {
            value: ArcSwapOption::const_empty(),
        }
    }

    /// Return the current value, or `None` if nothing was ever stored.
    pub fn load(&self) -> Option<Arc<T>> {
        self.value.load_full()
    }

    /// Replace the current value.
    pub fn store(&self, value: T) {
        self.value.store(Some(Arc::new(value)));
    }

    pub fn is_empty(&self) -> bool {
        self.value.load().is_none()
    }
}

impl<T> Default for ValueSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
