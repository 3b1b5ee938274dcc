//! System-level operations.

use std::time::Duration;

/// System operations trait.
pub trait SystemOps {
    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}
