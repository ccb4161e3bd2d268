//! Platform abstraction for deferring update flushes.
//!
//! The runtime never drives its own event loop. When a component requests a
//! state change the runtime asks the platform for one deferred flush, and the
//! host loop answers by calling [`crate::Renderer::flush`] on a later turn.

/// Requests deferred flushes on behalf of the runtime.
///
/// Implementations must be safe to call from multiple threads; the runtime
/// itself stays on one thread.
pub trait FlushScheduler: Send + Sync {
    /// Ask the host to call `Renderer::flush` on a later turn.
    fn schedule_flush(&self);
}
