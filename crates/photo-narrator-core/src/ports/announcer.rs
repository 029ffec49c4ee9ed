//! Speech output port.

/// Port for speaking text aloud.
///
/// Implementations queue phrases internally and return immediately. Phrases
/// must be spoken in the order `speak` was called.
pub trait Announcer: Send + Sync {
    /// Enqueues a phrase. Never blocks on playback.
    fn speak(&self, text: &str);
}
