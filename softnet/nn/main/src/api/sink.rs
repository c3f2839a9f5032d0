//! Text sink that receives training progress.

/// Receives human-readable lines from the training loop.
///
/// A disabled sink drops every line; it never changes what is computed.
/// Cross-validation disables the sink while it retrains internally.
pub trait TrainingLog {
    fn append_text(&mut self, line: &str);
    fn append_error(&mut self, line: &str);
    fn set_enabled(&mut self, enabled: bool);
    fn is_enabled(&self) -> bool;
}
