//! Progress reporting for state generation.
//!
//! Generation can take minutes at realistic parameters, so callers may want
//! progress lines. The hook is an explicit capability passed into
//! [`CltState::generate_with_log`](crate::state::CltState::generate_with_log)
//! rather than a global verbosity switch.

/// Receives human-readable progress lines during state generation.
pub trait GenerationLog {
    fn message(&self, msg: &str);
}

/// Writes tagged progress lines to stderr.
pub struct StderrLog;

impl GenerationLog for StderrLog {
    fn message(&self, msg: &str) {
        eprintln!("[keygen] {}", msg);
    }
}

/// Discards all progress lines.
pub struct SilentLog;

impl GenerationLog for SilentLog {
    fn message(&self, _msg: &str) {}
}
