//! Process-wide logging setup shared by binaries and tests.

/// Subscriber configuration (filters, formatting).
pub mod subscriber;

/// Initialize structured logging at `info`, overridable with `RUST_LOG`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    subscriber::init_with_default("info");
}
