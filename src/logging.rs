use super::*;

/// Diagnostics go to stderr so stdout only ever carries the JSON report.
pub(crate) fn init() {
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_max_level(tracing::Level::DEBUG)
    .with_ansi(false)
    .with_target(false)
    .without_time()
    .init();
}
