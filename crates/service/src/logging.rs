use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Install the global subscriber. Logs go to stderr so command output on
///  stdout stays clean. `RUST_LOG` overrides `level`.
///
/// The returned guard flushes pending records when dropped and must be held
///  for the life of the process.
pub fn init(level: tracing::Level) -> WorkerGuard {
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(non_blocking_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stderr_layer).init();
    register_panic_logger();
    guard
}

fn register_panic_logger() {
    std::panic::set_hook(Box::new(|panic| match panic.location() {
        Some(location) => {
            tracing::error!(
                message = %panic,
                panic.file = location.file(),
                panic.line = location.line(),
                panic.column = location.column(),
            );
        }
        None => tracing::error!(message = %panic),
    }));
}
