pub mod arc;
pub mod land;
pub mod symbology;

pub use arc::*;
pub use land::*;
pub use symbology::*;

/// Routes `tracing` output to the test harness; `RUST_LOG` picks the level.
#[cfg(test)]
pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
