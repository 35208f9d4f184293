//! Shared helpers for integration tests

use std::sync::Once;

use querygraph::TemplateRegistry;

static INIT: Once = Once::new();

/// Install a test-friendly tracing subscriber once per test binary
///
/// Output is controlled with `RUST_LOG`, e.g. `RUST_LOG=querygraph=trace`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// `d` depends on `b` and `c`, both of which depend on `a`
#[allow(dead_code)]
pub fn diamond() -> TemplateRegistry {
    TemplateRegistry::from_templates([
        ("a", "SELECT id, amount FROM payments"),
        ("b", "SELECT * FROM {{a}} WHERE amount > 0"),
        ("c", "SELECT * FROM {{a}} WHERE amount < 0"),
        ("d", "SELECT * FROM {{b}} UNION ALL SELECT * FROM {{c}}"),
    ])
    .expect("Should build registry")
}
