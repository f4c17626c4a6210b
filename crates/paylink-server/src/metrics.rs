use prometheus::{IntCounterVec, Opts, Registry};
use std::sync::{LazyLock, Once};

pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// Link creation, by mode (simple | tracked)
pub static LINKS_CREATED: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("paylink_links_created_total", "Payment links created"),
        &["mode"],
    )
    .unwrap()
});

// Tracked request lookups, by result (ok | not_found | error)
pub static REQUEST_LOOKUPS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "paylink_request_lookups_total",
            "Tracked payment request lookups",
        ),
        &["result"],
    )
    .unwrap()
});

// Settlement reports relayed to the payment service, by result (ok | error)
pub static SETTLEMENT_REPORTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "paylink_settlement_reports_total",
            "Settlement reports relayed to the payment service",
        ),
        &["result"],
    )
    .unwrap()
});

static REGISTER: Once = Once::new();

/// Register all metrics with the registry. Safe to call more than once.
pub fn register_metrics() {
    REGISTER.call_once(|| {
        REGISTRY.register(Box::new(LINKS_CREATED.clone())).unwrap();
        REGISTRY
            .register(Box::new(REQUEST_LOOKUPS.clone()))
            .unwrap();
        REGISTRY
            .register(Box::new(SETTLEMENT_REPORTS.clone()))
            .unwrap();
    });
}

/// Label for a lookup outcome.
pub fn lookup_result<T, E>(result: &Result<T, E>, not_found: impl Fn(&E) -> bool) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) if not_found(e) => "not_found",
        Err(_) => "error",
    }
}
