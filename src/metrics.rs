use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process. Returns `None` if a
    /// different recorder is already installed.
    pub fn global() -> Option<&'static Metrics> {
        static GLOBAL: OnceCell<Option<Metrics>> = OnceCell::new();
        GLOBAL
            .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
                Ok(handle) => Some(Metrics { handle }),
                Err(e) => {
                    tracing::warn!(error = %e, "prometheus recorder not installed");
                    None
                }
            })
            .as_ref()
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
