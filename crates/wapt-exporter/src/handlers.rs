//! Scrape handler.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use tracing::error;

use wapt_inventory::InventoryApi;
use wapt_metrics::{WaptCollector, render_prometheus};

/// Shared state for the scrape handler.
pub struct ScrapeState<C> {
    pub collector: Arc<WaptCollector<C>>,
}

impl<C> Clone for ScrapeState<C> {
    fn clone(&self) -> Self {
        Self {
            collector: self.collector.clone(),
        }
    }
}

/// GET <telemetry path>
///
/// WAPT failures are reported through the gauges themselves, so this
/// answers 200 unless the exposition could not be encoded.
pub async fn prometheus_metrics<C>(State(state): State<ScrapeState<C>>) -> Response
where
    C: InventoryApi + 'static,
{
    let mut samples = Vec::new();
    state.collector.collect(&mut samples).await;

    match render_prometheus(state.collector.describe(), &samples) {
        Ok(body) => (
            StatusCode::OK,
            [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics").into_response()
        }
    }
}
