use actix_web::{get, web, HttpResponse};

use crate::metrics::Metrics;

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "neo-exporter",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[get("/metrics")]
pub async fn metrics_endpoint(metrics: web::Data<Metrics>) -> HttpResponse {
    match metrics.render() {
        Ok(output) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(output),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            HttpResponse::InternalServerError().body("Failed to encode metrics")
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(metrics_endpoint);
}
