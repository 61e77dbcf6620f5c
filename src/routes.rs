use actix_web::web;

use crate::handlers;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/events")
            // order matters: more specific routes before less specific
            .route("/stats", web::get().to(handlers::get_stats))
            .route("/timeseries", web::get().to(handlers::get_timeseries))
            .route("", web::get().to(handlers::get_events)),
    )
    .route("/health", web::get().to(handlers::health));
}
