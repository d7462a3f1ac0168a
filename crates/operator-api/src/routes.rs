//! Route configuration for the operator API

use actix_web::web;

use crate::handlers;

/// Configure all routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            // Health check endpoint
            .route("/health", web::get().to(handlers::health_check))
            // Trigger management; add and update are both upserts
            .route("/triggers", web::post().to(handlers::add_trigger))
            .route("/triggers", web::put().to(handlers::update_trigger))
            .service(
                web::scope("/namespaces/{namespace}")
                    .route("/triggers", web::get().to(handlers::list_triggers))
                    .route("/triggers/{id}", web::delete().to(handlers::remove_trigger)),
            ),
    );
}
