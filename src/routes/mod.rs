use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

pub mod auth_routes;
pub mod laptop_routes;
pub mod ml_routes;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(auth_routes::config)
            .configure(laptop_routes::config)
            .configure(ml_routes::config)
            .route("/health", web::get().to(health)),
    );
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "healthy", "message": "API is running" }))
}
