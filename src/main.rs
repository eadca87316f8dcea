use actix_cors::Cors;
use actix_files::Files;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use log::info;
use serde_json::json;

mod auth;
mod config;
mod db;
mod errors;
mod laptops;
mod models;
mod predictor;
mod routes;
mod uploads;

use auth::AuthService;
use config::Settings;
use laptops::LaptopService;
use predictor::Predictor;
use uploads::ImageStore;

async fn root() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "message": "Welcome to Laptop Bazar API",
        "version": "1.0.0",
    }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let settings = Settings::from_env();

    info!("Connecting to database: {}", settings.database_url);
    let pool = db::connect(&settings.database_url)
        .await
        .expect("Failed to create pool");
    db::init_schema(&pool)
        .await
        .expect("Failed to initialize database schema");

    std::fs::create_dir_all(&settings.upload_dir)?;

    let auth_service = web::Data::new(AuthService::new(pool.clone(), &settings));
    let laptop_service = web::Data::new(LaptopService::new(pool.clone()));
    let image_store = web::Data::new(ImageStore::new(&settings));
    let price_predictor = web::Data::new(Predictor::load(&settings.model_path));

    let upload_dir = settings.upload_dir.clone();
    let cors_origins = settings.cors_origins.clone();
    let bind_addr = settings.bind_addr.clone();

    info!("Starting server at http://{}", bind_addr);
    HttpServer::new(move || {
        let cors = if cors_origins.iter().any(|o| o == "*") {
            Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600)
        } else {
            cors_origins
                .iter()
                .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
                .allow_any_method()
                .allow_any_header()
                .supports_credentials()
                .max_age(3600)
        };

        App::new()
            .wrap(cors)
            .app_data(auth_service.clone())
            .app_data(laptop_service.clone())
            .app_data(image_store.clone())
            .app_data(price_predictor.clone())
            .configure(routes::config)
            .route("/", web::get().to(root))
            .service(Files::new("/uploads", &upload_dir))
    })
    .bind(&bind_addr)?
    .run()
    .await
}
