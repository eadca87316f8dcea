use actix_web::{web, HttpResponse, Responder};

use crate::errors::ApiError;
use crate::models::PredictionRequest;
use crate::predictor::Predictor;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/ml")
            .route("/predict", web::post().to(predict))
            .route("/health", web::get().to(health)),
    );
}

async fn predict(
    predictor: web::Data<Predictor>,
    body: web::Json<PredictionRequest>,
) -> Result<HttpResponse, ApiError> {
    let response = predictor.predict(&body)?;
    Ok(HttpResponse::Ok().json(response))
}

async fn health(predictor: web::Data<Predictor>) -> impl Responder {
    HttpResponse::Ok().json(predictor.health())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::{json, Value};
    use std::io::Write;

    fn request_body() -> Value {
        json!({
            "company": "Dell",
            "type_name": "Notebook",
            "inches": 15.6,
            "screen_resolution": "1920x1080",
            "cpu": "Intel Core i7",
            "ram": "16GB",
            "memory": "512GB SSD",
            "gpu": "Nvidia GTX 1650",
            "os": "Windows 10",
            "weight": "2.1kg"
        })
    }

    #[actix_web::test]
    async fn predict_without_model_is_503() {
        let predictor = web::Data::new(Predictor::load("/nonexistent/model.json"));
        let app = test::init_service(
            App::new()
                .app_data(predictor)
                .service(web::scope("/api").configure(config)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/ml/predict")
            .set_json(request_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let health_req = test::TestRequest::get().uri("/api/ml/health").to_request();
        let health: Value = test::call_and_read_body_json(&app, health_req).await;
        assert_eq!(health["status"], "model_not_loaded");
    }

    #[actix_web::test]
    async fn predict_with_model_returns_range() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{ "base_price": 500.0, "ram_per_gb": 5.0 }"#)
            .unwrap();
        let predictor = web::Data::new(Predictor::load(file.path().to_str().unwrap()));
        let app = test::init_service(
            App::new()
                .app_data(predictor)
                .service(web::scope("/api").configure(config)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/ml/predict")
            .set_json(request_body())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let predicted = body["predicted_price"].as_f64().unwrap();
        assert!(body["min_price"].as_f64().unwrap() < predicted);
        assert!(predicted < body["max_price"].as_f64().unwrap());
        assert_eq!(body["message"], "Price prediction successful");
    }
}
