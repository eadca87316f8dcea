use actix_web::{web, HttpRequest, HttpResponse};

use crate::auth::AuthService;
use crate::errors::ApiError;
use crate::models::{LoginRequest, RegisterRequest, User, UserResponse, UserUpdateRequest};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/me", web::get().to(me))
            .route("/me", web::put().to(update_me)),
    );
}

/// Pulls the bearer token out of the Authorization header and resolves it.
pub(crate) async fn extract_user(
    req: &HttpRequest,
    auth: &AuthService,
) -> Result<User, ApiError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("No authorization token provided".to_string()))?;

    auth.current_user(token).await
}

async fn register(
    auth: web::Data<AuthService>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = auth.register(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

async fn login(
    auth: web::Data<AuthService>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let token = auth.login(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(token))
}

async fn me(req: HttpRequest, auth: web::Data<AuthService>) -> Result<HttpResponse, ApiError> {
    let user = extract_user(&req, &auth).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

async fn update_me(
    req: HttpRequest,
    auth: web::Data<AuthService>,
    body: web::Json<UserUpdateRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = extract_user(&req, &auth).await?;
    let body = body.into_inner();
    let updated = auth
        .update_profile(user.id, body.full_name, body.phone)
        .await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(updated)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    use crate::config::Settings;
    use crate::db;

    fn test_settings() -> Settings {
        Settings {
            database_url: "sqlite::memory:".to_string(),
            secret_key: "route-test-secret".to_string(),
            access_token_expire_minutes: 30,
            upload_dir: "uploads".to_string(),
            max_file_size: 5_242_880,
            cors_origins: vec![],
            model_path: "model.json".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
        }
    }

    macro_rules! auth_app {
        () => {{
            let pool = db::test_pool().await;
            let auth = web::Data::new(AuthService::new(pool, &test_settings()));
            test::init_service(
                App::new()
                    .app_data(auth)
                    .service(web::scope("/api").configure(config)),
            )
            .await
        }};
    }

    fn register_body(email: &str, username: &str) -> Value {
        json!({
            "email": email,
            "username": username,
            "password": "password123",
            "full_name": "Test User"
        })
    }

    #[actix_web::test]
    async fn register_returns_201_without_password() {
        let app = auth_app!();

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(register_body("a@example.com", "a"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["email"], "a@example.com");
        assert!(body.get("password").is_none());
        assert!(body.get("hashed_password").is_none());
    }

    #[actix_web::test]
    async fn duplicate_registration_is_400() {
        let app = auth_app!();

        let first = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(register_body("a@example.com", "a"))
            .to_request();
        assert_eq!(
            test::call_service(&app, first).await.status(),
            StatusCode::CREATED
        );

        let second = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(register_body("a@example.com", "other"))
            .to_request();
        let resp = test::call_service(&app, second).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Email already registered");
    }

    #[actix_web::test]
    async fn login_with_bad_credentials_is_401() {
        let app = auth_app!();

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "nobody@example.com", "password": "nope" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn me_requires_bearer_token() {
        let app = auth_app!();

        let req = test::TestRequest::get().uri("/api/auth/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn me_roundtrip_and_profile_update() {
        let app = auth_app!();

        let register = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(register_body("a@example.com", "a"))
            .to_request();
        test::call_service(&app, register).await;

        let login = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "a@example.com", "password": "password123" }))
            .to_request();
        let login_resp: Value = test::call_and_read_body_json(&app, login).await;
        assert_eq!(login_resp["token_type"], "bearer");
        let token = login_resp["access_token"].as_str().unwrap().to_string();

        let me = test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let me_resp: Value = test::call_and_read_body_json(&app, me).await;
        assert_eq!(me_resp["email"], "a@example.com");

        let update = test::TestRequest::put()
            .uri("/api/auth/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(json!({ "phone": "555-0101" }))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, update).await;
        assert_eq!(updated["phone"], "555-0101");
        assert_eq!(updated["full_name"], "Test User");
    }
}
