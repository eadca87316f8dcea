use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::TryStreamExt;
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthService;
use crate::errors::ApiError;
use crate::laptops::{decode_images, LaptopFilters, LaptopService};
use crate::models::{LaptopCreate, LaptopUpdate};
use crate::routes::auth_routes::extract_user;
use crate::uploads::ImageStore;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/laptops")
            .service(
                web::resource(["", "/"])
                    .route(web::get().to(list_laptops))
                    .route(web::post().to(create_laptop)),
            )
            .route("/user/my-listings", web::get().to(my_listings))
            .route("/{id}/upload-images", web::post().to(upload_images))
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_laptop))
                    .route(web::put().to(update_laptop))
                    .route(web::delete().to(delete_laptop)),
            ),
    );
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
    company: Option<String>,
    min_price: Option<f64>,
    max_price: Option<f64>,
    condition: Option<String>,
    search: Option<String>,
}

async fn list_laptops(
    laptops: web::Data<LaptopService>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let filters = LaptopFilters {
        company: query.company,
        min_price: query.min_price,
        max_price: query.max_price,
        condition: query.condition,
        search: query.search,
    };
    let results = laptops.list(&filters, query.skip, query.limit).await?;
    Ok(HttpResponse::Ok().json(results))
}

async fn get_laptop(
    laptops: web::Data<LaptopService>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let detail = laptops.get_detail(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

async fn create_laptop(
    req: HttpRequest,
    auth: web::Data<AuthService>,
    laptops: web::Data<LaptopService>,
    body: web::Json<LaptopCreate>,
) -> Result<HttpResponse, ApiError> {
    let user = extract_user(&req, &auth).await?;
    let created = laptops.create(body.into_inner(), &user).await?;
    Ok(HttpResponse::Created().json(created))
}

async fn update_laptop(
    req: HttpRequest,
    auth: web::Data<AuthService>,
    laptops: web::Data<LaptopService>,
    path: web::Path<i64>,
    body: web::Json<LaptopUpdate>,
) -> Result<HttpResponse, ApiError> {
    let user = extract_user(&req, &auth).await?;
    let updated = laptops
        .update(path.into_inner(), body.into_inner(), &user)
        .await?;
    Ok(HttpResponse::Ok().json(updated))
}

async fn delete_laptop(
    req: HttpRequest,
    auth: web::Data<AuthService>,
    laptops: web::Data<LaptopService>,
    images: web::Data<ImageStore>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let user = extract_user(&req, &auth).await?;
    laptops.delete(path.into_inner(), &user, &images).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn my_listings(
    req: HttpRequest,
    auth: web::Data<AuthService>,
    laptops: web::Data<LaptopService>,
) -> Result<HttpResponse, ApiError> {
    let user = extract_user(&req, &auth).await?;
    let results = laptops.my_listings(&user).await?;
    Ok(HttpResponse::Ok().json(results))
}

/// Multipart image upload. Files are checked and saved one at a time; the
/// first oversized file aborts the call, and files saved earlier in the same
/// batch stay on disk but are not recorded on the listing.
async fn upload_images(
    req: HttpRequest,
    auth: web::Data<AuthService>,
    laptops: web::Data<LaptopService>,
    images: web::Data<ImageStore>,
    path: web::Path<i64>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let user = extract_user(&req, &auth).await?;
    let laptop = laptops.get(path.into_inner()).await?;
    if laptop.owner_id != user.id {
        return Err(ApiError::Forbidden(
            "Not authorized to upload images for this laptop".to_string(),
        ));
    }

    let mut all_images = decode_images(laptop.images.as_deref());
    let mut new_paths = Vec::new();

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ApiError::Validation(format!("Invalid upload: {e}")))?
    {
        let filename = field
            .content_disposition()
            .get_filename()
            .map(str::to_owned)
            .unwrap_or_else(|| "upload.bin".to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| ApiError::Validation(format!("Invalid upload: {e}")))?
        {
            if data.len() + chunk.len() > images.max_file_size() {
                return Err(ApiError::FileTooLarge(filename));
            }
            data.extend_from_slice(&chunk);
        }

        new_paths.push(images.save(laptop.id, &filename, &data)?);
    }

    all_images.extend(new_paths);
    laptops.set_images(laptop.id, &all_images).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Images uploaded successfully",
        "images": all_images,
    })))
}
