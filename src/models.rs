use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user, safe to return from any endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            full_name: user.full_name,
            phone: user.phone,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UserUpdateRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

/// Database row for a laptop listing. `images` holds a JSON array of file
/// paths as text; decoding is lenient (see `laptops::decode_images`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Laptop {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub type_name: Option<String>,
    pub inches: Option<f64>,
    pub screen_resolution: Option<String>,
    pub cpu: Option<String>,
    pub ram: Option<String>,
    pub memory: Option<String>,
    pub gpu: Option<String>,
    pub os: Option<String>,
    pub weight: Option<String>,
    pub price: f64,
    pub condition: Option<String>,
    pub description: Option<String>,
    pub contact_info: Option<String>,
    pub location: Option<String>,
    pub images: Option<String>,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct LaptopCreate {
    pub title: String,
    pub company: String,
    pub type_name: Option<String>,
    pub inches: Option<f64>,
    pub screen_resolution: Option<String>,
    pub cpu: Option<String>,
    pub ram: Option<String>,
    pub memory: Option<String>,
    pub gpu: Option<String>,
    pub os: Option<String>,
    pub weight: Option<String>,
    pub price: f64,
    pub condition: Option<String>,
    pub description: Option<String>,
    pub contact_info: Option<String>,
    pub location: Option<String>,
}

/// Partial update payload. Fields left out of the request body stay `None`
/// and are not written to the row.
#[derive(Debug, Default, Deserialize)]
pub struct LaptopUpdate {
    pub title: Option<String>,
    pub company: Option<String>,
    pub type_name: Option<String>,
    pub inches: Option<f64>,
    pub screen_resolution: Option<String>,
    pub cpu: Option<String>,
    pub ram: Option<String>,
    pub memory: Option<String>,
    pub gpu: Option<String>,
    pub os: Option<String>,
    pub weight: Option<String>,
    pub price: Option<f64>,
    pub condition: Option<String>,
    pub description: Option<String>,
    pub contact_info: Option<String>,
    pub location: Option<String>,
}

/// Full listing detail, including the resolved owner.
#[derive(Debug, Serialize, Deserialize)]
pub struct LaptopResponse {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub type_name: Option<String>,
    pub inches: Option<f64>,
    pub screen_resolution: Option<String>,
    pub cpu: Option<String>,
    pub ram: Option<String>,
    pub memory: Option<String>,
    pub gpu: Option<String>,
    pub os: Option<String>,
    pub weight: Option<String>,
    pub price: f64,
    pub condition: Option<String>,
    pub description: Option<String>,
    pub contact_info: Option<String>,
    pub location: Option<String>,
    pub images: Vec<String>,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: UserResponse,
}

impl LaptopResponse {
    pub fn from_parts(laptop: Laptop, images: Vec<String>, owner: UserResponse) -> Self {
        Self {
            id: laptop.id,
            title: laptop.title,
            company: laptop.company,
            type_name: laptop.type_name,
            inches: laptop.inches,
            screen_resolution: laptop.screen_resolution,
            cpu: laptop.cpu,
            ram: laptop.ram,
            memory: laptop.memory,
            gpu: laptop.gpu,
            os: laptop.os,
            weight: laptop.weight,
            price: laptop.price,
            condition: laptop.condition,
            description: laptop.description,
            contact_info: laptop.contact_info,
            location: laptop.location,
            images,
            owner_id: laptop.owner_id,
            created_at: laptop.created_at,
            updated_at: laptop.updated_at,
            owner,
        }
    }
}

/// Compact listing used by browse/search results.
#[derive(Debug, Serialize, Deserialize)]
pub struct LaptopSummary {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub price: f64,
    pub condition: Option<String>,
    pub images: Vec<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub company: String,
    pub type_name: String,
    pub inches: f64,
    pub screen_resolution: String,
    pub cpu: String,
    pub ram: String,
    pub memory: String,
    pub gpu: String,
    pub os: String,
    pub weight: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predicted_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub message: String,
}
