use chrono::Utc;
use log::{info, warn};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::errors::ApiError;
use crate::models::{
    Laptop, LaptopCreate, LaptopResponse, LaptopSummary, LaptopUpdate, User, UserResponse,
};
use crate::uploads::ImageStore;

/// Lenient decode of the stored image-list JSON. Corrupt or missing data
/// yields an empty list, never an error.
pub fn decode_images(raw: Option<&str>) -> Vec<String> {
    raw.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}

#[derive(Debug, Default)]
pub struct LaptopFilters {
    pub company: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub condition: Option<String>,
    pub search: Option<String>,
}

pub struct LaptopService {
    pool: SqlitePool,
}

impl LaptopService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Browse listings, newest first. Company and search are substring
    /// matches (SQLite LIKE is case-insensitive for ASCII), condition is an
    /// exact match and price bounds are inclusive.
    pub async fn list(
        &self,
        filters: &LaptopFilters,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<LaptopSummary>, ApiError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM laptops WHERE 1 = 1");

        if let Some(company) = &filters.company {
            qb.push(" AND company LIKE ");
            qb.push_bind(format!("%{company}%"));
        }
        if let Some(min_price) = filters.min_price {
            qb.push(" AND price >= ");
            qb.push_bind(min_price);
        }
        if let Some(max_price) = filters.max_price {
            qb.push(" AND price <= ");
            qb.push_bind(max_price);
        }
        if let Some(condition) = &filters.condition {
            qb.push(" AND condition = ");
            qb.push_bind(condition);
        }
        if let Some(search) = &filters.search {
            let pattern = format!("%{search}%");
            qb.push(" AND (title LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR description LIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }

        qb.push(" ORDER BY created_at DESC LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(skip);

        let laptops: Vec<Laptop> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(laptops.into_iter().map(summary).collect())
    }

    pub async fn get(&self, id: i64) -> Result<Laptop, ApiError> {
        sqlx::query_as::<_, Laptop>("SELECT * FROM laptops WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Laptop not found".to_string()))
    }

    /// Full detail with the owner resolved through an explicit second query.
    pub async fn get_detail(&self, id: i64) -> Result<LaptopResponse, ApiError> {
        let laptop = self.get(id).await?;
        self.to_response(laptop).await
    }

    pub async fn create(&self, attrs: LaptopCreate, owner: &User) -> Result<LaptopResponse, ApiError> {
        if attrs.price < 0.0 {
            return Err(ApiError::Validation("Price must be non-negative".to_string()));
        }

        let now = Utc::now();
        let laptop = sqlx::query_as::<_, Laptop>(
            r#"
            INSERT INTO laptops (
                title, company, type_name, inches, screen_resolution, cpu, ram,
                memory, gpu, os, weight, price, condition, description,
                contact_info, location, images, owner_id, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&attrs.title)
        .bind(&attrs.company)
        .bind(&attrs.type_name)
        .bind(attrs.inches)
        .bind(&attrs.screen_resolution)
        .bind(&attrs.cpu)
        .bind(&attrs.ram)
        .bind(&attrs.memory)
        .bind(&attrs.gpu)
        .bind(&attrs.os)
        .bind(&attrs.weight)
        .bind(attrs.price)
        .bind(&attrs.condition)
        .bind(&attrs.description)
        .bind(&attrs.contact_info)
        .bind(&attrs.location)
        .bind("[]")
        .bind(owner.id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        info!("Laptop {} created by user {}", laptop.id, owner.id);
        self.to_response(laptop).await
    }

    /// Partial update: only fields present in the payload are written.
    pub async fn update(
        &self,
        id: i64,
        changes: LaptopUpdate,
        caller: &User,
    ) -> Result<LaptopResponse, ApiError> {
        let laptop = self.get(id).await?;
        if laptop.owner_id != caller.id {
            return Err(ApiError::Forbidden(
                "Not authorized to update this laptop".to_string(),
            ));
        }
        if let Some(price) = changes.price {
            if price < 0.0 {
                return Err(ApiError::Validation("Price must be non-negative".to_string()));
            }
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE laptops SET updated_at = ");
        qb.push_bind(Utc::now());

        macro_rules! set_field {
            ($field:ident) => {
                if let Some(value) = changes.$field {
                    qb.push(concat!(", ", stringify!($field), " = "));
                    qb.push_bind(value);
                }
            };
        }
        set_field!(title);
        set_field!(company);
        set_field!(type_name);
        set_field!(inches);
        set_field!(screen_resolution);
        set_field!(cpu);
        set_field!(ram);
        set_field!(memory);
        set_field!(gpu);
        set_field!(os);
        set_field!(weight);
        set_field!(price);
        set_field!(condition);
        set_field!(description);
        set_field!(contact_info);
        set_field!(location);

        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.build().execute(&self.pool).await?;

        self.get_detail(id).await
    }

    /// Deletes a listing and its image files. File removal happens first and
    /// is best-effort: one stubborn file never blocks the rest or the row.
    pub async fn delete(&self, id: i64, caller: &User, images: &ImageStore) -> Result<(), ApiError> {
        let laptop = self.get(id).await?;
        if laptop.owner_id != caller.id {
            return Err(ApiError::Forbidden(
                "Not authorized to delete this laptop".to_string(),
            ));
        }

        for path in decode_images(laptop.images.as_deref()) {
            images.remove(&path);
        }

        sqlx::query("DELETE FROM laptops WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        info!("Laptop {} deleted by user {}", id, caller.id);
        Ok(())
    }

    pub async fn my_listings(&self, caller: &User) -> Result<Vec<LaptopSummary>, ApiError> {
        let laptops = sqlx::query_as::<_, Laptop>(
            "SELECT * FROM laptops WHERE owner_id = ? ORDER BY created_at DESC",
        )
        .bind(caller.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(laptops.into_iter().map(summary).collect())
    }

    /// Overwrites the stored image list for a listing.
    pub async fn set_images(&self, id: i64, images: &[String]) -> Result<(), ApiError> {
        let encoded = serde_json::to_string(images)
            .map_err(|e| ApiError::Internal(format!("image list encoding error: {e}")))?;

        sqlx::query("UPDATE laptops SET images = ?, updated_at = ? WHERE id = ?")
            .bind(encoded)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn to_response(&self, laptop: Laptop) -> Result<LaptopResponse, ApiError> {
        let owner = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(laptop.owner_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                warn!("Laptop {} references missing owner {}", laptop.id, laptop.owner_id);
                ApiError::Internal(format!("owner {} not found", laptop.owner_id))
            })?;

        let images = decode_images(laptop.images.as_deref());
        Ok(LaptopResponse::from_parts(laptop, images, UserResponse::from(owner)))
    }
}

fn summary(laptop: Laptop) -> LaptopSummary {
    let images = decode_images(laptop.images.as_deref());
    LaptopSummary {
        id: laptop.id,
        title: laptop.title,
        company: laptop.company,
        price: laptop.price,
        condition: laptop.condition,
        images,
        location: laptop.location,
        created_at: laptop.created_at,
    }
}
