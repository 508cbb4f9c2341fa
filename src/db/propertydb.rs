use async_trait::async_trait;
use sqlx::{
    query_builder::Separated, Encode, Postgres, QueryBuilder, Type,
};

use crate::{
    db::db::DBClient,
    models::propertymodel::{
        Category, ListingStatus, Property, PropertyImage, PropertyWithImage,
    },
    service::listing_rules::NormalizedPricing,
};

const SELECT_WITH_MAIN_IMAGE: &str = r#"
    SELECT
        p.*,
        (SELECT pi.image_url
         FROM property_image pi
         WHERE pi.property_id = p.id AND pi.is_main = true
         LIMIT 1) AS main_image
    FROM property p
"#;

// Advisory lock key guarding the featured-listing limit.
const FEATURED_LOCK_KEY: i64 = 0x6665_6174_7572_6564;

#[derive(Debug, Clone, PartialEq)]
pub enum FeaturedUpdate {
    Updated(Property),
    LimitReached,
    NotFound,
}

/// A listing ready to insert. Pricing is only accepted in normalized form.
#[derive(Debug, Clone)]
pub struct NewProperty {
    pub realtor_id: i32,
    pub property_type: String,
    pub category: Category,
    pub pricing: NormalizedPricing,
    pub maintenance_fee: Option<i64>,
    pub area: Option<f64>,
    pub rooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub direction: Option<String>,
    pub floor_info: Option<String>,
    pub usage_type: Option<String>,
    pub parking: Option<String>,
    pub elevator: Option<String>,
    pub move_in_date: Option<String>,
    pub sido: Option<String>,
    pub sigungu: Option<String>,
    pub dong: Option<String>,
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub description: Option<String>,
}

/// Columns to overwrite on an existing listing. `None` keeps the stored value.
/// When `pricing` is set, deal type and all three pricing columns are written together,
/// nulls included.
#[derive(Debug, Clone, Default)]
pub struct PropertyChanges {
    pub property_type: Option<String>,
    pub category: Option<Category>,
    pub pricing: Option<NormalizedPricing>,
    pub maintenance_fee: Option<i64>,
    pub area: Option<f64>,
    pub rooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub direction: Option<String>,
    pub floor_info: Option<String>,
    pub usage_type: Option<String>,
    pub parking: Option<String>,
    pub elevator: Option<String>,
    pub move_in_date: Option<String>,
    pub sido: Option<String>,
    pub sigungu: Option<String>,
    pub dong: Option<String>,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub description: Option<String>,
    pub status: Option<ListingStatus>,
}

fn assign<T>(set: &mut Separated<'_, 'static, Postgres, &'static str>, column: &str, value: Option<T>)
where
    T: 'static + Encode<'static, Postgres> + Type<Postgres> + Send,
{
    if let Some(value) = value {
        set.push(format!("{} = ", column));
        set.push_bind_unseparated(value);
    }
}

impl PropertyChanges {
    pub fn is_empty(&self) -> bool {
        self.property_type.is_none()
            && self.category.is_none()
            && self.pricing.is_none()
            && self.maintenance_fee.is_none()
            && self.area.is_none()
            && self.rooms.is_none()
            && self.bathrooms.is_none()
            && self.direction.is_none()
            && self.floor_info.is_none()
            && self.usage_type.is_none()
            && self.parking.is_none()
            && self.elevator.is_none()
            && self.move_in_date.is_none()
            && self.sido.is_none()
            && self.sigungu.is_none()
            && self.dong.is_none()
            && self.address.is_none()
            && self.lat.is_none()
            && self.lng.is_none()
            && self.description.is_none()
            && self.status.is_none()
    }

    /// Builds `UPDATE property SET ... WHERE id = $n RETURNING *`, or `None` when
    /// there is nothing to write.
    pub fn into_update_query(self, property_id: i32) -> Option<QueryBuilder<'static, Postgres>> {
        if self.is_empty() {
            return None;
        }

        let mut builder = QueryBuilder::new("UPDATE property SET ");
        {
            let mut set = builder.separated(", ");
            assign(&mut set, "type", self.property_type);
            assign(&mut set, "category", self.category.map(|c| c.as_str()));
            if let Some(pricing) = self.pricing {
                set.push("deal_type = ");
                set.push_bind_unseparated(pricing.deal_type().label());
                set.push("price = ");
                set.push_bind_unseparated(pricing.price());
                set.push("deposit = ");
                set.push_bind_unseparated(pricing.deposit());
                set.push("monthly_rent = ");
                set.push_bind_unseparated(pricing.monthly_rent());
            }
            assign(&mut set, "maintenance_fee", self.maintenance_fee);
            assign(&mut set, "area", self.area);
            assign(&mut set, "rooms", self.rooms);
            assign(&mut set, "bathrooms", self.bathrooms);
            assign(&mut set, "direction", self.direction);
            assign(&mut set, "floor_info", self.floor_info);
            assign(&mut set, "usage_type", self.usage_type);
            assign(&mut set, "parking", self.parking);
            assign(&mut set, "elevator", self.elevator);
            assign(&mut set, "move_in_date", self.move_in_date);
            assign(&mut set, "sido", self.sido);
            assign(&mut set, "sigungu", self.sigungu);
            assign(&mut set, "dong", self.dong);
            assign(&mut set, "address", self.address);
            assign(&mut set, "lat", self.lat);
            assign(&mut set, "lng", self.lng);
            assign(&mut set, "description", self.description);
            assign(&mut set, "status", self.status.map(|s| s.label()));
        }
        builder.push(" WHERE id = ");
        builder.push_bind(property_id);
        builder.push(" RETURNING *");

        Some(builder)
    }
}

#[async_trait]
pub trait PropertyExt: Send + Sync {
    async fn insert_property(
        &self,
        listing: NewProperty,
    ) -> Result<Property, sqlx::Error>;

    async fn get_property_by_id(
        &self,
        property_id: i32,
    ) -> Result<Option<PropertyWithImage>, sqlx::Error>;

    async fn get_properties(&self) -> Result<Vec<PropertyWithImage>, sqlx::Error>;

    async fn get_featured_properties(
        &self,
        limit: i64,
    ) -> Result<Vec<PropertyWithImage>, sqlx::Error>;

    async fn get_properties_by_category(
        &self,
        category: Category,
        limit: Option<i64>,
    ) -> Result<Vec<PropertyWithImage>, sqlx::Error>;

    /// `Ok(None)` when no row has `property_id`.
    async fn update_property(
        &self,
        property_id: i32,
        changes: PropertyChanges,
    ) -> Result<Option<Property>, sqlx::Error>;

    /// Removes the listing and its image rows; returns the removed image URLs.
    async fn delete_property(
        &self,
        property_id: i32,
    ) -> Result<Option<Vec<String>>, sqlx::Error>;

    /// Sets the featured flag. Turning it on fails with `LimitReached` once `limit`
    /// other listings are featured; the check and the write are one atomic step.
    async fn set_featured(
        &self,
        property_id: i32,
        is_featured: bool,
        limit: i64,
    ) -> Result<FeaturedUpdate, sqlx::Error>;

    async fn update_status(
        &self,
        property_id: i32,
        status: ListingStatus,
    ) -> Result<Option<Property>, sqlx::Error>;

    async fn get_property_images(
        &self,
        property_id: i32,
    ) -> Result<Vec<PropertyImage>, sqlx::Error>;

    async fn add_property_images(
        &self,
        property_id: i32,
        image_urls: Vec<String>,
    ) -> Result<Vec<PropertyImage>, sqlx::Error>;

    async fn delete_property_image(
        &self,
        property_id: i32,
        image_id: i32,
    ) -> Result<Option<String>, sqlx::Error>;

    async fn set_main_image(
        &self,
        property_id: i32,
        image_id: i32,
    ) -> Result<bool, sqlx::Error>;
}

#[async_trait]
impl PropertyExt for DBClient {
    async fn insert_property(
        &self,
        listing: NewProperty,
    ) -> Result<Property, sqlx::Error> {
        let pricing = listing.pricing;

        let property = sqlx::query_as::<_, Property>(
            r#"
            INSERT INTO property (
                realtor_id, type, category, price, deposit, monthly_rent, area, rooms, bathrooms,
                sido, sigungu, dong, address, lat, lng, description, deal_type,
                maintenance_fee, direction, floor_info, usage_type, parking, elevator, move_in_date,
                status, is_featured
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, false
            )
            RETURNING *
            "#,
        )
        .bind(listing.realtor_id)
        .bind(listing.property_type)
        .bind(listing.category.as_str())
        .bind(pricing.price())
        .bind(pricing.deposit())
        .bind(pricing.monthly_rent())
        .bind(listing.area)
        .bind(listing.rooms)
        .bind(listing.bathrooms)
        .bind(listing.sido)
        .bind(listing.sigungu)
        .bind(listing.dong)
        .bind(listing.address)
        .bind(listing.lat)
        .bind(listing.lng)
        .bind(listing.description)
        .bind(pricing.deal_type().label())
        .bind(listing.maintenance_fee)
        .bind(listing.direction)
        .bind(listing.floor_info)
        .bind(listing.usage_type)
        .bind(listing.parking)
        .bind(listing.elevator)
        .bind(listing.move_in_date)
        .bind(ListingStatus::Active.label())
        .fetch_one(&self.pool)
        .await?;

        Ok(property)
    }

    async fn get_property_by_id(
        &self,
        property_id: i32,
    ) -> Result<Option<PropertyWithImage>, sqlx::Error> {
        let query = format!("{} WHERE p.id = $1", SELECT_WITH_MAIN_IMAGE);
        sqlx::query_as::<_, PropertyWithImage>(&query)
            .bind(property_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_properties(&self) -> Result<Vec<PropertyWithImage>, sqlx::Error> {
        let query = format!("{} ORDER BY p.created_at DESC", SELECT_WITH_MAIN_IMAGE);
        sqlx::query_as::<_, PropertyWithImage>(&query)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_featured_properties(
        &self,
        limit: i64,
    ) -> Result<Vec<PropertyWithImage>, sqlx::Error> {
        let query = format!(
            "{} WHERE p.is_featured = true AND p.status = $1 ORDER BY p.created_at DESC LIMIT $2",
            SELECT_WITH_MAIN_IMAGE
        );
        sqlx::query_as::<_, PropertyWithImage>(&query)
            .bind(ListingStatus::Active.label())
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_properties_by_category(
        &self,
        category: Category,
        limit: Option<i64>,
    ) -> Result<Vec<PropertyWithImage>, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_WITH_MAIN_IMAGE);
        builder.push(" WHERE p.category = ");
        builder.push_bind(category.as_str());
        builder.push(" AND p.status = ");
        builder.push_bind(ListingStatus::Active.label());
        builder.push(" ORDER BY p.created_at DESC");
        if let Some(limit) = limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit);
        }

        builder
            .build_query_as::<PropertyWithImage>()
            .fetch_all(&self.pool)
            .await
    }

    async fn update_property(
        &self,
        property_id: i32,
        changes: PropertyChanges,
    ) -> Result<Option<Property>, sqlx::Error> {
        let Some(mut builder) = changes.into_update_query(property_id) else {
            return Ok(None);
        };

        builder
            .build_query_as::<Property>()
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_property(
        &self,
        property_id: i32,
    ) -> Result<Option<Vec<String>>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let image_urls: Vec<String> = sqlx::query_scalar(
            "SELECT image_url FROM property_image WHERE property_id = $1",
        )
        .bind(property_id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM property_image WHERE property_id = $1")
            .bind(property_id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM property WHERE id = $1")
            .bind(property_id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(image_urls))
    }

    async fn set_featured(
        &self,
        property_id: i32,
        is_featured: bool,
        limit: i64,
    ) -> Result<FeaturedUpdate, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        if is_featured {
            // serializes concurrent featured changes until commit/rollback
            sqlx::query("SELECT pg_advisory_xact_lock($1)")
                .bind(FEATURED_LOCK_KEY)
                .execute(&mut *tx)
                .await?;

            let others: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM property WHERE is_featured = true AND id <> $1",
            )
            .bind(property_id)
            .fetch_one(&mut *tx)
            .await?;

            if others >= limit {
                tx.rollback().await?;
                return Ok(FeaturedUpdate::LimitReached);
            }
        }

        let property = sqlx::query_as::<_, Property>(
            "UPDATE property SET is_featured = $1 WHERE id = $2 RETURNING *",
        )
        .bind(is_featured)
        .bind(property_id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(property.map_or(FeaturedUpdate::NotFound, FeaturedUpdate::Updated))
    }

    async fn update_status(
        &self,
        property_id: i32,
        status: ListingStatus,
    ) -> Result<Option<Property>, sqlx::Error> {
        sqlx::query_as::<_, Property>(
            "UPDATE property SET status = $1 WHERE id = $2 RETURNING *",
        )
        .bind(status.label())
        .bind(property_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_property_images(
        &self,
        property_id: i32,
    ) -> Result<Vec<PropertyImage>, sqlx::Error> {
        sqlx::query_as::<_, PropertyImage>(
            r#"
            SELECT id, property_id, image_url, is_main
            FROM property_image
            WHERE property_id = $1
            ORDER BY is_main DESC, id ASC
            "#,
        )
        .bind(property_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn add_property_images(
        &self,
        property_id: i32,
        image_urls: Vec<String>,
    ) -> Result<Vec<PropertyImage>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let has_main: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM property_image WHERE property_id = $1 AND is_main = true)",
        )
        .bind(property_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut images = Vec::with_capacity(image_urls.len());
        for (index, image_url) in image_urls.into_iter().enumerate() {
            let image = sqlx::query_as::<_, PropertyImage>(
                r#"
                INSERT INTO property_image (property_id, image_url, is_main)
                VALUES ($1, $2, $3)
                RETURNING id, property_id, image_url, is_main
                "#,
            )
            .bind(property_id)
            .bind(image_url)
            .bind(!has_main && index == 0)
            .fetch_one(&mut *tx)
            .await?;
            images.push(image);
        }

        tx.commit().await?;
        Ok(images)
    }

    async fn delete_property_image(
        &self,
        property_id: i32,
        image_id: i32,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            DELETE FROM property_image
            WHERE id = $1 AND property_id = $2
            RETURNING image_url
            "#,
        )
        .bind(image_id)
        .bind(property_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn set_main_image(
        &self,
        property_id: i32,
        image_id: i32,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE property_image SET is_main = false WHERE property_id = $1")
            .bind(property_id)
            .execute(&mut *tx)
            .await?;

        let updated = sqlx::query(
            "UPDATE property_image SET is_main = true WHERE id = $1 AND property_id = $2",
        )
        .bind(image_id)
        .bind(property_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            // unknown image: keep the previous main
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }
}
