// src/service/property_service.rs
use std::sync::Arc;

use validator::Validate;

use crate::{
    db::{
        db::DBClient,
        propertydb::{FeaturedUpdate, NewProperty, PropertyChanges, PropertyExt},
        query_timeout::QueryTimeout,
    },
    dtos::propertydtos::{CategoryQueryDto, CreatePropertyDto, UpdatePropertyDto},
    models::propertymodel::{
        Category, DealType, ListingStatus, PricingFields, Property, PropertyImage,
        PropertyWithImage,
    },
    service::{
        category::{infer_category, resolve_category},
        error::ServiceError,
        listing_rules::{normalize_pricing, NormalizedPricing},
    },
};

/// Listings shown in the featured strip of the home page.
pub const FEATURED_DISPLAY_LIMIT: i64 = 6;
/// Listings that may carry the featured flag at once.
pub const MAX_FEATURED: i64 = 8;
pub const MAX_IMAGES_PER_UPLOAD: usize = 5;

#[derive(Debug)]
pub struct PropertyService<R = DBClient> {
    repo: Arc<R>,
    timeout: QueryTimeout,
}

fn invalid_input(errors: validator::ValidationErrors) -> ServiceError {
    ServiceError::InvalidInput(CreatePropertyDto::validation_message(&errors))
}

fn normalize_logged(
    fields: PricingFields,
    deal_type: DealType,
) -> Result<NormalizedPricing, ServiceError> {
    let pricing = normalize_pricing(fields, deal_type)?;
    let cleared = pricing.cleared_from(&fields);
    if !cleared.is_empty() {
        let columns: Vec<&str> = cleared.iter().map(|f| f.column()).collect();
        tracing::debug!("{} 도메인 규칙 적용 - {:?} NULL로 설정", deal_type, columns);
    }
    Ok(pricing)
}

impl<R: PropertyExt> PropertyService<R> {
    pub fn new(repo: Arc<R>, timeout: QueryTimeout) -> Self {
        PropertyService { repo, timeout }
    }

    async fn require_property(&self, property_id: i32) -> Result<PropertyWithImage, ServiceError> {
        self.timeout
            .run(self.repo.get_property_by_id(property_id))
            .await?
            .ok_or(ServiceError::PropertyNotFound(property_id))
    }

    pub async fn create_property(&self, body: CreatePropertyDto) -> Result<Property, ServiceError> {
        body.validate().map_err(invalid_input)?;

        // pricing rules gate everything after them, category inference included
        let deal_type: DealType = body.deal_type.parse()?;
        let pricing = normalize_logged(body.pricing(), deal_type)?;

        let category = resolve_category(&body.property_type, body.category)?;
        if body.category.is_none() {
            tracing::debug!("category 자동 매핑: {} → {}", body.property_type, category);
        }

        let listing = NewProperty {
            realtor_id: body.realtor_id,
            property_type: body.property_type,
            category,
            pricing,
            maintenance_fee: body.maintenance_fee,
            area: body.area,
            rooms: body.rooms,
            bathrooms: body.bathrooms,
            direction: body.direction,
            floor_info: body.floor_info,
            usage_type: body.usage_type,
            parking: body.parking,
            elevator: body.elevator,
            move_in_date: body.move_in_date,
            sido: body.sido,
            sigungu: body.sigungu,
            dong: body.dong,
            address: body.address,
            lat: body.lat,
            lng: body.lng,
            description: body.description,
        };

        let property = self.timeout.run(self.repo.insert_property(listing)).await?;
        tracing::info!(property_id = property.id, "매물 등록 완료");
        Ok(property)
    }

    pub async fn get_property(&self, property_id: i32) -> Result<PropertyWithImage, ServiceError> {
        self.require_property(property_id).await
    }

    pub async fn list_properties(&self) -> Result<Vec<PropertyWithImage>, ServiceError> {
        Ok(self.timeout.run(self.repo.get_properties()).await?)
    }

    pub async fn featured_properties(&self) -> Result<Vec<PropertyWithImage>, ServiceError> {
        Ok(self
            .timeout
            .run(self.repo.get_featured_properties(FEATURED_DISPLAY_LIMIT))
            .await?)
    }

    /// Active listings of one category. Without a limit every match is returned.
    pub async fn properties_by_category(
        &self,
        category: &str,
        query: CategoryQueryDto,
    ) -> Result<Vec<PropertyWithImage>, ServiceError> {
        query.validate().map_err(invalid_input)?;
        let category: Category = category.parse().map_err(ServiceError::InvalidCategory)?;

        Ok(self
            .timeout
            .run(self.repo.get_properties_by_category(category, query.limit))
            .await?)
    }

    /// Partial update. Pricing is merged over the stored row and normalized as a whole,
    /// so a stored listing never ends up with a mixed pricing shape.
    pub async fn update_property(
        &self,
        property_id: i32,
        body: UpdatePropertyDto,
    ) -> Result<Property, ServiceError> {
        body.validate().map_err(invalid_input)?;
        let existing = self.require_property(property_id).await?.property;

        let pricing = if body.touches_pricing() {
            let deal_type: DealType = body
                .deal_type
                .as_deref()
                .unwrap_or(existing.deal_type.as_str())
                .parse()?;
            let merged = PricingFields {
                price: body.price.or(existing.price),
                deposit: body.deposit.or(existing.deposit),
                monthly_rent: body.monthly_rent.or(existing.monthly_rent),
            };
            Some(normalize_logged(merged, deal_type)?)
        } else {
            None
        };

        let category = match (&body.property_type, body.category) {
            (_, Some(category)) => Some(category),
            (Some(property_type), None) => {
                let category = infer_category(property_type)?;
                tracing::debug!("PUT - category 자동 매핑: {} → {}", property_type, category);
                Some(category)
            }
            (None, None) => None,
        };

        let status = body
            .status
            .as_deref()
            .map(str::parse::<ListingStatus>)
            .transpose()
            .map_err(ServiceError::InvalidStatus)?;

        let changes = PropertyChanges {
            property_type: body.property_type,
            category,
            pricing,
            maintenance_fee: body.maintenance_fee,
            area: body.area,
            rooms: body.rooms,
            bathrooms: body.bathrooms,
            direction: body.direction,
            floor_info: body.floor_info,
            usage_type: body.usage_type,
            parking: body.parking,
            elevator: body.elevator,
            move_in_date: body.move_in_date,
            sido: body.sido,
            sigungu: body.sigungu,
            dong: body.dong,
            address: body.address,
            lat: body.lat,
            lng: body.lng,
            description: body.description,
            status,
        };
        if changes.is_empty() {
            return Err(ServiceError::NothingToUpdate);
        }

        let property = self
            .timeout
            .run(self.repo.update_property(property_id, changes))
            .await?
            .ok_or(ServiceError::PropertyNotFound(property_id))?;

        tracing::info!(property_id, "매물 수정 완료");
        Ok(property)
    }

    /// Deletes the listing and its image rows. The returned URLs point at files the
    /// caller should remove from storage.
    pub async fn delete_property(&self, property_id: i32) -> Result<Vec<String>, ServiceError> {
        let image_urls = self
            .timeout
            .run(self.repo.delete_property(property_id))
            .await?
            .ok_or(ServiceError::PropertyNotFound(property_id))?;

        tracing::info!(property_id, images = image_urls.len(), "매물 삭제 완료");
        Ok(image_urls)
    }

    pub async fn set_featured(
        &self,
        property_id: i32,
        is_featured: bool,
    ) -> Result<Property, ServiceError> {
        let outcome = self
            .timeout
            .run(self.repo.set_featured(property_id, is_featured, MAX_FEATURED))
            .await?;

        match outcome {
            FeaturedUpdate::Updated(property) => {
                tracing::info!(property_id, is_featured, "추천매물 설정 변경");
                Ok(property)
            }
            FeaturedUpdate::LimitReached => Err(ServiceError::FeaturedLimitReached(MAX_FEATURED)),
            FeaturedUpdate::NotFound => Err(ServiceError::PropertyNotFound(property_id)),
        }
    }

    pub async fn update_status(&self, property_id: i32, status: &str) -> Result<Property, ServiceError> {
        let status: ListingStatus = status.parse().map_err(ServiceError::InvalidStatus)?;

        self.timeout
            .run(self.repo.update_status(property_id, status))
            .await?
            .ok_or(ServiceError::PropertyNotFound(property_id))
    }

    pub async fn property_images(&self, property_id: i32) -> Result<Vec<PropertyImage>, ServiceError> {
        Ok(self.timeout.run(self.repo.get_property_images(property_id)).await?)
    }

    /// Records uploaded image URLs. The first one becomes the main image when the
    /// listing has none yet.
    pub async fn add_images(
        &self,
        property_id: i32,
        image_urls: Vec<String>,
    ) -> Result<Vec<PropertyImage>, ServiceError> {
        if image_urls.is_empty() || image_urls.len() > MAX_IMAGES_PER_UPLOAD {
            return Err(ServiceError::ImageCountOutOfRange {
                given: image_urls.len(),
                max: MAX_IMAGES_PER_UPLOAD,
            });
        }
        self.require_property(property_id).await?;

        let images = self
            .timeout
            .run(self.repo.add_property_images(property_id, image_urls))
            .await?;
        tracing::info!(property_id, count = images.len(), "이미지 업로드 완료");
        Ok(images)
    }

    /// Removes one image row and returns its URL.
    pub async fn delete_image(&self, property_id: i32, image_id: i32) -> Result<String, ServiceError> {
        self.timeout
            .run(self.repo.delete_property_image(property_id, image_id))
            .await?
            .ok_or(ServiceError::ImageNotFound { property_id, image_id })
    }

    pub async fn set_main_image(&self, property_id: i32, image_id: i32) -> Result<(), ServiceError> {
        let updated = self
            .timeout
            .run(self.repo.set_main_image(property_id, image_id))
            .await?;
        if !updated {
            return Err(ServiceError::ImageNotFound { property_id, image_id });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::service::error::{ListingError, PricingField};

    #[derive(Default)]
    struct InMemoryRepo {
        properties: Mutex<Vec<Property>>,
        images: Mutex<Vec<PropertyImage>>,
        inserted: Mutex<Vec<NewProperty>>,
        updates: Mutex<Vec<PropertyChanges>>,
    }

    impl InMemoryRepo {
        fn with_property(property: Property) -> Self {
            let repo = InMemoryRepo::default();
            repo.properties.lock().unwrap().push(property);
            repo
        }

        fn with_image(self, id: i32, property_id: i32, is_main: bool) -> Self {
            self.images.lock().unwrap().push(PropertyImage {
                id,
                property_id,
                image_url: format!("/uploads/{}.jpg", id),
                is_main,
            });
            self
        }
    }

    fn stored(id: i32, deal_type: DealType, pricing: PricingFields) -> Property {
        Property {
            id,
            realtor_id: 1,
            property_type: "아파트".to_string(),
            category: Some("RESIDENTIAL".to_string()),
            deal_type: deal_type.label().to_string(),
            price: pricing.price,
            deposit: pricing.deposit,
            monthly_rent: pricing.monthly_rent,
            maintenance_fee: None,
            area: Some(84.9),
            rooms: Some(3),
            bathrooms: Some(2),
            direction: None,
            floor_info: None,
            usage_type: None,
            parking: None,
            elevator: None,
            move_in_date: None,
            sido: None,
            sigungu: None,
            dong: None,
            address: "천안시 동남구 청당동".to_string(),
            lat: None,
            lng: None,
            description: None,
            status: ListingStatus::Active.label().to_string(),
            is_featured: false,
            created_at: Utc::now(),
        }
    }

    fn apply(property: &mut Property, changes: &PropertyChanges) {
        if let Some(property_type) = &changes.property_type {
            property.property_type = property_type.clone();
        }
        if let Some(category) = changes.category {
            property.category = Some(category.as_str().to_string());
        }
        if let Some(pricing) = changes.pricing {
            property.deal_type = pricing.deal_type().label().to_string();
            property.price = pricing.price();
            property.deposit = pricing.deposit();
            property.monthly_rent = pricing.monthly_rent();
        }
        if let Some(rooms) = changes.rooms {
            property.rooms = Some(rooms);
        }
        if let Some(address) = &changes.address {
            property.address = address.clone();
        }
        if let Some(status) = changes.status {
            property.status = status.label().to_string();
        }
    }

    #[async_trait]
    impl PropertyExt for InMemoryRepo {
        async fn insert_property(&self, listing: NewProperty) -> Result<Property, sqlx::Error> {
            let mut properties = self.properties.lock().unwrap();
            let mut property = stored(properties.len() as i32 + 1, listing.pricing.deal_type(), listing.pricing.fields());
            property.realtor_id = listing.realtor_id;
            property.property_type = listing.property_type.clone();
            property.category = Some(listing.category.as_str().to_string());
            property.address = listing.address.clone();
            properties.push(property.clone());
            self.inserted.lock().unwrap().push(listing);
            Ok(property)
        }

        async fn get_property_by_id(&self, property_id: i32) -> Result<Option<PropertyWithImage>, sqlx::Error> {
            let properties = self.properties.lock().unwrap();
            Ok(properties.iter().find(|p| p.id == property_id).map(|p| PropertyWithImage {
                property: p.clone(),
                main_image: None,
            }))
        }

        async fn get_properties(&self) -> Result<Vec<PropertyWithImage>, sqlx::Error> {
            let properties = self.properties.lock().unwrap();
            Ok(properties
                .iter()
                .map(|p| PropertyWithImage { property: p.clone(), main_image: None })
                .collect())
        }

        async fn get_featured_properties(&self, limit: i64) -> Result<Vec<PropertyWithImage>, sqlx::Error> {
            let all = self.get_properties().await?;
            Ok(all
                .into_iter()
                .filter(|p| p.property.is_featured)
                .take(limit as usize)
                .collect())
        }

        async fn get_properties_by_category(
            &self,
            category: Category,
            limit: Option<i64>,
        ) -> Result<Vec<PropertyWithImage>, sqlx::Error> {
            let all = self.get_properties().await?;
            Ok(all
                .into_iter()
                .filter(|p| p.property.category.as_deref() == Some(category.as_str()))
                .take(limit.map_or(usize::MAX, |l| l as usize))
                .collect())
        }

        async fn update_property(
            &self,
            property_id: i32,
            changes: PropertyChanges,
        ) -> Result<Option<Property>, sqlx::Error> {
            let mut properties = self.properties.lock().unwrap();
            let updated = properties.iter_mut().find(|p| p.id == property_id).map(|p| {
                apply(p, &changes);
                p.clone()
            });
            self.updates.lock().unwrap().push(changes);
            Ok(updated)
        }

        async fn delete_property(&self, property_id: i32) -> Result<Option<Vec<String>>, sqlx::Error> {
            let mut properties = self.properties.lock().unwrap();
            let before = properties.len();
            properties.retain(|p| p.id != property_id);
            if properties.len() == before {
                return Ok(None);
            }
            let mut images = self.images.lock().unwrap();
            let urls = images
                .iter()
                .filter(|i| i.property_id == property_id)
                .map(|i| i.image_url.clone())
                .collect();
            images.retain(|i| i.property_id != property_id);
            Ok(Some(urls))
        }

        async fn set_featured(
            &self,
            property_id: i32,
            is_featured: bool,
            limit: i64,
        ) -> Result<FeaturedUpdate, sqlx::Error> {
            let mut properties = self.properties.lock().unwrap();
            let others = properties
                .iter()
                .filter(|p| p.is_featured && p.id != property_id)
                .count() as i64;
            if is_featured && others >= limit {
                return Ok(FeaturedUpdate::LimitReached);
            }
            Ok(properties
                .iter_mut()
                .find(|p| p.id == property_id)
                .map_or(FeaturedUpdate::NotFound, |p| {
                    p.is_featured = is_featured;
                    FeaturedUpdate::Updated(p.clone())
                }))
        }

        async fn update_status(&self, property_id: i32, status: ListingStatus) -> Result<Option<Property>, sqlx::Error> {
            let mut properties = self.properties.lock().unwrap();
            Ok(properties.iter_mut().find(|p| p.id == property_id).map(|p| {
                p.status = status.label().to_string();
                p.clone()
            }))
        }

        async fn get_property_images(&self, property_id: i32) -> Result<Vec<PropertyImage>, sqlx::Error> {
            let mut images: Vec<PropertyImage> = self
                .images
                .lock()
                .unwrap()
                .iter()
                .filter(|i| i.property_id == property_id)
                .cloned()
                .collect();
            images.sort_by_key(|i| (!i.is_main, i.id));
            Ok(images)
        }

        async fn add_property_images(
            &self,
            property_id: i32,
            image_urls: Vec<String>,
        ) -> Result<Vec<PropertyImage>, sqlx::Error> {
            let mut images = self.images.lock().unwrap();
            let has_main = images.iter().any(|i| i.property_id == property_id && i.is_main);
            let mut added = Vec::new();
            for (index, image_url) in image_urls.into_iter().enumerate() {
                let image = PropertyImage {
                    id: images.len() as i32 + 1,
                    property_id,
                    image_url,
                    is_main: !has_main && index == 0,
                };
                images.push(image.clone());
                added.push(image);
            }
            Ok(added)
        }

        async fn delete_property_image(&self, property_id: i32, image_id: i32) -> Result<Option<String>, sqlx::Error> {
            let mut images = self.images.lock().unwrap();
            let position = images
                .iter()
                .position(|i| i.id == image_id && i.property_id == property_id);
            Ok(position.map(|index| images.remove(index).image_url))
        }

        async fn set_main_image(&self, property_id: i32, image_id: i32) -> Result<bool, sqlx::Error> {
            let mut images = self.images.lock().unwrap();
            if !images.iter().any(|i| i.id == image_id && i.property_id == property_id) {
                return Ok(false);
            }
            for image in images.iter_mut().filter(|i| i.property_id == property_id) {
                image.is_main = image.id == image_id;
            }
            Ok(true)
        }
    }

    fn service(repo: InMemoryRepo) -> (PropertyService<InMemoryRepo>, Arc<InMemoryRepo>) {
        let repo = Arc::new(repo);
        (PropertyService::new(repo.clone(), QueryTimeout::default()), repo)
    }

    fn sale_body() -> CreatePropertyDto {
        CreatePropertyDto {
            realtor_id: 1,
            property_type: "아파트".to_string(),
            deal_type: "매매".to_string(),
            address: "천안시 동남구 청당동 1".to_string(),
            price: Some(420_000_000),
            deposit: Some(10_000_000),
            monthly_rent: Some(300_000),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_sale_persists_normalized_pricing() {
        let (service, repo) = service(InMemoryRepo::default());

        let property = service.create_property(sale_body()).await.unwrap();
        assert_eq!(property.price, Some(420_000_000));
        assert_eq!(property.deposit, None);
        assert_eq!(property.monthly_rent, None);
        assert_eq!(property.category.as_deref(), Some("RESIDENTIAL"));

        let inserted = repo.inserted.lock().unwrap();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].category, Category::Residential);
        assert_eq!(inserted[0].pricing.deal_type(), DealType::Sale);
    }

    #[tokio::test]
    async fn test_create_rejects_before_persistence() {
        let (service, repo) = service(InMemoryRepo::default());

        let body = CreatePropertyDto {
            deal_type: "월세".to_string(),
            deposit: Some(-1),
            monthly_rent: Some(500_000),
            ..sale_body()
        };
        let err = service.create_property(body).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Listing(ListingError::MissingRequiredField {
                deal_type: DealType::MonthlyRent,
                field: PricingField::Deposit,
            })
        ));

        let body = CreatePropertyDto {
            deal_type: "전월세".to_string(),
            ..sale_body()
        };
        let err = service.create_property(body).await.unwrap_err();
        assert!(matches!(err, ServiceError::Listing(ListingError::UnknownDealType(_))));

        let body = CreatePropertyDto {
            property_type: "농장".to_string(),
            ..sale_body()
        };
        let err = service.create_property(body).await.unwrap_err();
        assert!(matches!(err, ServiceError::Listing(ListingError::UnknownPropertyType(_))));

        assert!(repo.inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_with_explicit_category_skips_inference() {
        let (service, _repo) = service(InMemoryRepo::default());
        let body = CreatePropertyDto {
            property_type: "농장".to_string(),
            category: Some(Category::Land),
            ..sale_body()
        };
        let property = service.create_property(body).await.unwrap();
        assert_eq!(property.category.as_deref(), Some("LAND"));
    }

    #[tokio::test]
    async fn test_create_reports_missing_required_fields() {
        let (service, _repo) = service(InMemoryRepo::default());
        let body = CreatePropertyDto {
            deal_type: String::new(),
            ..sale_body()
        };
        let err = service.create_property(body).await.unwrap_err();
        assert_eq!(err.to_string(), "필수 값 누락 (realtor_id, type, address, deal_type)");
    }

    #[tokio::test]
    async fn test_pricing_errors_take_precedence_over_category() {
        let (service, repo) = service(InMemoryRepo::default());

        let body = CreatePropertyDto {
            property_type: "농장".to_string(),
            deal_type: "전월세".to_string(),
            ..sale_body()
        };
        let err = service.create_property(body).await.unwrap_err();
        assert!(matches!(err, ServiceError::Listing(ListingError::UnknownDealType(_))));

        let body = CreatePropertyDto {
            property_type: "농장".to_string(),
            price: None,
            ..sale_body()
        };
        let err = service.create_property(body).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Listing(ListingError::MissingRequiredField {
                deal_type: DealType::Sale,
                field: PricingField::Price,
            })
        ));
        assert!(repo.inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_pricing_errors_take_precedence_over_category() {
        let existing = stored(1, DealType::Sale, PricingFields { price: Some(300_000_000), ..Default::default() });
        let (service, repo) = service(InMemoryRepo::with_property(existing));

        let body = UpdatePropertyDto {
            property_type: Some("농장".to_string()),
            deal_type: Some("월세".to_string()),
            ..Default::default()
        };
        let err = service.update_property(1, body).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Listing(ListingError::MissingRequiredField { field: PricingField::Deposit, .. })
        ));
        assert!(repo.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_switching_to_monthly_rent_clears_price() {
        let existing = stored(1, DealType::Sale, PricingFields { price: Some(300_000_000), ..Default::default() });
        let (service, repo) = service(InMemoryRepo::with_property(existing));

        let body = UpdatePropertyDto {
            deal_type: Some("월세".to_string()),
            deposit: Some(20_000_000),
            monthly_rent: Some(800_000),
            ..Default::default()
        };
        let property = service.update_property(1, body).await.unwrap();
        assert_eq!(property.deal_type, "월세");
        assert_eq!(property.price, None);
        assert_eq!(property.deposit, Some(20_000_000));
        assert_eq!(property.monthly_rent, Some(800_000));
        assert_eq!(repo.updates.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_switching_deal_type_requires_new_fields() {
        let existing = stored(1, DealType::Sale, PricingFields { price: Some(300_000_000), ..Default::default() });
        let (service, repo) = service(InMemoryRepo::with_property(existing));

        let body = UpdatePropertyDto {
            deal_type: Some("월세".to_string()),
            ..Default::default()
        };
        let err = service.update_property(1, body).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Listing(ListingError::MissingRequiredField { field: PricingField::Deposit, .. })
        ));
        assert!(repo.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_pricing_uses_stored_deal_type() {
        let existing = stored(
            1,
            DealType::MonthlyRent,
            PricingFields { price: None, deposit: Some(5_000_000), monthly_rent: Some(400_000) },
        );
        let (service, _repo) = service(InMemoryRepo::with_property(existing));

        let body = UpdatePropertyDto {
            monthly_rent: Some(450_000),
            price: Some(99),
            ..Default::default()
        };
        let property = service.update_property(1, body).await.unwrap();
        assert_eq!(property.price, None);
        assert_eq!(property.deposit, Some(5_000_000));
        assert_eq!(property.monthly_rent, Some(450_000));

        let body = UpdatePropertyDto {
            monthly_rent: Some(0),
            ..Default::default()
        };
        assert!(service.update_property(1, body).await.is_err());
    }

    #[tokio::test]
    async fn test_update_without_pricing_leaves_pricing_alone() {
        let existing = stored(1, DealType::Jeonse, PricingFields { price: Some(150_000_000), ..Default::default() });
        let (service, repo) = service(InMemoryRepo::with_property(existing));

        let body = UpdatePropertyDto {
            property_type: Some("창고".to_string()),
            rooms: Some(0),
            ..Default::default()
        };
        let property = service.update_property(1, body).await.unwrap();
        assert_eq!(property.category.as_deref(), Some("INDUSTRIAL"));
        assert_eq!(property.price, Some(150_000_000));

        let updates = repo.updates.lock().unwrap();
        assert!(updates[0].pricing.is_none());
    }

    #[tokio::test]
    async fn test_update_edge_cases() {
        let existing = stored(1, DealType::Sale, PricingFields { price: Some(1), ..Default::default() });
        let (service, _repo) = service(InMemoryRepo::with_property(existing));

        let err = service.update_property(1, UpdatePropertyDto::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NothingToUpdate));

        let err = service.update_property(42, UpdatePropertyDto::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::PropertyNotFound(42)));

        let body = UpdatePropertyDto {
            status: Some("보류".to_string()),
            ..Default::default()
        };
        let err = service.update_property(1, body).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidStatus(_)));
    }

    #[tokio::test]
    async fn test_featured_limit() {
        let repo = InMemoryRepo::default();
        {
            let mut properties = repo.properties.lock().unwrap();
            for id in 1..=9 {
                let mut property = stored(id, DealType::Sale, PricingFields { price: Some(1), ..Default::default() });
                property.is_featured = id <= MAX_FEATURED as i32;
                properties.push(property);
            }
        }
        let (service, _repo) = service(repo);

        let err = service.set_featured(9, true).await.unwrap_err();
        assert!(matches!(err, ServiceError::FeaturedLimitReached(8)));

        let property = service.set_featured(1, false).await.unwrap();
        assert!(!property.is_featured);
        assert!(service.set_featured(9, true).await.unwrap().is_featured);
        assert_eq!(service.featured_properties().await.unwrap().len(), FEATURED_DISPLAY_LIMIT as usize);

        // at the limit, an already featured listing can still be re-flagged
        assert!(service.set_featured(2, true).await.unwrap().is_featured);
        assert!(matches!(service.set_featured(1, true).await, Err(ServiceError::FeaturedLimitReached(8))));
        assert!(matches!(service.set_featured(40, false).await, Err(ServiceError::PropertyNotFound(40))));
    }

    #[tokio::test]
    async fn test_update_status_values() {
        let existing = stored(1, DealType::Sale, PricingFields { price: Some(1), ..Default::default() });
        let (service, _repo) = service(InMemoryRepo::with_property(existing));

        assert_eq!(service.update_status(1, "거래완료").await.unwrap().status, "거래완료");
        assert!(matches!(service.update_status(1, "sold").await, Err(ServiceError::InvalidStatus(_))));
        assert!(matches!(service.update_status(5, "거래중").await, Err(ServiceError::PropertyNotFound(5))));
    }

    #[tokio::test]
    async fn test_category_listing_parses_category() {
        let existing = stored(1, DealType::Sale, PricingFields { price: Some(1), ..Default::default() });
        let (service, _repo) = service(InMemoryRepo::with_property(existing));

        let found = service
            .properties_by_category("RESIDENTIAL", CategoryQueryDto::default())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let err = service
            .properties_by_category("FARM", CategoryQueryDto::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCategory(_)));
    }

    #[tokio::test]
    async fn test_image_upload_rules() {
        let existing = stored(1, DealType::Sale, PricingFields { price: Some(1), ..Default::default() });
        let (service, _repo) = service(InMemoryRepo::with_property(existing));

        let err = service.add_images(1, Vec::new()).await.unwrap_err();
        assert!(matches!(err, ServiceError::ImageCountOutOfRange { given: 0, max: 5 }));

        let too_many = (0..6).map(|i| format!("/uploads/{}.jpg", i)).collect();
        assert!(service.add_images(1, too_many).await.is_err());

        let err = service.add_images(2, vec!["/uploads/a.jpg".into()]).await.unwrap_err();
        assert!(matches!(err, ServiceError::PropertyNotFound(2)));

        let images = service
            .add_images(1, vec!["/uploads/a.jpg".into(), "/uploads/b.jpg".into()])
            .await
            .unwrap();
        assert!(images[0].is_main);
        assert!(!images[1].is_main);

        let more = service.add_images(1, vec!["/uploads/c.jpg".into()]).await.unwrap();
        assert!(!more[0].is_main);
    }

    #[tokio::test]
    async fn test_main_image_and_delete() {
        let existing = stored(1, DealType::Sale, PricingFields { price: Some(1), ..Default::default() });
        let repo = InMemoryRepo::with_property(existing)
            .with_image(1, 1, true)
            .with_image(2, 1, false);
        let (service, _repo) = service(repo);

        service.set_main_image(1, 2).await.unwrap();
        let images = service.property_images(1).await.unwrap();
        assert_eq!(images[0].id, 2);
        assert!(images[0].is_main);
        assert!(!images[1].is_main);

        assert!(matches!(
            service.set_main_image(1, 9).await,
            Err(ServiceError::ImageNotFound { property_id: 1, image_id: 9 })
        ));

        assert_eq!(service.delete_image(1, 1).await.unwrap(), "/uploads/1.jpg");
        assert!(service.delete_image(1, 1).await.is_err());

        let removed = service.delete_property(1).await.unwrap();
        assert_eq!(removed, vec!["/uploads/2.jpg".to_string()]);
        assert!(matches!(service.delete_property(1).await, Err(ServiceError::PropertyNotFound(1))));
        assert!(matches!(service.get_property(1).await, Err(ServiceError::PropertyNotFound(1))));
    }
}
