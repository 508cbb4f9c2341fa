use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::propertymodel::{Category, PricingFields};

const MISSING_REQUIRED: &str = "필수 값 누락 (realtor_id, type, address, deal_type)";

// absent required keys fall back to empty/zero so validation reports them
#[derive(Debug, Serialize, Deserialize, Validate, Clone, Default)]
#[serde(default)]
pub struct CreatePropertyDto {
    #[validate(range(min = 1, message = "필수 값 누락 (realtor_id, type, address, deal_type)"))]
    pub realtor_id: i32,

    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "필수 값 누락 (realtor_id, type, address, deal_type)"))]
    pub property_type: String,

    pub category: Option<Category>,

    #[validate(length(min = 1, message = "필수 값 누락 (realtor_id, type, address, deal_type)"))]
    pub deal_type: String,

    //Pricing
    pub price: Option<i64>,
    pub deposit: Option<i64>,
    pub monthly_rent: Option<i64>,
    #[validate(range(min = 0, message = "관리비는 0 이상이어야 합니다"))]
    pub maintenance_fee: Option<i64>,

    //Specifications
    #[validate(range(min = 0.0, message = "면적은 0 이상이어야 합니다"))]
    pub area: Option<f64>,
    #[validate(range(min = 0, message = "방 개수는 0 이상이어야 합니다"))]
    pub rooms: Option<i32>,
    #[validate(range(min = 0, message = "욕실 개수는 0 이상이어야 합니다"))]
    pub bathrooms: Option<i32>,
    pub direction: Option<String>,
    pub floor_info: Option<String>,
    pub usage_type: Option<String>,
    pub parking: Option<String>,
    pub elevator: Option<String>,
    pub move_in_date: Option<String>,

    //Location
    pub sido: Option<String>,
    pub sigungu: Option<String>,
    pub dong: Option<String>,
    #[validate(length(min = 1, message = "필수 값 누락 (realtor_id, type, address, deal_type)"))]
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,

    pub description: Option<String>,
}

impl CreatePropertyDto {
    pub fn pricing(&self) -> PricingFields {
        PricingFields {
            price: self.price,
            deposit: self.deposit,
            monthly_rent: self.monthly_rent,
        }
    }

    /// Message of the first failing field in field-name order, or the generic
    /// required-field message.
    pub fn validation_message(errors: &validator::ValidationErrors) -> String {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by_key(|(name, _)| *name);

        fields
            .into_iter()
            .flat_map(|(_, errs)| errs.iter())
            .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| MISSING_REQUIRED.to_string())
    }
}

/// Partial update. `None` leaves the stored column untouched.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, Default)]
pub struct UpdatePropertyDto {
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "매물 종류가 비어 있습니다"))]
    pub property_type: Option<String>,
    pub category: Option<Category>,
    pub deal_type: Option<String>,
    pub status: Option<String>,

    pub price: Option<i64>,
    pub deposit: Option<i64>,
    pub monthly_rent: Option<i64>,
    #[validate(range(min = 0, message = "관리비는 0 이상이어야 합니다"))]
    pub maintenance_fee: Option<i64>,

    #[validate(range(min = 0.0, message = "면적은 0 이상이어야 합니다"))]
    pub area: Option<f64>,
    #[validate(range(min = 0, message = "방 개수는 0 이상이어야 합니다"))]
    pub rooms: Option<i32>,
    #[validate(range(min = 0, message = "욕실 개수는 0 이상이어야 합니다"))]
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
    #[validate(length(min = 1, message = "주소가 비어 있습니다"))]
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,

    pub description: Option<String>,
}

impl UpdatePropertyDto {
    pub fn touches_pricing(&self) -> bool {
        self.deal_type.is_some()
            || self.price.is_some()
            || self.deposit.is_some()
            || self.monthly_rent.is_some()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct FeaturedDto {
    pub is_featured: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StatusDto {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone, Copy, Default)]
pub struct CategoryQueryDto {
    #[validate(range(min = 1, message = "limit은 1 이상이어야 합니다"))]
    pub limit: Option<i64>,
}
