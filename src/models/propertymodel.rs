use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::service::error::ListingError;

/// Transaction type of a listing. Stored and exchanged as the Korean label.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DealType {
    #[serde(rename = "매매")]
    Sale,
    #[serde(rename = "전세")]
    Jeonse,
    #[serde(rename = "월세")]
    MonthlyRent,
}

impl DealType {
    pub const ALL: [DealType; 3] = [DealType::Sale, DealType::Jeonse, DealType::MonthlyRent];

    pub fn label(&self) -> &'static str {
        match self {
            DealType::Sale => "매매",
            DealType::Jeonse => "전세",
            DealType::MonthlyRent => "월세",
        }
    }
}

impl fmt::Display for DealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DealType {
    type Err = ListingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DealType::ALL
            .into_iter()
            .find(|deal_type| deal_type.label() == s)
            .ok_or_else(|| ListingError::UnknownDealType(s.to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Residential,
    Commercial,
    Industrial,
    Land,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Residential,
        Category::Commercial,
        Category::Industrial,
        Category::Land,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Residential => "RESIDENTIAL",
            Category::Commercial => "COMMERCIAL",
            Category::Industrial => "INDUSTRIAL",
            Category::Land => "LAND",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| format!("알 수 없는 카테고리: {}", s))
    }
}

/// Trading state shown on the site. Only these two values are ever written.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ListingStatus {
    #[serde(rename = "거래중")]
    Active,
    #[serde(rename = "거래완료")]
    Completed,
}

impl ListingStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ListingStatus::Active => "거래중",
            ListingStatus::Completed => "거래완료",
        }
    }
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "거래중" => Ok(ListingStatus::Active),
            "거래완료" => Ok(ListingStatus::Completed),
            _ => Err("잘못된 상태 값".to_string()),
        }
    }
}

/// Raw pricing columns as submitted by a caller, amounts in won.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct PricingFields {
    pub price: Option<i64>,
    pub deposit: Option<i64>,
    pub monthly_rent: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Property {
    pub id: i32,
    pub realtor_id: i32,

    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub property_type: String,
    pub category: Option<String>,
    pub deal_type: String,

    //Pricing
    pub price: Option<i64>,
    pub deposit: Option<i64>,
    pub monthly_rent: Option<i64>,
    pub maintenance_fee: Option<i64>,

    //Specifications
    pub area: Option<f64>,
    pub rooms: Option<i32>,
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
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,

    pub description: Option<String>,
    pub status: String,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

impl Property {
    pub fn pricing(&self) -> PricingFields {
        PricingFields {
            price: self.price,
            deposit: self.deposit,
            monthly_rent: self.monthly_rent,
        }
    }
}

/// A listing row together with the URL of its main image, if one is set.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct PropertyWithImage {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub property: Property,
    pub main_image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct PropertyImage {
    pub id: i32,
    pub property_id: i32,
    pub image_url: String,
    pub is_main: bool,
}
