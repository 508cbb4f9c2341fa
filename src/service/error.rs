use axum::http::StatusCode;
use thiserror::Error;

use crate::{
    db::query_timeout::QueryError,
    error::HttpError,
    models::propertymodel::DealType,
};

/// Pricing column checked by the deal-type rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingField {
    Price,
    Deposit,
    MonthlyRent,
}

impl PricingField {
    pub fn column(&self) -> &'static str {
        match self {
            PricingField::Price => "price",
            PricingField::Deposit => "deposit",
            PricingField::MonthlyRent => "monthly_rent",
        }
    }

    fn display_name(&self, deal_type: DealType) -> &'static str {
        match (self, deal_type) {
            (PricingField::Price, DealType::Jeonse) => "전세금",
            (PricingField::Price, _) => "매매가",
            (PricingField::Deposit, _) => "보증금",
            (PricingField::MonthlyRent, _) => "월세",
        }
    }
}

fn required_field_message(deal_type: &DealType, field: &PricingField) -> String {
    let particle = match field {
        PricingField::Price if *deal_type == DealType::Jeonse => "은",
        _ => "는",
    };
    format!(
        "{}: {}({}){} 필수입니다",
        deal_type.label(),
        field.display_name(*deal_type),
        field.column(),
        particle
    )
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListingError {
    #[error("{}", required_field_message(.deal_type, .field))]
    MissingRequiredField { deal_type: DealType, field: PricingField },

    #[error("알 수 없는 거래 유형: {0}")]
    UnknownDealType(String),

    #[error("알 수 없는 매물 종류: {0}")]
    UnknownPropertyType(String),
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Listing(#[from] ListingError),

    #[error("{0}")]
    InvalidInput(String),

    #[error("매물 없음")]
    PropertyNotFound(i32),

    #[error("이미지를 찾을 수 없음")]
    ImageNotFound { property_id: i32, image_id: i32 },

    #[error("수정할 값 없음")]
    NothingToUpdate,

    #[error("추천매물은 최대 {0}개까지만 설정할 수 있습니다.")]
    FeaturedLimitReached(i64),

    #[error("{0}")]
    InvalidStatus(String),

    #[error("{0}")]
    InvalidCategory(String),

    #[error("이미지는 1개 이상 {max}개 이하로 업로드할 수 있습니다 (요청: {given})")]
    ImageCountOutOfRange { given: usize, max: usize },

    #[error("Database error: {0}")]
    Database(#[from] QueryError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Database(QueryError::Database(err))
    }
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Listing(_)
            | ServiceError::InvalidInput(_)
            | ServiceError::NothingToUpdate
            | ServiceError::FeaturedLimitReached(_)
            | ServiceError::InvalidStatus(_)
            | ServiceError::InvalidCategory(_)
            | ServiceError::ImageCountOutOfRange { .. } => StatusCode::BAD_REQUEST,

            ServiceError::PropertyNotFound(_)
            | ServiceError::ImageNotFound { .. } => StatusCode::NOT_FOUND,

            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("listing request failed: {}", error);
                HttpError::server_error("요청 처리 실패")
            }
            status => HttpError::new(error.to_string(), status),
        }
    }
}
