//! Deal-type pricing rules.
//!
//! Every persisted listing carries exactly one pricing shape:
//!
//! | deal type | required                         | forced to null            |
//! |-----------|----------------------------------|---------------------------|
//! | 매매      | `price > 0`                      | `deposit`, `monthly_rent` |
//! | 전세      | `price > 0`                      | `deposit`, `monthly_rent` |
//! | 월세      | `deposit >= 0`, `monthly_rent > 0` | `price`                 |
//!
//! Missing required values are rejected. Values that do not belong to the deal type
//! are cleared without complaint.

use serde::Serialize;

use crate::{
    models::propertymodel::{DealType, PricingFields},
    service::error::{ListingError, PricingField},
};

/// Pricing that has passed [`normalize_pricing`]. Only this module can build one, so
/// anything holding a `NormalizedPricing` satisfies the table above.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedPricing {
    deal_type: DealType,
    price: Option<i64>,
    deposit: Option<i64>,
    monthly_rent: Option<i64>,
}

impl NormalizedPricing {
    pub fn deal_type(&self) -> DealType {
        self.deal_type
    }

    pub fn price(&self) -> Option<i64> {
        self.price
    }

    pub fn deposit(&self) -> Option<i64> {
        self.deposit
    }

    pub fn monthly_rent(&self) -> Option<i64> {
        self.monthly_rent
    }

    pub fn fields(&self) -> PricingFields {
        PricingFields {
            price: self.price,
            deposit: self.deposit,
            monthly_rent: self.monthly_rent,
        }
    }

    /// Columns the caller supplied that normalization replaced with null.
    pub fn cleared_from(&self, input: &PricingFields) -> Vec<PricingField> {
        let mut cleared = Vec::new();
        if input.price.is_some() && self.price.is_none() {
            cleared.push(PricingField::Price);
        }
        if input.deposit.is_some() && self.deposit.is_none() {
            cleared.push(PricingField::Deposit);
        }
        if input.monthly_rent.is_some() && self.monthly_rent.is_none() {
            cleared.push(PricingField::MonthlyRent);
        }
        cleared
    }
}

fn require(
    value: Option<i64>,
    accept: impl Fn(i64) -> bool,
    deal_type: DealType,
    field: PricingField,
) -> Result<i64, ListingError> {
    value
        .filter(|v| accept(*v))
        .ok_or(ListingError::MissingRequiredField { deal_type, field })
}

/// Applies the pricing rules for `deal_type`. Either the whole record is normalized or
/// an error is returned; nothing is partially applied.
pub fn normalize_pricing(
    fields: PricingFields,
    deal_type: DealType,
) -> Result<NormalizedPricing, ListingError> {
    match deal_type {
        DealType::Sale | DealType::Jeonse => {
            let price = require(fields.price, |p| p > 0, deal_type, PricingField::Price)?;
            Ok(NormalizedPricing {
                deal_type,
                price: Some(price),
                deposit: None,
                monthly_rent: None,
            })
        }
        DealType::MonthlyRent => {
            let deposit = require(fields.deposit, |d| d >= 0, deal_type, PricingField::Deposit)?;
            let monthly_rent = require(
                fields.monthly_rent,
                |r| r > 0,
                deal_type,
                PricingField::MonthlyRent,
            )?;
            Ok(NormalizedPricing {
                deal_type,
                price: None,
                deposit: Some(deposit),
                monthly_rent: Some(monthly_rent),
            })
        }
    }
}

/// Same as [`normalize_pricing`] but takes the deal type as its stored label
/// (`매매`, `전세`, `월세`).
pub fn validate_and_normalize(
    fields: PricingFields,
    deal_type: &str,
) -> Result<NormalizedPricing, ListingError> {
    normalize_pricing(fields, deal_type.parse()?)
}
