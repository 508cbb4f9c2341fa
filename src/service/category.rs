use crate::{models::propertymodel::Category, service::error::ListingError};

// Property type labels accepted by the listing form, grouped by the category they file under.
const CATEGORY_TABLE: &[(Category, &[&str])] = &[
    (Category::Residential, &["아파트", "오피스텔", "원룸", "투룸", "빌라"]),
    (Category::Commercial, &["상가", "사무실"]),
    (Category::Industrial, &["공장", "창고"]),
    (Category::Land, &["토지"]),
];

pub fn infer_category(property_type: &str) -> Result<Category, ListingError> {
    CATEGORY_TABLE
        .iter()
        .find(|(_, labels)| labels.contains(&property_type))
        .map(|(category, _)| *category)
        .ok_or_else(|| ListingError::UnknownPropertyType(property_type.to_string()))
}

/// An explicit category always wins and is never checked against the type label.
pub fn resolve_category(
    property_type: &str,
    explicit: Option<Category>,
) -> Result<Category, ListingError> {
    match explicit {
        Some(category) => Ok(category),
        None => infer_category(property_type),
    }
}
