pub mod category;
pub mod error;
pub mod listing_rules;
pub mod property_service;
