pub mod db;
pub mod propertydb;
pub mod query_timeout;
