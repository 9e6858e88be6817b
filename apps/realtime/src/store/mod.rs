pub mod cache;
pub mod documents;
pub mod keys;
pub mod repos;
