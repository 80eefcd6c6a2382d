/// API routes outside the catalog resources
pub mod health;
pub mod index;
