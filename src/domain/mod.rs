pub mod errors;
pub mod models;
pub mod phone;
pub mod scoring;
