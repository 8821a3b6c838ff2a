pub mod alerts;
pub mod app;
pub mod transactions;
