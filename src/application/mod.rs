// Application layer - Use cases over the repository port
pub mod aggregation;
pub mod crm_repository;
pub mod dashboard_service;
pub mod streaming_service;
