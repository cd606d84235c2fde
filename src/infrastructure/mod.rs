// Infrastructure layer - External dependencies and adapters
pub mod cache;
pub mod chunked_json;
pub mod config;
pub mod http_response;
pub mod memory_repository;
pub mod postgres_repository;
