// Domain layer - Business rules with no I/O
pub mod dashboard;
pub mod period;
pub mod project;
pub mod role;
pub mod tile_link;
