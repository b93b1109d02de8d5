pub mod db;
pub mod migrations;

pub use db::SqliteRepository;
pub use migrations::{Migration, MIGRATIONS};
