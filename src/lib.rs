pub mod columns;
pub mod config;
pub mod db;
pub mod kobo;
