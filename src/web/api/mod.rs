pub mod altitude;
pub mod error;
pub mod health;
