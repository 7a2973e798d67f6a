pub mod health;
pub mod mcq;
