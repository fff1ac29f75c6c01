pub mod admin;
pub mod health;
pub mod usage;
pub mod workflows;
