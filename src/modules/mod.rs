pub mod auth;
pub mod common;
pub mod payment;
pub mod plan;
