pub mod base;
pub mod cost;
pub mod escalation;
pub mod models;
pub mod roles;
pub mod tiers;
