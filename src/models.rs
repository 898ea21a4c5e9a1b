pub mod auth;
pub mod inventory;
pub mod menu;
pub mod order;
