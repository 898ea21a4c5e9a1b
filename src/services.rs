pub mod inventory_service;
pub mod menu_service;
pub mod order_service;
pub mod payment_service;
pub mod pickup;
pub mod verification_service;

#[cfg(test)]
mod db_tests;
