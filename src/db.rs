pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod menu_repo;
pub use menu_repo::MenuRepository;
pub mod order_repo;
pub use order_repo::OrderRepository;
