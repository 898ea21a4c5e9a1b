// src/services/inventory_service.rs

use crate::{
    common::{
        error::AppError,
        pagination::{limit_offset, Page},
    },
    db::InventoryRepository,
    models::inventory::{InventoryLogEntry, InventoryLogFilter},
};

pub const LOGS_PER_PAGE: u32 = 50;

#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: InventoryRepository,
}

impl InventoryService {
    pub fn new(inventory_repo: InventoryRepository) -> Self {
        Self { inventory_repo }
    }

    pub async fn list_logs(
        &self,
        filter: &InventoryLogFilter,
        page: u32,
    ) -> Result<Page<InventoryLogEntry>, AppError> {
        let (limit, offset) = limit_offset(page, LOGS_PER_PAGE);
        let entries = self.inventory_repo.list_entries(filter, limit, offset).await?;
        Ok(Page::new(entries, page.max(1), LOGS_PER_PAGE))
    }
}
