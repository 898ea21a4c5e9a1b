use serde::Serialize;
use utoipa::ToSchema;

/// Uma página de resultados (numeração começa em 1).
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, per_page: u32) -> Self {
        Self { items, page, per_page }
    }
}

/// Converte o número da página (>= 1) em LIMIT/OFFSET.
pub fn limit_offset(page: u32, per_page: u32) -> (i64, i64) {
    let page = page.max(1) as i64;
    let per_page = per_page as i64;
    (per_page, (page - 1) * per_page)
}
