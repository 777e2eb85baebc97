use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub list: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

impl PaginationParams {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self { page, page_size }
    }

    pub fn get_page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn get_page_size(&self) -> u32 {
        self.page_size.unwrap_or(20).clamp(1, 50)
    }

    pub fn get_offset(&self) -> u32 {
        (self.get_page() - 1) * self.get_page_size()
    }

    pub fn get_limit(&self) -> u32 {
        self.get_page_size()
    }
}

impl<T> PaginatedResponse<T> {
    pub fn new(list: Vec<T>, params: &PaginationParams, total: i64) -> Self {
        Self {
            list,
            total,
            page: params.get_page(),
            page_size: params.get_page_size(),
        }
    }
}
