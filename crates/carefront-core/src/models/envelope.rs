use serde::{Deserialize, Serialize};

/// Standard response envelope wrapped around every Carefront endpoint.
///
/// Even HTTP 200 responses can report failure through `isSuccess`, with a
/// human-readable `message` the portals surface directly.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: serde::Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    #[serde(rename = "isSuccess", default)]
    pub is_success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One page of a list endpoint. Pages are 1-based.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: serde::Deserialize<'de>"))]
pub struct Paged<T> {
    #[serde(default)]
    pub items: Vec<T>,
    #[serde(default)]
    pub page: u32,
    #[serde(rename = "pageSize", default)]
    pub page_size: u32,
    #[serde(rename = "totalCount", default)]
    pub total_count: u64,
}

impl<T> Paged<T> {
    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(self.page_size as u64) as u32
    }

    pub fn has_next(&self) -> bool {
        self.page_size != 0 && (self.page as u64) * (self.page_size as u64) < self.total_count
    }
}
