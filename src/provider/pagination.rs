//! Page resolution for `limit` / `pagination`

use serde::{Deserialize, Serialize};

use super::search::Pagination;

/// Page actually requested from the feature source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based
    pub page: u32,
    pub page_size: u32,
}

/// Token handed back to the caller for the following page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageToken {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn next(&self) -> PageToken {
        PageToken {
            page: self.page.saturating_add(1),
            page_size: self.page_size,
        }
    }

    /// Zero-based record offset of this page
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.page_size as usize)
    }
}

/// Work out which page to fetch
///
/// - 默认第 1 页，页大小为 `max_page_size`
/// - `limit == 0` 等同于不限制
/// - `limit` 只收缩页大小，不会超过 `max_page_size`
/// - 显式的 `pagination` 优先，页大小同样被限制在 `max_page_size` 以内
pub fn resolve(limit: Option<u32>, pagination: Option<&Pagination>, max_page_size: u32) -> PageRequest {
    let max_page_size = max_page_size.max(1);
    let mut page = 1;
    let mut page_size = max_page_size;

    if let Some(limit) = limit.filter(|l| *l > 0) {
        page_size = limit.min(max_page_size);
    }

    if let Some(p) = pagination {
        page = p.page.unwrap_or(1).max(1);
        page_size = p
            .page_size
            .filter(|s| *s > 0)
            .unwrap_or(max_page_size)
            .min(max_page_size);
    }

    PageRequest { page, page_size }
}
