use serde::{Deserialize, Serialize};

/// Hard cap on page size, whatever the client asks for.
const MAX_PER_PAGE: u64 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 { 1 }
fn default_per_page() -> u64 { 20 }

impl PaginationParams {
    /// The effective page size. Offsets, limits, and page counts all derive
    /// from this one clamped value so pages tile the result set without gaps.
    pub fn per_page(&self) -> u64 {
        self.per_page.min(MAX_PER_PAGE)
    }

    pub fn offset(&self) -> u64 {
        (self.page.saturating_sub(1)) * self.per_page()
    }

    pub fn limit(&self) -> u64 {
        self.per_page()
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 1, per_page: 20 }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, params: &PaginationParams) -> Self {
        let per_page = params.per_page();
        let total_pages = if total == 0 { 0 } else { (total + per_page - 1) / per_page };
        Self {
            items,
            total,
            page: params.page,
            per_page,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_start_at_the_first_page() {
        let params = PaginationParams::default();
        assert_eq!(params.offset(), 0);
        assert_eq!(params.limit(), 20);
    }

    #[test]
    fn offset_strides_by_the_clamped_page_size() {
        // An oversized per_page must not open gaps between pages: page 2
        // has to start right where the capped page 1 ended.
        let params = PaginationParams { page: 2, per_page: 200 };
        assert_eq!(params.limit(), 100);
        assert_eq!(params.offset(), 100);
    }

    #[test]
    fn total_pages_uses_the_same_clamped_size() {
        let params = PaginationParams { page: 1, per_page: 200 };
        let page = Paginated::new(vec![0u8; 100], 250, &params);
        assert_eq!(page.per_page, 100);
        assert_eq!(page.total_pages, 3);

        let empty = Paginated::new(Vec::<u8>::new(), 0, &params);
        assert_eq!(empty.total_pages, 0);
    }
}
