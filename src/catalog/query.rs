//! Listing filters, sort order and paging

/// Field a listing is sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Title,
    Composer,
    Year,
}

impl SortField {
    /// Parse a `_sort` value; unknown fields fall back to title
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "composer" => SortField::Composer,
            "year" => SortField::Year,
            _ => SortField::Title,
        }
    }
}

/// Direction of a listing sort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Parse an `_order` value; anything but `desc` is ascending
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

/// Parameters for [`InMemoryCatalog::list`](super::InMemoryCatalog::list)
#[derive(Debug, Clone)]
pub struct SheetQuery {
    /// Substring of the title
    pub title: Option<String>,
    /// Substring of the composer name
    pub composer: Option<String>,
    /// Match sheets carrying any of these genres
    pub genres: Vec<String>,
    /// Match sheets carrying any of these instruments
    pub instruments: Vec<String>,
    pub sort: SortField,
    pub order: SortOrder,
    /// 1-based page number
    pub page: usize,
    /// Page size
    pub limit: usize,
}

impl Default for SheetQuery {
    fn default() -> Self {
        Self {
            title: None,
            composer: None,
            genres: Vec::new(),
            instruments: Vec::new(),
            sort: SortField::Title,
            order: SortOrder::Asc,
            page: 1,
            limit: 10,
        }
    }
}

impl SheetQuery {
    /// Number of matching rows to skip
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// Split a comma-separated query value into trimmed, non-empty names
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
