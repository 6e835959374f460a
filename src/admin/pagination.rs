/// Page window over a change list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

impl Paginator {
    /// Clamp `page` (1-based) into the valid range for `total` items.
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let per_page = per_page.max(1);
        let mut paginator = Self {
            page: 1,
            per_page,
            total: total.max(0),
        };
        paginator.page = page.clamp(1, paginator.num_pages());
        paginator
    }

    /// Always at least one page, even when empty.
    pub fn num_pages(&self) -> i64 {
        ((self.total + self.per_page - 1) / self.per_page).max(1)
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.num_pages()
    }

    pub fn previous(&self) -> i64 {
        (self.page - 1).max(1)
    }

    pub fn next(&self) -> i64 {
        (self.page + 1).min(self.num_pages())
    }
}
