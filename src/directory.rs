//! Psychologist directory: client-side search, filters and "load more" paging.

use serde::{Deserialize, Serialize};

pub const PAGE_SIZE: usize = 6;

/// Directory card for one psychologist, already normalized from the backend record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Psychologist {
    pub id: i64,
    pub name: String,
    pub specialty: String,
    /// Session price in whole COP.
    pub price: u64,
    pub location: String,
    pub avatar: String,
    pub description: String,
    pub approach: String,
    pub experience: String,
    pub education: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub min: u64,
    pub max: u64,
}

impl PriceRange {
    pub const KNOWN: [PriceRange; 3] = [
        PriceRange { min: 0, max: 50_000 },
        PriceRange { min: 100_000, max: 150_000 },
        PriceRange { min: 200_000, max: 250_000 },
    ];

    /// Parses `min-max`; only the offered ranges are recognized.
    pub fn parse(s: &str) -> Option<Self> {
        let (lo, hi) = s.trim().split_once('-')?;
        let r = PriceRange { min: lo.trim().parse().ok()?, max: hi.trim().parse().ok()? };
        Self::KNOWN.contains(&r).then_some(r)
    }

    pub fn contains(&self, price: u64) -> bool { price >= self.min && price <= self.max }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectoryFilter {
    pub search: String,
    pub specialty: String,
    pub location: String,
    /// Raw range value; an unrecognized range does not filter.
    pub price: String,
}

impl DirectoryFilter {
    pub fn matches(&self, p: &Psychologist) -> bool {
        let search = self.search.trim().to_lowercase();
        if !search.is_empty() {
            let hit = [&p.name, &p.specialty, &p.description].iter().any(|f| f.to_lowercase().contains(&search));
            if !hit { return false; }
        }
        if !contains_ci(&p.specialty, &self.specialty) { return false; }
        if !contains_ci(&p.location, &self.location) { return false; }
        if !self.price.trim().is_empty() {
            if let Some(range) = PriceRange::parse(&self.price) {
                if !range.contains(p.price) { return false; }
            }
        }
        true
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Debug, Clone, Default)]
pub struct Directory {
    all: Vec<Psychologist>,
    filtered: Vec<Psychologist>,
    filter: DirectoryFilter,
    page: usize,
}

impl Directory {
    pub fn new(entries: Vec<Psychologist>) -> Self {
        let mut d = Directory { all: entries, filtered: Vec::new(), filter: DirectoryFilter::default(), page: 1 };
        d.apply();
        d
    }

    pub fn filter(&self) -> &DirectoryFilter { &self.filter }
    pub fn page(&self) -> usize { self.page }
    pub fn total(&self) -> usize { self.all.len() }
    pub fn filtered(&self) -> &[Psychologist] { &self.filtered }

    /// Replaces the filter and goes back to the first page.
    pub fn set_filter(&mut self, filter: DirectoryFilter) {
        self.filter = filter;
        self.page = 1;
        self.apply();
    }

    pub fn clear_filters(&mut self) { self.set_filter(DirectoryFilter::default()); }

    pub fn visible(&self) -> &[Psychologist] {
        let end = (self.page * PAGE_SIZE).min(self.filtered.len());
        &self.filtered[..end]
    }

    pub fn has_more(&self) -> bool { self.page * PAGE_SIZE < self.filtered.len() }

    /// Advances one page; returns false when everything is already visible.
    pub fn load_more(&mut self) -> bool {
        if !self.has_more() { return false; }
        self.page += 1;
        true
    }

    pub fn find(&self, id: i64) -> Option<&Psychologist> { self.all.iter().find(|p| p.id == id) }

    fn apply(&mut self) {
        self.filtered = self.all.iter().filter(|p| self.filter.matches(p)).cloned().collect();
    }
}

/// Colombian peso display: `$` prefix, dot thousands separator, no decimals.
pub fn format_cop(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('$');
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 { out.push('.'); }
        out.push(c);
    }
    out
}
