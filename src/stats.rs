use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};

use crate::models::Snippet;

/// Aggregate statistics over one mirror snapshot, as shown on the
/// dashboard. Derived in full on every emission; nothing is accumulated
/// incrementally, so the numbers can never drift from the snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardStats {
    pub total_snippets: usize,
    pub language_count: usize,
    pub language_distribution: HashMap<String, usize>,
    pub category_count: usize,
    pub public_snippets: usize,
    /// Rounded percentage of public snippets; 0 for an empty snapshot.
    pub public_percent: u32,
    pub tag_count: usize,
    pub total_likes: i64,
    /// Snippets created within the trailing 7x24h window, boundary
    /// inclusive.
    pub weekly_growth: usize,
}

pub fn compute_stats(snippets: &[Snippet]) -> DashboardStats {
    compute_stats_at(snippets, Utc::now())
}

/// O(n) over the snapshot; `now` is the measurement instant for the weekly
/// window.
pub fn compute_stats_at(snippets: &[Snippet], now: DateTime<Utc>) -> DashboardStats {
    let mut language_distribution: HashMap<String, usize> = HashMap::new();
    let mut categories: HashSet<&str> = HashSet::new();
    let mut tags: HashSet<&str> = HashSet::new();
    let mut public_snippets = 0;
    let mut total_likes = 0;
    let mut weekly_growth = 0;
    let week_ago = now - Duration::days(7);

    for snippet in snippets {
        if !snippet.language.is_empty() {
            *language_distribution
                .entry(snippet.language.clone())
                .or_default() += 1;
        }
        if let Some(category) = &snippet.sub_category {
            categories.insert(category.as_str());
        }
        for tag in &snippet.tags {
            tags.insert(tag.as_str());
        }
        if snippet.is_public {
            public_snippets += 1;
        }
        total_likes += snippet.likes;
        if snippet.created_at >= week_ago {
            weekly_growth += 1;
        }
    }

    let total_snippets = snippets.len();
    let public_percent = if total_snippets == 0 {
        0
    } else {
        ((public_snippets as f64 / total_snippets as f64) * 100.0).round() as u32
    };

    DashboardStats {
        total_snippets,
        language_count: language_distribution.len(),
        language_distribution,
        category_count: categories.len(),
        public_snippets,
        public_percent,
        tag_count: tags.len(),
        total_likes,
        weekly_growth,
    }
}
