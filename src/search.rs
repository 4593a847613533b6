use crate::models::Snippet;

/// Immutable query state threaded into [`filter_snippets`]. Keeping it a
/// plain value keeps filtering a pure function of (snapshot, query).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnippetQuery {
    /// Case-insensitive substring matched against title, description or code.
    pub search_text: String,
    /// Exact match when set.
    pub language: Option<String>,
    /// Exact match when set.
    pub sub_category: Option<String>,
    /// Every listed tag must be present (AND semantics).
    pub tags: Vec<String>,
}

impl SnippetQuery {
    pub fn is_empty(&self) -> bool {
        self.search_text.trim().is_empty()
            && self.language.is_none()
            && self.sub_category.is_none()
            && self.tags.is_empty()
    }
}

/// Compute the presented subset of a mirror snapshot, newest first.
///
/// An empty query returns the whole snapshot in the same order.
pub fn filter_snippets(snippets: &[Snippet], query: &SnippetQuery) -> Vec<Snippet> {
    let needle = query.search_text.trim().to_lowercase();
    let mut result: Vec<Snippet> = snippets
        .iter()
        .filter(|snippet| matches(snippet, query, &needle))
        .cloned()
        .collect();
    result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    result
}

fn matches(snippet: &Snippet, query: &SnippetQuery, needle: &str) -> bool {
    if !needle.is_empty() {
        let hit = snippet.title.to_lowercase().contains(needle)
            || snippet.description.to_lowercase().contains(needle)
            || snippet.code.to_lowercase().contains(needle);
        if !hit {
            return false;
        }
    }
    if let Some(language) = &query.language {
        if &snippet.language != language {
            return false;
        }
    }
    if let Some(sub_category) = &query.sub_category {
        if snippet.sub_category.as_ref() != Some(sub_category) {
            return false;
        }
    }
    query
        .tags
        .iter()
        .all(|tag| snippet.tags.iter().any(|t| t == tag))
}

/// Distinct languages present in the snapshot, sorted, for filter dropdowns.
pub fn available_languages(snippets: &[Snippet]) -> Vec<String> {
    let mut languages: Vec<String> = snippets.iter().map(|s| s.language.clone()).collect();
    languages.sort();
    languages.dedup();
    languages
}
