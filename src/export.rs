use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StoreError;
use crate::models::{Snippet, Version};
use crate::snippets::SnippetManager;
use crate::store::DocumentStore;

pub const EXPORT_FORMAT_VERSION: &str = "1.0";

/// Default name for a JSON backup, e.g. `snippets_backup_2026-08-08.json`.
pub fn backup_file_name() -> String {
    format!("snippets_backup_{}.json", Utc::now().format("%Y-%m-%d"))
}

/// Default name for a plain-text dump.
pub fn text_export_file_name() -> String {
    format!("snippets_text_{}.txt", Utc::now().format("%Y-%m-%d"))
}

/// Backup file structure: every snippet of one user with its full version
/// history embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub snippets: Vec<ExportedSnippet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedSnippet {
    #[serde(flatten)]
    pub snippet: Snippet,
    #[serde(default)]
    pub versions: Vec<Version>,
}

/// Outcome of an import run. Individual snippet failures are collected
/// here; they never abort the rest of the batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub total: usize,
    pub imported: usize,
    pub failed: usize,
    pub errors: Vec<ImportError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportError {
    pub snippet: String,
    pub error: String,
}

/// Gather the current user's snippets and their histories into a backup.
pub fn export_snippets(manager: &SnippetManager) -> Result<ExportData, StoreError> {
    let mut snippets = Vec::new();
    for snippet in manager.list_mine()? {
        let versions = manager.versions().list(snippet.id)?;
        snippets.push(ExportedSnippet { snippet, versions });
    }
    Ok(ExportData {
        version: EXPORT_FORMAT_VERSION.to_string(),
        export_date: Utc::now(),
        snippets,
    })
}

pub fn export_to_file(manager: &SnippetManager, path: &Path) -> anyhow::Result<()> {
    let data = export_snippets(manager)?;
    let json = serde_json::to_string_pretty(&data).context("Failed to serialize backup")?;
    fs::write(path, json).context("Failed to write backup file")
}

/// Human-readable dump: labeled fields, a fenced code block per snippet,
/// snippets separated by a divider line.
pub fn export_plain_text(manager: &SnippetManager) -> Result<String, StoreError> {
    let mut text = String::new();
    for snippet in manager.list_mine()? {
        text.push_str(&format!("Title: {}\n", snippet.title));
        text.push_str(&format!("Language: {}\n", snippet.language));
        text.push_str(&format!("Tags: {}\n", snippet.tags.join(", ")));
        if let Some(category) = &snippet.sub_category {
            if !category.is_empty() {
                text.push_str(&format!("Category: {category}\n"));
            }
        }
        text.push_str(&format!("Description: {}\n", snippet.description));
        text.push_str("Code:\n");
        text.push_str(&format!("```{}\n", snippet.language.to_lowercase()));
        text.push_str(&snippet.code);
        text.push_str("\n```\n\n");
        text.push_str("-------------------\n\n");
    }
    Ok(text)
}

pub fn export_plain_text_to_file(manager: &SnippetManager, path: &Path) -> anyhow::Result<()> {
    let text = export_plain_text(manager)?;
    fs::write(path, text).context("Failed to write text export file")
}

/// Read and validate a backup file, then import it. The payload must carry
/// both `version` and `snippets` to be accepted at all.
pub fn import_from_file(manager: &SnippetManager, path: &Path) -> anyhow::Result<ImportReport> {
    let contents = fs::read_to_string(path).context("Failed to read backup file")?;
    let raw: serde_json::Value =
        serde_json::from_str(&contents).context("Failed to parse backup file as JSON")?;
    if raw.get("version").is_none() || raw.get("snippets").is_none() {
        anyhow::bail!("invalid backup file format");
    }
    let data: ExportData = serde_json::from_value(raw).context("Failed to parse backup contents")?;
    Ok(import_snippets(manager, data))
}

/// Import every snippet in the backup as a fresh, always-private snippet of
/// the current user, re-homing its version history.
pub fn import_snippets(manager: &SnippetManager, data: ExportData) -> ImportReport {
    let mut report = ImportReport {
        total: data.snippets.len(),
        ..ImportReport::default()
    };
    for exported in data.snippets {
        let label = exported.snippet.title.clone();
        match import_one(manager, exported) {
            Ok(()) => report.imported += 1,
            Err(err) => {
                warn!(snippet = %label, %err, "skipping snippet on import");
                report.failed += 1;
                report.errors.push(ImportError {
                    snippet: label,
                    error: err.to_string(),
                });
            }
        }
    }
    report
}

fn import_one(manager: &SnippetManager, exported: ExportedSnippet) -> Result<(), StoreError> {
    let ExportedSnippet { snippet, versions } = exported;
    let mut draft = snippet.to_draft();
    // Imported snippets are always created private; the backup's folder
    // does not exist in this account.
    draft.is_public = false;
    draft.folder_id = None;
    draft.validate()?;

    let fresh = Snippet::from_draft(&manager.session().user_id, draft);
    manager.store().insert(
        "snippets",
        &fresh.id.to_string(),
        serde_json::to_value(&fresh)?,
    )?;
    manager.versions().import_history(&fresh, versions)
}
