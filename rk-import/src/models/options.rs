//! Per-run import options

use rk_common::config::ImportDefaults;
use serde::{Deserialize, Serialize};

/// Options captured once at run start and applied to every item
///
/// Serialized in the backend's camelCase form; flattened into the
/// import-batch body and sent as text fields with uploads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOptions {
    /// Convert plain-text books to EPUB on import
    pub auto_convert_txt: bool,
    /// Convert MOBI/AZW3 books to EPUB on import
    pub auto_convert_mobi: bool,
    /// Fetch metadata (cover, author, rating) from online sources
    pub auto_fetch_metadata: bool,
    /// Visible to every library user, not only the importer
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Remove the scanned source file after a successful import
    pub delete_source_after_import: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self::from(&ImportDefaults::default())
    }
}

impl From<&ImportDefaults> for ImportOptions {
    fn from(defaults: &ImportDefaults) -> Self {
        Self {
            auto_convert_txt: defaults.auto_convert_txt,
            auto_convert_mobi: defaults.auto_convert_mobi,
            auto_fetch_metadata: defaults.auto_fetch_metadata,
            is_public: defaults.is_public,
            category: defaults.category.clone(),
            delete_source_after_import: defaults.delete_source_after_import,
        }
    }
}

impl ImportOptions {
    /// Multipart text fields for `POST /books/upload`
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("autoConvertTxt", self.auto_convert_txt.to_string()),
            ("autoConvertMobi", self.auto_convert_mobi.to_string()),
            ("autoFetchMetadata", self.auto_fetch_metadata.to_string()),
            ("isPublic", self.is_public.to_string()),
            (
                "deleteSourceAfterImport",
                self.delete_source_after_import.to_string(),
            ),
        ];
        if let Some(category) = &self.category {
            fields.push(("category", category.clone()));
        }
        fields
    }
}
