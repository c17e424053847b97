use crate::category::infer_category;
use serde::{Deserialize, Serialize};

/// A release of a model, as returned by `GET /model-versions/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelVersion {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    /// Id of the owning model.
    #[serde(default)]
    pub model_id: i64,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub files: Vec<ModelFile>,
    #[serde(default)]
    pub images: Vec<ModelImage>,
}

impl ModelVersion {
    /// The canonical downloadable artifact of this version.
    pub fn primary_file(&self) -> Option<&ModelFile> {
        self.files.iter().find(|f| f.primary)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    pub name: String,
    /// Declared size; only used to scale progress output.
    #[serde(default, rename = "sizeKB")]
    pub size_kb: f64,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(rename = "downloadUrl", alias = "downloadURL")]
    pub download_url: String,
}

impl ModelFile {
    pub fn total_bytes(&self) -> u64 {
        (self.size_kb.max(0.0) * 1024.0) as u64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelImage {
    pub url: String,
}

/// A model, as returned by `GET /models/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Inferred from `tags` once the record is fetched.
    #[serde(default)]
    pub category: String,
    /// Published versions, newest first.
    #[serde(default)]
    pub model_versions: Vec<VersionSummary>,
}

impl Model {
    /// Fill in `category` from the tags.
    pub fn categorize(mut self) -> Self {
        self.category = infer_category(&self.tags);
        self
    }

    pub fn latest_version(&self) -> Option<&VersionSummary> {
        self.model_versions.first()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionSummary {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERSION_JSON: &str = r#"{
        "id": 368189,
        "modelId": 328553,
        "name": "v1.0 beta",
        "baseModel": "SDXL 1.0",
        "files": [
            {
                "name": "preview.zip",
                "sizeKB": 12.5,
                "type": "Training Data",
                "downloadUrl": "https://civitai.com/api/download/models/368189?type=Training%20Data"
            },
            {
                "name": "detail_slider.safetensors",
                "sizeKB": 2048,
                "type": "Model",
                "primary": true,
                "downloadUrl": "https://civitai.com/api/download/models/368189"
            }
        ],
        "images": [
            { "url": "https://image.civitai.com/xG1/abc/width=832/5523.jpeg", "nsfw": "None" }
        ]
    }"#;

    #[test]
    fn test_decode_version() {
        let version: ModelVersion = serde_json::from_str(VERSION_JSON).unwrap();
        assert_eq!(version.id, 368189);
        assert_eq!(version.model_id, 328553);
        assert_eq!(version.files.len(), 2);
        assert_eq!(version.images.len(), 1);

        let primary = version.primary_file().unwrap();
        assert_eq!(primary.name, "detail_slider.safetensors");
        assert_eq!(primary.total_bytes(), 2048 * 1024);
    }

    #[test]
    fn test_no_primary_file() {
        let version: ModelVersion = serde_json::from_str(
            r#"{"id": 1, "files": [{"name": "a", "downloadUrl": "https://x/a"}]}"#,
        )
        .unwrap();
        assert!(version.primary_file().is_none());
    }

    #[test]
    fn test_download_url_alias() {
        let file: ModelFile =
            serde_json::from_str(r#"{"name": "a", "downloadURL": "https://x/a"}"#).unwrap();
        assert_eq!(file.download_url, "https://x/a");
        assert!(!file.primary);
    }

    #[test]
    fn test_decode_model_and_categorize() {
        let model = serde_json::from_str::<Model>(
            r#"{
                "id": 328553,
                "name": "Detail Slider",
                "type": "LORA",
                "tags": ["anime", "Concept", "style"],
                "modelVersions": [{"id": 368189, "name": "v1.0"}, {"id": 2, "name": "v0.9"}]
            }"#,
        )
        .unwrap()
        .categorize();
        assert_eq!(model.kind, "LORA");
        assert_eq!(model.category, "Concept");
        assert_eq!(model.latest_version().unwrap().id, 368189);
    }
}
