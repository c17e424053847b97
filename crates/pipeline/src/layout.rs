//! Where downloads land: `root/type/category/model/version/<file>`.

use airgrab_core::manifest::{Model, ModelVersion};
use airgrab_core::GrabError;
use std::path::{Path, PathBuf};
use url::Url;

/// Make one directory level from a display name: whitespace and path
/// separators become `_`.
pub fn path_segment(name: &str) -> String {
    let segment: String = name
        .chars()
        .map(|c| {
            if c.is_whitespace() || c == '/' || c == '\\' {
                '_'
            } else {
                c
            }
        })
        .collect();

    match segment.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => segment,
    }
}

pub fn model_directory(root: &Path, model: &Model, version: &ModelVersion) -> PathBuf {
    root.join(path_segment(&model.kind))
        .join(path_segment(&model.category))
        .join(path_segment(&model.name))
        .join(path_segment(&version.name))
}

/// Remote file names are kept as given, minus anything that would leave the
/// target directory.
pub fn file_name(name: &str) -> String {
    let cleaned = name.replace(['/', '\\'], "_");
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

/// Local name for an image: the last non-empty segment of its URL path,
/// still percent-encoded.
pub fn image_file_name(url: &str) -> Result<String, GrabError> {
    let parsed = Url::parse(url).map_err(|_| GrabError::InvalidImageUrl(url.to_string()))?;

    parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(file_name)
        .ok_or_else(|| GrabError::InvalidImageUrl(url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(kind: &str, category: &str, name: &str) -> Model {
        Model {
            id: 1,
            name: name.to_string(),
            kind: kind.to_string(),
            tags: Vec::new(),
            category: category.to_string(),
            model_versions: Vec::new(),
        }
    }

    fn version(name: &str) -> ModelVersion {
        ModelVersion {
            id: 2,
            name: name.to_string(),
            model_id: 1,
            kind: String::new(),
            files: Vec::new(),
            images: Vec::new(),
        }
    }

    #[test]
    fn test_model_directory_replaces_whitespace() {
        let dir = model_directory(
            Path::new("/models"),
            &model("LORA", "base model", "Detail Slider  XL"),
            &version("v1.0 beta"),
        );
        assert_eq!(
            dir,
            Path::new("/models/LORA/base_model/Detail_Slider__XL/v1.0_beta")
        );
    }

    #[test]
    fn test_segments_cannot_escape_root() {
        assert_eq!(path_segment("AC/DC"), "AC_DC");
        assert_eq!(path_segment(".."), "_");
        assert_eq!(path_segment(""), "_");
        assert_eq!(file_name("../../evil.safetensors"), ".._.._evil.safetensors");
        assert_eq!(file_name("model.safetensors"), "model.safetensors");
    }

    #[test]
    fn test_image_file_name() {
        assert_eq!(
            image_file_name("https://image.civitai.com/xG1/abc/width=450/5523.jpeg").unwrap(),
            "5523.jpeg"
        );
        assert_eq!(
            image_file_name("https://img.example/a/2.png?width=450#top").unwrap(),
            "2.png"
        );
        assert_eq!(image_file_name("https://img.example/a/3.png/").unwrap(), "3.png");
    }

    #[test]
    fn test_image_url_is_normalised_before_naming() {
        // Backslashes separate segments in http(s) URLs.
        assert_eq!(
            image_file_name("https://image.civitai.com/a\\b\\c.png").unwrap(),
            "c.png"
        );
        assert_eq!(
            image_file_name("HTTPS://img.example/x/%2E%2E/4.png").unwrap(),
            "4.png"
        );
        assert!(matches!(
            image_file_name("HTTPS://img.example/x/%2E%2E"),
            Err(GrabError::InvalidImageUrl(_))
        ));
    }

    #[test]
    fn test_image_url_without_path() {
        for url in [
            "https://img.example",
            "https://img.example/",
            "",
            "not a url",
            "data:image/png;base64,AAAA",
        ] {
            assert!(
                matches!(image_file_name(url), Err(GrabError::InvalidImageUrl(_))),
                "expected failure for {url:?}"
            );
        }
    }
}
