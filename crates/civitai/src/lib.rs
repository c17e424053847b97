//! # Civitai: The Supplier
//!
//! **Metadata lookups and streamed downloads against the Civitai REST API.**
//!
//! The pipeline talks to the remote through the [`ModelService`] trait so that the
//! orchestrator can be driven by anything that answers the three calls it needs.
//! [`CivitaiClient`] is the real implementation, built on `surf`.
//!
//! ## Usage
//!
//! ```no_run
//! use airgrab_civitai::{CivitaiClient, ModelService, Settings};
//!
//! #[async_std::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (settings, _path) = Settings::load()?;
//!     let client = CivitaiClient::from_settings(&settings);
//!
//!     let version = client.model_version(368189).await?;
//!     let model = client.model(version.model_id).await?;
//!     println!("{} / {} ({})", model.name, version.name, model.category);
//!
//!     if let Some(file) = version.primary_file() {
//!         let report = |bytes: u64| print!("\r+{} bytes", bytes);
//!         client
//!             .download(&file.download_url, std::path::Path::new(&file.name), Some(&report))
//!             .await?;
//!     }
//!     Ok(())
//! }
//! ```

/// HTTP client for the Civitai API.
pub mod client;

/// User configuration (`config.toml`).
pub mod settings;

use airgrab_core::manifest::{Model, ModelVersion};
use airgrab_core::GrabError;
use async_trait::async_trait;
use std::path::Path;

pub use client::CivitaiClient;
pub use settings::Settings;

/// Callback receiving the number of bytes written by each chunk.
pub type Progress<'a> = &'a (dyn Fn(u64) + Send + Sync);

#[async_trait]
pub trait ModelService: Send + Sync {
    /// Fetch a model version record by id
    async fn model_version(&self, version_id: i64) -> Result<ModelVersion, GrabError>;

    /// Fetch a model record by id, with its category filled in
    async fn model(&self, model_id: i64) -> Result<Model, GrabError>;

    /// Stream a remote resource into `dest`, creating or truncating it.
    /// Returns the number of bytes written.
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<Progress<'_>>,
    ) -> Result<u64, GrabError>;
}
