use crate::handoff::HandoffReceiver;
use crate::layout;
use airgrab_civitai::ModelService;
use airgrab_core::manifest::{Model, ModelVersion};
use airgrab_core::protocol::DownloadEvent;
use airgrab_core::{GrabError, ResourceLocator};
use futures::channel::mpsc;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Outcome counts of a [`Orchestrator::run`], for logging only.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub failed: usize,
}

/// Consumer side of the pipeline. Each locator is resolved to a model
/// version, then its primary file and preview images are downloaded under
/// `root`. A failing item is logged and abandoned; the loop keeps going.
pub struct Orchestrator<S> {
    service: S,
    root: PathBuf,
    item_timeout: Option<Duration>,
    events: Option<mpsc::UnboundedSender<DownloadEvent>>,
}

impl<S: ModelService> Orchestrator<S> {
    pub fn new(service: S, root: impl Into<PathBuf>) -> Self {
        Self {
            service,
            root: root.into(),
            item_timeout: None,
            events: None,
        }
    }

    /// Give up on an item that takes longer than `limit`.
    pub fn with_item_timeout(mut self, limit: Option<Duration>) -> Self {
        self.item_timeout = limit;
        self
    }

    /// Report progress on `events`. Send failures are ignored.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<DownloadEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Run the main loop until the producer hangs up.
    pub async fn run(&self, mut input: HandoffReceiver<ResourceLocator>) -> RunSummary {
        log::info!("Waiting for models to download...");
        let mut summary = RunSummary::default();

        while let Some(locator) = input.recv().await {
            match self.handle(&locator).await {
                Ok(_) => summary.completed += 1,
                Err(_) => summary.failed += 1,
            }
        }

        log::info!(
            "Download queue closed: {} completed, {} failed",
            summary.completed,
            summary.failed
        );
        summary
    }

    /// Process one item and report the outcome. The error is returned for
    /// the caller's information only; it has already been logged.
    pub async fn handle(&self, locator: &ResourceLocator) -> Result<PathBuf, GrabError> {
        log::info!("Resource found: {}", locator);
        self.emit(DownloadEvent::Received(locator.clone()));

        let result = match self.item_timeout {
            Some(limit) => async_std::future::timeout(limit, self.process(locator))
                .await
                .unwrap_or_else(|_| Err(GrabError::Timeout(limit))),
            None => self.process(locator).await,
        };

        match &result {
            Ok(directory) => {
                log::info!("Download complete: {} -> {:?}", locator, directory);
                self.emit(DownloadEvent::Complete {
                    locator: locator.clone(),
                    directory: directory.clone(),
                });
            }
            Err(e) => {
                log::error!("Error downloading {}: {}", locator, e);
                self.emit(DownloadEvent::Failed {
                    locator: locator.clone(),
                    reason: e.to_string(),
                });
            }
        }
        result
    }

    /// Resolve and download one item; returns the directory it landed in.
    pub async fn process(&self, locator: &ResourceLocator) -> Result<PathBuf, GrabError> {
        let (version, model) = self.resolve_version(locator).await?;
        let model = match model {
            Some(model) if model.id == version.model_id => model,
            _ => self.service.model(version.model_id).await?,
        };

        let directory = layout::model_directory(&self.root, &model, &version);
        fs::create_dir_all(&directory).map_err(|e| GrabError::io(&directory, e))?;
        self.emit(DownloadEvent::Resolved {
            model: model.name.clone(),
            version: version.name.clone(),
            directory: directory.clone(),
        });

        let primary = version
            .primary_file()
            .ok_or_else(|| GrabError::NoPrimaryFile(version.name.clone()))?;
        if let Some(format) = locator.format() {
            if !primary.name.to_lowercase().ends_with(format) {
                log::warn!(
                    "{} asked for '{}' but the primary file is {}",
                    locator,
                    format,
                    primary.name
                );
            }
        }

        let file_name = layout::file_name(&primary.name);
        self.fetch(
            &primary.download_url,
            &directory.join(&file_name),
            &file_name,
            primary.total_bytes(),
        )
        .await?;

        log::info!("Downloading images");
        for image in &version.images {
            let image_name = layout::image_file_name(&image.url)?;
            self.fetch(&image.url, &directory.join(&image_name), &image_name, 0)
                .await?;
        }

        Ok(directory)
    }

    /// Fetch the version named by the locator. Without one, the model's
    /// newest version is used and the model record is handed back as well.
    async fn resolve_version(
        &self,
        locator: &ResourceLocator,
    ) -> Result<(ModelVersion, Option<Model>), GrabError> {
        if let Some(version_id) = locator.version() {
            let version = self.service.model_version(version_id).await?;
            return Ok((version, None));
        }

        let model = self.service.model(locator.model_id).await?;
        let latest = model
            .latest_version()
            .ok_or(GrabError::NoVersions(model.id))?;
        log::info!(
            "No version given for {}, using latest: {}",
            locator,
            latest.name
        );
        let version = self.service.model_version(latest.id).await?;
        Ok((version, Some(model)))
    }

    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        name: &str,
        total_bytes: u64,
    ) -> Result<u64, GrabError> {
        self.emit(DownloadEvent::FileStarted {
            name: name.to_string(),
            total_bytes,
        });

        let events = self.events.clone();
        let report = move |bytes: u64| {
            if let Some(events) = &events {
                let _ = events.unbounded_send(DownloadEvent::Progress(bytes));
            }
        };
        let written = self.service.download(url, dest, Some(&report)).await?;

        self.emit(DownloadEvent::FileFinished {
            name: name.to_string(),
        });
        Ok(written)
    }

    fn emit(&self, event: DownloadEvent) {
        if let Some(events) = &self.events {
            let _ = events.unbounded_send(event);
        }
    }
}
