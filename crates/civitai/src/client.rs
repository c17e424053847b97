use crate::settings::Settings;
use crate::{ModelService, Progress};
use airgrab_core::manifest::{Model, ModelVersion};
use airgrab_core::{GrabError, RemoteStatus};
use async_trait::async_trait;
use futures::io::{AsyncReadExt, AsyncWriteExt};
use serde::de::DeserializeOwned;
use std::path::Path;
use surf::http::headers::{AUTHORIZATION, CONTENT_TYPE, LOCATION, USER_AGENT};
use surf::http::Method;

pub const DEFAULT_HOST: &str = "https://civitai.com/api/v1";

const CHUNK_SIZE: usize = 64 * 1024;
const MAX_REDIRECTS: u8 = 5;

/// Stateless-per-call client. Cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct CivitaiClient {
    host: String,
    api_key: Option<String>,
    client: surf::Client,
}

impl CivitaiClient {
    pub fn new(host: impl Into<String>, api_key: Option<String>) -> Self {
        let host = host.into().trim_end_matches('/').to_string();
        let api_key = api_key.filter(|key| !key.trim().is_empty());
        let client = surf::Client::new().with(RedirectMiddleware::new(MAX_REDIRECTS));
        Self {
            host,
            api_key,
            client,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.host.clone(), settings.api_key.clone())
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    /// Issue a GET and fail on anything but a 2xx response.
    async fn get(&self, url: &str, json: bool) -> Result<surf::Response, GrabError> {
        let parsed = surf::Url::parse(url).map_err(|e| GrabError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let mut request = surf::Request::new(Method::Get, parsed);
        request.insert_header(USER_AGENT, concat!("airgrab/", env!("CARGO_PKG_VERSION")));
        if json {
            request.insert_header(CONTENT_TYPE, "application/json");
        }
        if let Some(key) = &self.api_key {
            request.insert_header(AUTHORIZATION, format!("Bearer {}", key));
        }

        log::debug!("retrieving data from url: {}", url);
        let response = self
            .client
            .send(request)
            .await
            .map_err(|e| GrabError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(GrabError::Status {
                status: RemoteStatus::from_code(status.into()),
                url: url.to_string(),
            })
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, GrabError> {
        let mut response = self.get(url, true).await?;
        let body = response
            .body_bytes()
            .await
            .map_err(|e| GrabError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        serde_json::from_slice(&body).map_err(|e| GrabError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl ModelService for CivitaiClient {
    async fn model_version(&self, version_id: i64) -> Result<ModelVersion, GrabError> {
        log::debug!("Getting model version from id: {}", version_id);
        let url = format!("{}/model-versions/{}", self.host, version_id);
        self.get_json(&url).await
    }

    async fn model(&self, model_id: i64) -> Result<Model, GrabError> {
        log::debug!("Getting model from id: {}", model_id);
        let url = format!("{}/models/{}", self.host, model_id);
        let model: Model = self.get_json(&url).await?;
        Ok(model.categorize())
    }

    async fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<Progress<'_>>,
    ) -> Result<u64, GrabError> {
        log::debug!("Downloading: {} -> {:?}", url, dest);
        let mut response = self.get(url, false).await?;

        let std_file = std::fs::File::create(dest).map_err(|e| GrabError::io(dest, e))?;
        let mut file: async_std::fs::File = std_file.into();

        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut written = 0u64;
        loop {
            let n = response
                .read(&mut buffer)
                .await
                .map_err(|e| GrabError::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            if n == 0 {
                break;
            }

            file.write_all(&buffer[..n])
                .await
                .map_err(|e| GrabError::io(dest, e))?;
            written += n as u64;

            if let Some(progress) = progress {
                progress(n as u64);
            }
        }

        file.flush().await.map_err(|e| GrabError::io(dest, e))?;
        Ok(written)
    }
}

/// Follows redirects (download links bounce to a CDN). Headers are carried
/// across hops, except the bearer credential, which never leaves the original host.
struct RedirectMiddleware {
    max_attempts: u8,
}

impl RedirectMiddleware {
    pub fn new(max_attempts: u8) -> Self {
        Self { max_attempts }
    }
}

#[surf::utils::async_trait]
impl surf::middleware::Middleware for RedirectMiddleware {
    async fn handle(
        &self,
        req: surf::Request,
        client: surf::Client,
        next: surf::middleware::Next<'_>,
    ) -> surf::Result<surf::Response> {
        let mut attempts = 0;
        let mut current_req = req;

        loop {
            if attempts > self.max_attempts {
                return Err(surf::Error::from_str(
                    surf::StatusCode::LoopDetected,
                    "Too many redirects",
                ));
            }

            let response = next.run(current_req.clone(), client.clone()).await?;

            if !response.status().is_redirection() {
                return Ok(response);
            }
            let location = response
                .header(LOCATION)
                .map(|values| values.last().as_str().to_string());
            let Some(location) = location else {
                return Ok(response);
            };

            let new_url = match surf::Url::parse(&location) {
                Ok(url) => url,
                Err(_) => current_req.url().join(&location).map_err(|_| {
                    surf::Error::from_str(
                        surf::StatusCode::BadGateway,
                        "Invalid redirect location",
                    )
                })?,
            };

            let same_host = new_url.host_str() == current_req.url().host_str();
            let mut redirected = surf::Request::new(Method::Get, new_url);
            for (name, values) in current_req.iter() {
                if same_host || *name != AUTHORIZATION {
                    redirected.insert_header(name.clone(), values.last().as_str());
                }
            }

            log::debug!("following redirect to {}", redirected.url());
            current_req = redirected;
            attempts += 1;
        }
    }
}
