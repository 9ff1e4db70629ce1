use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode, header::ACCEPT};
use serde::{Serialize, de::DeserializeOwned};
use url::Url;

use crate::builders::PublishImage;
use crate::cloud::{Appliance, Image, PublishedImage, Scan};

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(600);
const USER_AGENT: &str = concat!("cloud-image-publisher/", env!("CARGO_PKG_VERSION"));

/// Where the image factory lives and who is calling it.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub url: String,
    pub login: String,
    pub password: Option<String>,
}

/// Remote operations the publish flow relies on.
#[async_trait]
pub trait PublishApi: Send + Sync {
    async fn get_image(&self, uri: &str) -> Result<Image, ApiError>;

    async fn get_appliance(&self, uri: &str) -> Result<Appliance, ApiError>;

    async fn get_scan(&self, uri: &str) -> Result<Scan, ApiError>;

    async fn publish_appliance_image(
        &self,
        login: &str,
        appliance_id: u64,
        image_id: u64,
        body: &PublishImage,
    ) -> Result<PublishedImage, ApiError>;

    async fn publish_scan_image(
        &self,
        login: &str,
        scanned_instance_id: u64,
        scan_id: u64,
        image_id: u64,
        body: &PublishImage,
    ) -> Result<PublishedImage, ApiError>;
}

pub(crate) fn appliance_publish_path(login: &str, appliance_id: u64, image_id: u64) -> String {
    format!("users/{login}/appliances/{appliance_id}/images/{image_id}/pimages")
}

pub(crate) fn scan_publish_path(login: &str, scanned_instance_id: u64, scan_id: u64, image_id: u64) -> String {
    format!("users/{login}/scannedinstances/{scanned_instance_id}/scans/{scan_id}/images/{image_id}/pimages")
}

/// JSON/HTTP implementation of [`PublishApi`].
#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    credentials: Credentials,
    http: Client,
}

impl ApiClient {
    pub fn new(credentials: Credentials) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Self::with_http(credentials, http)
    }

    fn with_http(credentials: Credentials, http: Client) -> Result<Self, ApiError> {
        let mut base = Url::parse(&credentials.url)?;
        // Url::join drops the last segment unless the base ends with '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self { base, credentials, http })
    }

    pub fn login(&self) -> &str {
        &self.credentials.login
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder, url: &Url) -> Result<T, ApiError> {
        let res = request
            .basic_auth(&self.credentials.login, self.credentials.password.as_deref())
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status,
                url: url.to_string(),
                body,
            });
        }

        Ok(res.json().await?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        debug!("GET {url}");
        self.send(self.http.get(url.clone()), &url).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!("POST {url}");
        self.send(self.http.post(url.clone()).json(body), &url).await
    }
}

#[async_trait]
impl PublishApi for ApiClient {
    async fn get_image(&self, uri: &str) -> Result<Image, ApiError> {
        self.get_json(uri).await
    }

    async fn get_appliance(&self, uri: &str) -> Result<Appliance, ApiError> {
        self.get_json(uri).await
    }

    async fn get_scan(&self, uri: &str) -> Result<Scan, ApiError> {
        self.get_json(uri).await
    }

    async fn publish_appliance_image(
        &self,
        login: &str,
        appliance_id: u64,
        image_id: u64,
        body: &PublishImage,
    ) -> Result<PublishedImage, ApiError> {
        self.post_json(&appliance_publish_path(login, appliance_id, image_id), body)
            .await
    }

    async fn publish_scan_image(
        &self,
        login: &str,
        scanned_instance_id: u64,
        scan_id: u64,
        image_id: u64,
        body: &PublishImage,
    ) -> Result<PublishedImage, ApiError> {
        self.post_json(&scan_publish_path(login, scanned_instance_id, scan_id, image_id), body)
            .await
    }
}

/// ---- Errors ----
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("invalid service url: {0}")]
    Url(#[from] url::ParseError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status} for {url}: {body}")]
    Status {
        status: StatusCode,
        url: String,
        body: String,
    },
}
