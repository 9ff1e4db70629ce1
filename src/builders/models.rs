use serde::Serialize;

use super::{BuilderKind, PublishAws, PublishAzure, PublishCloudStack, PublishOracle, PublishOutscale};

/// Provider-specific payload sent to the image factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PublishRequest {
    Aws(PublishAws),
    Azure(PublishAzure),
    CloudStack(PublishCloudStack),
    Oracle(PublishOracle),
    Outscale(PublishOutscale),
}

impl PublishRequest {
    pub fn kind(&self) -> BuilderKind {
        match self {
            PublishRequest::Aws(_) => BuilderKind::Aws,
            PublishRequest::Azure(_) => BuilderKind::Azure,
            PublishRequest::CloudStack(_) => BuilderKind::CloudStack,
            PublishRequest::Oracle(_) => BuilderKind::Oracle,
            PublishRequest::Outscale(_) => BuilderKind::Outscale,
        }
    }
}

/// Body of a publish call: the provider request plus the image and the
/// appliance/scan it comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishImage {
    #[serde(flatten)]
    pub request: PublishRequest,
    pub image_uri: String,
    pub parent_uri: String,
}

impl PublishImage {
    pub fn new(request: PublishRequest, image_uri: impl Into<String>, parent_uri: impl Into<String>) -> Self {
        Self {
            request,
            image_uri: image_uri.into(),
            parent_uri: parent_uri.into(),
        }
    }
}

/// Required builder fields that were not configured.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{provider} builder is missing required field(s): {}", .fields.join(", "))]
pub struct MissingFields {
    provider: BuilderKind,
    fields: Vec<&'static str>,
}

impl MissingFields {
    pub fn new(provider: BuilderKind, fields: Vec<&'static str>) -> Self {
        Self { provider, fields }
    }

    pub fn provider(&self) -> BuilderKind {
        self.provider
    }

    pub fn fields(&self) -> &[&'static str] {
        &self.fields
    }
}
