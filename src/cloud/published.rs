use serde::Deserialize;

/// The service's record of an image pushed to a cloud provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedImage {
    db_id: u64,
    #[serde(alias = "imageUri")]
    uri: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    cloud_id: Option<String>,
}

impl PublishedImage {
    #[cfg(test)]
    pub fn new(db_id: u64, uri: impl Into<String>) -> Self {
        Self {
            db_id,
            uri: uri.into(),
            status: None,
            cloud_id: None,
        }
    }

    pub fn db_id(&self) -> u64 {
        self.db_id
    }

    /// eg. users/guest/appliances/5/images/1234/pimages/5678
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Identifier assigned by the cloud provider, once known.
    pub fn cloud_id(&self) -> Option<&str> {
        self.cloud_id.as_deref()
    }
}
