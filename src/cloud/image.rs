use serde::Deserialize;
use std::fmt;

/// Lifecycle states reported by the image factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageState {
    #[default]
    Pending,
    Building,
    Complete,
    Cancelled,
    Failed,
}

impl ImageState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageState::Pending => "pending",
            ImageState::Building => "building",
            ImageState::Complete => "complete",
            ImageState::Cancelled => "cancelled",
            ImageState::Failed => "failed",
        }
    }

    /// Unknown states are treated as still pending.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "building" | "generating" => ImageState::Building,
            "complete" | "done" => ImageState::Complete,
            "cancelled" | "canceled" => ImageState::Cancelled,
            "failed" | "error" => ImageState::Failed,
            _ => ImageState::Pending,
        }
    }
}

impl fmt::Display for ImageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ImageState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(ImageState::parse(&raw))
    }
}

/// Status block of an image: the state name plus the service's own
/// completeness flag.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStatus {
    #[serde(default)]
    state: ImageState,
    #[serde(default)]
    complete: bool,
    #[serde(default)]
    message: Option<String>,
}

impl ImageStatus {
    #[cfg(test)]
    pub fn new(state: ImageState, complete: bool) -> Self {
        Self {
            state,
            complete,
            message: None,
        }
    }

    pub fn state(&self) -> ImageState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// Machine sizing the image was generated with.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallProfile {
    #[serde(default)]
    memory_size: Option<u64>,
    #[serde(default)]
    swap_size: Option<u64>,
}

impl InstallProfile {
    #[cfg(test)]
    pub fn new(memory_size: Option<u64>, swap_size: Option<u64>) -> Self {
        Self {
            memory_size,
            swap_size,
        }
    }

    /// Memory in MB
    pub fn memory_size(&self) -> Option<u64> {
        self.memory_size
    }

    /// Swap in MB
    pub fn swap_size(&self) -> Option<u64> {
        self.swap_size
    }
}

/// A generated machine image as returned by the image factory.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    db_id: u64,
    uri: String,
    #[serde(default)]
    status: ImageStatus,
    #[serde(default)]
    install_profile: Option<InstallProfile>,
    #[serde(default)]
    target_format: Option<String>,
}

#[cfg(test)]
impl Image {
    pub fn new(db_id: u64, uri: impl Into<String>, status: ImageStatus) -> Self {
        Self {
            db_id,
            uri: uri.into(),
            status,
            install_profile: None,
            target_format: None,
        }
    }

    pub fn with_install_profile(mut self, profile: InstallProfile) -> Self {
        self.install_profile = Some(profile);
        self
    }
}

impl Image {
    pub fn db_id(&self) -> u64 {
        self.db_id
    }

    /// Path of the image relative to the service root,
    /// eg. users/guest/appliances/5/images/1234
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn status(&self) -> &ImageStatus {
        &self.status
    }

    pub fn install_profile(&self) -> Option<&InstallProfile> {
        self.install_profile.as_ref()
    }

    // eg. azure, aws
    pub fn target_format(&self) -> Option<&str> {
        self.target_format.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_service_payload() {
        let json = r#"{
            "dbId": 1234,
            "uri": "users/guest/appliances/5/images/1234",
            "status": { "state": "Complete", "complete": true },
            "installProfile": { "memorySize": 1024, "swapSize": 512 },
            "targetFormat": "azure"
        }"#;

        let image: Image = serde_json::from_str(json).expect("image should parse");
        assert_eq!(image.db_id(), 1234);
        assert_eq!(image.status().state(), ImageState::Complete);
        assert!(image.status().is_complete());
        let profile = image.install_profile().expect("profile");
        assert_eq!(profile.memory_size(), Some(1024));
        assert_eq!(profile.swap_size(), Some(512));
        assert_eq!(image.target_format(), Some("azure"));
    }

    #[test]
    fn missing_status_defaults_to_pending() {
        let image: Image = serde_json::from_str(r#"{ "dbId": 1, "uri": "x" }"#).unwrap();
        assert_eq!(image.status().state(), ImageState::Pending);
        assert!(!image.status().is_complete());
        assert!(image.install_profile().is_none());
    }

    #[test]
    fn unknown_state_is_pending() {
        assert_eq!(ImageState::parse("queued"), ImageState::Pending);
        assert_eq!(ImageState::parse("canceled"), ImageState::Cancelled);
    }
}
