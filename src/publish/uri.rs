use std::{fmt, str::FromStr, sync::OnceLock};

use regex::Regex;

fn appliance_regex() -> &'static Regex {
    static APPLIANCE_RE: OnceLock<Regex> = OnceLock::new();
    APPLIANCE_RE.get_or_init(|| {
        Regex::new(r"^/?users/(?P<login>[^/]+)/appliances/(?P<appliance>\d+)/images/(?P<image>\d+)/?$")
            .expect("invalid appliance image uri regex")
    })
}

fn scan_regex() -> &'static Regex {
    static SCAN_RE: OnceLock<Regex> = OnceLock::new();
    SCAN_RE.get_or_init(|| {
        Regex::new(
            r"^/?users/(?P<login>[^/]+)/scannedinstances/(?P<instance>\d+)/scans/(?P<scan>\d+)/images/(?P<image>\d+)/?$",
        )
        .expect("invalid scan image uri regex")
    })
}

/// Location of an image on the service, split into the ids needed to
/// address its nested resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageUri {
    Appliance {
        login: String,
        appliance_id: u64,
        image_id: u64,
    },
    Scan {
        login: String,
        scanned_instance_id: u64,
        scan_id: u64,
        image_id: u64,
    },
}

impl ImageUri {
    pub fn login(&self) -> &str {
        match self {
            ImageUri::Appliance { login, .. } | ImageUri::Scan { login, .. } => login,
        }
    }

    pub fn image_id(&self) -> u64 {
        match self {
            ImageUri::Appliance { image_id, .. } | ImageUri::Scan { image_id, .. } => *image_id,
        }
    }

    /// Same resource addressed under another user's path.
    pub fn for_login(&self, login: &str) -> ImageUri {
        let mut uri = self.clone();
        match &mut uri {
            ImageUri::Appliance { login: l, .. } | ImageUri::Scan { login: l, .. } => *l = login.to_string(),
        }
        uri
    }

    /// URI of the appliance or scan the image belongs to.
    pub fn parent_uri(&self) -> String {
        match self {
            ImageUri::Appliance {
                login, appliance_id, ..
            } => format!("users/{login}/appliances/{appliance_id}"),
            ImageUri::Scan {
                login,
                scanned_instance_id,
                scan_id,
                ..
            } => format!("users/{login}/scannedinstances/{scanned_instance_id}/scans/{scan_id}"),
        }
    }
}

impl fmt::Display for ImageUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/images/{}", self.parent_uri(), self.image_id())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("'{0}' is neither an appliance nor a scan image uri")]
pub struct UnrecognizedImageUri(pub String);

impl FromStr for ImageUri {
    type Err = UnrecognizedImageUri;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unrecognized = || UnrecognizedImageUri(s.to_string());
        let id = |caps: &regex::Captures<'_>, name: &str| -> Result<u64, UnrecognizedImageUri> {
            caps.name(name)
                .and_then(|m| m.as_str().parse().ok())
                .ok_or_else(unrecognized)
        };

        if let Some(caps) = scan_regex().captures(s) {
            return Ok(ImageUri::Scan {
                login: caps["login"].to_string(),
                scanned_instance_id: id(&caps, "instance")?,
                scan_id: id(&caps, "scan")?,
                image_id: id(&caps, "image")?,
            });
        }

        if let Some(caps) = appliance_regex().captures(s) {
            return Ok(ImageUri::Appliance {
                login: caps["login"].to_string(),
                appliance_id: id(&caps, "appliance")?,
                image_id: id(&caps, "image")?,
            });
        }

        Err(unrecognized())
    }
}
