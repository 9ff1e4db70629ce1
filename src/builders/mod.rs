mod aws;
mod azure;
mod cloudstack;
mod models;
mod oracle;
mod outscale;

use std::{collections::BTreeMap, fmt, fs, path::Path, str::FromStr};

use log::{debug, warn};
use serde::Deserialize;

pub use aws::{PublishAws, publish_aws};
pub use azure::{PublishAzure, publish_azure};
pub use cloudstack::{PublishCloudStack, publish_cloudstack};
pub use models::{MissingFields, PublishImage, PublishRequest};
pub use oracle::{PublishOracle, publish_oracle};
pub use outscale::{PublishOutscale, publish_outscale};

/// Key holding the provider name inside a builder entry.
pub const TYPE_FIELD: &str = "type";

/// Cloud providers an image can be published to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuilderKind {
    Aws,
    Azure,
    CloudStack,
    Oracle,
    Outscale,
}

impl BuilderKind {
    pub const ALL: [BuilderKind; 5] = [
        BuilderKind::Aws,
        BuilderKind::Azure,
        BuilderKind::CloudStack,
        BuilderKind::Oracle,
        BuilderKind::Outscale,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuilderKind::Aws => "aws",
            BuilderKind::Azure => "azure",
            BuilderKind::CloudStack => "cloudstack",
            BuilderKind::Oracle => "oracle",
            BuilderKind::Outscale => "outscale",
        }
    }

    /// Builder keys that must be present for this provider.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            BuilderKind::Aws => &aws::REQUIRED,
            BuilderKind::Azure => &azure::REQUIRED,
            BuilderKind::CloudStack => &cloudstack::REQUIRED,
            BuilderKind::Oracle => &oracle::REQUIRED,
            BuilderKind::Outscale => &outscale::REQUIRED,
        }
    }
}

impl fmt::Display for BuilderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuilderKind {
    type Err = BuilderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '_'], "-");
        match normalized.as_str() {
            "aws" | "amazon" | "amazon-aws" => Ok(BuilderKind::Aws),
            "azure" | "microsoft-azure" => Ok(BuilderKind::Azure),
            "cloudstack" | "cloud-stack" => Ok(BuilderKind::CloudStack),
            "oracle" | "oracle-raw" | "oracleraw" => Ok(BuilderKind::Oracle),
            "outscale" => Ok(BuilderKind::Outscale),
            _ => Err(BuilderError::UnknownType(s.to_string())),
        }
    }
}

fn expected_kinds() -> String {
    BuilderKind::ALL.map(|k| k.as_str()).join(", ")
}

/// Untyped key/value settings of a single builder entry.
///
/// Values are kept as strings; the provider validators decide which keys
/// matter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuilderConfig {
    fields: BTreeMap<String, String>,
}

impl BuilderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Raw value of the `type` field.
    pub fn type_name(&self) -> Option<&str> {
        self.get(TYPE_FIELD)
    }

    pub fn kind(&self) -> Result<BuilderKind, BuilderError> {
        self.type_name().ok_or(BuilderError::MissingType)?.parse()
    }

    /// Fetch every key in `keys`, or report all the absent ones at once.
    pub(crate) fn require<const N: usize>(
        &self,
        provider: BuilderKind,
        keys: [&'static str; N],
    ) -> Result<[String; N], MissingFields> {
        let missing: Vec<&'static str> = keys.iter().copied().filter(|k| !self.contains(k)).collect();
        if !missing.is_empty() {
            return Err(MissingFields::new(provider, missing));
        }
        Ok(keys.map(|k| self.get(k).unwrap_or_default().to_string()))
    }

    /// Required keys of `provider` absent from this builder.
    pub fn missing_fields(&self, provider: BuilderKind) -> MissingFields {
        let missing = provider
            .required_fields()
            .iter()
            .copied()
            .filter(|k| !self.contains(k))
            .collect();
        MissingFields::new(provider, missing)
    }

    pub(crate) fn optional(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }
}

impl<K, V> FromIterator<(K, V)> for BuilderConfig
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut config = BuilderConfig::new();
        for (k, v) in iter {
            config.insert(k, v);
        }
        config
    }
}

/// Turn a builder entry into the request for its provider.
pub fn build_publish_request(builder: &BuilderConfig) -> Result<PublishRequest, BuilderError> {
    let kind = builder.kind()?;
    let request = match kind {
        BuilderKind::Aws => publish_aws(builder).map(PublishRequest::Aws),
        BuilderKind::Azure => publish_azure(builder).map(PublishRequest::Azure),
        BuilderKind::CloudStack => publish_cloudstack(builder).map(PublishRequest::CloudStack),
        BuilderKind::Oracle => publish_oracle(builder).map(PublishRequest::Oracle),
        BuilderKind::Outscale => publish_outscale(builder).map(PublishRequest::Outscale),
    };
    request.ok_or_else(|| builder.missing_fields(kind).into())
}

// ---- Builder file loading ----

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldValue {
    Flag(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
    Nested(serde::de::IgnoredAny),
}

#[derive(Deserialize)]
struct BuilderDocument {
    #[serde(default)]
    builders: Vec<BTreeMap<String, Option<FieldValue>>>,
}

fn into_configs(document: BuilderDocument) -> Vec<BuilderConfig> {
    document
        .builders
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| {
            let mut config = BuilderConfig::new();
            for (key, value) in entry {
                let value = match value {
                    None => continue,
                    Some(FieldValue::Flag(b)) => b.to_string(),
                    Some(FieldValue::Integer(n)) => n.to_string(),
                    Some(FieldValue::Unsigned(n)) => n.to_string(),
                    Some(FieldValue::Float(n)) => n.to_string(),
                    Some(FieldValue::Text(s)) => s,
                    Some(FieldValue::Nested(_)) => {
                        warn!("builder #{idx}: ignoring nested value for '{key}'");
                        continue;
                    }
                };
                config.insert(key, value);
            }
            config
        })
        .collect()
}

/// Parse a builder document held in memory. JSON when `json` is set, YAML
/// otherwise.
pub fn parse_builders(data: &str, json: bool) -> Result<Vec<BuilderConfig>, BuilderError> {
    let document: BuilderDocument = if json {
        serde_json::from_str(data)?
    } else {
        serde_yaml::from_str(data)?
    };

    let configs = into_configs(document);
    if configs.is_empty() {
        return Err(BuilderError::NoBuilders);
    }
    Ok(configs)
}

/// Load the `builders` list of a YAML or JSON file.
pub fn load_builders(path: impl AsRef<Path>) -> Result<Vec<BuilderConfig>, BuilderError> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)?;
    let json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    debug!("loading builders from {} ({})", path.display(), if json { "json" } else { "yaml" });
    parse_builders(&data, json)
}

/// ---- Errors ----
#[derive(thiserror::Error, Debug)]
pub enum BuilderError {
    #[error("builder has no 'type' field")]
    MissingType,
    #[error("unknown builder type '{0}', expected one of: {kinds}", kinds = expected_kinds())]
    UnknownType(String),
    #[error(transparent)]
    MissingFields(#[from] MissingFields),
    #[error("no builders defined")]
    NoBuilders,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
