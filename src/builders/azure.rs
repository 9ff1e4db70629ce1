use serde::Serialize;

use super::{BuilderConfig, BuilderKind, MissingFields};

pub(crate) const REQUIRED: [&str; 4] = ["storageAccount", "container", "blob", "displayName"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishAzure {
    pub storage_account: String,
    pub container: String,
    pub blob: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<String>,
}

impl TryFrom<&BuilderConfig> for PublishAzure {
    type Error = MissingFields;

    fn try_from(builder: &BuilderConfig) -> Result<Self, Self::Error> {
        let [storage_account, container, blob, display_name] = builder.require(BuilderKind::Azure, REQUIRED)?;

        Ok(Self {
            storage_account,
            container,
            blob,
            display_name,
            resource_group: builder.optional("resourceGroup"),
        })
    }
}

pub fn publish_azure(builder: &BuilderConfig) -> Option<PublishAzure> {
    PublishAzure::try_from(builder).ok()
}
