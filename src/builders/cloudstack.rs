use serde::Serialize;

use super::{BuilderConfig, BuilderKind, MissingFields};

pub(crate) const REQUIRED: [&str; 3] = ["imageName", "zone", "description"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishCloudStack {
    pub display_name: String,
    pub zone_name: String,
    pub description: String,
}

impl TryFrom<&BuilderConfig> for PublishCloudStack {
    type Error = MissingFields;

    // Builder keys differ from the service field names.
    fn try_from(builder: &BuilderConfig) -> Result<Self, Self::Error> {
        let [display_name, zone_name, description] =
            builder.require(BuilderKind::CloudStack, REQUIRED)?;

        Ok(Self {
            display_name,
            zone_name,
            description,
        })
    }
}

pub fn publish_cloudstack(builder: &BuilderConfig) -> Option<PublishCloudStack> {
    PublishCloudStack::try_from(builder).ok()
}
