use serde::Serialize;

use super::{BuilderConfig, BuilderKind, MissingFields};

pub(crate) const REQUIRED: [&str; 2] = ["region", "bucket"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishAws {
    pub region: String,
    pub bucket: String,
}

impl TryFrom<&BuilderConfig> for PublishAws {
    type Error = MissingFields;

    fn try_from(builder: &BuilderConfig) -> Result<Self, Self::Error> {
        let [region, bucket] = builder.require(BuilderKind::Aws, REQUIRED)?;
        Ok(Self { region, bucket })
    }
}

pub fn publish_aws(builder: &BuilderConfig) -> Option<PublishAws> {
    PublishAws::try_from(builder).ok()
}
