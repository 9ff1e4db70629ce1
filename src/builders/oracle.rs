use serde::Serialize;

use super::{BuilderConfig, BuilderKind, MissingFields};

pub(crate) const REQUIRED: [&str; 2] = ["displayName", "computeEndPoint"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishOracle {
    pub display_name: String,
    pub compute_end_point: String,
}

impl TryFrom<&BuilderConfig> for PublishOracle {
    type Error = MissingFields;

    fn try_from(builder: &BuilderConfig) -> Result<Self, Self::Error> {
        let [display_name, compute_end_point] =
            builder.require(BuilderKind::Oracle, REQUIRED)?;
        Ok(Self {
            display_name,
            compute_end_point,
        })
    }
}

pub fn publish_oracle(builder: &BuilderConfig) -> Option<PublishOracle> {
    PublishOracle::try_from(builder).ok()
}
