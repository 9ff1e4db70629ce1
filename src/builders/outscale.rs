use serde::Serialize;

use super::{BuilderConfig, BuilderKind, MissingFields};

pub(crate) const REQUIRED: [&str; 1] = ["region"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishOutscale {
    pub region: String,
}

impl TryFrom<&BuilderConfig> for PublishOutscale {
    type Error = MissingFields;

    fn try_from(builder: &BuilderConfig) -> Result<Self, Self::Error> {
        let [region] = builder.require(BuilderKind::Outscale, REQUIRED)?;
        Ok(Self { region })
    }
}

pub fn publish_outscale(builder: &BuilderConfig) -> Option<PublishOutscale> {
    PublishOutscale::try_from(builder).ok()
}
