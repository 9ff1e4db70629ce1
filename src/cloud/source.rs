use serde::Deserialize;

/// Appliance template an image was generated from.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appliance {
    db_id: u64,
    uri: String,
    #[serde(default)]
    name: Option<String>,
}

/// Scan of a running instance an image was generated from.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scan {
    db_id: u64,
    uri: String,
    #[serde(default)]
    name: Option<String>,
}

impl Appliance {
    #[cfg(test)]
    pub fn new(db_id: u64, uri: impl Into<String>) -> Self {
        Self {
            db_id,
            uri: uri.into(),
            name: None,
        }
    }

    pub fn db_id(&self) -> u64 {
        self.db_id
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl Scan {
    #[cfg(test)]
    pub fn new(db_id: u64, uri: impl Into<String>) -> Self {
        Self {
            db_id,
            uri: uri.into(),
            name: None,
        }
    }

    pub fn db_id(&self) -> u64 {
        self.db_id
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Origin of an image being published.
#[derive(Debug, Clone)]
pub enum Source {
    Appliance(Appliance),
    Scan(Scan),
}

impl Source {
    pub fn kind(&self) -> &'static str {
        match self {
            Source::Appliance(_) => "appliance",
            Source::Scan(_) => "scan",
        }
    }

    pub fn db_id(&self) -> u64 {
        match self {
            Source::Appliance(a) => a.db_id(),
            Source::Scan(s) => s.db_id(),
        }
    }

    pub fn uri(&self) -> &str {
        match self {
            Source::Appliance(a) => a.uri(),
            Source::Scan(s) => s.uri(),
        }
    }

    /// Label for the summary printed after publishing.
    pub fn label(&self) -> String {
        let name = match self {
            Source::Appliance(a) => a.name(),
            Source::Scan(s) => s.name(),
        };
        match name {
            Some(name) => format!("{} '{name}'", self.kind()),
            None => format!("{} #{}", self.kind(), self.db_id()),
        }
    }
}
