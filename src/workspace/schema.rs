use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Server-assigned document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u64> for DocumentId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

const STORE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DISPLAY_TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M";

/// One entry of the remote document collection, as the store reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub filename: String,
    /// `yyyy-MM-dd HH:mm:ss`, or `N/A` when the store has no timestamp.
    #[serde(default)]
    pub uploaded_at: String,
    #[serde(default)]
    pub owner_id: Option<u64>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl DocumentSummary {
    pub fn uploaded_at_parsed(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.uploaded_at, STORE_TIMESTAMP_FORMAT).ok()
    }

    /// `DD-MM-YYYY HH:mm`, or the raw value if it does not parse.
    pub fn uploaded_at_display(&self) -> String {
        self.uploaded_at_parsed()
            .map(|t| t.format(DISPLAY_TIMESTAMP_FORMAT).to_string())
            .unwrap_or_else(|| self.uploaded_at.clone())
    }
}
