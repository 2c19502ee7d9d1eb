use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Target identifier. The API may send it as a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TargetId(pub String);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TargetId {
    fn from(id: &str) -> Self {
        TargetId(id.to_string())
    }
}

impl<'de> Deserialize<'de> for TargetId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => TargetId(s),
            Raw::Number(n) => TargetId(n.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub dob: Option<String>,
}

impl Target {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTarget {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub dob: Option<String>,
}

impl NewTarget {
    /// Both names are required before a target can be submitted.
    pub fn is_complete(&self) -> bool {
        !self.first_name.trim().is_empty() && !self.last_name.trim().is_empty()
    }
}

/// Case-insensitive match of `query` against "first last".
pub fn search_targets<'a>(targets: &'a [Target], query: &str) -> Vec<&'a Target> {
    let query = query.to_lowercase();
    targets
        .iter()
        .filter(|t| t.full_name().to_lowercase().contains(&query))
        .collect()
}
