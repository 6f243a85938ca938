//! The closed set of cached resource kinds.
//!
//! Each kind names one logical JSON document persisted in the backing store.
//! The set is fixed at compile time: the cache builds one slot per variant,
//! so "operating on an unregistered kind" cannot be expressed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named logical document cached and flushed independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Dashboard-wide settings document.
    Settings,
    /// Chart definitions.
    Charts,
    /// Data points referenced by charts.
    Points,
    /// Tag metadata.
    Tags,
}

impl ResourceKind {
    /// Every kind, in the stable order used by `reload` and flush passes.
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Settings,
        ResourceKind::Charts,
        ResourceKind::Points,
        ResourceKind::Tags,
    ];

    /// The name under which this resource is persisted in the backing store.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Settings => "settings",
            ResourceKind::Charts => "charts",
            ResourceKind::Points => "points",
            ResourceKind::Tags => "tags",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ParseResourceKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "settings" => Ok(ResourceKind::Settings),
            "charts" => Ok(ResourceKind::Charts),
            "points" => Ok(ResourceKind::Points),
            "tags" => Ok(ResourceKind::Tags),
            _ => Err(ParseResourceKindError(s.to_string())),
        }
    }
}

/// Error when parsing an unknown resource kind name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown resource kind: {0}")]
pub struct ParseResourceKindError(pub String);
