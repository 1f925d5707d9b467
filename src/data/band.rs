use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Passband identifier
///
/// Survey bands are small integers, e.g. ZTF uses 1 for g and 2 for r. The band name used as a
/// feature-name suffix is the number itself: `SPM_A_1`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct Band(pub u8);

impl Band {
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    pub const fn id(&self) -> u8 {
        self.0
    }

    /// Append band suffix to a feature name
    pub fn suffixed(&self, name: &str) -> String {
        format!("{name}_{self}")
    }
}

impl From<u8> for Band {
    fn from(id: u8) -> Self {
        Self(id)
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
