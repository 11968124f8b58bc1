//! Domain entities: core data structures

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How modules are obtained while loading a tree.
///
/// - `None`: never download, only load what storage already has.
/// - `Get`: download modules that are missing, reuse the rest.
/// - `Update`: re-download every module, even if storage has it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GetMode {
    None,
    #[default]
    Get,
    Update,
}

impl GetMode {
    /// Whether storage should be asked to fetch at all.
    pub fn fetches(self) -> bool {
        self != GetMode::None
    }

    /// Whether an existing copy must be refreshed.
    pub fn forces_refresh(self) -> bool {
        self == GetMode::Update
    }
}

impl fmt::Display for GetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GetMode::None => "none",
            GetMode::Get => "get",
            GetMode::Update => "update",
        };
        f.write_str(s)
    }
}

impl FromStr for GetMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(GetMode::None),
            "get" => Ok(GetMode::Get),
            "update" => Ok(GetMode::Update),
            other => Err(format!("unknown get mode: {other}")),
        }
    }
}

/// A named pointer from one configuration to another module.
///
/// Every key besides `name` and `source` is an argument passed to the
/// module's variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModuleRef {
    pub name: String,
    #[serde(default)]
    pub source: String,
    #[serde(flatten)]
    pub args: BTreeMap<String, toml::Value>,
}

/// An input variable declared by a module.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(default)]
    pub default: Option<toml::Value>,
    #[serde(default)]
    pub description: Option<String>,
}

/// An output exposed by a module to its parent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Output {
    pub name: String,
    #[serde(default)]
    pub value: Option<toml::Value>,
}
