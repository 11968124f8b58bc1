//! Parsed module configuration.
//!
//! A module is a directory of TOML files declaring variables (inputs),
//! outputs and references to further modules:
//!
//! ```toml
//! [[variable]]
//! name = "region"
//!
//! [[module]]
//! name = "network"
//! source = "./network"
//! cidr = "${var.region}"
//!
//! [[output]]
//! name = "vpc_id"
//! value = "${module.network.vpc_id}"
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::entities::{ModuleRef, Output, Variable};
use crate::domain::error::DomainError;
use crate::domain::interpolation::{scan_value, InterpolatedVariable};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawModuleFile {
    #[serde(default)]
    variable: Vec<Variable>,
    #[serde(default)]
    output: Vec<Output>,
    #[serde(default)]
    module: Vec<ModuleRef>,
}

/// Configuration of one module, merged from all files of its directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleConfig {
    /// Directory the configuration was loaded from; relative module
    /// sources resolve against it.
    pub dir: PathBuf,
    pub variables: Vec<Variable>,
    pub outputs: Vec<Output>,
    pub modules: Vec<ModuleRef>,
}

impl ModuleConfig {
    /// Create an empty configuration rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Default::default()
        }
    }

    /// Parse a single configuration file.
    ///
    /// `file_path` is only used for error messages and to derive `dir`.
    pub fn parse(content: &str, file_path: &Path) -> Result<Self, DomainError> {
        let raw: RawModuleFile =
            toml::from_str(content).map_err(|e| DomainError::InvalidConfig {
                path: file_path.to_path_buf(),
                message: e.message().to_string(),
            })?;

        Ok(Self {
            dir: file_path.parent().map(Path::to_path_buf).unwrap_or_default(),
            variables: raw.variable,
            outputs: raw.output,
            modules: raw.module,
        })
    }

    /// Append the declarations of `other` (files of the same directory).
    pub fn merge(&mut self, other: ModuleConfig) {
        self.variables.extend(other.variables);
        self.outputs.extend(other.outputs);
        self.modules.extend(other.modules);
    }

    /// Module references of this level, in declared order.
    pub fn module_refs(&self) -> &[ModuleRef] {
        &self.modules
    }

    pub fn variable_names(&self) -> BTreeSet<&str> {
        self.variables.iter().map(|v| v.name.as_str()).collect()
    }

    pub fn has_output(&self, name: &str) -> bool {
        self.outputs.iter().any(|o| o.name == name)
    }

    /// Every interpolated reference, keyed by where it appears
    /// (`module.<name>` for arguments, `output.<name>` for output values).
    pub fn interpolated_variables(&self) -> BTreeMap<String, Vec<InterpolatedVariable>> {
        let mut result = BTreeMap::new();

        for m in &self.modules {
            let mut refs = Vec::new();
            m.args.values().for_each(|v| scan_value(v, &mut refs));
            if !refs.is_empty() {
                result.insert(format!("module.{}", m.name), refs);
            }
        }

        for o in &self.outputs {
            let mut refs = Vec::new();
            if let Some(value) = &o.value {
                scan_value(value, &mut refs);
            }
            if !refs.is_empty() {
                result.insert(format!("output.{}", o.name), refs);
            }
        }

        result
    }

    /// Semantic checks local to this configuration.
    ///
    /// Cross-module contracts (parameters, outputs) are checked by the tree.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut seen = HashSet::new();
        for v in &self.variables {
            if !seen.insert(v.name.as_str()) {
                return Err(DomainError::DuplicateVariable(v.name.clone()));
            }
        }

        seen.clear();
        for o in &self.outputs {
            if !seen.insert(o.name.as_str()) {
                return Err(DomainError::DuplicateOutput(o.name.clone()));
            }
            if o.value.is_none() {
                return Err(DomainError::MissingOutputValue(o.name.clone()));
            }
        }

        seen.clear();
        for m in &self.modules {
            if !seen.insert(m.name.as_str()) {
                return Err(DomainError::DuplicateModule(m.name.clone()));
            }
            if m.source.trim().is_empty() {
                return Err(DomainError::MissingSource(m.name.clone()));
            }
        }

        let variables = self.variable_names();
        for (location, refs) in self.interpolated_variables() {
            for r in refs {
                match r {
                    InterpolatedVariable::User { name } if !variables.contains(name.as_str()) => {
                        return Err(DomainError::UnknownVariable { location, name });
                    }
                    InterpolatedVariable::Module { name, .. } if !seen.contains(name.as_str()) => {
                        return Err(DomainError::UnknownModule { location, name });
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }
}
