//! The module tree: a configuration plus the modules it imports,
//! recursively.
//!
//! A tree is built in two steps. [`ModuleTree::load`] fetches (depending
//! on the [`GetMode`]) and parses every transitively referenced module.
//! [`ModuleTree::validate`] then checks each configuration on its own and
//! the contracts between a module and its parent: arguments must be
//! declared variables, referenced outputs must exist.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rayon::prelude::*;
use termtree::Tree;
use tracing::{debug, instrument};

use crate::application::error::{ContractError, LoaderError, PathError, TreeError, TreeResult};
use crate::application::loader::ConfigLoader;
use crate::application::storage::Storage;
use crate::domain::{detect, GetMode, InterpolatedVariable, ModuleConfig, ModuleRef};

/// Display name of the root module.
pub const ROOT_NAME: &str = "<root>";

/// Options for [`ModuleTree::load_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub mode: GetMode,
    /// Load the subtrees of one level concurrently. Each level is still
    /// completely resolved before any of its children are loaded.
    pub parallel: bool,
}

impl LoadOptions {
    pub fn new(mode: GetMode) -> Self {
        Self {
            mode,
            parallel: false,
        }
    }
}

/// The loaded children of a node, keyed by module name.
#[derive(Debug, Clone)]
pub struct Children {
    generation: u64,
    nodes: BTreeMap<String, Arc<ModuleTree>>,
}

impl Children {
    /// How many times the owning node has been loaded successfully,
    /// this load included.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ModuleTree>> {
        self.nodes.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ModuleTree>> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Default)]
enum NodeState {
    #[default]
    Unloaded,
    Loaded(Children),
}

/// One module: its configuration and, once loaded, its children.
#[derive(Debug)]
pub struct ModuleTree {
    name: String,
    config: Arc<ModuleConfig>,
    state: RwLock<NodeState>,
    loads: AtomicU64,
}

impl ModuleTree {
    /// Create an unloaded tree. Use an empty name for the root module.
    pub fn new(name: impl Into<String>, config: ModuleConfig) -> Self {
        Self {
            name: name.into(),
            config: Arc::new(config),
            state: RwLock::new(NodeState::Unloaded),
            loads: AtomicU64::new(0),
        }
    }

    /// Parse the configuration in `dir` and wrap it in an unloaded tree.
    pub fn from_dir(
        name: impl Into<String>,
        dir: &Path,
        loader: &dyn ConfigLoader,
    ) -> Result<Self, LoaderError> {
        Ok(Self::new(name, loader.load_dir(dir)?))
    }

    /// The module name as declared by the parent; empty for the root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name used in messages: the module name, or `<root>`.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            ROOT_NAME
        } else {
            &self.name
        }
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// Modules imported by this level of the tree.
    pub fn modules(&self) -> &[ModuleRef] {
        self.config.module_refs()
    }

    pub fn is_loaded(&self) -> bool {
        matches!(*self.state.read(), NodeState::Loaded(_))
    }

    /// Snapshot of the children, `None` until loaded.
    pub fn children(&self) -> Option<Children> {
        match &*self.state.read() {
            NodeState::Loaded(children) => Some(children.clone()),
            NodeState::Unloaded => None,
        }
    }

    /// Number of levels below and including this node that are loaded.
    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .map(|c| c.iter().map(|child| child.depth()).max().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Load the whole tree sequentially. See [`ModuleTree::load_with`].
    pub fn load(
        &self,
        storage: &dyn Storage,
        loader: &dyn ConfigLoader,
        mode: GetMode,
    ) -> TreeResult<()> {
        self.load_with(storage, loader, LoadOptions::new(mode))
    }

    /// Load the configuration of the entire tree, fetching modules as
    /// `opts.mode` allows.
    ///
    /// Every call rebuilds the children from scratch. On error this node
    /// is left unloaded; retry by loading again from the root.
    #[instrument(
        level = "debug",
        skip(self, storage, loader),
        fields(module = %self.display_name())
    )]
    pub fn load_with(
        &self,
        storage: &dyn Storage,
        loader: &dyn ConfigLoader,
        opts: LoadOptions,
    ) -> TreeResult<()> {
        let mut state = self.state.write();
        *state = NodeState::Unloaded;

        let nodes = self.resolve_children(storage, loader, opts.mode)?;

        if opts.parallel {
            nodes
                .par_iter()
                .try_for_each(|(_, child)| child.load_with(storage, loader, opts))?;
        } else {
            for child in nodes.values() {
                child.load_with(storage, loader, opts)?;
            }
        }

        let generation = self.loads.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("loaded {} children, generation {}", nodes.len(), generation);
        *state = NodeState::Loaded(Children { generation, nodes });
        Ok(())
    }

    /// Fetch, locate and parse every module referenced by this level.
    fn resolve_children(
        &self,
        storage: &dyn Storage,
        loader: &dyn ConfigLoader,
        mode: GetMode,
    ) -> TreeResult<BTreeMap<String, Arc<ModuleTree>>> {
        let mut nodes = BTreeMap::new();

        for m in self.config.module_refs() {
            if nodes.contains_key(&m.name) {
                return Err(TreeError::DuplicateModule(m.name.clone()));
            }

            let source =
                detect(&m.source, &self.config.dir).map_err(|e| TreeError::InvalidSource {
                    name: m.name.clone(),
                    source: e,
                })?;

            if mode.fetches() {
                storage
                    .resolve_or_fetch(&source, mode.forces_refresh())
                    .map_err(|e| TreeError::Storage {
                        name: m.name.clone(),
                        source: e,
                    })?;
            }

            let dir = storage
                .locate_local(&source)
                .map_err(|e| TreeError::Storage {
                    name: m.name.clone(),
                    source: e,
                })?
                .ok_or_else(|| TreeError::NotFound(m.name.clone()))?;

            debug!("module {}: {} -> {}", m.name, source, dir.display());
            let child = ModuleTree::from_dir(m.name.clone(), &dir, loader).map_err(|e| {
                TreeError::Config {
                    name: m.name.clone(),
                    source: e,
                }
            })?;
            nodes.insert(m.name.clone(), Arc::new(child));
        }

        Ok(nodes)
    }

    /// Semantic checks on the entire tree.
    ///
    /// Failures are reported as [`TreeError::Path`] naming every module
    /// from the failing one up to the root. The tree must be loaded.
    pub fn validate(&self) -> TreeResult<()> {
        let children = self.children().ok_or(TreeError::NotLoaded)?;
        let name = self.display_name();

        self.config
            .validate()
            .map_err(|e| PathError::new(name, e))?;

        for child in children.iter() {
            match child.validate() {
                Ok(()) => {}
                Err(TreeError::Path(e)) => return Err(e.push(name).into()),
                Err(e) => return Err(e),
            }
        }

        // Arguments passed to a module must be variables it declares.
        for m in self.config.module_refs() {
            let child = Self::child(&children, &m.name)?;
            let variables = child.config.variable_names();
            if let Some(key) = m.args.keys().find(|k| !variables.contains(k.as_str())) {
                let cause = ContractError::InvalidParameter {
                    module: m.name.clone(),
                    key: key.clone(),
                };
                return Err(PathError::new(name, cause).into());
            }
        }

        // Module outputs referenced by interpolations must exist.
        for (location, refs) in self.config.interpolated_variables() {
            for r in refs {
                let InterpolatedVariable::Module { name: module, field } = r else {
                    continue;
                };
                let child = Self::child(&children, &module)?;
                if !child.config.has_output(&field) {
                    let cause = ContractError::InvalidOutput {
                        location: location.clone(),
                        field,
                        module,
                    };
                    return Err(PathError::new(name, cause).into());
                }
            }
        }

        Ok(())
    }

    fn child<'a>(children: &'a Children, name: &str) -> TreeResult<&'a Arc<ModuleTree>> {
        children
            .get(name)
            .ok_or_else(|| TreeError::MissingChild(name.to_string()))
    }

    /// Render for terminals with box-drawing characters.
    pub fn to_termtree(&self) -> Tree<String> {
        let root = self.display_name().to_string();
        match self.children() {
            Some(children) => {
                Tree::new(root).with_leaves(children.iter().map(|c| c.to_termtree()))
            }
            None => Tree::new(root).with_leaves([Tree::new("(not loaded)".to_string())]),
        }
    }
}

impl fmt::Display for ModuleTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.display_name())?;
        match self.children() {
            None => write!(f, "  not loaded"),
            Some(children) => {
                for child in children.iter() {
                    for line in child.to_string().lines() {
                        writeln!(f, "  {line}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tree_is_not_loaded() {
        let tree = ModuleTree::new("", ModuleConfig::new("/x"));
        assert!(!tree.is_loaded());
        assert!(tree.children().is_none());
        assert_eq!(tree.display_name(), ROOT_NAME);
        assert_eq!(tree.to_string(), "<root>\n  not loaded");
    }

    #[test]
    fn test_validate_requires_load() {
        let tree = ModuleTree::new("child", ModuleConfig::new("/x"));
        let err = tree.validate().unwrap_err();
        assert!(matches!(err, TreeError::NotLoaded));
    }
}
