//! Functions
//!
//! A function is a named list of command lines, parsed once and then bound to
//! a source each time it is called. Function files use one command per line;
//! blank lines and lines starting with `#` are ignored.

use crate::error::ExecError;
use crate::execution::tasks::BuildContexts;
use crate::execution::UnboundEntryAction;
use crate::source::ExecutionCommandSource;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, info};
use walkdir::WalkDir;

pub const FUNCTION_EXTENSION: &str = "mcfunction";

pub struct InstantiatedFunction<S> {
    id: String,
    entries: Rc<[UnboundEntryAction<S>]>,
}

impl<S> fmt::Debug for InstantiatedFunction<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstantiatedFunction")
            .field("id", &self.id)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl<S> InstantiatedFunction<S> {
    pub fn new(id: impl Into<String>, entries: Vec<UnboundEntryAction<S>>) -> Self {
        Self {
            id: id.into(),
            entries: Rc::from(entries),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn entries(&self) -> &Rc<[UnboundEntryAction<S>]> {
        &self.entries
    }
}

impl<S: ExecutionCommandSource> InstantiatedFunction<S> {
    /// Parse `text` with the source's dispatcher. `origin` only labels errors.
    pub fn compile(id: &str, text: &str, origin: &Path, source: &S) -> Result<Self, ExecError> {
        let mut entries = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let chain = source
                .dispatcher()
                .parse(line, source)
                .map_err(|e| ExecError::FunctionParse {
                    path: origin.to_path_buf(),
                    line: index + 1,
                    source: e,
                })?;
            entries.push(UnboundEntryAction::Command(BuildContexts::new(line, chain)));
        }
        Ok(Self::new(id, entries))
    }
}

/// Functions by id (`namespace:path/name`).
pub struct FunctionLibrary<S> {
    functions: BTreeMap<String, Rc<InstantiatedFunction<S>>>,
}

impl<S> Default for FunctionLibrary<S> {
    fn default() -> Self {
        Self {
            functions: BTreeMap::new(),
        }
    }
}

impl<S> FunctionLibrary<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, function: InstantiatedFunction<S>) -> Rc<InstantiatedFunction<S>> {
        let function = Rc::new(function);
        self.functions
            .insert(function.id().to_string(), Rc::clone(&function));
        function
    }

    pub fn get(&self, id: &str) -> Option<Rc<InstantiatedFunction<S>>> {
        self.functions.get(id).cloned()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl<S: ExecutionCommandSource> FunctionLibrary<S> {
    /// Compile every function file under `dir` into `namespace`.
    ///
    /// `dir/foo/bar.mcfunction` becomes `namespace:foo/bar`. Returns the number
    /// of functions loaded.
    pub fn load_dir(&mut self, dir: &Path, namespace: &str, source: &S) -> Result<usize, ExecError> {
        if !dir.is_dir() {
            return Err(ExecError::FunctionDirNotFound(dir.to_path_buf()));
        }
        let mut loaded = 0;
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| ExecError::IoError(e.into()))?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(FUNCTION_EXTENSION)
            {
                continue;
            }
            let relative = path
                .strip_prefix(dir)
                .unwrap_or(path)
                .with_extension("");
            let name: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            let id = format!("{}:{}", namespace, name.join("/"));
            let text = std::fs::read_to_string(path)?;
            let function = InstantiatedFunction::compile(&id, &text, path, source)?;
            debug!(function = %id, commands = function.entries().len(), "Loaded function");
            self.insert(function);
            loaded += 1;
        }
        info!(dir = %dir.display(), namespace, loaded, "Loaded functions");
        Ok(loaded)
    }
}
