//! Schema registry: named JSON Schemas loaded once and cached
//!
//! ```text
//! schemas/
//! ├── users-schema.json
//! └── resources-schema.json
//! ```
//!
//! A logical name (`users`) is resolved by a [`SchemaStore`]; the
//! [`SchemaRegistry`] compiles the document once and hands out `Arc<Schema>`
//! for every later lookup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use crate::error::SchemaLoadError;

/// Source of raw schema documents, keyed by logical name.
pub trait SchemaStore: Send + Sync {
    /// Load the raw schema document for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaLoadError`] if the name is unknown or the document is malformed.
    fn load(&self, name: &str) -> Result<Value, SchemaLoadError>;
}

/// Directory-backed store. `users` → `users-schema.json`, `users.json`,
/// `users-schema.yaml`, `users.yaml`, `users.yml` (first match wins).
#[derive(Debug, Clone)]
pub struct FileSchemaStore {
    dir: PathBuf,
}

impl FileSchemaStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn candidates(&self, name: &str) -> Vec<PathBuf> {
        [
            format!("{name}-schema.json"),
            format!("{name}.json"),
            format!("{name}-schema.yaml"),
            format!("{name}.yaml"),
            format!("{name}.yml"),
        ]
        .into_iter()
        .map(|f| self.dir.join(f))
        .collect()
    }
}

impl SchemaStore for FileSchemaStore {
    fn load(&self, name: &str) -> Result<Value, SchemaLoadError> {
        let candidates = self.candidates(name);
        let Some(path) = candidates.iter().find(|p| p.is_file()) else {
            return Err(SchemaLoadError::Unknown {
                name: name.to_string(),
                searched: self.dir.display().to_string(),
            });
        };

        let content = std::fs::read_to_string(path).map_err(|e| SchemaLoadError::Io {
            name: name.to_string(),
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        parse_schema_document(name, path, &content)
    }
}

/// Parse a schema file as JSON or YAML, chosen by extension.
fn parse_schema_document(name: &str, path: &Path, content: &str) -> Result<Value, SchemaLoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "yaml" | "yml" => serde_yml::from_str(content).map_err(|e| SchemaLoadError::Malformed {
            name: name.to_string(),
            message: format!("Invalid YAML: {e}"),
        }),
        _ => serde_json::from_str(content).map_err(|e| SchemaLoadError::Malformed {
            name: name.to_string(),
            message: format!("Invalid JSON: {e}"),
        }),
    }
}

/// In-memory store, handy for embedding schemas or for tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySchemaStore {
    schemas: HashMap<String, Value>,
}

impl MemorySchemaStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.schemas.insert(name.into(), schema);
        self
    }
}

impl SchemaStore for MemorySchemaStore {
    fn load(&self, name: &str) -> Result<Value, SchemaLoadError> {
        self.schemas
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaLoadError::Unknown {
                name: name.to_string(),
                searched: "memory".to_string(),
            })
    }
}

/// A compiled, immutable schema.
pub struct Schema {
    name: String,
    document: Value,
    validator: jsonschema::Validator,
}

impl Schema {
    /// Compile a raw schema document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaLoadError::Invalid`] if the document is not a valid schema.
    pub fn compile(name: impl Into<String>, document: Value) -> Result<Self, SchemaLoadError> {
        let name = name.into();
        let validator =
            jsonschema::validator_for(&document).map_err(|e| SchemaLoadError::Invalid {
                name: name.clone(),
                message: e.to_string(),
            })?;
        Ok(Self {
            name,
            document,
            validator,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn document(&self) -> &Value {
        &self.document
    }

    pub(crate) fn validator(&self) -> &jsonschema::Validator {
        &self.validator
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema").field("name", &self.name).finish()
    }
}

/// Caching front of a [`SchemaStore`]. Safe for concurrent reads.
pub struct SchemaRegistry {
    store: Box<dyn SchemaStore>,
    cache: RwLock<HashMap<String, Arc<Schema>>>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new(store: impl SchemaStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Registry over a schema directory.
    #[must_use]
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(FileSchemaStore::new(dir))
    }

    /// Fetch a compiled schema, loading it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaLoadError`] if the store cannot provide the schema or it does not compile.
    pub fn get(&self, name: &str) -> Result<Arc<Schema>, SchemaLoadError> {
        if let Some(hit) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Ok(Arc::clone(hit));
        }

        let document = self.store.load(name)?;
        let schema = Arc::new(Schema::compile(name, document)?);

        // Another caller may have raced us here; keep whichever landed first.
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let entry = cache
            .entry(name.to_string())
            .or_insert_with(|| Arc::clone(&schema));
        Ok(Arc::clone(entry))
    }

    /// Load every named schema up front. Returns the failures, if any.
    pub fn preload<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Vec<SchemaLoadError> {
        names
            .into_iter()
            .filter_map(|name| self.get(name).err())
            .collect()
    }

    /// Names currently cached, sorted.
    #[must_use]
    pub fn cached(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("cached", &self.cached())
            .finish_non_exhaustive()
    }
}
