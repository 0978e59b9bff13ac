//! Server schema published at the well-known schema path.
//!
//! The document maps application names to their modules, components and
//! methods, with each method declared as `"rpc"` or `"stream"`:
//!
//! ```text
//! {
//!   "TodoApp": {
//!     "modules": {
//!       "TodoModule": {
//!         "TodoComponent": { "addTodo": "rpc", "listen": "stream" }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! The `"modules"` level is optional; an application object without it is
//! read as the module map itself.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::error::{OnixError, Result};

/// Declared call kind of a remote method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// Unary request/response.
    Rpc,
    /// Server push stream.
    Stream,
}

impl MethodKind {
    /// Name used in the schema document.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rpc => "rpc",
            Self::Stream => "stream",
        }
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema of one application: module -> component -> method -> kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppSchema {
    modules: Map<String, Value>,
}

impl AppSchema {
    /// Read an application object from the schema document.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| OnixError::InvalidSchema("application entry is not an object".into()))?;

        let modules = match object.get("modules") {
            Some(Value::Object(modules)) => modules.clone(),
            Some(_) => {
                return Err(OnixError::InvalidSchema(
                    "\"modules\" is not an object".into(),
                ))
            }
            None => object.clone(),
        };

        Ok(Self { modules })
    }

    /// Raw declared kind of a method, if any.
    pub fn declared(&self, module: &str, component: &str, method: &str) -> Option<&str> {
        self.modules
            .get(module)?
            .get(component)?
            .get(method)?
            .as_str()
    }

    /// Whether `method` exists and is declared with `kind`.
    pub fn allows(&self, module: &str, component: &str, method: &str, kind: MethodKind) -> bool {
        self.declared(module, component, method) == Some(kind.as_str())
    }

    /// Module names.
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }
}

/// Whole schema document: application name -> [`AppSchema`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    apps: BTreeMap<String, AppSchema>,
}

impl Schema {
    /// Parse the schema document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchema` if the document is not an object of objects.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| OnixError::InvalidSchema("schema is not an object".into()))?;

        let mut apps = BTreeMap::new();
        for (name, app) in object {
            let app = AppSchema::from_value(app)
                .map_err(|e| OnixError::InvalidSchema(format!("{}: {}", name, e)))?;
            apps.insert(name.clone(), app);
        }
        Ok(Self { apps })
    }

    /// Schema of one application.
    pub fn app(&self, name: &str) -> Option<&AppSchema> {
        self.apps.get(name)
    }

    /// Application names, sorted.
    pub fn apps(&self) -> impl Iterator<Item = &str> {
        self.apps.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_schema() {
        let schema = Schema::from_value(&json!({
            "App": { "Mod": { "Comp": { "greet": "rpc", "feed": "stream" } } }
        }))
        .unwrap();

        let app = schema.app("App").unwrap();
        assert_eq!(app.declared("Mod", "Comp", "greet"), Some("rpc"));
        assert!(app.allows("Mod", "Comp", "feed", MethodKind::Stream));
        assert!(!app.allows("Mod", "Comp", "feed", MethodKind::Rpc));
        assert!(!app.allows("Mod", "Comp", "missing", MethodKind::Rpc));
        assert!(!app.allows("Other", "Comp", "greet", MethodKind::Rpc));
    }

    #[test]
    fn test_modules_key() {
        let schema = Schema::from_value(&json!({
            "TodoApp": {
                "modules": { "TodoModule": { "TodoComponent": { "addTodo": "rpc" } } }
            }
        }))
        .unwrap();

        let app = schema.app("TodoApp").unwrap();
        assert!(app.allows("TodoModule", "TodoComponent", "addTodo", MethodKind::Rpc));
        assert_eq!(app.modules().collect::<Vec<_>>(), vec!["TodoModule"]);
    }

    #[test]
    fn test_unknown_app() {
        let schema = Schema::from_value(&json!({ "App": {} })).unwrap();
        assert!(schema.app("Nope").is_none());
        assert_eq!(schema.apps().collect::<Vec<_>>(), vec!["App"]);
    }

    #[test]
    fn test_invalid_documents() {
        assert!(Schema::from_value(&json!([1, 2])).is_err());
        assert!(Schema::from_value(&json!({ "App": "rpc" })).is_err());
        assert!(Schema::from_value(&json!({ "App": { "modules": 3 } })).is_err());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(MethodKind::Rpc.to_string(), "rpc");
        assert_eq!(MethodKind::Stream.as_str(), "stream");
    }
}
