use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// A value exposed to macro code under a fixed name.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// A host module, identified by its import name.
    Module(&'static str),
    /// The document macro code should act on.
    Document(String),
    /// Caller-supplied parameters.
    Params(Map<String, Value>),
}

/// The complete, enumerated set of names visible to macro code.
///
/// Nothing outside this set is reachable from executed code.
#[derive(Debug, Clone, PartialEq)]
pub struct Namespace {
    bindings: BTreeMap<&'static str, Binding>,
}

impl Namespace {
    /// Builds the standard namespace bound to `document`.
    ///
    /// `App`/`FreeCAD` and `Gui`/`FreeCADGui` are aliases of the same host
    /// modules.
    #[must_use]
    pub fn for_document(document: impl Into<String>, params: Map<String, Value>) -> Self {
        let bindings = BTreeMap::from([
            ("App", Binding::Module("FreeCAD")),
            ("FreeCAD", Binding::Module("FreeCAD")),
            ("Gui", Binding::Module("FreeCADGui")),
            ("FreeCADGui", Binding::Module("FreeCADGui")),
            ("Part", Binding::Module("Part")),
            ("math", Binding::Module("math")),
            ("time", Binding::Module("time")),
            ("doc", Binding::Document(document.into())),
            ("params", Binding::Params(params)),
        ]);
        Self { bindings }
    }

    /// Whether `name` is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Document bound as `doc`.
    #[must_use]
    pub fn document(&self) -> Option<&str> {
        match self.bindings.get("doc") {
            Some(Binding::Document(name)) => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_only_enumerated_bindings() {
        let namespace = Namespace::for_document("Model", Map::new());
        for name in [
            "App",
            "FreeCAD",
            "FreeCADGui",
            "Gui",
            "Part",
            "doc",
            "math",
            "params",
            "time",
        ] {
            assert!(namespace.contains(name), "{name} should be bound");
        }
        assert!(!namespace.contains("os"));
        assert!(!namespace.contains("__builtins__"));
    }

    #[test]
    fn document_is_bound_as_doc() {
        let namespace = Namespace::for_document("Model", Map::new());
        assert_eq!(namespace.document(), Some("Model"));
    }
}
