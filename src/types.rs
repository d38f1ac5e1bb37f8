use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Abstract,
    Interface,
}

/// A named type that values can be checked against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub name: String,
    pub kind: TypeKind,
}

impl TypeRef {
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Class,
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Interface,
        }
    }

    pub fn abstract_class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Abstract,
        }
    }

    /// Interfaces and abstract types can never be the exact runtime type of a
    /// value, so checks against them always use assignability.
    pub fn forces_compatibility(&self) -> bool {
        matches!(self.kind, TypeKind::Interface | TypeKind::Abstract)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Resolves type names written in configuration.
///
/// Names that were never declared resolve as concrete classes.
#[derive(Debug, Clone)]
pub struct TypeResolver {
    known: HashMap<String, TypeRef>,
}

impl Default for TypeResolver {
    fn default() -> Self {
        let mut resolver = Self {
            known: HashMap::new(),
        };
        for name in ["IDisposable", "IComparable", "IEnumerable", "ISerializable"] {
            resolver.declare(TypeRef::interface(name));
        }
        resolver.declare(TypeRef::abstract_class("ValueType"));
        resolver
    }
}

impl TypeResolver {
    pub fn declare(&mut self, ty: TypeRef) -> &mut Self {
        self.known.insert(ty.name.clone(), ty);
        self
    }

    pub fn resolve(&self, name: &str) -> TypeRef {
        let name = name.trim();
        self.known
            .get(name)
            .cloned()
            .unwrap_or_else(|| TypeRef::class(name))
    }
}
