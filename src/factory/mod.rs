//! Builds assertion trees from declarative configuration
//!
//! Each configuration node named `X` is handled by the builder registered as
//! `assert_X`, with hyphens turned into underscores. Nodes that carry a
//! `namespace` locator are built by the registry of that external module.
//!
//! # Example
//!
//! ```text
//! not
//! └── equal  binding="HttpStatusCode" type="Int32" value="404"
//! ```
//!
//! builds `InvertedAll([Comparison(HttpStatusCode, Equal, Int32 404)])`,
//! which holds for every error except "404 Not Found".

mod builtins;
pub mod error;
pub mod node;
pub mod registry;

pub use error::ConfigurationError;
pub use node::{ConfigItem, ConfigNode};
pub use registry::{
    Arg, BoundArgs, Builder, BuilderRegistry, ModuleLocator, ModuleRegistry, Param, ParamKind,
    RulePlugin, TRUTHY_TOKENS, builder_name, is_truthy,
};

use crate::assertion::Assertion;
use crate::types::TypeResolver;
use std::sync::Arc;
use tracing::debug;

/// Turns [`ConfigNode`] trees into [`Assertion`] trees
#[derive(Debug, Clone)]
pub struct AssertionFactory {
    registry: Arc<BuilderRegistry>,
    modules: Arc<ModuleRegistry>,
    types: Arc<TypeResolver>,
}

impl Default for AssertionFactory {
    fn default() -> Self {
        Self::new(BuilderRegistry::builtin())
    }
}

impl AssertionFactory {
    pub fn new(registry: BuilderRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            modules: Arc::new(ModuleRegistry::new()),
            types: Arc::new(TypeResolver::default()),
        }
    }

    pub fn with_modules(mut self, modules: ModuleRegistry) -> Self {
        self.modules = Arc::new(modules);
        self
    }

    pub fn with_types(mut self, types: TypeResolver) -> Self {
        self.types = Arc::new(types);
        self
    }

    pub fn registry(&self) -> &BuilderRegistry {
        &self.registry
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    pub fn types(&self) -> &TypeResolver {
        &self.types
    }

    /// Build the assertion described by `node` and, recursively, its children.
    pub fn create(&self, node: &ConfigNode) -> Result<Assertion, ConfigurationError> {
        let registry = match &node.namespace {
            Some(locator) => self.modules.resolve(&ModuleLocator::decode(locator)?)?,
            None => self.registry.as_ref(),
        };

        let name = builder_name(&node.name);
        let builder = registry
            .get(&name)
            .ok_or_else(|| ConfigurationError::MissingBuilder {
                rule: node.name.clone(),
                builder: name.clone(),
            })?;

        let result = match builder {
            Builder::Node(build) => build(self, node),
            Builder::Params { params, build } => {
                BoundArgs::bind(self, node, params).and_then(|mut args| build(&mut args))
            }
        };

        match result {
            Ok(assertion) => {
                debug!(rule = %node.name, builder = %name, "built assertion");
                Ok(assertion)
            }
            Err(source) => Err(ConfigurationError::Build {
                rule: node.name.clone(),
                message: source.to_string(),
                source: Box::new(source),
            }),
        }
    }

    /// Build every element child of `node` in document order.
    ///
    /// Comments and whitespace are skipped; any other content is rejected.
    pub fn create_children(&self, node: &ConfigNode) -> Result<Vec<Assertion>, ConfigurationError> {
        let mut count = 0;
        for item in &node.children {
            match item {
                ConfigItem::Element(_) => count += 1,
                ConfigItem::Comment { .. } => {}
                ConfigItem::Text(text) if text.trim().is_empty() => {}
                ConfigItem::Text(text) => {
                    return Err(ConfigurationError::UnexpectedContent {
                        parent: node.name.clone(),
                        content: text.clone(),
                    });
                }
            }
        }

        let mut assertions = Vec::with_capacity(count);
        for child in node.elements() {
            assertions.push(self.create(child)?);
        }
        Ok(assertions)
    }
}
