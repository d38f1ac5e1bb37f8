use super::AssertionFactory;
use super::error::ConfigurationError;
use super::node::ConfigNode;
use crate::assertion::{Assertion, ContextExpression, TypeCode};
use crate::types::TypeRef;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type NodeBuilder =
    Arc<dyn Fn(&AssertionFactory, &ConfigNode) -> Result<Assertion, ConfigurationError> + Send + Sync>;

pub type ParamBuilder =
    Arc<dyn Fn(&mut BoundArgs) -> Result<Assertion, ConfigurationError> + Send + Sync>;

/// Tokens read as `true` by boolean parameters, compared case-insensitively.
pub const TRUTHY_TOKENS: [&str; 4] = ["true", "yes", "on", "1"];

/// How a builder wants to be invoked
#[derive(Clone)]
pub enum Builder {
    /// Receives the raw node; used by composites that build their own children.
    Node(NodeBuilder),
    /// Receives parameters bound by name from the node's attributes or child
    /// elements.
    Params {
        params: Arc<[Param]>,
        build: ParamBuilder,
    },
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Builder::Node(_) => f.write_str("Builder::Node"),
            Builder::Params { params, .. } => f.debug_tuple("Builder::Params").field(params).finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Becomes a lenient path expression over the raw text.
    ContextExpression,
    /// Resolved through the factory's [`TypeResolver`](crate::types::TypeResolver).
    TypeReference,
    Bool,
    TypeCode,
    Integer,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
}

impl Param {
    pub const fn required(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Arg {
    Expression(ContextExpression),
    Type(TypeRef),
    Bool(bool),
    TypeCode(TypeCode),
    Integer(i64),
    Text(String),
}

/// Parameters bound for one invocation of a [`Builder::Params`] builder
#[derive(Debug)]
pub struct BoundArgs {
    rule: String,
    values: HashMap<&'static str, Arg>,
}

impl BoundArgs {
    /// Convert each declared parameter found on `node`.
    pub(crate) fn bind(
        factory: &AssertionFactory,
        node: &ConfigNode,
        params: &[Param],
    ) -> Result<Self, ConfigurationError> {
        let mut values = HashMap::with_capacity(params.len());
        for param in params {
            let Some(raw) = node.parameter(param.name) else {
                if param.required {
                    return Err(ConfigurationError::MissingParameter {
                        rule: node.name.clone(),
                        parameter: param.name.to_string(),
                    });
                }
                continue;
            };

            let invalid = |reason: String| ConfigurationError::InvalidParameter {
                rule: node.name.clone(),
                parameter: param.name.to_string(),
                value: raw.clone(),
                reason,
            };

            let arg = match param.kind {
                ParamKind::ContextExpression => Arg::Expression(ContextExpression::path(&raw)?),
                ParamKind::TypeReference => {
                    if raw.trim().is_empty() {
                        return Err(invalid("type name is empty".to_string()));
                    }
                    Arg::Type(factory.types().resolve(&raw))
                }
                ParamKind::Bool => Arg::Bool(is_truthy(&raw)),
                ParamKind::TypeCode => Arg::TypeCode(raw.parse().map_err(invalid)?),
                ParamKind::Integer => Arg::Integer(
                    raw.trim()
                        .parse()
                        .map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?,
                ),
                ParamKind::Text => Arg::Text(raw.clone()),
            };
            values.insert(param.name, arg);
        }

        Ok(Self {
            rule: node.name.clone(),
            values,
        })
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }

    fn take(&mut self, name: &str) -> Result<Arg, ConfigurationError> {
        self.values
            .remove(name)
            .ok_or_else(|| ConfigurationError::MissingParameter {
                rule: self.rule.clone(),
                parameter: name.to_string(),
            })
    }

    fn mismatch(&self, name: &str, expected: &str) -> ConfigurationError {
        ConfigurationError::InvalidParameter {
            rule: self.rule.clone(),
            parameter: name.to_string(),
            value: String::new(),
            reason: format!("parameter is not declared as {expected}"),
        }
    }

    pub fn expression(&mut self, name: &str) -> Result<ContextExpression, ConfigurationError> {
        match self.take(name)? {
            Arg::Expression(expr) => Ok(expr),
            _ => Err(self.mismatch(name, "a context expression")),
        }
    }

    pub fn optional_expression(
        &mut self,
        name: &str,
    ) -> Result<Option<ContextExpression>, ConfigurationError> {
        if !self.values.contains_key(name) {
            return Ok(None);
        }
        self.expression(name).map(Some)
    }

    pub fn type_ref(&mut self, name: &str) -> Result<TypeRef, ConfigurationError> {
        match self.take(name)? {
            Arg::Type(ty) => Ok(ty),
            _ => Err(self.mismatch(name, "a type reference")),
        }
    }

    pub fn type_code(&mut self, name: &str) -> Result<TypeCode, ConfigurationError> {
        match self.take(name)? {
            Arg::TypeCode(code) => Ok(code),
            _ => Err(self.mismatch(name, "a type code")),
        }
    }

    pub fn integer(&mut self, name: &str) -> Result<i64, ConfigurationError> {
        match self.take(name)? {
            Arg::Integer(n) => Ok(n),
            _ => Err(self.mismatch(name, "an integer")),
        }
    }

    /// Missing text parameters read as empty.
    pub fn text(&mut self, name: &str) -> Result<String, ConfigurationError> {
        match self.values.remove(name) {
            Some(Arg::Text(text)) => Ok(text),
            None => Ok(String::new()),
            Some(_) => Err(self.mismatch(name, "text")),
        }
    }

    /// Missing flags read as false.
    pub fn flag(&mut self, name: &str) -> Result<bool, ConfigurationError> {
        match self.values.remove(name) {
            Some(Arg::Bool(flag)) => Ok(flag),
            None => Ok(false),
            Some(_) => Err(self.mismatch(name, "a boolean")),
        }
    }
}

pub fn is_truthy(raw: &str) -> bool {
    let raw = raw.trim();
    TRUTHY_TOKENS
        .iter()
        .any(|token| token.eq_ignore_ascii_case(raw))
}

/// Name of the builder that handles rule `rule_name`.
pub fn builder_name(rule_name: &str) -> String {
    format!("assert_{}", rule_name.trim().replace('-', "_"))
}

/// Extension point for rule modules that contribute builders
pub trait RulePlugin {
    fn register(&self, registry: &mut BuilderRegistry);
}

/// Maps builder names (`assert_<rule>`) to builders
#[derive(Clone, Default)]
pub struct BuilderRegistry {
    builders: HashMap<String, Builder>,
}

impl BuilderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in rule.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        super::builtins::register(&mut registry);
        registry
    }

    pub fn register_node<F>(&mut self, name: &str, build: F) -> &mut Self
    where
        F: Fn(&AssertionFactory, &ConfigNode) -> Result<Assertion, ConfigurationError>
            + Send
            + Sync
            + 'static,
    {
        self.builders
            .insert(name.to_string(), Builder::Node(Arc::new(build)));
        self
    }

    pub fn register_params<F>(&mut self, name: &str, params: &[Param], build: F) -> &mut Self
    where
        F: Fn(&mut BoundArgs) -> Result<Assertion, ConfigurationError> + Send + Sync + 'static,
    {
        self.builders.insert(
            name.to_string(),
            Builder::Params {
                params: params.into(),
                build: Arc::new(build),
            },
        );
        self
    }

    pub fn install(&mut self, plugin: &dyn RulePlugin) -> &mut Self {
        plugin.register(self);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Builder> {
        self.builders.get(name)
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    /// Registered builder names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for BuilderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuilderRegistry")
            .field("builders", &self.names())
            .finish()
    }
}

/// Identifies an external rule module
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleLocator {
    pub namespace: String,
    pub module: String,
}

impl ModuleLocator {
    /// Module assumed when a locator only names a namespace.
    pub const HOST_MODULE: &'static str = "host";

    pub fn new(namespace: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            module: module.into(),
        }
    }

    /// Decode one of the three supported locator shapes from the trailing
    /// segments of `text`:
    ///
    /// ```text
    /// <prefix>/ns/<namespace>                  by namespace, host module
    /// <prefix>/module/<module>                 by module, namespace = module
    /// <prefix>/nsmodule/<namespace>/<module>   both
    /// ```
    pub fn decode(text: &str) -> Result<Self, ConfigurationError> {
        let invalid = || ConfigurationError::InvalidModuleLocator(text.to_string());
        let segments: Vec<&str> = text.trim().trim_end_matches('/').split('/').collect();

        let locator = match segments.as_slice() {
            [.., "nsmodule", namespace, module] => Self::new(*namespace, *module),
            [.., "ns", namespace] => Self::new(*namespace, Self::HOST_MODULE),
            [.., "module", module] => Self::new(*module, *module),
            _ => return Err(invalid()),
        };

        if locator.namespace.is_empty() || locator.module.is_empty() {
            return Err(invalid());
        }
        Ok(locator)
    }
}

/// Explicitly owned set of external rule registries, populated at startup
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: HashMap<ModuleLocator, Arc<BuilderRegistry>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_module(&mut self, locator: ModuleLocator, registry: BuilderRegistry) -> &mut Self {
        self.modules.insert(locator, Arc::new(registry));
        self
    }

    pub fn resolve(&self, locator: &ModuleLocator) -> Result<&BuilderRegistry, ConfigurationError> {
        self.modules
            .get(locator)
            .map(Arc::as_ref)
            .ok_or_else(|| ConfigurationError::UnresolvedModule {
                namespace: locator.namespace.clone(),
                module: locator.module.clone(),
            })
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
