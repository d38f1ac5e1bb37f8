use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One element of a declarative rule tree.
///
/// The tree is usually deserialized from a settings file; attribute values
/// may be written as strings, numbers or booleans and are kept as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigNode {
    pub name: String,
    /// Locator of an external rule module that provides this node's builder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, deserialize_with = "scalar_attributes")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<ConfigItem>,
}

/// Content found under a [`ConfigNode`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigItem {
    Element(ConfigNode),
    Comment { comment: String },
    Text(String),
}

impl ConfigNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn child(mut self, child: ConfigNode) -> Self {
        self.children.push(ConfigItem::Element(child));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(ConfigItem::Text(text.into()));
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.children.push(ConfigItem::Comment {
            comment: comment.into(),
        });
        self
    }

    pub fn in_module(mut self, locator: impl Into<String>) -> Self {
        self.namespace = Some(locator.into());
        self
    }

    pub fn elements(&self) -> impl Iterator<Item = &ConfigNode> {
        self.children.iter().filter_map(|item| match item {
            ConfigItem::Element(node) => Some(node),
            _ => None,
        })
    }

    /// Concatenated text content, trimmed.
    pub fn inner_text(&self) -> String {
        let text: String = self
            .children
            .iter()
            .filter_map(|item| match item {
                ConfigItem::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        text.trim().to_string()
    }

    /// Value of `name` taken from an attribute, else from the text of a child
    /// element with that name.
    pub fn parameter(&self, name: &str) -> Option<String> {
        if let Some(value) = self.attributes.get(name) {
            return Some(value.clone());
        }
        self.elements()
            .find(|child| child.name == name)
            .map(ConfigNode::inner_text)
    }
}

fn scalar_attributes<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(de::Error::custom(format!(
                        "attribute '{key}' must be a string, number or boolean"
                    )));
                }
            };
            Ok((key, text))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_prefers_attribute_then_child_text() {
        let node = ConfigNode::new("regex")
            .attr("binding", "Exception.Message")
            .child(ConfigNode::new("pattern").text("  ^timeout  "))
            .child(ConfigNode::new("binding").text("ignored"));

        assert_eq!(node.parameter("binding").as_deref(), Some("Exception.Message"));
        assert_eq!(node.parameter("pattern").as_deref(), Some("^timeout"));
        assert_eq!(node.parameter("caseSensitive"), None);
    }

    #[test]
    fn test_deserialize_tree_from_toml() {
        let node: ConfigNode = toml::from_str(
            r#"
name = "or"

[[children]]
comment = "ignore not-found"

[[children]]
name = "equal"
attributes = { binding = "HttpStatusCode", type = "Int32", value = 404 }

[[children]]
name = "regex"
namespace = "urn:rules/ns/Acme"
attributes = { binding = "Exception.Message", pattern = "^x", caseSensitive = true }
"#,
        )
        .unwrap();

        assert_eq!(node.name, "or");
        assert_eq!(node.children.len(), 3);
        assert!(matches!(node.children[0], ConfigItem::Comment { .. }));

        let elements: Vec<_> = node.elements().collect();
        assert_eq!(elements[0].attributes["value"], "404");
        assert_eq!(elements[1].attributes["caseSensitive"], "true");
        assert_eq!(elements[1].namespace.as_deref(), Some("urn:rules/ns/Acme"));
    }

    #[test]
    fn test_deserialize_text_items_from_json() {
        let node: ConfigNode = serde_json::from_value(serde_json::json!({
            "name": "and",
            "children": ["  ", {"name": "true"}]
        }))
        .unwrap();
        assert_eq!(node.children[0], ConfigItem::Text("  ".into()));
        assert_eq!(node.elements().count(), 1);
    }

    #[test]
    fn test_nested_attribute_values_are_rejected() {
        let result: Result<ConfigNode, _> = serde_json::from_value(serde_json::json!({
            "name": "equal",
            "attributes": {"value": [1, 2]}
        }));
        assert!(result.is_err());
    }
}
