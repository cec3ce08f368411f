//! Owned XML element tree for manifests and XML resources.
//!
//! Compiled attribute values are modelled as resource [`Item`]s. The text
//! decoder accepts regular XML where an attribute value of the form
//! `@0x7f010001` denotes a compiled reference to that resource id.

use roxmltree::{Document, Node};

use crate::error::XmlReadError;
use crate::resources::Item;

/// An XML attribute with its optional compiled value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    /// Local name, without namespace prefix.
    pub name: String,
    /// Raw string value.
    pub value: String,
    /// Compiled value, when the attribute refers to a resource.
    pub compiled: Option<Item>,
}

impl XmlAttribute {
    /// Plain string attribute.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        let compiled = parse_reference(&value).map(Item::Reference);
        Self {
            name: name.into(),
            value,
            compiled,
        }
    }
}

/// An XML element with attributes and child elements.
///
/// Text content is not retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    /// Create an empty element.
    #[must_use]
    pub fn element(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Add a child element.
    #[must_use]
    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    /// Look up an attribute by local name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&XmlAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Look up an attribute's raw value by local name.
    #[must_use]
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attribute(name).map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing any existing value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let attribute = XmlAttribute::new(name, value);
        match self.attributes.iter_mut().find(|a| a.name == attribute.name) {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
    }

    /// First child element with the given name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All child elements with the given name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First child element with the given name, created if missing.
    pub fn child_mut_or_insert(&mut self, name: &str) -> &mut XmlNode {
        let index = match self.children.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                self.children.push(XmlNode::element(name));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    /// This element and all descendant elements in document order.
    #[must_use]
    pub fn descendants(&self) -> Vec<&XmlNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Ids of every compiled resource reference in this subtree's attributes.
    #[must_use]
    pub fn compiled_references(&self) -> Vec<u32> {
        self.descendants()
            .into_iter()
            .flat_map(|node| node.attributes.iter())
            .filter_map(|attribute| match attribute.compiled {
                Some(Item::Reference(id)) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Decode an XML document.
    pub fn parse(text: &str) -> Result<Self, XmlReadError> {
        let doc = Document::parse(text)?;
        Ok(convert(doc.root_element()))
    }
}

fn convert(node: Node<'_, '_>) -> XmlNode {
    XmlNode {
        name: node.tag_name().name().to_string(),
        attributes: node
            .attributes()
            .map(|a| XmlAttribute::new(a.name(), a.value()))
            .collect(),
        children: node
            .children()
            .filter(Node::is_element)
            .map(convert)
            .collect(),
    }
}

/// Parse `@0x7f010001` into a resource id.
fn parse_reference(value: &str) -> Option<u32> {
    let hex = value.strip_prefix("@0x")?;
    u32::from_str_radix(hex, 16).ok()
}
