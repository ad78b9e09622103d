//! Core types for the position-annotated tag tree.

use crate::error::Error;
use crate::position::Span;
use indexmap::IndexMap;

/// A namespace binding: prefix plus URI.
///
/// The default namespace (`xmlns="..."`) has an empty prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Namespace {
    pub prefix: String,
    pub uri: String,
}

impl Namespace {
    pub fn new(prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            uri: uri.into(),
        }
    }
}

/// An attribute with source positions.
///
/// `start`/`end` delimit the value between its quotes; `name_start` is where
/// the attribute name begins. All three are zero for attributes created with
/// [`Attribute::new`] rather than parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Qualified name, e.g. `xmlns:e` or `width.down`.
    pub name: String,

    /// The attribute value after unescaping XML entities.
    pub value: String,

    pub name_start: usize,
    pub start: usize,
    pub end: usize,
}

impl Attribute {
    /// A synthesized attribute with no source position.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            name_start: 0,
            start: 0,
            end: 0,
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    pub fn is_synthesized(&self) -> bool {
        self.name_start == 0 && self.start == 0 && self.end == 0
    }

    /// The namespace this attribute declares, if it is `xmlns` or `xmlns:p`.
    pub fn namespace_declaration(&self) -> Option<Namespace> {
        if self.name == "xmlns" {
            Some(Namespace::new("", self.value.clone()))
        } else {
            self.name
                .strip_prefix("xmlns:")
                .map(|prefix| Namespace::new(prefix, self.value.clone()))
        }
    }

    /// Source extent from the first character of the name to the closing
    /// quote, inclusive of both ends.
    pub(crate) fn hit(&self, offset: usize) -> bool {
        !self.is_synthesized() && self.name_start <= offset && offset <= self.end
    }
}

/// Leaf text or CDATA content with its source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    pub content: String,
    pub span: Span,
}

/// A child of a [`Tag`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Tag(Tag),
    Text(TextNode),
    CData(TextNode),
}

impl Node {
    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Node::Tag(tag) => Some(tag),
            Node::Text(_) | Node::CData(_) => None,
        }
    }

    pub fn start(&self) -> usize {
        match self {
            Node::Tag(tag) => tag.start,
            Node::Text(text) | Node::CData(text) => text.span.start,
        }
    }
}

/// A borrowed node returned by position lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef<'a> {
    Tag(&'a Tag),
    Attribute(&'a Attribute),
    Text(&'a TextNode),
}

/// An element of the tag tree.
///
/// `start..end` covers the whole element, from its `<` to the `>` of its end
/// tag (or of the start tag when self-closing). `line`/`column` are 1-based
/// and refer to `start`.
///
/// The tree is owned top-down. `location` is the chain of child indices that
/// leads from the root to this tag (empty for the root); it is the lookup-only
/// parent relation, resolved against the root with [`Tag::parent`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tag {
    /// Qualified name as written, e.g. `e:Group`.
    pub name: String,

    pub prefix: Option<String>,

    /// URI bound to `prefix` by the nearest declaring ancestor (or the tag
    /// itself). Empty when unprefixed or when the prefix is unbound.
    pub namespace: String,

    pub local_name: String,

    pub start: usize,
    pub end: usize,

    /// Offset just past the `>` of the start tag.
    pub start_tag_end: usize,

    /// Offset of the `<` of the end tag; equals `start_tag_end` when
    /// self-closing.
    pub end_tag_start: usize,

    pub self_closing: bool,

    pub line: usize,
    pub column: usize,

    /// Attributes in source order, keyed by qualified name.
    pub attributes: IndexMap<String, Attribute>,

    pub children: Vec<Node>,

    /// First non-blank text or CDATA content, trimmed.
    pub text: Option<String>,

    pub location: Vec<usize>,

    /// Parse issues; only ever populated on the root.
    pub errors: Vec<Error>,
}

impl Tag {
    /// A synthesized tag with no source position.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let (prefix, local_name) = split_qualified(&name);
        Self {
            prefix: prefix.map(str::to_string),
            local_name: local_name.to_string(),
            name,
            ..Self::default()
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    pub fn is_root(&self) -> bool {
        self.location.is_empty()
    }

    /// Get an attribute value by qualified name.
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|a| a.value.as_str())
    }

    /// Get an attribute by qualified name, with its source positions.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Set an attribute value, keeping its position in the attribute order if
    /// it already exists and appending a synthesized one otherwise.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.get_mut(name) {
            Some(existing) => existing.value = value,
            None => {
                self.attributes
                    .insert(name.to_string(), Attribute::new(name, value));
            }
        }
    }

    /// Remove an attribute, preserving the order of the rest. Returns the
    /// removed attribute.
    pub fn delete_attribute(&mut self, name: &str) -> Option<Attribute> {
        self.attributes.shift_remove(name)
    }

    /// Child tags, skipping text and CDATA.
    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.children.iter().filter_map(Node::as_tag)
    }

    /// Child tags with the given local name and namespace URI. An empty `uri`
    /// matches only children without a namespace.
    pub fn child(&self, local_name: &str, uri: &str) -> Vec<&Tag> {
        self.tags()
            .filter(|t| t.local_name == local_name && t.namespace == uri)
            .collect()
    }

    /// The namespace this tag's own name resolves to.
    pub fn namespace_binding(&self) -> Namespace {
        Namespace::new(self.prefix.clone().unwrap_or_default(), self.namespace.clone())
    }

    /// Namespaces declared by this tag's own `xmlns` attributes.
    pub fn namespace_declarations(&self) -> Vec<Namespace> {
        self.attributes
            .values()
            .filter_map(Attribute::namespace_declaration)
            .collect()
    }

    /// The tag at `location` below this one (`&[]` is `self`).
    pub fn descendant(&self, location: &[usize]) -> Option<&Tag> {
        let mut current = self;
        for &index in location {
            current = current.children.get(index)?.as_tag()?;
        }
        Some(current)
    }

    pub fn descendant_mut(&mut self, location: &[usize]) -> Option<&mut Tag> {
        let mut current = self;
        for &index in location {
            current = match current.children.get_mut(index)? {
                Node::Tag(tag) => tag,
                Node::Text(_) | Node::CData(_) => return None,
            };
        }
        Some(current)
    }

    /// Resolve this tag's parent inside the tree rooted at `root`.
    pub fn parent<'a>(&self, root: &'a Tag) -> Option<&'a Tag> {
        let (_, parent) = self.location.split_last()?;
        root.descendant(parent)
    }

    /// Rewrite `location` for this tag and its whole subtree.
    pub(crate) fn relink(&mut self, location: Vec<usize>) {
        for (index, child) in self.children.iter_mut().enumerate() {
            if let Node::Tag(tag) = child {
                let mut child_location = location.clone();
                child_location.push(index);
                tag.relink(child_location);
            }
        }
        self.location = location;
    }
}

/// Split `prefix:local` into its parts.
pub(crate) fn split_qualified(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tag_splits_name() {
        let tag = Tag::new("e:Group");
        assert_eq!(tag.prefix.as_deref(), Some("e"));
        assert_eq!(tag.local_name, "Group");
        assert!(tag.is_root());
    }

    #[test]
    fn test_set_attribute_keeps_order() {
        let mut tag = Tag::new("e:Rect");
        tag.set_attribute("id", "bg");
        tag.set_attribute("width", "10");
        tag.set_attribute("id", "fg");

        let names: Vec<&str> = tag.attributes.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["id", "width"]);
        assert_eq!(tag.get_attribute("id"), Some("fg"));
        assert!(tag.attribute("width").unwrap().is_synthesized());
    }

    #[test]
    fn test_delete_attribute() {
        let mut tag = Tag::new("e:Rect");
        tag.set_attribute("id", "bg");
        tag.set_attribute("x", "1");
        tag.set_attribute("y", "2");

        let removed = tag.delete_attribute("x");
        assert_eq!(removed.map(|a| a.value), Some("1".to_string()));
        assert!(tag.delete_attribute("missing").is_none());

        let names: Vec<&str> = tag.attributes.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["id", "y"]);
    }

    #[test]
    fn test_namespace_declaration() {
        let attr = Attribute::new("xmlns:e", "http://ns.egret.com/eui");
        assert_eq!(
            attr.namespace_declaration(),
            Some(Namespace::new("e", "http://ns.egret.com/eui"))
        );
        assert_eq!(
            Attribute::new("xmlns", "urn:x").namespace_declaration(),
            Some(Namespace::new("", "urn:x"))
        );
        assert_eq!(Attribute::new("id", "a").namespace_declaration(), None);
        assert_eq!(Attribute::new("x.down", "1").local_name(), "x.down");
    }
}
