//! Event-driven parser that builds position-annotated [`Tag`] trees.

use crate::attrs::tag_attributes;
use crate::cache::{DEFAULT_CAPACITY, ParseCache};
use crate::position::{LineIndex, Location, Span};
use crate::types::{Attribute, Namespace, Node, Tag, TextNode, split_qualified};
use crate::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesCData, BytesStart, BytesText, Event};

/// Options for a single parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Return the first parse issue as `Err` instead of collecting issues on
    /// the root.
    pub throw_on_error: bool,

    /// Record line/column/offset on parse issues.
    pub position_in_errors: bool,

    /// Consult and fill the [`TagParser`] cache. Ignored by the free
    /// functions, which never cache.
    pub use_cache: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            throw_on_error: true,
            position_in_errors: true,
            use_cache: true,
        }
    }
}

impl ParseOptions {
    /// Collect issues on the root instead of failing.
    pub fn lenient() -> Self {
        Self {
            throw_on_error: false,
            ..Self::default()
        }
    }

    pub fn with_throw_on_error(mut self, value: bool) -> Self {
        self.throw_on_error = value;
        self
    }

    pub fn with_position_in_errors(mut self, value: bool) -> Self {
        self.position_in_errors = value;
        self
    }

    pub fn with_cache(mut self, value: bool) -> Self {
        self.use_cache = value;
        self
    }
}

/// Parse a document in strict mode, without caching.
///
/// # Example
///
/// ```rust
/// use exml_tree::parse;
///
/// let root = parse(r#"<e:Skin xmlns:e="http://ns.egret.com/eui"><e:Image/></e:Skin>"#).unwrap();
/// assert_eq!(root.local_name, "Skin");
/// assert_eq!(root.namespace, "http://ns.egret.com/eui");
/// assert_eq!(root.tags().count(), 1);
/// ```
///
/// # Errors
///
/// Returns the first parse issue if the document is malformed.
pub fn parse(content: &str) -> Result<Tag> {
    parse_with_options(content, &ParseOptions::default())
}

/// Parse a document with explicit options, without caching.
///
/// With `throw_on_error == false` this never fails: issues are collected on
/// the returned root, and a document without any element yields an empty
/// placeholder root.
pub fn parse_with_options(content: &str, options: &ParseOptions) -> Result<Tag> {
    let mut builder = TreeBuilder::new(content, options);
    let root = builder.build();
    if options.throw_on_error {
        if let Some(first) = root.errors.first() {
            return Err(first.clone());
        }
    } else {
        for issue in &root.errors {
            tracing::debug!(error = %issue, "collected parse issue");
        }
    }
    Ok(root)
}

/// A parser that owns a bounded cache of previously parsed documents.
///
/// Cache hits return a fresh deep copy, so callers may mutate what they get
/// back without affecting the cache or each other.
#[derive(Debug, Clone)]
pub struct TagParser {
    cache: ParseCache,
}

impl Default for TagParser {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl TagParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: ParseCache::new(capacity),
        }
    }

    pub fn cache(&self) -> &ParseCache {
        &self.cache
    }

    /// Parse `content`, consulting the cache when `options.use_cache` is set.
    ///
    /// Only documents that parse without issues are cached.
    pub fn parse(&mut self, content: &str, options: &ParseOptions) -> Result<Tag> {
        if options.use_cache {
            if let Some(hit) = self.cache.get(content) {
                tracing::trace!(len = content.len(), "parse cache hit");
                return Ok(hit);
            }
            tracing::trace!(len = content.len(), "parse cache miss");
        }

        let root = parse_with_options(content, options)?;
        if options.use_cache && root.errors.is_empty() {
            self.cache.insert(content, &root);
        }
        Ok(root)
    }
}

/// A tag whose end has not been seen yet.
struct OpenTag {
    tag: Tag,

    /// Namespaces declared on this tag.
    declared: Vec<Namespace>,
}

/// Internal parser state.
struct TreeBuilder<'a> {
    source: &'a str,
    reader: Reader<&'a [u8]>,
    lines: LineIndex,
    options: &'a ParseOptions,
    stack: Vec<OpenTag>,
    root: Option<Tag>,
    errors: Vec<Error>,
}

impl<'a> TreeBuilder<'a> {
    fn new(source: &'a str, options: &'a ParseOptions) -> Self {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;

        Self {
            source,
            reader,
            lines: LineIndex::new(source),
            options,
            stack: Vec::new(),
            root: None,
            errors: Vec::new(),
        }
    }

    fn build(&mut self) -> Tag {
        let completed = self.read_events();

        // Close whatever is still open so every range stays inside its
        // parent's, reporting it only if the input ended cleanly.
        while let Some(open) = self.stack.pop() {
            if completed {
                let location = self.locate(open.tag.start);
                self.errors.push(Error::UnclosedTag {
                    name: open.tag.name.clone(),
                    location,
                });
            }
            let mut tag = open.tag;
            tag.end = self.source.len();
            tag.end_tag_start = self.source.len();
            self.attach(tag);
        }

        let mut root = match self.root.take() {
            Some(root) => root,
            None => {
                if self.errors.is_empty() {
                    self.errors.push(Error::EmptyDocument);
                }
                Tag::default()
            }
        };
        root.errors = std::mem::take(&mut self.errors);
        root
    }

    /// Returns `false` if reading stopped at an error.
    fn read_events(&mut self) -> bool {
        loop {
            // Capture position before reading the event
            let event_start = self.reader.buffer_position() as usize;

            let outcome = match self.reader.read_event() {
                Ok(Event::Start(e)) => self.handle_start(&e, event_start),
                Ok(Event::End(_)) => {
                    self.handle_end(event_start);
                    Ok(())
                }
                Ok(Event::Empty(e)) => self.handle_empty(&e, event_start),
                Ok(Event::Text(e)) => self.handle_text(&e, event_start),
                Ok(Event::CData(e)) => {
                    self.handle_cdata(&e, event_start);
                    Ok(())
                }
                Ok(Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_)) => {
                    // Comments, processing instructions and the XML
                    // declaration do not appear in the tree.
                    Ok(())
                }
                Ok(Event::Eof) => return true,
                Err(e) => {
                    let position = self.reader.error_position() as usize;
                    Err(Error::XmlSyntax {
                        message: e.to_string(),
                        location: self.locate(position),
                    })
                }
            };

            if let Err(err) = outcome {
                self.errors.push(err);
                return false;
            }
        }
    }

    fn handle_start(&mut self, e: &BytesStart<'_>, event_start: usize) -> Result<()> {
        let start_tag_end = self.reader.buffer_position() as usize;
        let open = self.open_tag(e, event_start, start_tag_end)?;
        self.stack.push(open);
        Ok(())
    }

    fn handle_end(&mut self, event_start: usize) {
        // quick-xml has already checked that the names match.
        let Some(open) = self.stack.pop() else {
            return;
        };
        let mut tag = open.tag;
        tag.end_tag_start = event_start;
        tag.end = self.reader.buffer_position() as usize;
        self.attach(tag);
    }

    fn handle_empty(&mut self, e: &BytesStart<'_>, event_start: usize) -> Result<()> {
        let end = self.reader.buffer_position() as usize;
        let open = self.open_tag(e, event_start, end)?;
        let mut tag = open.tag;
        tag.self_closing = true;
        tag.end = end;
        tag.end_tag_start = end;
        self.attach(tag);
        Ok(())
    }

    fn handle_text(&mut self, e: &BytesText<'_>, event_start: usize) -> Result<()> {
        let event_end = self.reader.buffer_position() as usize;
        let raw = &self.source[event_start..event_end];
        if raw.trim().is_empty() {
            return Ok(());
        }

        let text = e.unescape().map_err(|err| Error::XmlSyntax {
            message: format!("Invalid text content: {}", err),
            location: self.locate(event_start),
        })?;

        if self.stack.is_empty() {
            return Err(Error::TextOutsideRoot {
                location: self.locate(event_start),
            });
        }

        let leading = raw.len() - raw.trim_start().len();
        let span = Span::new(event_start + leading, event_start + raw.trim_end().len());
        self.attach_text(Node::Text(TextNode {
            content: text.trim().to_string(),
            span,
        }));
        Ok(())
    }

    fn handle_cdata(&mut self, e: &BytesCData<'_>, event_start: usize) {
        let content = String::from_utf8_lossy(e.as_ref()).trim().to_string();
        let span = Span::new(event_start, self.reader.buffer_position() as usize);
        self.attach_text(Node::CData(TextNode { content, span }));
    }

    /// Text only sticks to a tag that has neither children nor text yet.
    fn attach_text(&mut self, node: Node) {
        let Some(open) = self.stack.last_mut() else {
            return;
        };
        let tag = &mut open.tag;
        if !tag.children.is_empty() || tag.text.is_some() {
            return;
        }
        if let Node::Text(text) | Node::CData(text) = &node {
            if text.content.is_empty() {
                return;
            }
            tag.text = Some(text.content.clone());
        }
        tag.children.push(node);
    }

    fn open_tag(
        &mut self,
        e: &BytesStart<'_>,
        event_start: usize,
        start_tag_end: usize,
    ) -> Result<OpenTag> {
        if self.stack.is_empty() && self.root.is_some() {
            return Err(Error::MultipleRoots {
                location: self.locate(event_start),
            });
        }

        let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
        let attributes = self.parse_attributes(e, event_start, start_tag_end)?;
        let declared: Vec<Namespace> = attributes
            .iter()
            .filter_map(Attribute::namespace_declaration)
            .collect();

        let (prefix, local_name) = split_qualified(&name);
        let namespace = match prefix {
            Some(prefix) => self.resolve_prefix(prefix, &declared).unwrap_or_default(),
            None => String::new(),
        };

        let location = match self.stack.last() {
            Some(parent) => {
                let mut location = parent.tag.location.clone();
                location.push(parent.tag.children.len());
                location
            }
            None => Vec::new(),
        };

        let position = self.lines.locate(event_start);
        let tag = Tag {
            prefix: prefix.map(str::to_string),
            local_name: local_name.to_string(),
            namespace,
            start: event_start,
            end: start_tag_end,
            start_tag_end,
            end_tag_start: start_tag_end,
            self_closing: false,
            line: position.line,
            column: position.column,
            attributes: attributes
                .into_iter()
                .map(|attr| (attr.name.clone(), attr))
                .collect(),
            children: Vec::new(),
            text: None,
            location,
            errors: Vec::new(),
            name,
        };

        Ok(OpenTag { tag, declared })
    }

    /// Nearest binding for `prefix`: the tag's own declarations first, then
    /// the open ancestors from the innermost outwards.
    fn resolve_prefix(&self, prefix: &str, own: &[Namespace]) -> Option<String> {
        std::iter::once(own)
            .chain(self.stack.iter().rev().map(|open| open.declared.as_slice()))
            .find_map(|scope| scope.iter().find(|ns| ns.prefix == prefix))
            .map(|ns| ns.uri.clone())
    }

    fn parse_attributes(
        &self,
        e: &BytesStart<'_>,
        tag_start: usize,
        tag_end: usize,
    ) -> Result<Vec<Attribute>> {
        let tag_text = &self.source[tag_start..tag_end];
        let spans = tag_attributes(tag_text);
        let mut attributes = Vec::new();

        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|err| Error::XmlSyntax {
                message: format!("Attribute error: {}", err),
                location: self.locate(tag_start),
            })?;

            let name = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr.unescape_value().map_err(|err| Error::XmlSyntax {
                message: format!("Invalid attribute value: {}", err),
                location: self.locate(tag_start),
            })?;

            let (name_start, start, end) = spans
                .iter()
                .find(|span| span.name(tag_text) == name)
                .map_or((0, 0, 0), |span| {
                    (
                        tag_start + span.name.start,
                        tag_start + span.value.start,
                        tag_start + span.value.end,
                    )
                });

            attributes.push(Attribute {
                name,
                value: value.into_owned(),
                name_start,
                start,
                end,
            });
        }

        Ok(attributes)
    }

    fn attach(&mut self, tag: Tag) {
        match self.stack.last_mut() {
            Some(parent) => parent.tag.children.push(Node::Tag(tag)),
            None => {
                if self.root.is_none() {
                    self.root = Some(tag);
                }
            }
        }
    }

    fn locate(&self, offset: usize) -> Option<Location> {
        self.options
            .position_in_errors
            .then(|| self.lines.locate(offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SKIN: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<e:Skin class="ButtonSkin" states="up,down" xmlns:e="http://ns.egret.com/eui" xmlns:w="http://ns.egret.com/wing">
  <!-- background -->
  <e:Image id="bg" source="bg_png" source.down="bg_down_png"/>
  <e:Label id="labelDisplay" includeIn="up">Hello &amp; welcome</e:Label>
  <w:Declarations/>
</e:Skin>"#;

    #[test]
    fn test_parse_simple_element() {
        let root = parse("<root/>").unwrap();
        assert_eq!(root.name, "root");
        assert!(root.self_closing);
        assert!(root.children.is_empty());
        assert!(root.errors.is_empty());
    }

    #[test]
    fn test_parse_skin() {
        let root = parse(SKIN).unwrap();
        assert_eq!(root.name, "e:Skin");
        assert_eq!(root.prefix.as_deref(), Some("e"));
        assert_eq!(root.local_name, "Skin");
        assert_eq!(root.namespace, "http://ns.egret.com/eui");
        assert_eq!(root.get_attribute("states"), Some("up,down"));

        let children: Vec<&Tag> = root.tags().collect();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0].get_attribute("source.down"), Some("bg_down_png"));
        assert_eq!(children[1].text.as_deref(), Some("Hello & welcome"));
        assert_eq!(children[2].namespace, "http://ns.egret.com/wing");
        assert_eq!(children[2].location, vec![2]);
    }

    #[test]
    fn test_offsets_and_positions() {
        let content = "<a>\n  <b x=\"1\"/>\n</a>";
        let root = parse(content).unwrap();
        assert_eq!(root.start, 0);
        assert_eq!(root.end, content.len());
        assert_eq!(root.start_tag_end, 3);
        assert_eq!(root.end_tag_start, content.len() - 4);

        let b = root.tags().next().unwrap();
        assert_eq!(&content[b.start..b.end], "<b x=\"1\"/>");
        assert_eq!(b.start_tag_end, b.end);
        assert_eq!((b.line, b.column), (2, 3));

        let x = b.attribute("x").unwrap();
        assert_eq!(&content[x.start..x.end], "1");
        assert_eq!(&content[x.name_start..x.name_start + 1], "x");
    }

    #[test]
    fn test_prefix_resolution_is_lexical() {
        let content = r#"<a xmlns:p="urn:outer"><b xmlns:p="urn:inner"><p:c/></b><p:d/></a>"#;
        let root = parse(content).unwrap();
        let b = root.tags().next().unwrap();
        let c = b.tags().next().unwrap();
        let d = root.tags().nth(1).unwrap();
        assert_eq!(c.namespace, "urn:inner");
        assert_eq!(d.namespace, "urn:outer");
    }

    #[test]
    fn test_unbound_prefix_has_empty_namespace() {
        let root = parse("<x:a/>").unwrap();
        assert_eq!(root.prefix.as_deref(), Some("x"));
        assert_eq!(root.namespace, "");
    }

    #[test]
    fn test_first_text_wins() {
        let root = parse("<a>  first <b/> second </a>").unwrap();
        assert_eq!(root.text.as_deref(), Some("first"));
        assert_eq!(root.children.len(), 2);
        assert!(matches!(root.children[0], Node::Text(_)));
    }

    #[test]
    fn test_text_after_child_is_dropped() {
        let root = parse("<a><b/> tail </a>").unwrap();
        assert_eq!(root.text, None);
        assert_eq!(root.children.len(), 1);
    }

    #[test]
    fn test_cdata_text() {
        let content = "<a><![CDATA[ x < y ]]></a>";
        let root = parse(content).unwrap();
        assert_eq!(root.text.as_deref(), Some("x < y"));
        let Node::CData(cdata) = &root.children[0] else {
            panic!("expected CDATA child");
        };
        assert_eq!(&content[cdata.span.start..cdata.span.end], "<![CDATA[ x < y ]]>");
    }

    #[test]
    fn test_empty_document_error() {
        let result = parse("");
        assert!(matches!(result, Err(Error::EmptyDocument)));
    }

    #[test]
    fn test_lenient_collects_errors() {
        let root = parse_with_options("<a><b></a>", &ParseOptions::lenient()).unwrap();
        assert_eq!(root.name, "a");
        assert_eq!(root.errors.len(), 1);
        assert!(matches!(root.errors[0], Error::XmlSyntax { .. }));
        assert!(root.errors[0].location().is_some());
    }

    #[test]
    fn test_lenient_unclosed_tags_are_closed_at_eof() {
        let content = "<a><b>";
        let root = parse_with_options(content, &ParseOptions::lenient()).unwrap();
        assert_eq!(root.end, content.len());
        let b = root.tags().next().unwrap();
        assert_eq!(b.end, content.len());
        assert!(matches!(&root.errors[0], Error::UnclosedTag { name, .. } if name == "b"));
        assert!(matches!(&root.errors[1], Error::UnclosedTag { name, .. } if name == "a"));
    }

    #[test]
    fn test_strict_returns_first_error() {
        let result = parse("<a><b>");
        assert!(matches!(result, Err(Error::UnclosedTag { name, .. }) if name == "b"));
    }

    #[test]
    fn test_errors_without_position() {
        let options = ParseOptions::lenient().with_position_in_errors(false);
        let root = parse_with_options("<a/><b/>", &options).unwrap();
        assert_eq!(root.errors, vec![Error::MultipleRoots { location: None }]);
    }

    #[test]
    fn test_text_outside_root() {
        let result = parse("<a/>trailing");
        assert!(matches!(result, Err(Error::TextOutsideRoot { .. })));
    }

    #[test]
    fn test_lenient_empty_document_placeholder() {
        let root = parse_with_options("   ", &ParseOptions::lenient()).unwrap();
        assert_eq!(root.name, "");
        assert_eq!(root.errors, vec![Error::EmptyDocument]);
    }

    #[test]
    fn test_parser_cache_returns_independent_copies() {
        let mut parser = TagParser::with_capacity(2);
        let options = ParseOptions::default();

        let mut first = parser.parse(SKIN, &options).unwrap();
        let second = parser.parse(SKIN, &options).unwrap();
        assert_eq!(first, second);
        assert_eq!(parser.cache().len(), 1);

        first.set_attribute("states", "changed");
        let third = parser.parse(SKIN, &options).unwrap();
        assert_eq!(third.get_attribute("states"), Some("up,down"));
    }

    #[test]
    fn test_parser_does_not_cache_failures() {
        let mut parser = TagParser::new();
        let options = ParseOptions::lenient();
        let root = parser.parse("<a>", &options).unwrap();
        assert!(!root.errors.is_empty());
        assert!(parser.cache().is_empty());
    }

    #[test]
    fn test_parser_without_cache() {
        let mut parser = TagParser::new();
        let options = ParseOptions::default().with_cache(false);
        parser.parse("<a/>", &options).unwrap();
        assert!(parser.cache().is_empty());
    }
}
