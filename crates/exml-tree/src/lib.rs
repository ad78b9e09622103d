//! Position-annotated tag trees for EXML documents.
//!
//! This crate parses EXML (an XML dialect describing UI skins) into a tree of
//! [`Tag`]s where every element and attribute keeps its byte offsets in the
//! source text. It wraps [`quick-xml`] and adds namespace resolution, a
//! bounded parse cache, serialization back to text, and lookup by offset.
//!
//! # Example
//!
//! ```rust
//! use exml_tree::{NodeRef, node_at_position, parse};
//!
//! let content = r#"<e:Skin xmlns:e="http://ns.egret.com/eui" states="up,down">
//!   <e:Image id="bg" includeIn="up"/>
//! </e:Skin>"#;
//! let root = parse(content).unwrap();
//!
//! let image = root.tags().next().unwrap();
//! assert_eq!(image.local_name, "Image");
//! assert_eq!(image.get_attribute("includeIn"), Some("up"));
//! assert_eq!(image.parent(&root).map(|p| p.local_name.as_str()), Some("Skin"));
//!
//! let offset = content.find("bg").unwrap();
//! assert!(matches!(node_at_position(&root, offset), Some(NodeRef::Attribute(a)) if a.name == "id"));
//! ```
//!
//! # Caching
//!
//! [`TagParser`] keeps the most recently parsed documents keyed by their exact
//! text and hands out deep copies:
//!
//! ```rust
//! use exml_tree::{ParseOptions, TagParser};
//!
//! let mut parser = TagParser::new();
//! let first = parser.parse("<a><b/></a>", &ParseOptions::default()).unwrap();
//! let second = parser.parse("<a><b/></a>", &ParseOptions::default()).unwrap();
//! assert_eq!(first, second);
//! ```

pub mod attrs;
pub mod cache;
pub mod error;
pub mod mutate;
pub mod parser;
pub mod position;
pub mod query;
pub mod stringify;
pub mod types;

pub use attrs::{AttributeSpan, tag_attributes};
pub use cache::{DEFAULT_CAPACITY, ParseCache};
pub use error::{Error, Result};
pub use mutate::append_child;
pub use parser::{ParseOptions, TagParser, parse, parse_with_options};
pub use position::{Location, Span};
pub use query::{current_state, declared_states, node_at_position};
pub use stringify::{stringify, stringify_fragment};
pub use types::{Attribute, Namespace, Node, NodeRef, Tag, TextNode};
