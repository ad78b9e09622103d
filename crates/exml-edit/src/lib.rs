//! Text-level editing of EXML view states.
//!
//! EXML skins declare named view states and mark each element as present in
//! some of them, through `includeIn`, `excludeFrom` or a dotted name suffix.
//! The functions here create, remove and rename states, map between tree
//! paths and text ranges, and maintain namespace declarations, all by
//! splicing the original text. Comments, quoting and formatting outside the
//! edited attributes survive untouched.
//!
//! Transforms never fail outright. Malformed markup stops the scan and the
//! rest of the document is passed through as is, which the returned
//! [`EditResult`] reports.
//!
//! # Example
//!
//! ```rust
//! use exml_edit::{create_new_state, find_range_by_path};
//!
//! let text = r#"<e:Skin xmlns:e="http://ns.egret.com/eui" states="up">
//!     <e:Image source="bg" excludeFrom="up"/>
//! </e:Skin>"#;
//! let result = create_new_state(text, &["up"], "down", None);
//! assert!(result.fully_succeeded);
//! assert!(result.text.contains(r#"states="up,down""#));
//! assert!(result.text.contains(r#"excludeFrom="up,down""#));
//!
//! let image = find_range_by_path(&result.text, &[0, 0], Some("down"), &["up", "down"]);
//! assert_eq!(image.head, None);
//! ```
//!
//! Framework names such as the skin root or the working-element prefix come
//! from a [`Dialect`]; build a [`StateEditor`] to use a different one.

pub mod config;
pub mod edit;
pub mod editor;
pub mod indent;
pub mod namespace;
pub mod path;
pub mod scanner;
pub mod states;
pub mod value_index;
pub mod visibility;

pub use config::{Dialect, IndentStyle};
pub use edit::EditResult;
pub use editor::{
    StateEditor, add_namespace, change_state_name, clean_namespace, create_new_state,
    find_item_by_path, find_path_at_pos, find_range_by_path, format_indent, indent_at,
    indent_string_at, is_single_state, is_visible, remove_state, set_start_state,
};
pub use namespace::{Insertion, NamespaceEdit, get_namespaces, remove_head};
pub use path::NodeRange;
pub use scanner::{Scanner, Token, TokenKind};
pub use value_index::{ValueIndex, get_value_index};
