//! Framework vocabulary and indentation settings for the state editor.
//!
//! EXML gives special meaning to a handful of element names: the `Skin`
//! root, the `Declarations` block of non-visual objects, the `<states>`
//! list of `<State name="…"/>` declarations, and the `Array` and
//! `elementsContent` containers whose children are laid out as if they were
//! children of the enclosing component. Every name here is matched against
//! an element's local name, so the namespace prefix in use does not matter.

/// Element and prefix names the state editor keys on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    /// Root element name. Always visible and never single-state.
    pub skin: String,

    /// Prefix of editor-only ("working") elements. They are always visible
    /// and never scoped by blank-state creation.
    pub working_prefix: String,

    /// Non-visual object block, copied verbatim by state edits.
    pub declarations: String,

    /// A single state declaration, `<State name="…"/>`.
    pub state: String,

    /// Container of [`Dialect::state`] declarations.
    pub states: String,

    /// Container whose children belong to the enclosing component.
    pub array: String,

    /// Default-property container, treated like [`Dialect::array`].
    pub elements_content: String,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            skin: "Skin".to_string(),
            working_prefix: "w".to_string(),
            declarations: "Declarations".to_string(),
            state: "State".to_string(),
            states: "states".to_string(),
            array: "Array".to_string(),
            elements_content: "elementsContent".to_string(),
        }
    }
}

impl Dialect {
    pub fn with_skin(mut self, name: impl Into<String>) -> Self {
        self.skin = name.into();
        self
    }

    pub fn with_working_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.working_prefix = prefix.into();
        self
    }

    pub fn with_declarations(mut self, name: impl Into<String>) -> Self {
        self.declarations = name.into();
        self
    }

    pub(crate) fn is_container(&self, local_name: &str) -> bool {
        local_name == self.array || local_name == self.elements_content
    }
}

/// How indentation is written and measured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentStyle {
    /// One level of indentation as written by `format_indent`.
    pub unit: String,

    /// Spaces that count as one level when measuring existing indentation.
    /// A partial level rounds up.
    pub spaces_per_level: usize,
}

impl Default for IndentStyle {
    fn default() -> Self {
        Self {
            unit: "\t".to_string(),
            spaces_per_level: 2,
        }
    }
}

impl IndentStyle {
    pub fn new(unit: impl Into<String>, spaces_per_level: usize) -> Self {
        Self {
            unit: unit.into(),
            spaces_per_level: spaces_per_level.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dialect() {
        let dialect = Dialect::default();
        assert_eq!(dialect.skin, "Skin");
        assert_eq!(dialect.working_prefix, "w");
        assert!(dialect.is_container("Array"));
        assert!(dialect.is_container("elementsContent"));
        assert!(!dialect.is_container("Group"));
    }

    #[test]
    fn test_dialect_builders() {
        let dialect = Dialect::default()
            .with_skin("Panel")
            .with_working_prefix("d")
            .with_declarations("Defs");
        assert_eq!(dialect.skin, "Panel");
        assert_eq!(dialect.working_prefix, "d");
        assert_eq!(dialect.declarations, "Defs");
    }

    #[test]
    fn test_indent_style_never_zero_width() {
        assert_eq!(IndentStyle::new("  ", 0).spaces_per_level, 1);
        assert_eq!(IndentStyle::default().unit, "\t");
    }
}
