//! Option selectors used when querying a storage scope.

use std::fmt::{self, Display, Formatter};

use crate::error::{Error, Result};

/// Which options a storage fetch should return.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Every stored option.
    #[default]
    All,
    /// A single named option.
    One(String),
    /// A set of named options.
    Many(Vec<String>),
}

impl Selector {
    /// Returns `true` if an option with `name` falls within this selector.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::One(option) => option == name,
            Self::Many(options) => options.iter().any(|option| option == name),
        }
    }

    /// Returns `true` when the selector covers every option.
    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl From<&str> for Selector {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Self::All
        } else {
            Self::One(value.to_owned())
        }
    }
}

impl From<Option<&str>> for Selector {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Self::All, Self::from)
    }
}

impl From<Vec<String>> for Selector {
    fn from(value: Vec<String>) -> Self {
        Self::Many(value)
    }
}

impl Display for Selector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("*"),
            Self::One(option) => f.write_str(option),
            Self::Many(options) => f.write_str(&options.join(",")),
        }
    }
}

/// Validates a caller-supplied option name.
///
/// # Errors
///
/// Returns [`Error::InvalidOptionName`] if the name is empty or blank.
pub fn validate_option_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidOptionName {
            name: name.into(),
            reason: "option name cannot be empty".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_selects_everything() {
        assert_eq!(Selector::from(""), Selector::All);
        assert_eq!(Selector::from(None), Selector::All);
        assert_eq!(Selector::from(Some("color")), Selector::One("color".into()));
    }

    #[test]
    fn matches_by_variant() {
        let many = Selector::from(vec!["a".to_owned(), "b".to_owned()]);
        assert!(many.matches("b"));
        assert!(!many.matches("c"));
        assert!(Selector::All.matches("anything"));
        assert!(!Selector::from("a").matches("b"));
    }

    #[test]
    fn rejects_blank_names() {
        assert!(validate_option_name("  ").is_err());
        assert!(validate_option_name("color").is_ok());
    }
}
