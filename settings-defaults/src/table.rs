//! Frozen table of default option values.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde_json::Value;
use settings_primitives::{OptionMap, SettingValue, option_map_from_json, validate_option_name};
use thiserror::Error;
use tracing::{error, warn};

/// Result alias for defaults operations.
pub type DefaultsResult<T> = Result<T, DefaultsError>;

/// Errors emitted by the defaults table.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DefaultsError {
    /// No default value exists for the requested option.
    #[error("default value for option \"{option}\" missing, no default value defined")]
    UnknownOption {
        /// Name of the requested option.
        option: String,
    },

    /// The table itself is malformed.
    #[error("invalid defaults table: {reason}")]
    InvalidTable {
        /// Human-readable reason describing the problem.
        reason: String,
    },

    /// A supplied option name or value was rejected.
    #[error(transparent)]
    Primitive(#[from] settings_primitives::Error),
}

#[derive(Debug, Clone)]
struct DefaultEntry {
    template: SettingValue,
    frozen: bool,
}

/// Builder for [`DefaultsTable`].
#[derive(Debug, Default)]
pub struct DefaultsTableBuilder {
    entries: Vec<(String, DefaultEntry)>,
}

impl DefaultsTableBuilder {
    /// Registers a frozen default.
    #[must_use]
    pub fn option(mut self, name: impl Into<String>, value: impl Into<SettingValue>) -> Self {
        self.entries.push((
            name.into(),
            DefaultEntry {
                template: value.into(),
                frozen: true,
            },
        ));
        self
    }

    /// Registers a default whose template was authored without being frozen.
    ///
    /// Reads still hand out copies, but composite templates registered this
    /// way are reported by [`DefaultsTable::validate`] and warned about on
    /// every read.
    #[must_use]
    pub fn mutable_option(
        mut self,
        name: impl Into<String>,
        value: impl Into<SettingValue>,
    ) -> Self {
        self.entries.push((
            name.into(),
            DefaultEntry {
                template: value.into(),
                frozen: false,
            },
        ));
        self
    }

    /// Finalises the table.
    ///
    /// # Errors
    ///
    /// Returns [`DefaultsError::Primitive`] for blank option names and
    /// [`DefaultsError::InvalidTable`] when a name is registered twice.
    pub fn build(self) -> DefaultsResult<DefaultsTable> {
        let mut entries = BTreeMap::new();
        for (name, entry) in self.entries {
            validate_option_name(&name)?;
            match entries.entry(name) {
                Entry::Occupied(occupied) => {
                    return Err(DefaultsError::InvalidTable {
                        reason: format!("option \"{}\" defined twice", occupied.key()),
                    });
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(entry);
                }
            }
        }
        Ok(DefaultsTable { entries })
    }
}

/// Immutable mapping from option name to default value.
#[derive(Debug, Clone, Default)]
pub struct DefaultsTable {
    entries: BTreeMap<String, DefaultEntry>,
}

impl DefaultsTable {
    /// Starts building a table.
    #[must_use]
    pub fn builder() -> DefaultsTableBuilder {
        DefaultsTableBuilder::default()
    }

    /// Loads a table from a JSON object. Every entry is frozen.
    ///
    /// # Errors
    ///
    /// Returns [`DefaultsError::Primitive`] when `document` is not an object
    /// or contains a blank option name.
    pub fn from_json(document: Value) -> DefaultsResult<Self> {
        option_map_from_json(document)?
            .into_iter()
            .fold(Self::builder(), |builder, (name, value)| builder.option(name, value))
            .build()
    }

    /// Returns a copy of the default value for `option`.
    ///
    /// # Errors
    ///
    /// Returns [`DefaultsError::UnknownOption`] if the table has no entry
    /// for `option`.
    pub fn default_value(&self, option: &str) -> DefaultsResult<SettingValue> {
        let Some(entry) = self.entries.get(option) else {
            error!(option, "default value missing, no default value defined");
            return Err(DefaultsError::UnknownOption {
                option: option.to_owned(),
            });
        };
        Ok(copy_template(option, entry))
    }

    /// Returns a copy of the whole table.
    #[must_use]
    pub fn all(&self) -> OptionMap {
        self.entries
            .iter()
            .map(|(name, entry)| (name.clone(), copy_template(name, entry)))
            .collect()
    }

    /// Returns `true` when a default exists for `option`.
    #[must_use]
    pub fn contains(&self, option: &str) -> bool {
        self.entries.contains_key(option)
    }

    /// Iterates over the option names in the table.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of options with defaults.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no defaults are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks the authoring rules for a shipped table: it must define at
    /// least one option and every composite template must be frozen.
    ///
    /// # Errors
    ///
    /// Returns [`DefaultsError::InvalidTable`] describing the first rule
    /// that is violated.
    pub fn validate(&self) -> DefaultsResult<()> {
        if self.entries.is_empty() {
            return Err(DefaultsError::InvalidTable {
                reason: "no default options defined".into(),
            });
        }

        let unfrozen: Vec<&str> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.template.is_composite() && !entry.frozen)
            .map(|(name, _)| name.as_str())
            .collect();
        if !unfrozen.is_empty() {
            return Err(DefaultsError::InvalidTable {
                reason: format!("default values not frozen: {}", unfrozen.join(", ")),
            });
        }

        Ok(())
    }
}

fn copy_template(name: &str, entry: &DefaultEntry) -> SettingValue {
    if entry.template.is_composite() && !entry.frozen {
        warn!(
            option = name,
            kind = entry.template.kind(),
            "default value is not frozen; all default options should be frozen"
        );
    }
    entry.template.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> DefaultsTable {
        DefaultsTable::builder()
            .option("color", "blue")
            .option("volume", json!({"level": 5}))
            .option("sites", json!(["example.org"]))
            .build()
            .unwrap()
    }

    #[test]
    fn returns_defaults_by_name() {
        let table = table();
        assert_eq!(table.default_value("color").unwrap().as_str(), Some("blue"));
        assert_eq!(table.default_value("volume").unwrap().to_json(), json!({"level": 5}));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn unknown_option_names_the_option() {
        let err = table().default_value("colour").unwrap_err();
        assert_eq!(
            err,
            DefaultsError::UnknownOption {
                option: "colour".into()
            }
        );
        assert!(err.to_string().contains("\"colour\""));
    }

    #[test]
    fn mutating_a_copy_leaves_template_untouched() {
        let table = table();
        let mut volume = table.default_value("volume").unwrap();
        if let SettingValue::Mapping(map) = &mut volume {
            map.insert("level".into(), json!(11));
        }
        assert_eq!(table.default_value("volume").unwrap().to_json(), json!({"level": 5}));

        let mut all = table.all();
        all.insert("color".into(), SettingValue::from("red"));
        assert_eq!(table.all()["color"].as_str(), Some("blue"));
    }

    #[test]
    fn rejects_duplicates_and_blank_names() {
        let err = DefaultsTable::builder()
            .option("a", 1_i64)
            .option("a", 2_i64)
            .build()
            .unwrap_err();
        assert!(matches!(err, DefaultsError::InvalidTable { .. }));

        let err = DefaultsTable::builder().option("", 1_i64).build().unwrap_err();
        assert!(matches!(err, DefaultsError::Primitive(_)));
    }

    #[test]
    fn validate_reports_unfrozen_composites() {
        assert!(table().validate().is_ok());
        assert!(DefaultsTable::default().validate().is_err());

        let table = DefaultsTable::builder()
            .mutable_option("flag", true)
            .mutable_option("volume", json!({"level": 5}))
            .build()
            .unwrap();
        let err = table.validate().unwrap_err();
        assert_eq!(
            err,
            DefaultsError::InvalidTable {
                reason: "default values not frozen: volume".into()
            }
        );
        // Unfrozen templates still read normally.
        assert_eq!(table.default_value("volume").unwrap().to_json(), json!({"level": 5}));
    }

    #[test]
    fn loads_from_json_object() {
        let document = json!({"color": "blue", "volume": {"level": 5}});
        let table = DefaultsTable::from_json(document).unwrap();
        assert!(table.contains("volume"));
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["color", "volume"]);
        assert!(DefaultsTable::from_json(json!("nope")).is_err());
    }
}
