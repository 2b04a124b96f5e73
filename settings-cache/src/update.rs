//! Write requests accepted by [`SettingsCache::set`](crate::SettingsCache::set).

use settings_primitives::{OptionMap, SettingValue, validate_option_name};

use crate::error::{SettingsError, SettingsResult};

/// One or more option values to persist.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsUpdate {
    /// A single option. The value is required; `None` is rejected.
    Single {
        /// Option name.
        option: String,
        /// New value.
        value: Option<SettingValue>,
    },
    /// Several options at once.
    Many(OptionMap),
}

impl SettingsUpdate {
    /// Normalises the request into the option map to write.
    pub(crate) fn into_options(self) -> SettingsResult<OptionMap> {
        match self {
            Self::Single { option, value } => {
                validate_option_name(&option)?;
                let Some(value) = value else {
                    return Err(SettingsError::invalid_argument(format!(
                        "no value passed for option \"{option}\""
                    )));
                };
                Ok(OptionMap::from([(option, value)]))
            }
            Self::Many(options) => {
                for name in options.keys() {
                    validate_option_name(name)?;
                }
                Ok(options)
            }
        }
    }
}

impl From<(&str, SettingValue)> for SettingsUpdate {
    fn from((option, value): (&str, SettingValue)) -> Self {
        Self::Single {
            option: option.to_owned(),
            value: Some(value),
        }
    }
}

impl From<(String, SettingValue)> for SettingsUpdate {
    fn from((option, value): (String, SettingValue)) -> Self {
        Self::Single {
            option,
            value: Some(value),
        }
    }
}

impl From<(&str, Option<SettingValue>)> for SettingsUpdate {
    fn from((option, value): (&str, Option<SettingValue>)) -> Self {
        Self::Single {
            option: option.to_owned(),
            value,
        }
    }
}

impl From<OptionMap> for SettingsUpdate {
    fn from(value: OptionMap) -> Self {
        Self::Many(value)
    }
}
