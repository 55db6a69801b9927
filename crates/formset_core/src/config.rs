//! Construction-time settings of a formset controller.

use serde::{Deserialize, Serialize};
use shared::{domain::Prefix, error::ConfigError};

pub const DEFAULT_PLACEHOLDER: &str = "__prefix__";

/// Class names that mark control roles inside the container markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlClasses {
    pub add: String,
    pub remove: String,
    pub serial: String,
    pub row: String,
}

impl Default for ControlClasses {
    fn default() -> Self {
        Self {
            add: "formset-add".into(),
            remove: "formset-remove".into(),
            serial: "formset-serial".into(),
            row: "formset-row".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormsetConfig {
    pub prefix: Prefix,
    /// Rows whose index is below this can never be removed.
    #[serde(default)]
    pub min_num: Option<usize>,
    /// Hard ceiling on the row count. `None` means unbounded.
    #[serde(default)]
    pub max_num: Option<usize>,
    /// Kept for compatibility with existing configurations. Remove controls
    /// are shown for every row at or above `min_num` regardless of this flag.
    #[serde(default = "default_can_delete")]
    pub can_delete: bool,
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    #[serde(default)]
    pub classes: ControlClasses,
}

fn default_can_delete() -> bool {
    true
}

fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}

impl FormsetConfig {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Prefix::new(prefix),
            min_num: None,
            max_num: None,
            can_delete: true,
            placeholder: default_placeholder(),
            classes: ControlClasses::default(),
        }
    }

    pub fn with_min_num(mut self, min_num: usize) -> Self {
        self.min_num = Some(min_num);
        self
    }

    pub fn with_max_num(mut self, max_num: usize) -> Self {
        self.max_num = Some(max_num);
        self
    }

    pub fn with_can_delete(mut self, can_delete: bool) -> Self {
        self.can_delete = can_delete;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_classes(mut self, classes: ControlClasses) -> Self {
        self.classes = classes;
        self
    }

    /// Floor below which rows are protected; an unset `min_num` counts as zero.
    pub fn floor(&self) -> usize {
        self.min_num.unwrap_or(0)
    }

    pub fn is_at_ceiling(&self, rows: usize) -> bool {
        self.max_num.is_some_and(|max_num| rows >= max_num)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix.as_str().is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        if self.placeholder.is_empty() {
            return Err(ConfigError::EmptyPlaceholder);
        }
        if self.prefix.as_str().contains(&self.placeholder) {
            return Err(ConfigError::PrefixContainsPlaceholder {
                prefix: self.prefix.clone(),
                placeholder: self.placeholder.clone(),
            });
        }
        if let (Some(min_num), Some(max_num)) = (self.min_num, self.max_num) {
            if min_num > max_num {
                return Err(ConfigError::MinAboveMax { min_num, max_num });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_django_conventions() {
        let config = FormsetConfig::new("form");
        assert_eq!(config.placeholder, "__prefix__");
        assert!(config.can_delete);
        assert_eq!(config.floor(), 0);
        assert!(!config.is_at_ceiling(10_000));
    }

    #[test]
    fn rejects_min_above_max() {
        let config = FormsetConfig::new("form").with_min_num(3).with_max_num(2);
        assert_eq!(
            config.validate(),
            Err(ConfigError::MinAboveMax {
                min_num: 3,
                max_num: 2
            })
        );
    }

    #[test]
    fn rejects_empty_prefix_and_placeholder() {
        assert_eq!(
            FormsetConfig::new("").validate(),
            Err(ConfigError::EmptyPrefix)
        );
        assert_eq!(
            FormsetConfig::new("form").with_placeholder("").validate(),
            Err(ConfigError::EmptyPlaceholder)
        );
    }

    #[test]
    fn deserializes_from_toml_with_defaults() {
        let config: FormsetConfig = toml::from_str(
            r#"
            prefix = "addresses"
            max_num = 3

            [classes]
            remove = "delete-row"
            "#,
        )
        .expect("parse config");
        assert_eq!(config.prefix.as_str(), "addresses");
        assert_eq!(config.max_num, Some(3));
        assert_eq!(config.min_num, None);
        assert_eq!(config.classes.remove, "delete-row");
        assert_eq!(config.classes.add, "formset-add");
        assert!(config.is_at_ceiling(3));
    }
}
