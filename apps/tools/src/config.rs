use std::{fs, path::Path};

use anyhow::Context;
use formset_core::{ControlClasses, FieldSpec, FormsetConfig, InputKind};
use serde::Deserialize;
use shared::domain::Prefix;
use tracing::warn;

const DEFAULT_SETTINGS_FILE: &str = "formset.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub prefix: String,
    pub min_num: Option<usize>,
    pub max_num: Option<usize>,
    pub can_delete: bool,
    pub placeholder: String,
    pub classes: ControlClasses,
    pub fields: Vec<FieldSpec>,
    /// Rows the simulated server renders before the controller starts.
    pub initial_rows: usize,
    /// How many of those rows stand for existing server objects.
    pub initial_forms: usize,
    pub tabular: bool,
    pub add_button_text: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        let config = FormsetConfig::new("form");
        Self {
            prefix: config.prefix.to_string(),
            min_num: config.min_num,
            max_num: config.max_num,
            can_delete: config.can_delete,
            placeholder: config.placeholder,
            classes: config.classes,
            fields: vec![FieldSpec::new("name", "Name").with_input(InputKind::Text)],
            initial_rows: 1,
            initial_forms: 0,
            tabular: false,
            add_button_text: None,
        }
    }
}

impl Settings {
    pub fn formset_config(&self) -> FormsetConfig {
        FormsetConfig {
            prefix: Prefix::new(self.prefix.clone()),
            min_num: self.min_num,
            max_num: self.max_num,
            can_delete: self.can_delete,
            placeholder: self.placeholder.clone(),
            classes: self.classes.clone(),
        }
    }
}

/// Defaults, overlaid by the TOML file, overlaid by `FORMSET__*` variables.
///
/// An explicitly requested file must exist; the default `formset.toml` is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = match path {
        Some(path) => read_settings(path)?,
        None if Path::new(DEFAULT_SETTINGS_FILE).exists() => {
            read_settings(Path::new(DEFAULT_SETTINGS_FILE))?
        }
        None => Settings::default(),
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn read_settings(path: &Path) -> anyhow::Result<Settings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read formset settings '{}'", path.display()))?;
    parse_settings(&raw)
        .with_context(|| format!("failed to parse formset settings '{}'", path.display()))
}

pub fn parse_settings(raw: &str) -> anyhow::Result<Settings> {
    Ok(toml::from_str(raw)?)
}

pub fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("FORMSET__PREFIX") {
        settings.prefix = v;
    }
    if let Some(v) = lookup("FORMSET__MIN_NUM") {
        match v.parse::<usize>() {
            Ok(parsed) => settings.min_num = Some(parsed),
            Err(_) => warn!(value = %v, "ignoring non-numeric FORMSET__MIN_NUM"),
        }
    }
    if let Some(v) = lookup("FORMSET__MAX_NUM") {
        match v.parse::<usize>() {
            Ok(parsed) => settings.max_num = Some(parsed),
            Err(_) => warn!(value = %v, "ignoring non-numeric FORMSET__MAX_NUM"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn parses_settings_file_with_fields() {
        let settings = parse_settings(
            r#"
            prefix = "addresses"
            min_num = 1
            max_num = 3
            initial_rows = 2
            add_button_text = "Add address"

            [[fields]]
            key = "street"
            label = "Street"

            [[fields]]
            key = "zip"
            input = "number"
            "#,
        )
        .expect("settings");

        assert_eq!(settings.prefix, "addresses");
        assert_eq!(settings.initial_rows, 2);
        assert_eq!(settings.fields.len(), 2);
        assert_eq!(settings.fields[1].input, InputKind::Number);
        assert_eq!(settings.fields[1].label, None);

        let config = settings.formset_config();
        assert_eq!(config.floor(), 1);
        assert_eq!(config.max_num, Some(3));
        assert_eq!(config.placeholder, "__prefix__");
    }

    #[test]
    fn empty_file_yields_defaults() {
        let settings = parse_settings("").expect("settings");
        assert_eq!(settings.prefix, "form");
        assert_eq!(settings.initial_rows, 1);
        assert_eq!(settings.fields.len(), 1);
    }

    #[test]
    fn env_overrides_win_and_bad_numbers_are_ignored() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("FORMSET__PREFIX", "lines"),
            ("FORMSET__MIN_NUM", "two"),
            ("FORMSET__MAX_NUM", "4"),
        ]);
        let mut settings = Settings::default();
        apply_env_overrides(&mut settings, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.prefix, "lines");
        assert_eq!(settings.min_num, None);
        assert_eq!(settings.max_num, Some(4));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = load_settings(Some(Path::new("/nonexistent/formset.toml")))
            .expect_err("missing file");
        assert!(err.to_string().contains("failed to read formset settings"));
    }
}
