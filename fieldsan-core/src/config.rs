//! Configuration management for `fieldsan-core`.
//!
//! This module defines the sanitizer configuration: the name of the tag key
//! holding field directives and the date re-formatting policy. A configuration
//! can be built from typed [`SanitizerOption`]s or loaded from a YAML or JSON
//! file; either way it is validated once and then never changes.
//!
//! License: MIT OR Apache-2.0

use std::path::Path;

use chrono::format::{Item, StrftimeItems};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SanitizeError};
use crate::transforms;

/// Tag key looked up on every field unless configured otherwise.
pub const DEFAULT_TAG_NAME: &str = "san";

/// Allowed length range of a tag name, in characters.
pub const TAG_NAME_LENGTH: std::ops::RangeInclusive<usize> = 1..=10;

/// Policy for the `date` text directive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DateFormat {
    /// Accepted input formats (strftime syntax), tried in order.
    pub input: Vec<String>,
    /// If true, a parsed date is re-printed in the input format it matched.
    pub keep_format: bool,
    /// Output format used when `keep_format` is false.
    pub output: String,
}

/// Resolved configuration of a `Sanitizer`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SanitizerConfig {
    pub tag_name: String,
    pub date_format: Option<DateFormat>,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            tag_name: DEFAULT_TAG_NAME.to_string(),
            date_format: None,
        }
    }
}

/// A single construction option, applied in order by `Sanitizer::with_options`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanitizerOption {
    TagName(String),
    DateFormat(DateFormat),
}

fn check_strftime(format: &str, what: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(SanitizeError::InvalidConfig(format!(
            "{} date format {:?} is not a valid strftime pattern",
            what, format
        )));
    }
    Ok(())
}

impl SanitizerConfig {
    /// Builds a configuration from options. Later options override earlier ones.
    pub fn from_options<I>(options: I) -> Result<Self>
    where
        I: IntoIterator<Item = SanitizerOption>,
    {
        let mut config = Self::default();
        for option in options {
            match option {
                SanitizerOption::TagName(name) => config.tag_name = name,
                SanitizerOption::DateFormat(format) => config.date_format = Some(format),
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a `.json` file, or from YAML for any other extension.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading sanitizer configuration from: {}", path.display());
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: SanitizerConfig = serde_yml::from_str(text)
            .map_err(|e| SanitizeError::InvalidConfig(format!("failed to parse YAML configuration: {}", e)))?;
        config.validate()?;
        debug!("Loaded sanitizer configuration with tag name '{}'.", config.tag_name);
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: SanitizerConfig = serde_json::from_str(text)
            .map_err(|e| SanitizeError::InvalidConfig(format!("failed to parse JSON configuration: {}", e)))?;
        config.validate()?;
        debug!("Loaded sanitizer configuration with tag name '{}'.", config.tag_name);
        Ok(config)
    }

    /// Checks the tag name length and every date format. An output format must
    /// read back what it prints, and may only use an offset if every input
    /// format provides one.
    pub fn validate(&self) -> Result<()> {
        if !TAG_NAME_LENGTH.contains(&self.tag_name.chars().count()) {
            return Err(SanitizeError::InvalidTagName(self.tag_name.clone()));
        }
        if let Some(date) = &self.date_format {
            for input in &date.input {
                check_strftime(input, "input")?;
            }
            if !date.keep_format {
                if date.output.is_empty() {
                    return Err(SanitizeError::InvalidConfig(
                        "date output format is required unless keep_format is set".to_string(),
                    ));
                }
                check_strftime(&date.output, "output")?;
                if !transforms::round_trips(&date.output) {
                    return Err(SanitizeError::InvalidConfig(format!(
                        "output date format {:?} does not describe a full date and can not be read back",
                        date.output
                    )));
                }
                if transforms::needs_offset(&date.output) {
                    if let Some(input) = date.input.iter().find(|input| !transforms::needs_offset(input)) {
                        return Err(SanitizeError::InvalidConfig(format!(
                            "output date format {:?} needs a UTC offset that input format {:?} does not provide",
                            date.output, input
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tag_name() {
        let config = SanitizerConfig::from_options([]).unwrap();
        assert_eq!(config.tag_name, "san");
        assert!(config.date_format.is_none());
    }

    #[test]
    fn test_tag_name_length_limits() {
        assert!(SanitizerConfig::from_options([SanitizerOption::TagName("a".into())]).is_ok());
        assert!(SanitizerConfig::from_options([SanitizerOption::TagName("abcdefghij".into())]).is_ok());
        let err = SanitizerConfig::from_options([SanitizerOption::TagName("abcdefghijk".into())]).unwrap_err();
        assert!(matches!(err, SanitizeError::InvalidTagName(_)));
        let err = SanitizerConfig::from_options([SanitizerOption::TagName(String::new())]).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_later_options_override() {
        let config = SanitizerConfig::from_options([
            SanitizerOption::TagName("first".into()),
            SanitizerOption::TagName("second".into()),
        ])
        .unwrap();
        assert_eq!(config.tag_name, "second");
    }

    #[test]
    fn test_invalid_date_formats_rejected() {
        let bad_input = DateFormat {
            input: vec!["%Y-%Q".into()],
            keep_format: true,
            output: String::new(),
        };
        assert!(SanitizerConfig::from_options([SanitizerOption::DateFormat(bad_input)]).is_err());

        let missing_output = DateFormat {
            input: vec!["%Y-%m-%d".into()],
            keep_format: false,
            output: String::new(),
        };
        assert!(SanitizerConfig::from_options([SanitizerOption::DateFormat(missing_output)]).is_err());
    }

    #[test]
    fn test_output_date_format_constraints() {
        let policy = |input: &str, output: &str| DateFormat {
            input: vec![input.to_string()],
            keep_format: false,
            output: output.to_string(),
        };
        let partial = SanitizerConfig::from_options([SanitizerOption::DateFormat(policy("%Y-%m-%d", "%B %Y"))]);
        assert!(matches!(partial, Err(SanitizeError::InvalidConfig(_))));

        let offset = SanitizerConfig::from_options([SanitizerOption::DateFormat(policy("%Y-%m-%d", "%Y-%m-%d %z"))]);
        assert!(matches!(offset, Err(SanitizeError::InvalidConfig(ref msg)) if msg.contains("offset")));

        let zoned = policy("%Y-%m-%dT%H:%M:%S%z", "%d/%m/%Y %H:%M %z");
        assert!(SanitizerConfig::from_options([SanitizerOption::DateFormat(zoned)]).is_ok());
    }

    #[test]
    fn test_unknown_yaml_option_rejected() {
        let err = SanitizerConfig::from_yaml_str("tag_name: val\ncolour: blue\n").unwrap_err();
        assert!(matches!(err, SanitizeError::InvalidConfig(_)));
    }

    #[test]
    fn test_json_config() {
        let config = SanitizerConfig::from_json_str(
            r#"{"tag_name":"clean","date_format":{"input":["%d/%m/%Y"],"output":"%Y-%m-%d"}}"#,
        )
        .unwrap();
        assert_eq!(config.tag_name, "clean");
        let date = config.date_format.unwrap();
        assert_eq!(date.input, vec!["%d/%m/%Y".to_string()]);
        assert!(!date.keep_format);
    }
}
