//! Per-source filter and rewrite policies
//!
//! A policy is pure data. It is deserialized from the `policy` table of a
//! `[[sources]]` entry, tagged by `mode`:
//!
//! ```toml
//! [sources.policy]
//! mode = "group-include"
//! groups = ["Sky Sports Main"]
//! group_label = "ZXIPTV"
//! ```
//!
//! [`crate::pipeline::filter_engine::FilterEngine`] compiles a policy into a matcher.

use serde::{Deserialize, Serialize};

use crate::pipeline::filter_engine::normalize_for_matching;

/// Attribute injected into entries that lack it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultAttribute {
    pub name: String,
    pub value: String,
}

impl DefaultAttribute {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Placeholder channel identity used by sources that publish events without
/// a real guide id
///
/// Entries whose `tvg-id` equals `tvg_id` get their `tvg-name` forced to
/// `tvg_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderIdentity {
    pub tvg_id: String,
    pub tvg_name: String,
}

/// How entries of one source are filtered and rewritten
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum SourcePolicy {
    /// Keep every entry untouched
    #[default]
    Passthrough,

    /// Drop entries matching a blocklist, fill in missing attributes on the rest
    KeywordExclude {
        #[serde(default)]
        exclude_keywords: Vec<String>,
        #[serde(default)]
        default_attributes: Vec<DefaultAttribute>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<PlaceholderIdentity>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        negative_guard: Option<String>,
    },

    /// Keep only entries matching an allowlist and relabel their group
    KeywordInclude {
        keywords: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        negative_guard: Option<String>,
        group_label: String,
        #[serde(default)]
        strip_prefixes: Vec<String>,
    },

    /// Keep only entries already in one of the listed groups and relabel them
    GroupInclude {
        groups: Vec<String>,
        group_label: String,
    },
}

impl SourcePolicy {
    /// Configuration name of the mode, used in logs
    pub fn mode_name(&self) -> &'static str {
        match self {
            Self::Passthrough => "passthrough",
            Self::KeywordExclude { .. } => "keyword-exclude",
            Self::KeywordInclude { .. } => "keyword-include",
            Self::GroupInclude { .. } => "group-include",
        }
    }

    /// Check the invariants serde cannot express
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Passthrough => Ok(()),
            Self::KeywordExclude { placeholder, .. } => match placeholder {
                Some(p) if p.tvg_id.trim().is_empty() => {
                    Err("placeholder.tvg_id must not be empty".to_string())
                }
                _ => Ok(()),
            },
            Self::KeywordInclude {
                keywords,
                group_label,
                ..
            } => {
                if keywords.iter().all(|k| normalize_for_matching(k).is_empty()) {
                    return Err("keyword-include needs at least one keyword".to_string());
                }
                if group_label.trim().is_empty() {
                    return Err("group_label must not be empty".to_string());
                }
                Ok(())
            }
            Self::GroupInclude {
                groups,
                group_label,
            } => {
                if groups.is_empty() {
                    return Err("group-include needs at least one group".to_string());
                }
                if group_label.trim().is_empty() {
                    return Err("group_label must not be empty".to_string());
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        policy: SourcePolicy,
    }

    #[test]
    fn test_deserialize_group_include() {
        let wrapper: Wrapper = toml::from_str(
            r#"
            [policy]
            mode = "group-include"
            groups = ["Sky Sports Main", "Sky Sports F1"]
            group_label = "ZXIPTV"
            "#,
        )
        .unwrap();

        assert_eq!(
            wrapper.policy,
            SourcePolicy::GroupInclude {
                groups: vec!["Sky Sports Main".to_string(), "Sky Sports F1".to_string()],
                group_label: "ZXIPTV".to_string(),
            }
        );
    }

    #[test]
    fn test_deserialize_keyword_exclude_with_defaults() {
        let wrapper: Wrapper = toml::from_str(
            r#"
            [policy]
            mode = "keyword-exclude"
            exclude_keywords = ["nfl", "cricket"]
            default_attributes = [
                { name = "tvg-name", value = "Live Event" },
                { name = "group-title", value = "Unknown" },
            ]
            placeholder = { tvg_id = "PPV.EVENTS.Dummy.us", tvg_name = "Live Event" }
            "#,
        )
        .unwrap();

        match wrapper.policy {
            SourcePolicy::KeywordExclude {
                exclude_keywords,
                default_attributes,
                placeholder,
                negative_guard,
            } => {
                assert_eq!(exclude_keywords, vec!["nfl", "cricket"]);
                assert_eq!(default_attributes[0], DefaultAttribute::new("tvg-name", "Live Event"));
                assert_eq!(default_attributes[1].name, "group-title");
                assert_eq!(placeholder.unwrap().tvg_id, "PPV.EVENTS.Dummy.us");
                assert!(negative_guard.is_none());
            }
            other => panic!("unexpected policy {other:?}"),
        }
    }

    #[test]
    fn test_missing_mode_is_rejected() {
        let result: Result<Wrapper, _> = toml::from_str("[policy]\ngroups = []\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate() {
        assert!(SourcePolicy::Passthrough.validate().is_ok());
        assert!(SourcePolicy::GroupInclude {
            groups: vec![],
            group_label: "X".to_string()
        }
        .validate()
        .is_err());
        assert!(SourcePolicy::KeywordInclude {
            keywords: vec!["  ".to_string()],
            negative_guard: None,
            group_label: "Sports".to_string(),
            strip_prefixes: vec![],
        }
        .validate()
        .is_err());
        assert!(SourcePolicy::KeywordInclude {
            keywords: vec!["***".to_string(), " - ".to_string()],
            negative_guard: None,
            group_label: "Sports".to_string(),
            strip_prefixes: vec![],
        }
        .validate()
        .is_err());
        assert!(SourcePolicy::KeywordInclude {
            keywords: vec!["***".to_string(), "sky sports".to_string()],
            negative_guard: None,
            group_label: "Sports".to_string(),
            strip_prefixes: vec![],
        }
        .validate()
        .is_ok());
        assert!(SourcePolicy::KeywordInclude {
            keywords: vec!["sky sports".to_string()],
            negative_guard: Some("arena".to_string()),
            group_label: "".to_string(),
            strip_prefixes: vec![],
        }
        .validate()
        .is_err());
    }
}
