//! Filter & rewrite engine
//!
//! A [`FilterEngine`] is built once per source from its [`SourcePolicy`] and
//! decides, entry by entry, whether to keep it and how to rewrite its
//! attributes. Keywords are matched as substrings of a normalized title:
//! lower-cased, with every run of non-alphanumeric characters collapsed to a
//! single space. Only the title is inspected, never the raw attribute text.

use tracing::{debug, trace};

use crate::models::{attrs, DefaultAttribute, PlaceholderIdentity, SourcePolicy, StreamEntry};

/// Normalize text for keyword matching
///
/// `"NBA-W: Finals (HD)"` becomes `"nba w finals hd"`.
pub fn normalize_for_matching(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_space && !normalized.is_empty() {
                normalized.push(' ');
            }
            pending_space = false;
            normalized.extend(ch.to_lowercase());
        } else {
            pending_space = true;
        }
    }

    normalized
}

/// Remove parenthesised or bracketed segments and leading regional prefixes
///
/// `"UK: Sky Sports Main Event (Backup) [HD]"` with prefix `"UK:"` becomes
/// `"Sky Sports Main Event"`. Falls back to the trimmed input when nothing
/// would be left.
pub fn clean_display_name(title: &str, strip_prefixes: &[String]) -> String {
    let mut stripped = String::with_capacity(title.len());
    let mut depth = 0usize;
    for ch in title.chars() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' if depth > 0 => depth -= 1,
            _ if depth == 0 => stripped.push(ch),
            _ => {}
        }
    }

    let mut cleaned = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    for prefix in strip_prefixes {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            continue;
        }
        // an alphanumeric prefix must end on a word boundary, "UK" never strips "UKTV"
        let matches = cleaned
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
            && (prefix.ends_with(|c: char| !c.is_alphanumeric())
                || cleaned[prefix.len()..]
                    .chars()
                    .next()
                    .map_or(true, |c| !c.is_alphanumeric()));
        if matches {
            cleaned = cleaned[prefix.len()..]
                .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '|' | '-'))
                .to_string();
            break;
        }
    }

    if cleaned.is_empty() {
        title.trim().to_string()
    } else {
        cleaned
    }
}

fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| normalize_for_matching(k))
        .filter(|k| !k.is_empty())
        .collect()
}

fn normalize_guard(guard: &Option<String>) -> Option<String> {
    guard
        .as_deref()
        .map(normalize_for_matching)
        .filter(|g| !g.is_empty())
}

/// Policy with its keyword lists pre-normalized
#[derive(Debug, Clone)]
enum CompiledPolicy {
    Passthrough,
    KeywordExclude {
        keywords: Vec<String>,
        guard: Option<String>,
        defaults: Vec<DefaultAttribute>,
        placeholder: Option<PlaceholderIdentity>,
    },
    KeywordInclude {
        keywords: Vec<String>,
        guard: Option<String>,
        group_label: String,
        strip_prefixes: Vec<String>,
    },
    GroupInclude {
        groups: Vec<String>,
        group_label: String,
    },
}

/// Counters for one pass of the engine over a source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub kept: usize,
    pub discarded: usize,
}

/// Per-source filter and rewrite engine
#[derive(Debug, Clone)]
pub struct FilterEngine {
    policy: CompiledPolicy,
    mode: &'static str,
}

impl FilterEngine {
    pub fn new(policy: &SourcePolicy) -> Self {
        let compiled = match policy {
            SourcePolicy::Passthrough => CompiledPolicy::Passthrough,
            SourcePolicy::KeywordExclude {
                exclude_keywords,
                default_attributes,
                placeholder,
                negative_guard,
            } => CompiledPolicy::KeywordExclude {
                keywords: normalize_keywords(exclude_keywords),
                guard: normalize_guard(negative_guard),
                defaults: default_attributes.clone(),
                placeholder: placeholder.clone(),
            },
            SourcePolicy::KeywordInclude {
                keywords,
                negative_guard,
                group_label,
                strip_prefixes,
            } => CompiledPolicy::KeywordInclude {
                keywords: normalize_keywords(keywords),
                guard: normalize_guard(negative_guard),
                group_label: group_label.clone(),
                strip_prefixes: strip_prefixes.clone(),
            },
            SourcePolicy::GroupInclude {
                groups,
                group_label,
            } => CompiledPolicy::GroupInclude {
                groups: groups.clone(),
                group_label: group_label.clone(),
            },
        };

        Self {
            policy: compiled,
            mode: policy.mode_name(),
        }
    }

    pub fn mode(&self) -> &'static str {
        self.mode
    }

    /// Keep (possibly rewritten) or discard one entry
    pub fn apply(&self, mut entry: StreamEntry) -> Option<StreamEntry> {
        match &self.policy {
            CompiledPolicy::Passthrough => Some(entry),

            CompiledPolicy::KeywordExclude {
                keywords,
                guard,
                defaults,
                placeholder,
            } => {
                let normalized = normalize_for_matching(entry.title());
                if let Some(keyword) = first_match(&normalized, keywords, guard.as_deref()) {
                    trace!("Excluding '{}': matched keyword '{}'", entry.title(), keyword);
                    return None;
                }

                for default in defaults {
                    entry.info.insert_if_absent(default.name.as_str(), default.value.as_str());
                }
                if let Some(placeholder) = placeholder {
                    if entry.attribute(attrs::TVG_ID) == Some(placeholder.tvg_id.as_str()) {
                        entry.info.set(attrs::TVG_NAME, placeholder.tvg_name.as_str());
                    }
                }
                Some(entry)
            }

            CompiledPolicy::KeywordInclude {
                keywords,
                guard,
                group_label,
                strip_prefixes,
            } => {
                let normalized = normalize_for_matching(entry.title());
                let keyword = first_match(&normalized, keywords, guard.as_deref())?;
                trace!("Including '{}': matched keyword '{}'", entry.title(), keyword);

                let display_name = clean_display_name(entry.title(), strip_prefixes);
                entry.info.set(attrs::GROUP_TITLE, group_label.as_str());
                entry.info.remove(attrs::TVG_ID);
                entry.info.set(attrs::TVG_NAME, display_name.as_str());
                entry.info.title = display_name;
                Some(entry)
            }

            CompiledPolicy::GroupInclude {
                groups,
                group_label,
            } => {
                let allowed = entry
                    .group_title()
                    .is_some_and(|group| groups.iter().any(|g| g == group));
                if !allowed {
                    return None;
                }
                entry.info.set(attrs::GROUP_TITLE, group_label.as_str());
                Some(entry)
            }
        }
    }

    /// Run the engine over all entries of a source, preserving order
    pub fn filter_entries(&self, entries: Vec<StreamEntry>) -> (Vec<StreamEntry>, FilterStats) {
        let mut stats = FilterStats::default();
        let mut kept = Vec::with_capacity(entries.len());

        for entry in entries {
            match self.apply(entry) {
                Some(entry) => {
                    stats.kept += 1;
                    kept.push(entry);
                }
                None => stats.discarded += 1,
            }
        }

        debug!(
            "Filter ({}) kept {} entries, discarded {}",
            self.mode, stats.kept, stats.discarded
        );
        (kept, stats)
    }
}

/// First keyword contained in `normalized`, unless the guard vetoes any match
fn first_match<'a>(normalized: &str, keywords: &'a [String], guard: Option<&str>) -> Option<&'a str> {
    if guard.is_some_and(|g| normalized.contains(g)) {
        return None;
    }
    keywords
        .iter()
        .find(|k| normalized.contains(k.as_str()))
        .map(String::as_str)
}
