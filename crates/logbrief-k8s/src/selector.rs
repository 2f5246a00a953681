use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

use crate::SourceError;

/// Pod label that carries the application name
pub const APP_LABEL: &str = "app";

/// How pods are matched against a requested app name.
///
/// Label selectors only support equality, so a glob (`*` or `?` anywhere in
/// the name) lists every pod carrying an `app` label and matches the glob
/// against the label value client-side. All other characters, `.` included,
/// are literal.
#[derive(Clone, Debug)]
pub enum AppSelector {
    Exact(String),
    Glob { pattern: String, regex: Regex },
}

impl AppSelector {
    pub fn for_app(app_name: &str) -> Result<Self, SourceError> {
        if !app_name.contains(['*', '?']) {
            return Ok(Self::Exact(app_name.to_string()));
        }

        let mut re = String::with_capacity(app_name.len() * 2 + 2);
        re.push('^');
        for ch in app_name.chars() {
            match ch {
                '*' => re.push_str(".*"),
                '?' => re.push('.'),
                other => re.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
            }
        }
        re.push('$');

        let regex = Regex::new(&re).map_err(|source| SourceError::Pattern {
            pattern: app_name.to_string(),
            source,
        })?;
        Ok(Self::Glob {
            pattern: app_name.to_string(),
            regex,
        })
    }

    /// Server-side label selector
    pub fn label_selector(&self) -> String {
        match self {
            Self::Exact(name) => format!("{APP_LABEL}={name}"),
            Self::Glob { .. } => APP_LABEL.to_string(),
        }
    }

    /// Client-side check of a pod's labels
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        labels
            .get(APP_LABEL)
            .is_some_and(|value| self.matches_value(value))
    }

    /// Check a single `app` label value
    pub fn matches_value(&self, value: &str) -> bool {
        match self {
            Self::Exact(name) => value == name,
            Self::Glob { regex, .. } => regex.is_match(value),
        }
    }

    /// Set-based selector naming every matching value, e.g.
    /// `app in (checkout-api,checkout-web)`.
    ///
    /// For tools that cannot filter pods themselves. `None` when no value
    /// matches.
    pub fn set_selector<'a>(&self, values: impl IntoIterator<Item = &'a str>) -> Option<String> {
        let matched: BTreeSet<&str> = values
            .into_iter()
            .filter(|value| self.matches_value(value))
            .collect();
        if matched.is_empty() {
            return None;
        }
        let joined = matched.into_iter().collect::<Vec<_>>().join(",");
        Some(format!("{APP_LABEL} in ({joined})"))
    }

    pub fn is_glob(&self) -> bool {
        matches!(self, Self::Glob { .. })
    }
}
