//! Bang records and the rows built from them.

use serde::{Deserialize, Serialize};
use url::Url;

use super::origin::RowTarget;

/// One shortcut entry: short name, trigger and URL template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bang {
    pub s: String,
    pub t: String,
    pub u: String,
}

impl Bang {
    pub fn new(s: impl Into<String>, t: impl Into<String>, u: impl Into<String>) -> Self {
        Self { s: s.into(), t: t.into(), u: u.into() }
    }

    /// Case-insensitive substring match over short name, trigger and template.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        [&self.s, &self.t, &self.u].iter().any(|field| field.to_lowercase().contains(&query))
    }
}

/// Where a row's link goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowLink {
    /// Opens the template's origin in a new tab.
    Navigate(Url),
    /// Shows the raw template text and goes nowhere.
    Inert,
}

/// A rendered row: labels, link and the favicon to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BangRow {
    pub short: String,
    pub trigger: String,
    /// Link text, always the raw template.
    pub template: String,
    pub link: RowLink,
    pub target: RowTarget,
}

impl BangRow {
    /// Build a row. Never fails: a template that does not resolve to a live
    /// origin produces a label-only row.
    pub fn build(bang: &Bang) -> Self {
        let target = RowTarget::resolve(&bang.u);
        let link = match &target {
            RowTarget::Live { origin, .. } => RowLink::Navigate(origin.clone()),
            RowTarget::LabelOnly => {
                tracing::debug!(template = %bang.u, "unresolvable template, label-only row");
                RowLink::Inert
            }
        };

        Self { short: bang.s.clone(), trigger: bang.t.clone(), template: bang.u.clone(), link, target }
    }

    pub fn favicon(&self) -> Option<&Url> {
        self.target.favicon()
    }

    pub fn is_live(&self) -> bool {
        matches!(self.target, RowTarget::Live { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bangs() -> Vec<Bang> {
        vec![
            Bang::new("Google", "g", "https://www.google.com/search?q={{{s}}}"),
            Bang::new("Wikipedia", "w", "https://en.wikipedia.org/wiki/{{{s}}}"),
            Bang::new("Rust Docs", "rs", "https://doc.rust-lang.org/std/?search={{{s}}}"),
        ]
    }

    #[test]
    fn test_matches_any_field_case_insensitively() {
        let bang = &bangs()[1];
        assert!(bang.matches("WIKI"));
        assert!(bang.matches("w"));
        assert!(bang.matches("en.wikipedia"));
        assert!(!bang.matches("google"));
    }

    #[test]
    fn test_build_live_row() {
        let row = BangRow::build(&bangs()[0]);
        assert_eq!(row.short, "Google");
        assert_eq!(row.trigger, "g");
        assert_eq!(row.link, RowLink::Navigate(Url::parse("https://www.google.com").unwrap()));
        assert_eq!(row.favicon().unwrap().as_str(), "https://www.google.com/favicon.ico");
        assert!(row.is_live());
    }

    #[test]
    fn test_build_malformed_template_is_label_only() {
        let row = BangRow::build(&Bang::new("Broken", "br", "not a url"));
        assert_eq!(row.short, "Broken");
        assert_eq!(row.trigger, "br");
        assert_eq!(row.template, "not a url");
        assert_eq!(row.link, RowLink::Inert);
        assert!(row.favicon().is_none());
        assert!(!row.is_live());
    }

    #[test]
    fn test_build_never_panics_on_odd_input() {
        for template in ["", "://", "http://", "https://[::1", "javascript:alert(1)", "\u{0}"] {
            let row = BangRow::build(&Bang::new("x", "x", template));
            assert!(!row.is_live(), "{template:?} should be label-only");
            assert_eq!(row.template, template);
        }
    }

    #[test]
    fn test_bang_json_shape() {
        let bang: Bang = serde_json::from_str(r#"{"s":"Google","t":"g","u":"https://google.com","d":"x"}"#).unwrap();
        assert_eq!(bang, Bang::new("Google", "g", "https://google.com"));
    }
}
