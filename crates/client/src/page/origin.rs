//! Favicon locations derived from a row's URL template.

use url::{Origin, Url};

use favicache_core::config::HOST_PLACEHOLDER;

/// Where a row points, once its template has been parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowTarget {
    /// The template parsed to a URL with a tuple origin.
    Live { origin: Url, favicon: Url },
    /// Unparseable template or opaque origin: show the label only.
    LabelOnly,
}

impl RowTarget {
    pub fn resolve(template: &str) -> Self {
        let Ok(url) = Url::parse(template) else {
            return RowTarget::LabelOnly;
        };
        match (origin_url(&url), origin_favicon(&url)) {
            (Some(origin), Some(favicon)) => RowTarget::Live { origin, favicon },
            _ => RowTarget::LabelOnly,
        }
    }

    pub fn favicon(&self) -> Option<&Url> {
        match self {
            RowTarget::Live { favicon, .. } => Some(favicon),
            RowTarget::LabelOnly => None,
        }
    }
}

fn origin_url(url: &Url) -> Option<Url> {
    match url.origin() {
        origin @ Origin::Tuple(..) => Url::parse(&origin.ascii_serialization()).ok(),
        Origin::Opaque(_) => None,
    }
}

/// `scheme://host[:port]/favicon.ico` for the URL's origin.
pub fn origin_favicon(url: &Url) -> Option<Url> {
    origin_url(url)?.join("/favicon.ico").ok()
}

/// The secondary provider's URL for a failing icon, or `None` when the icon has no host.
pub fn secondary_provider_url(template: &str, failing: &Url) -> Option<Url> {
    let host = failing.host_str()?;
    Url::parse(&template.replace(HOST_PLACEHOLDER, host)).ok()
}

/// Whether `url` is served from somewhere other than the page's own origin.
pub fn is_foreign(url: &Url, page_origin: &Url) -> bool {
    url.origin() != page_origin.origin()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DDG: &str = "https://icons.duckduckgo.com/ip3/{host}.ico";

    #[test]
    fn test_resolve_search_template() {
        let target = RowTarget::resolve("https://www.google.com/search?q={{{s}}}");
        assert_eq!(
            target,
            RowTarget::Live {
                origin: Url::parse("https://www.google.com").unwrap(),
                favicon: Url::parse("https://www.google.com/favicon.ico").unwrap(),
            }
        );
    }

    #[test]
    fn test_resolve_keeps_port() {
        let target = RowTarget::resolve("http://localhost:8080/find?q=x");
        assert_eq!(target.favicon().unwrap().as_str(), "http://localhost:8080/favicon.ico");
    }

    #[test]
    fn test_resolve_drops_default_port() {
        let target = RowTarget::resolve("https://example.com:443/a/b");
        assert_eq!(target.favicon().unwrap().as_str(), "https://example.com/favicon.ico");
    }

    #[test]
    fn test_resolve_malformed() {
        assert_eq!(RowTarget::resolve("not a url"), RowTarget::LabelOnly);
        assert_eq!(RowTarget::resolve(""), RowTarget::LabelOnly);
        assert_eq!(RowTarget::resolve("/relative/path"), RowTarget::LabelOnly);
    }

    #[test]
    fn test_resolve_opaque_origin() {
        assert_eq!(RowTarget::resolve("mailto:someone@example.com"), RowTarget::LabelOnly);
        assert_eq!(RowTarget::resolve("data:text/plain,hi"), RowTarget::LabelOnly);
    }

    #[test]
    fn test_secondary_provider_url() {
        let failing = Url::parse("https://www.example.com/favicon.ico").unwrap();
        assert_eq!(
            secondary_provider_url(DDG, &failing).unwrap().as_str(),
            "https://icons.duckduckgo.com/ip3/www.example.com.ico"
        );
    }

    #[test]
    fn test_is_foreign() {
        let page = Url::parse("http://localhost:3000/bangs").unwrap();
        assert!(is_foreign(&Url::parse("https://example.com/favicon.ico").unwrap(), &page));
        assert!(!is_foreign(&Url::parse("http://localhost:3000/assets/bangs/fallback-icon.svg").unwrap(), &page));
        assert!(is_foreign(&Url::parse("http://localhost:3001/favicon.ico").unwrap(), &page));
    }
}
