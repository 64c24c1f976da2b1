//! Sidebar navigation model

use serde::Serialize;

/// Product name shown above the navigation
pub const SITE_TITLE: &str = "Cosmo Kids CMS";

/// One management section of the sidebar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavSection {
    pub title: &'static str,
    pub url: &'static str,
    /// Collection backing the section, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<&'static str>,
}

/// Home, Classes, Gallery and News + Events, in sidebar order
pub const NAV_SECTIONS: &[NavSection] = &[
    NavSection {
        title: "Home",
        url: "/pages/home",
        collection: None,
    },
    NavSection {
        title: "Classes",
        url: "/pages/classes",
        collection: Some("classes"),
    },
    NavSection {
        title: "Gallery",
        url: "/pages/gallery",
        collection: Some("gallery"),
    },
    NavSection {
        title: "News + Events",
        url: "/pages/news-events",
        collection: Some("news-events"),
    },
];

impl NavSection {
    /// Path of one record's page under this section, e.g. `/pages/classes/abc`
    pub fn record_path(&self, id: &str) -> String {
        format!("{}/{}", self.url, urlencoding::encode(id))
    }
}

/// The sidebar section backed by `collection`
pub fn section_for(collection: &str) -> Option<&'static NavSection> {
    NAV_SECTIONS.iter().find(|s| s.collection == Some(collection))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_in_order() {
        let titles: Vec<_> = NAV_SECTIONS.iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["Home", "Classes", "Gallery", "News + Events"]);
    }

    #[test]
    fn test_record_path() {
        let classes = section_for("classes").unwrap();
        assert_eq!(classes.record_path("abc123"), "/pages/classes/abc123");
        assert_eq!(classes.record_path("a b"), "/pages/classes/a%20b");
        assert!(section_for("users").is_none());
    }
}
