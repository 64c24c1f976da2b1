//! Gallery model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Gallery category. `Daily Life` keeps its space on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GalleryCategory {
    #[default]
    Activities,
    Education,
    #[serde(rename = "Daily Life")]
    DailyLife,
    Events,
}

impl GalleryCategory {
    pub const ALL: [GalleryCategory; 4] = [
        GalleryCategory::Activities,
        GalleryCategory::Education,
        GalleryCategory::DailyLife,
        GalleryCategory::Events,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GalleryCategory::Activities => "Activities",
            GalleryCategory::Education => "Education",
            GalleryCategory::DailyLife => "Daily Life",
            GalleryCategory::Events => "Events",
        }
    }
}

impl fmt::Display for GalleryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GalleryCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GalleryCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Invalid gallery category: {}", s))
    }
}

/// A gallery image with its caption and tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GalleryItemRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub category: GalleryCategory,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<String>,
}

/// Split a comma-separated tag field, trimming blanks.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_daily_life_wire_name() {
        let item: GalleryItemRecord =
            serde_json::from_value(json!({"title": "Lunch", "category": "Daily Life"})).unwrap();
        assert_eq!(item.category, GalleryCategory::DailyLife);

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["category"], "Daily Life");
        assert!(value.get("uploadDate").is_none());
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!(
            "Daily Life".parse::<GalleryCategory>().unwrap(),
            GalleryCategory::DailyLife
        );
        assert!("All".parse::<GalleryCategory>().is_err());
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(
            parse_tags(" art, creative ,,learning "),
            vec!["art", "creative", "learning"]
        );
        assert!(parse_tags("  ").is_empty());
    }
}
