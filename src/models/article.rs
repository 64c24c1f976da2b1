//! Article model
//!
//! News and event posts stored in the `news-events` collection. The body is
//! a serialized rich-text blob produced by the editor widget; this crate only
//! stores it and extracts plain text from it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Article category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArticleCategory {
    #[default]
    News,
    Events,
}

impl ArticleCategory {
    pub const ALL: [ArticleCategory; 2] = [ArticleCategory::News, ArticleCategory::Events];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleCategory::News => "News",
            ArticleCategory::Events => "Events",
        }
    }
}

impl fmt::Display for ArticleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArticleCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArticleCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Invalid article category: {}", s))
    }
}

/// A news or event article.
///
/// Missing fields decode to empty strings and the `News` category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArticleRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Serialized rich-text blob
    pub content: String,
    pub author: String,
    pub category: ArticleCategory,
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    pub image_url: String,
}

impl ArticleRecord {
    pub fn plain_text(&self) -> String {
        RichText::plain_text(&self.content)
    }
}

/// Draft-style rich text: `{"blocks": [{"text": ...}, ...], "entityMap": {}}`
pub struct RichText;

#[derive(Deserialize)]
struct RawContent {
    #[serde(default)]
    blocks: Vec<RawBlock>,
}

#[derive(Deserialize)]
struct RawBlock {
    #[serde(default)]
    text: String,
}

impl RichText {
    /// Block texts joined by newlines.
    ///
    /// Content that is not a JSON object (legacy plain-text bodies) is
    /// returned as is.
    pub fn plain_text(content: &str) -> String {
        if !content.trim_start().starts_with('{') {
            return content.to_string();
        }
        match serde_json::from_str::<RawContent>(content) {
            Ok(raw) => raw
                .blocks
                .into_iter()
                .map(|b| b.text)
                .collect::<Vec<_>>()
                .join("\n"),
            Err(_) => content.to_string(),
        }
    }

    /// Serialize one unstyled block per line of `text`
    pub fn from_plain(text: &str) -> String {
        let blocks: Vec<serde_json::Value> = text
            .lines()
            .enumerate()
            .map(|(i, line)| {
                serde_json::json!({
                    "key": block_key(i),
                    "text": line,
                    "type": "unstyled",
                    "depth": 0,
                    "inlineStyleRanges": [],
                    "entityRanges": [],
                    "data": {},
                })
            })
            .collect();
        serde_json::json!({ "blocks": blocks, "entityMap": {} }).to_string()
    }
}

fn block_key(index: usize) -> String {
    // Five base-36 characters, stable per position
    let mut n = index as u64 * 7_919 + 104_729;
    let mut key = String::with_capacity(5);
    for _ in 0..5 {
        let digit = (n % 36) as u32;
        key.push(std::char::from_digit(digit, 36).unwrap_or('0'));
        n /= 36;
    }
    key
}
