//! Class model
//!
//! A class is one age group of the childcare center ("Smart Lions",
//! "Wise Mice", ...). Class documents live in the `classes` collection and are
//! edited either by document id or by slug.

use serde::{Deserialize, Serialize};

/// Entry of the "daily life" or "fun activities" lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListItem {
    pub title: String,
    pub description: String,
}

impl ListItem {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Which item list of a class an edit targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemList {
    DailyLife,
    FunActivities,
}

impl ItemList {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemList::DailyLife => "dailyLife",
            ItemList::FunActivities => "funActivities",
        }
    }
}

/// Number of daily-life rows the edit dialog always shows
pub const DAILY_LIFE_SLOTS: usize = 3;

/// Message returned when a class edit has no gallery image selected
pub const GALLERY_REQUIRED: &str = "Please select at least one gallery image.";

/// A class document.
///
/// Missing fields decode to empty values. Older documents store the summary
/// as `classSummary` and the hero image as `heroImage`; both are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassRecord {
    pub id: String,
    pub classname: String,
    pub age_range: String,
    #[serde(alias = "classSummary")]
    pub description: String,
    #[serde(alias = "heroImage")]
    pub image_url: String,
    pub daily_life: Vec<ListItem>,
    pub fun_activities: Vec<ListItem>,
    pub gallery_images: Vec<String>,
}

impl ClassRecord {
    /// Draft for a slug that has no document yet: `smart-lions` becomes
    /// "Smart Lions".
    pub fn from_slug(slug: &str) -> Self {
        Self {
            id: slug.to_string(),
            classname: title_from_slug(slug),
            ..Default::default()
        }
    }

    /// Whether the class has the fields the listing page needs
    pub fn is_complete(&self) -> bool {
        !self.classname.is_empty() && !self.age_range.is_empty() && !self.description.is_empty()
    }

    /// Add `url` when absent, remove it when present.
    ///
    /// Returns whether the image is selected afterwards.
    pub fn toggle_gallery_image(&mut self, url: &str) -> bool {
        if let Some(pos) = self.gallery_images.iter().position(|u| u == url) {
            self.gallery_images.remove(pos);
            false
        } else {
            self.gallery_images.push(url.to_string());
            true
        }
    }

    /// Grow `dailyLife` with empty rows until it has `slots` entries
    pub fn pad_daily_life(&mut self, slots: usize) {
        while self.daily_life.len() < slots {
            self.daily_life.push(ListItem::default());
        }
    }

    pub fn items(&self, list: ItemList) -> &[ListItem] {
        match list {
            ItemList::DailyLife => &self.daily_life,
            ItemList::FunActivities => &self.fun_activities,
        }
    }

    pub fn items_mut(&mut self, list: ItemList) -> &mut Vec<ListItem> {
        match list {
            ItemList::DailyLife => &mut self.daily_life,
            ItemList::FunActivities => &mut self.fun_activities,
        }
    }

    /// Append an empty item and return its index
    pub fn add_item(&mut self, list: ItemList) -> usize {
        let items = self.items_mut(list);
        items.push(ListItem::default());
        items.len() - 1
    }

    /// Remove the item at `index`; out-of-range indexes are ignored.
    pub fn remove_item(&mut self, list: ItemList, index: usize) -> Option<ListItem> {
        let items = self.items_mut(list);
        (index < items.len()).then(|| items.remove(index))
    }

    /// Replace the item at `index`. Returns `false` when out of range.
    pub fn set_item(&mut self, list: ItemList, index: usize, item: ListItem) -> bool {
        match self.items_mut(list).get_mut(index) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }
}

/// `news-and-events` -> `News And Events`
pub fn title_from_slug(slug: &str) -> String {
    slug.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_with_legacy_field_names() {
        let record: ClassRecord = serde_json::from_value(json!({
            "classname": "Wise Mice",
            "ageRange": "4-5 years",
            "classSummary": "Curious minds",
            "heroImage": "/mice.jpg",
        }))
        .unwrap();

        assert_eq!(record.description, "Curious minds");
        assert_eq!(record.image_url, "/mice.jpg");
        assert!(record.daily_life.is_empty());
        assert!(record.is_complete());
    }

    #[test]
    fn test_is_complete_requires_listing_fields() {
        let record = ClassRecord {
            classname: "Clever Cats".to_string(),
            age_range: "3 years".to_string(),
            ..Default::default()
        };
        assert!(!record.is_complete());
    }

    #[test]
    fn test_from_slug() {
        let draft = ClassRecord::from_slug("smart-lions");
        assert_eq!(draft.id, "smart-lions");
        assert_eq!(draft.classname, "Smart Lions");
        assert!(draft.gallery_images.is_empty());

        assert_eq!(title_from_slug("brainy-elephants"), "Brainy Elephants");
        assert_eq!(title_from_slug("solo"), "Solo");
    }

    #[test]
    fn test_toggle_gallery_image() {
        let mut record = ClassRecord::default();
        assert!(record.toggle_gallery_image("/a.jpg"));
        assert!(record.toggle_gallery_image("/b.jpg"));
        assert!(!record.toggle_gallery_image("/a.jpg"));
        assert_eq!(record.gallery_images, vec!["/b.jpg"]);
    }

    #[test]
    fn test_pad_daily_life_keeps_existing_rows() {
        let mut record = ClassRecord {
            daily_life: vec![ListItem::new("Circle time", "Songs")],
            ..Default::default()
        };
        record.pad_daily_life(DAILY_LIFE_SLOTS);
        assert_eq!(record.daily_life.len(), 3);
        assert_eq!(record.daily_life[0].title, "Circle time");

        record.daily_life.push(ListItem::default());
        record.pad_daily_life(DAILY_LIFE_SLOTS);
        assert_eq!(record.daily_life.len(), 4);
    }

    #[test]
    fn test_item_editing() {
        let mut record = ClassRecord::default();
        let idx = record.add_item(ItemList::FunActivities);
        assert!(record.set_item(
            ItemList::FunActivities,
            idx,
            ListItem::new("Painting", "Messy fun")
        ));
        assert!(!record.set_item(ItemList::FunActivities, 5, ListItem::default()));
        assert_eq!(record.items(ItemList::FunActivities)[0].title, "Painting");

        assert!(record.remove_item(ItemList::FunActivities, 3).is_none());
        let removed = record.remove_item(ItemList::FunActivities, 0).unwrap();
        assert_eq!(removed.title, "Painting");
        assert!(record.fun_activities.is_empty());
    }
}
