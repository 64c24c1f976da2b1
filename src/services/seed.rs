//! Sample news and events
//!
//! `populate_articles` writes three fixed articles so a fresh install has
//! something to show. Creates run one after another; a failure part way
//! through leaves the earlier articles in place.

use crate::models::{ArticleCategory, ArticleRecord, RichText};
use crate::services::collection::{CollectionGateway, GatewayError};

struct Fixture {
    title: &'static str,
    description: &'static str,
    body: &'static str,
    author: &'static str,
    category: ArticleCategory,
    date: &'static str,
    image_url: &'static str,
}

const FIXTURES: [Fixture; 3] = [
    Fixture {
        title: "Story Night 2021",
        description: "Join us for an evening of storytelling, fun activities, and community bonding.",
        body: "This is the full content for Story Night 2021.",
        author: "Jane Doe",
        category: ArticleCategory::Events,
        date: "2021-03-15",
        image_url: "/news1.jpg",
    },
    Fixture {
        title: "Cosmo Holiday Fun",
        description: "Fun and educational activities to keep your children engaged throughout the changing seasons.",
        body: "This is the full content for Cosmo Holiday Fun.",
        author: "John Smith",
        category: ArticleCategory::News,
        date: "2021-02-17",
        image_url: "/news2.jpg",
    },
    Fixture {
        title: "Sleepover Coming Soon!",
        description: "Get ready for a night of fun, games, and learning with our upcoming sleepover event.",
        body: "This is the full content for the Sleepover.",
        author: "Peter Pan",
        category: ArticleCategory::Events,
        date: "2021-01-05",
        image_url: "/news3.jpg",
    },
];

/// The sample articles, ids unassigned
pub fn sample_articles() -> Vec<ArticleRecord> {
    FIXTURES
        .iter()
        .map(|f| ArticleRecord {
            id: String::new(),
            title: f.title.to_string(),
            description: f.description.to_string(),
            content: RichText::from_plain(f.body),
            author: f.author.to_string(),
            category: f.category,
            date: f.date.to_string(),
            image_url: f.image_url.to_string(),
        })
        .collect()
}

/// Create the sample articles. Existing articles are left alone, so running
/// this twice yields duplicates.
pub async fn populate_articles(
    gateway: &CollectionGateway<ArticleRecord>,
) -> Result<Vec<ArticleRecord>, GatewayError> {
    let mut created = Vec::with_capacity(FIXTURES.len());
    for article in sample_articles() {
        created.push(gateway.create(&article).await?);
    }
    tracing::info!("Populated {} sample articles", created.len());
    Ok(created)
}
