//! Data models
//!
//! Record types of the three collections, storage assets, staff accounts and
//! the shared pagination containers.

pub mod article;
pub mod asset;
pub mod class;
pub mod document;
pub mod gallery;
pub mod nav;
mod pagination;
mod session;
mod user;

pub use article::{ArticleCategory, ArticleRecord, RichText};
pub use asset::StorageAsset;
pub use class::{ClassRecord, ItemList, ListItem};
pub use document::{Document, Fields};
pub use gallery::{GalleryCategory, GalleryItemRecord};
pub use nav::{NavSection, NAV_SECTIONS};
pub use pagination::{ListParams, PagedResult};
pub use session::Session;
pub use user::{Identity, User};
