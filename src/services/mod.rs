//! Services layer - Business logic
//!
//! Collection access, the section and edit state machines, media
//! resolution, and the credential gate. Handlers talk to these; these talk
//! to repositories and the object store.

pub mod collection;
pub mod edit;
pub mod media;
pub mod password;
pub mod rate_limiter;
pub mod section;
pub mod seed;
pub mod session;
pub mod user;
pub mod view;

pub use collection::{CollectionGateway, GatewayError, Record, ARTICLE_CONTENT_FIELDS};
pub use edit::{EditMode, EditSession};
pub use media::{MediaError, MediaResolver};
pub use password::{hash_password, verify_password};
pub use rate_limiter::LoginRateLimiter;
pub use section::{Section, SectionState};
pub use seed::populate_articles;
pub use session::SessionContext;
pub use user::{UserService, UserServiceError};
pub use view::{build_view, CategoryFilter, GalleryStats, Searchable, ViewQuery};
