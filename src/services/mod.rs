//! Services layer - Business logic
//!
//! The use-cases of the system. Services validate input, talk to storage
//! only through repository traits and report failures as typed errors.

pub mod article;
pub mod clock;
pub mod favorite;
pub mod id_generator;

pub use article::{generate_slug, ArticleService, ArticleServiceError};
pub use clock::{Clock, FixedClock, SystemClock};
pub use favorite::{FavoriteService, FavoriteServiceError};
pub use id_generator::{IdGenerator, IncrementIdGenerator, UuidGenerator};
