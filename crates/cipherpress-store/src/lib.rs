pub mod auth;
pub mod posts;
pub mod session;
pub mod store;

// Re-export key types for easier usage
pub use auth::{AuthError, AuthProvider, ListenerId, MemoryAuth, SessionListener, User};
pub use posts::{
    POSTS_COLLECTION, Post, PostChanges, PostError, PostInput, PostService, estimate_read_time,
    make_excerpt,
};
pub use session::Session;
pub use store::{DocumentStore, JsonFileStore, MemoryStore, Record, StoreError};
