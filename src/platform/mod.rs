pub mod instagram;
pub mod traits;

pub use instagram::{InstagramError, InstagramSession, PostMetadata};
pub use traits::PostProvider;
