pub mod favorite;
pub mod folder;
pub mod snippet;
pub mod version;

pub use favorite::Favorite;
pub use folder::Folder;
pub use snippet::{LANGUAGES, Snippet, SnippetDraft};
pub use version::Version;
