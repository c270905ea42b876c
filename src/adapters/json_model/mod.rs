//! Source-model adapter: compilation units pre-parsed by a frontend and stored as JSON.

mod provider;
mod source;

pub use provider::JsonModelProvider;
pub use source::JsonProjectSource;
