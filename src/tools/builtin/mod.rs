//! Built-in tools offered to the general agent loop.

mod admin;
mod document;
mod jobs;
mod knowledge;

pub use admin::AdminInfoTool;
pub use document::DocumentTool;
pub use jobs::JobSearchTool;
pub use knowledge::KnowledgeSearchTool;
