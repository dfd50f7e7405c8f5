pub mod catalog;
pub mod condition;
pub mod document;
pub mod error;
pub mod node;
pub mod types;

pub use catalog::*;
pub use condition::Condition;
pub use document::*;
pub use error::ScriptError;
pub use node::*;
pub use types::*;
