//! CLI command implementations

mod chat;
mod docs;
mod history;
mod init;
mod remove;
mod status;
mod upload;

pub use chat::*;
pub use docs::*;
pub use history::*;
pub use init::*;
pub use remove::*;
pub use status::*;
pub use upload::*;
