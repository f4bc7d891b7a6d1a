//! Operator text commands.

mod executor;
mod parser;

pub use executor::{
    CommandExecutor, emoji_markdown, failure_text, render_folder, render_folder_list,
    render_join_roles,
};
pub use parser::{OperatorCommand, USAGE};
