extern crate self as mustachio;

pub mod data;
pub mod error;
pub mod loader;
pub mod models;
pub mod tpl;

pub use data::{Fields, Value, Variant, to_value};
pub use error::TemplateError;
pub use loader::{FileLoader, MemoryLoader, PartialLoader};
pub use models::parser_options::ParserOptions;
pub use tpl::{Context, Node, Parser, Template, escape_html};

#[cfg(feature = "macros")]
pub use mustachio_macros::{Fields, embed_partials};
