//! MDX document handling.
//!
//! Frontmatter codec for the restricted YAML block at the top of every
//! MDX file, plus the HTML/Markdown body converters.

pub mod convert;
pub mod frontmatter;

pub use convert::{html_to_markdown, markdown_to_html};
pub use frontmatter::{FieldValue, Frontmatter, FrontmatterError, MdxDocument};
