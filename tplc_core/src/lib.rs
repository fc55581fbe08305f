//! `tplc_core` compiles Dotclear-style `<tpl:…>` templates. Template source
//! mixes literal text with block tags (`<tpl:Entries>…</tpl:Entries>`), value
//! tags (`{{tpl:EntryTitle}}`) and overridable block definitions
//! (`<tpl:Block name="content">…</tpl:Block>`). Every tag is compiled by a
//! handler registered on a [`Compiler`], and the results are concatenated
//! into a single output string.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Template source
//!   → Lexer (splits text, open/close/value tags and template comments)
//!   → Tree builder (matches registered open/close tags into a Node tree)
//!   → Compile context (registers block definitions, follows extends)
//!   → Nodes compile themselves through the handler registry
//! ```
//!
//! ## Key Types
//!
//! - [`Compiler`]: the tag handler registry and entry point.
//! - [`Attributes`]: the parsed `name="value"` pairs of a tag.
//! - [`Node`] / [`Template`]: the parsed tree.
//! - [`BlockStack`]: the block-inheritance stack behind `{{tpl:parent}}`.
//! - [`CompileContext`]: the state of one compile run.
//! - [`TemplateLoader`]: where `extends` and `include` find templates.
//! - [`CompilerConfig`]: configuration loaded from `tplc.toml`.
//!
//! ## Block Inheritance
//!
//! A child template overrides a block of its parent and can render the
//! overridden content with `{{tpl:parent}}`:
//!
//! ```rust
//! use tplc_core::Compiler;
//!
//! let compiler = Compiler::new();
//! let source = concat!(
//! 	r#"<tpl:Block name="title">Child, then {{tpl:parent}}</tpl:Block>"#,
//! 	r#"<tpl:Block name="title">Parent</tpl:Block>"#,
//! );
//!
//! let output = compiler.compile_str(source).unwrap();
//! assert_eq!(output, "Child, then ParentChild, then Parent");
//! ```

pub use attributes::*;
pub use compiler::*;
pub use config::*;
pub use context::*;
pub use error::*;
pub use inheritance::*;
pub use loader::*;
pub use node::*;
pub use parser::*;
pub use position::*;

mod attributes;
mod compiler;
pub mod config;
mod context;
#[allow(unused_assignments)]
mod error;
mod inheritance;
pub(crate) mod lexer;
pub mod loader;
mod node;
mod parser;
mod position;
pub(crate) mod tokens;

#[cfg(test)]
mod __fixtures;
