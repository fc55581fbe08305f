use std::collections::HashMap;

use thiserror::Error;

use crate::Attributes;
use crate::CompileContext;
use crate::CompilerConfig;
use crate::Template;
use crate::TemplateLoader;
use crate::TplError;
use crate::TplResult;
use crate::parser::build_template;

/// The block tag whose occurrences are overridable, named definitions.
pub const DEFINITION_TAG: &str = "Block";
/// `{{tpl:parent}}` renders the previous definition of the enclosing block.
pub const PARENT_TAG: &str = "parent";
/// `{{tpl:extends parent="…"}}` makes a template inherit from another one.
pub const EXTENDS_TAG: &str = "extends";
/// `{{tpl:include src="…"}}` inlines another compiled template.
pub const INCLUDE_TAG: &str = "include";

pub type HandlerResult = Result<String, HandlerError>;

/// A failure reported by a tag handler, e.g. an unusable attribute
/// combination. The compiler attaches the tag name and attribute dump.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HandlerError(String);

impl HandlerError {
	pub fn new(reason: impl Into<String>) -> Self {
		Self(reason.into())
	}
}

/// Compiles a block tag given its attributes and the already compiled content
/// of its children.
pub trait BlockHandler: Send + Sync {
	fn compile(&self, attrs: &Attributes, content: &str) -> HandlerResult;
}

impl<F> BlockHandler for F
where
	F: Fn(&Attributes, &str) -> HandlerResult + Send + Sync,
{
	fn compile(&self, attrs: &Attributes, content: &str) -> HandlerResult {
		self(attrs, content)
	}
}

/// Compiles a value tag given its attributes and the raw attribute text.
pub trait ValueHandler: Send + Sync {
	fn compile(&self, attrs: &Attributes, raw_attrs: &str) -> HandlerResult;
}

impl<F> ValueHandler for F
where
	F: Fn(&Attributes, &str) -> HandlerResult + Send + Sync,
{
	fn compile(&self, attrs: &Attributes, raw_attrs: &str) -> HandlerResult {
		self(attrs, raw_attrs)
	}
}

/// Observes every handler invocation. Output returned from the `before_*` and
/// `after_*` methods surrounds the handler output, and the `&mut` arguments
/// let a hook inject attributes or rewrite block content before the handler
/// runs.
pub trait CompileHook: Send + Sync {
	fn before_block(&self, _tag: &str, _attrs: &mut Attributes) -> String {
		String::new()
	}

	fn inside_block(&self, _tag: &str, _attrs: &mut Attributes, _content: &mut String) {}

	fn after_block(&self, _tag: &str, _attrs: &Attributes) -> String {
		String::new()
	}

	fn before_value(&self, _tag: &str, _attrs: &mut Attributes) -> String {
		String::new()
	}

	fn after_value(&self, _tag: &str, _attrs: &Attributes) -> String {
		String::new()
	}
}

/// The tag handler registry.
///
/// Handlers are registered once, at construction time, for every supported
/// tag. Registering a tag again replaces the previous handler, which is how
/// surrounding code overrides built-in behaviour. The compiler is immutable
/// while compiling and can be shared between threads; all per-run state lives
/// in a [`CompileContext`].
///
/// ```rust
/// use tplc_core::Compiler;
///
/// let mut compiler = Compiler::new();
/// compiler.register_value("BlogName", |_, _| Ok("<?= $blog->name ?>".into()));
/// compiler.register_block("Entries", |_, content| {
/// 	Ok(format!("<?php while ($posts->fetch()) : ?>{content}<?php endwhile; ?>"))
/// });
///
/// let output = compiler
/// 	.compile_str("<h1>{{tpl:BlogName}}</h1><tpl:Entries>.</tpl:Entries>")
/// 	.unwrap();
/// assert_eq!(
/// 	output,
/// 	"<h1><?= $blog->name ?></h1><?php while ($posts->fetch()) : ?>.<?php endwhile; ?>"
/// );
/// ```
pub struct Compiler {
	config: CompilerConfig,
	blocks: HashMap<String, Box<dyn BlockHandler>>,
	values: HashMap<String, Box<dyn ValueHandler>>,
	hooks: Vec<Box<dyn CompileHook>>,
}

impl Default for Compiler {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for Compiler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Compiler")
			.field("config", &self.config)
			.field("blocks", &self.block_tags())
			.field("values", &self.value_tags())
			.field("hooks", &self.hooks.len())
			.finish()
	}
}

impl Compiler {
	pub fn new() -> Self {
		Self::with_config(CompilerConfig::default())
	}

	/// A compiler with only the built-in tags registered.
	pub fn with_config(config: CompilerConfig) -> Self {
		let mut compiler = Self {
			config,
			blocks: HashMap::new(),
			values: HashMap::new(),
			hooks: Vec::new(),
		};

		compiler.register_block(DEFINITION_TAG, |_, content| Ok(content.to_string()));
		compiler
	}

	pub fn config(&self) -> &CompilerConfig {
		&self.config
	}

	pub fn register_block<F>(&mut self, tag: impl Into<String>, handler: F) -> &mut Self
	where
		F: Fn(&Attributes, &str) -> HandlerResult + Send + Sync + 'static,
	{
		self.register_block_handler(tag, handler)
	}

	pub fn register_block_handler(
		&mut self,
		tag: impl Into<String>,
		handler: impl BlockHandler + 'static,
	) -> &mut Self {
		let tag = tag.into();
		if self.blocks.insert(tag.clone(), Box::new(handler)).is_some() {
			tracing::debug!(tag = %tag, "replaced block handler");
		}
		self
	}

	pub fn register_value<F>(&mut self, tag: impl Into<String>, handler: F) -> &mut Self
	where
		F: Fn(&Attributes, &str) -> HandlerResult + Send + Sync + 'static,
	{
		self.register_value_handler(tag, handler)
	}

	pub fn register_value_handler(
		&mut self,
		tag: impl Into<String>,
		handler: impl ValueHandler + 'static,
	) -> &mut Self {
		let tag = tag.into();
		if self.values.insert(tag.clone(), Box::new(handler)).is_some() {
			tracing::debug!(tag = %tag, "replaced value handler");
		}
		self
	}

	/// Hooks run in registration order around every handler call.
	pub fn add_hook(&mut self, hook: impl CompileHook + 'static) -> &mut Self {
		self.hooks.push(Box::new(hook));
		self
	}

	pub fn is_block(&self, tag: &str) -> bool {
		self.blocks.contains_key(tag)
	}

	pub fn is_value(&self, tag: &str) -> bool {
		self.values.contains_key(tag)
	}

	/// Whether `tag` has a handler of either kind.
	pub fn is_registered(&self, tag: &str) -> bool {
		self.is_block(tag) || self.is_value(tag)
	}

	/// Registered block tags, sorted.
	pub fn block_tags(&self) -> Vec<&str> {
		let mut tags: Vec<&str> = self.blocks.keys().map(String::as_str).collect();
		tags.sort_unstable();
		tags
	}

	/// Registered value tags, sorted.
	pub fn value_tags(&self) -> Vec<&str> {
		let mut tags: Vec<&str> = self.values.keys().map(String::as_str).collect();
		tags.sort_unstable();
		tags
	}

	/// Build the node tree for `source`. Tags without a handler are kept as
	/// text.
	pub fn parse(&self, source: &str) -> TplResult<Template> {
		build_template(self, source)
	}

	/// Run the block handler for `tag`. An unregistered tag compiles to `""`.
	pub fn compile_block(
		&self,
		tag: &str,
		attrs: &Attributes,
		content: String,
	) -> TplResult<String> {
		let Some(handler) = self.blocks.get(tag) else {
			tracing::debug!(tag, "no block handler registered");
			return Ok(String::new());
		};

		tracing::trace!(tag, %attrs, "compiling block");

		if self.hooks.is_empty() {
			return handler
				.compile(attrs, &content)
				.map_err(|error| handler_error(tag, attrs, error));
		}

		let mut attrs = attrs.clone();
		let mut content = content;
		let mut output = String::new();

		for hook in &self.hooks {
			output.push_str(&hook.before_block(tag, &mut attrs));
		}

		for hook in &self.hooks {
			hook.inside_block(tag, &mut attrs, &mut content);
		}

		let compiled = handler
			.compile(&attrs, &content)
			.map_err(|error| handler_error(tag, &attrs, error))?;
		output.push_str(&compiled);

		for hook in &self.hooks {
			output.push_str(&hook.after_block(tag, &attrs));
		}

		Ok(output)
	}

	/// Run the value handler for `tag`. An unregistered tag compiles to `""`.
	pub fn compile_value(
		&self,
		tag: &str,
		attrs: &Attributes,
		raw_attrs: &str,
	) -> TplResult<String> {
		let Some(handler) = self.values.get(tag) else {
			tracing::debug!(tag, "no value handler registered");
			return Ok(String::new());
		};

		tracing::trace!(tag, %attrs, "compiling value");

		if self.hooks.is_empty() {
			return handler
				.compile(attrs, raw_attrs)
				.map_err(|error| handler_error(tag, attrs, error));
		}

		let mut attrs = attrs.clone();
		let mut output = String::new();

		for hook in &self.hooks {
			output.push_str(&hook.before_value(tag, &mut attrs));
		}

		let compiled = handler
			.compile(&attrs, raw_attrs)
			.map_err(|error| handler_error(tag, &attrs, error))?;
		output.push_str(&compiled);

		for hook in &self.hooks {
			output.push_str(&hook.after_value(tag, &attrs));
		}

		Ok(output)
	}

	/// A fresh compile context without a template loader.
	pub fn context(&self) -> CompileContext<'_> {
		CompileContext::new(self)
	}

	/// Compile a parsed template. The block-inheritance stack is reset first so
	/// nothing leaks between documents.
	pub fn compile_document(&self, template: &Template) -> TplResult<String> {
		self.context().compile_document(template)
	}

	/// Parse and compile a single template source.
	pub fn compile_str(&self, source: &str) -> TplResult<String> {
		let template = self.parse(source)?;
		self.compile_document(&template)
	}

	/// Load, parse and compile the template `name`, following `extends` and
	/// `include` through `loader`.
	pub fn compile_template(&self, loader: &dyn TemplateLoader, name: &str) -> TplResult<String> {
		CompileContext::new(self)
			.with_loader(loader)
			.compile_template(name)
	}
}

fn handler_error(tag: &str, attrs: &Attributes, error: HandlerError) -> TplError {
	TplError::Handler {
		tag: tag.to_string(),
		attributes: attrs.to_string(),
		reason: error.to_string(),
	}
}
