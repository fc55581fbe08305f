use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum TplError {
	#[error(transparent)]
	#[diagnostic(code(tplc::io_error))]
	Io(#[from] std::io::Error),

	#[error("unexpected closing tag `</tpl:{found}>` at {line}:{column}, `<tpl:{open}>` is still open")]
	#[diagnostic(
		code(tplc::mismatched_closing_tag),
		help("close `<tpl:{open}>` with `</tpl:{open}>` before closing `<tpl:{found}>`")
	)]
	MismatchedClosingTag {
		found: String,
		open: String,
		line: usize,
		column: usize,
	},

	#[error("unexpected closing tag `</tpl:{found}>` at {line}:{column}, no block is open")]
	#[diagnostic(
		code(tplc::unexpected_closing_tag),
		help("remove the closing tag or add a matching `<tpl:{found}>`")
	)]
	UnexpectedClosingTag {
		found: String,
		line: usize,
		column: usize,
	},

	#[error("handler for `{tag}` failed: {reason}")]
	#[diagnostic(code(tplc::handler), help("tag attributes: {attributes}"))]
	Handler {
		tag: String,
		attributes: String,
		reason: String,
	},

	#[error("`{{{{tpl:parent}}}}` used outside of a `<tpl:Block>` definition")]
	#[diagnostic(
		code(tplc::no_active_block),
		help("move the parent marker inside a `<tpl:Block name=\"…\">` definition")
	)]
	NoActiveBlock,

	#[error("block `{name}` refers to itself while it is being compiled")]
	#[diagnostic(code(tplc::inheritance_cycle))]
	InheritanceCycle { name: String },

	#[error("template nesting is deeper than {limit} levels")]
	#[diagnostic(
		code(tplc::depth_exceeded),
		help("check for templates that extend or include each other, or raise `max_depth` in tplc.toml")
	)]
	DepthExceeded { limit: usize },

	#[error("`<tpl:{tag}>` at {line}:{column} is nested deeper than {limit} blocks")]
	#[diagnostic(
		code(tplc::nesting_too_deep),
		help("flatten the template or raise `max_depth` in tplc.toml")
	)]
	NestingTooDeep {
		tag: String,
		limit: usize,
		line: usize,
		column: usize,
	},

	#[error("template not found: `{name}`")]
	#[diagnostic(
		code(tplc::template_not_found),
		help("add the directory containing the template to `[templates] paths` in tplc.toml")
	)]
	TemplateNotFound { name: String },

	#[error("`{tag}` needs a template loader")]
	#[diagnostic(
		code(tplc::no_loader),
		help("compile through `Compiler::compile_template` with a `TemplateLoader`")
	)]
	NoLoader { tag: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(tplc::config_parse),
		help("check that tplc.toml is valid TOML")
	)]
	ConfigParse(String),
}

pub type TplResult<T> = Result<T, TplError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
