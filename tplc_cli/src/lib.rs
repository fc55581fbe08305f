use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

/// Environment variable holding the `tracing` filter for the CLI.
pub const LOG_ENV: &str = "TPLC_LOG";

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Compile and inspect `<tpl:…>` theme templates.",
	long_about = "tplc compiles Dotclear-style theme templates. Block tags \
	              (`<tpl:Entries>…</tpl:Entries>`), value tags (`{{tpl:EntryTitle}}`) and \
	              overridable block definitions (`<tpl:Block name=\"…\">`) are resolved through \
	              the configured template paths, following `extends` and `include`.\n\nTags \
	              without a handler are kept as they are, so `tplc compile` flattens theme \
	              inheritance and leaves domain tags for the CMS.\n\nQuick start:\n  tplc \
	              compile home.html  Print the flattened template\n  tplc tree home.html     \
	              Show the parsed node tree\n  tplc check home.html    Report template problems"
)]
pub struct TplcCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the directory holding `tplc.toml` and the templates.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Compile a template and print the result.
	///
	/// The template is looked up in the configured `[templates] paths`, in
	/// order. Block definitions are resolved, `extends` and `include` are
	/// followed and every other tag is kept verbatim.
	Compile {
		/// Name of the template relative to the template paths.
		name: String,

		/// Write the compiled template to this file instead of stdout.
		#[arg(long, short)]
		output: Option<PathBuf>,
	},
	/// Print the parsed node tree of a template.
	Tree {
		/// Name of the template relative to the template paths.
		name: String,

		/// Output format. Use `text` for an indented outline or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = TreeFormat::Text)]
		format: TreeFormat,
	},
	/// Compile a template and report parse diagnostics.
	///
	/// Exits with status 1 when a diagnostic is found in the template or in
	/// any template it extends or includes.
	Check {
		/// Name of the template relative to the template paths.
		name: String,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TreeFormat {
	/// Indented outline of the nodes.
	Text,
	/// The parsed template as JSON.
	Json,
}
