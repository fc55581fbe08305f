use std::fmt::Write as _;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use tplc_cli::Commands;
use tplc_cli::LOG_ENV;
use tplc_cli::TplcCli;
use tplc_cli::TreeFormat;
use tplc_core::AnyEmptyResult;
use tplc_core::AnyResult;
use tplc_core::Attributes;
use tplc_core::Compiler;
use tplc_core::CompilerConfig;
use tplc_core::FileLoader;
use tplc_core::Node;
use tplc_core::Template;
use tplc_core::TemplateLoader;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = TplcCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Compile { name, output }) => run_compile(&args, name, output.as_ref()),
		Some(Commands::Tree { name, format }) => run_tree(&args, name, *format),
		Some(Commands::Check { name }) => run_check(&args, name),
		None => {
			eprintln!("No subcommand specified. Run `tplc --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		match e.downcast::<tplc_core::TplError>() {
			Ok(tpl_err) => {
				let report: miette::Report = (*tpl_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Log to stderr, filtered by `TPLC_LOG` when it is set.
fn init_tracing(verbose: bool, use_color: bool) {
	let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("tplc_core=debug,warn")
		} else {
			EnvFilter::new("warn")
		}
	});

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.without_time()
		.init();
}

fn resolve_root(args: &TplcCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// The compiler and loader for the project at `--path`.
fn load_project(args: &TplcCli) -> AnyResult<(Compiler, FileLoader)> {
	let root = resolve_root(args);
	let config = CompilerConfig::load(&root)?.unwrap_or_default();
	let loader = FileLoader::new(config.template_paths(&root));
	tracing::debug!(paths = ?loader.paths(), "template search paths");

	Ok((Compiler::with_config(config), loader))
}

fn run_compile(args: &TplcCli, name: &str, output: Option<&PathBuf>) -> AnyEmptyResult {
	let (compiler, loader) = load_project(args)?;
	let compiled = compiler.compile_template(&loader, name)?;

	match output {
		Some(path) => {
			std::fs::write(path, &compiled)?;
			println!(
				"{} compiled `{name}` into {}",
				colored!("✓", green),
				path.display()
			);
		}
		None => print!("{compiled}"),
	}

	Ok(())
}

fn run_tree(args: &TplcCli, name: &str, format: TreeFormat) -> AnyEmptyResult {
	let (compiler, loader) = load_project(args)?;
	let loaded = loader.load(name, 0)?;
	let template = compiler.parse(&loaded.source)?;

	match format {
		TreeFormat::Text => {
			print!("{}", render_tree(&template));
			for diagnostic in &template.diagnostics {
				eprintln!("{} {diagnostic}", colored!("warning:", yellow));
			}
		}
		TreeFormat::Json => println!("{}", serde_json::to_string_pretty(&template)?),
	}

	Ok(())
}

fn run_check(args: &TplcCli, name: &str) -> AnyEmptyResult {
	let (compiler, loader) = load_project(args)?;
	let mut ctx = compiler.context().with_loader(&loader);
	ctx.compile_template(name)?;

	let diagnostics = ctx.diagnostics();
	if diagnostics.is_empty() {
		println!("{} `{name}` has no problems", colored!("✓", green));
		return Ok(());
	}

	for diagnostic in diagnostics {
		println!("{} {diagnostic}", colored!("warning:", yellow));
	}

	println!();
	println!(
		"{} problem(s) found in `{name}` and the templates it uses",
		diagnostics.len()
	);
	process::exit(1);
}

/// An indented outline of the template: its `extends` target, the root nodes
/// and the children of every block definition.
fn render_tree(template: &Template) -> String {
	let mut out = String::new();

	if let Some(parent) = &template.extends {
		let _ = writeln!(out, "extends {parent}");
	}

	write_nodes(&mut out, &template.nodes, 0);

	for definition in &template.definitions {
		let _ = writeln!(out, "definition {:?}", definition.name);
		write_nodes(&mut out, &definition.children, 1);
	}

	out
}

fn write_nodes(out: &mut String, nodes: &[Node], depth: usize) {
	let indent = "  ".repeat(depth);

	for node in nodes {
		let line = match node {
			Node::Text { content } => format!("text {content:?}"),
			Node::Value { tag, attrs, .. } => format!("value {}", label(tag, attrs)),
			Node::Block {
				tag, attrs, closed, ..
			} => format!("block {}{}", label(tag, attrs), unclosed(*closed)),
			Node::BlockDefinition { name, closed, .. } => {
				format!("block {name:?}{}", unclosed(*closed))
			}
			Node::Parent => "parent".to_string(),
			Node::Include { attrs } => format!("include {attrs}"),
			_ => format!("{node:?}"),
		};

		let _ = writeln!(out, "{indent}{line}");
		write_nodes(out, node.children(), depth + 1);
	}
}

fn label(tag: &str, attrs: &Attributes) -> String {
	if attrs.is_empty() {
		tag.to_string()
	} else {
		format!("{tag} {attrs}")
	}
}

fn unclosed(closed: bool) -> &'static str {
	if closed { "" } else { " (unclosed)" }
}
