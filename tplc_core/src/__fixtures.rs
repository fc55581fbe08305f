use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use rstest::fixture;

use crate::Attributes;
use crate::CompileHook;
use crate::Compiler;
use crate::CompilerConfig;
use crate::HandlerError;
use crate::MemoryLoader;

/// A compiler with a handful of blog-like tags.
#[fixture]
pub fn blog_compiler() -> Compiler {
	let mut compiler = Compiler::new();
	register_blog_tags(&mut compiler);
	compiler
}

pub fn register_blog_tags(compiler: &mut Compiler) {
	compiler
		.register_block("Entries", |_, content| Ok(format!("<loop>{content}</loop>")))
		.register_block("If", |attrs, content| {
			if attrs.is_blank("cond") {
				return Err(HandlerError::new("missing cond attribute"));
			}

			Ok(format!("<if {}>{content}</if>", attrs.get("cond")))
		})
		.register_block("Upper", |_, content| Ok(content.to_uppercase()))
		.register_value("EntryTitle", |_, _| Ok("<?= $title ?>".into()))
		.register_value("Lang", |_, raw| Ok(format!("[{raw}]")));
}

/// A compiler whose `Count` value tag reports how often it has been called.
pub fn counting_compiler() -> (Compiler, Arc<AtomicUsize>) {
	let calls = Arc::new(AtomicUsize::new(0));
	let mut compiler = Compiler::new();
	register_blog_tags(&mut compiler);
	let counter = Arc::clone(&calls);
	compiler.register_value("Count", move |_, _| {
		let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
		Ok(call.to_string())
	});

	(compiler, calls)
}

pub fn compiler_with_config(config: CompilerConfig) -> Compiler {
	let mut compiler = Compiler::with_config(config);
	register_blog_tags(&mut compiler);
	compiler
}

/// Wraps blocks in marker comments, injects a default condition into `If`
/// and suffixes values.
pub struct DecoratingHook;

impl CompileHook for DecoratingHook {
	fn before_block(&self, tag: &str, _attrs: &mut Attributes) -> String {
		format!("<!--b:{tag}-->")
	}

	fn inside_block(&self, tag: &str, attrs: &mut Attributes, _content: &mut String) {
		if tag == "If" && !attrs.is_set("cond") {
			attrs.set("cond", "injected");
		}
	}

	fn after_value(&self, _tag: &str, _attrs: &Attributes) -> String {
		"!".into()
	}
}

/// A theme with a layout, a page extending it and a header partial.
#[fixture]
pub fn theme_loader() -> MemoryLoader {
	MemoryLoader::new().with_layer([
		(
			"layout.html",
			r#"<html><tpl:Block name="content">Default</tpl:Block></html>"#,
		),
		(
			"home.html",
			r#"{{tpl:extends parent="layout.html"}}<tpl:Block name="content">Home {{tpl:parent}}</tpl:Block>"#,
		),
		(
			"body.html",
			r#"<body>{{tpl:include src="header.html"}}</body>"#,
		),
		("header.html", "<header>{{tpl:EntryTitle}}</header>"),
		("a.html", r#"A{{tpl:include src="b.html"}}"#),
		("b.html", r#"B{{tpl:include src="a.html"}}"#),
		("self.html", r#"x{{tpl:include src="self.html"}}"#),
		(
			"titled.html",
			r#"<tpl:Block name="title">Home</tpl:Block>{{tpl:include src="part.html"}}"#,
		),
		("part.html", r#"<tpl:Block name="title">Part</tpl:Block>"#),
		("blank.html", r#"[{{tpl:include}}]"#),
		("missing.html", r#"{{tpl:include src="nope.html"}}"#),
		("loop.html", r#"{{tpl:extends parent="loop.html"}}"#),
	])
}
