use crate::Attributes;
use crate::BlockStack;
use crate::Compiler;
use crate::EXTENDS_TAG;
use crate::INCLUDE_TAG;
use crate::LoadedTemplate;
use crate::PARENT_TEMPLATE;
use crate::ParseDiagnostic;
use crate::Template;
use crate::TemplateLoader;
use crate::TplError;
use crate::TplResult;
use crate::inheritance::Lookup;
use crate::node::compile_nodes;

/// The state of one compile run: the block-inheritance stack, the nesting
/// depth, the chain of included templates and the diagnostics collected from
/// every parsed template.
///
/// A context borrows its [`Compiler`] so any number of runs can share one
/// registry.
pub struct CompileContext<'c> {
	compiler: &'c Compiler,
	loader: Option<&'c dyn TemplateLoader>,
	stack: BlockStack,
	depth: usize,
	/// Names of the templates being compiled, outermost first.
	includes: Vec<String>,
	diagnostics: Vec<ParseDiagnostic>,
}

impl std::fmt::Debug for CompileContext<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CompileContext")
			.field("stack", &self.stack)
			.field("depth", &self.depth)
			.field("includes", &self.includes)
			.field("diagnostics", &self.diagnostics)
			.finish_non_exhaustive()
	}
}

impl<'c> CompileContext<'c> {
	pub fn new(compiler: &'c Compiler) -> Self {
		Self {
			compiler,
			loader: None,
			stack: BlockStack::new(),
			depth: 0,
			includes: vec![],
			diagnostics: vec![],
		}
	}

	/// Resolve `extends` and `include` through `loader`.
	#[must_use]
	pub fn with_loader(mut self, loader: &'c dyn TemplateLoader) -> Self {
		self.loader = Some(loader);
		self
	}

	pub fn compiler(&self) -> &'c Compiler {
		self.compiler
	}

	pub fn stack(&self) -> &BlockStack {
		&self.stack
	}

	/// Diagnostics from every template parsed during the last run, including
	/// extended and included ones.
	pub fn diagnostics(&self) -> &[ParseDiagnostic] {
		&self.diagnostics
	}

	/// Forget everything from a previous run.
	pub fn reset(&mut self) {
		self.stack.reset();
		self.depth = 0;
		self.includes.clear();
		self.diagnostics.clear();
	}

	/// Compile a parsed template as a document of its own.
	pub fn compile_document(&mut self, template: &Template) -> TplResult<String> {
		self.reset();
		tracing::debug!(definitions = template.definitions.len(), "compiling document");

		let output = self.compile_chain(template, None)?;
		Ok(self.annotate(output))
	}

	/// Load and compile the template `name`.
	pub fn compile_template(&mut self, name: &str) -> TplResult<String> {
		self.reset();
		let loader = self.loader.ok_or_else(|| {
			TplError::NoLoader {
				tag: name.to_string(),
			}
		})?;

		let loaded = loader.load(name, 0)?;
		let template = self.compiler.parse(&loaded.source)?;
		tracing::debug!(name, origin = loaded.origin, "compiling template");

		self.includes.push(loaded.name.clone());
		let output = self.compile_chain(&template, Some(&loaded))?;
		Ok(self.annotate(output))
	}

	/// Register the definitions of `template` and follow its `extends`
	/// marker. The output is the compiled root of the chain.
	fn compile_chain(
		&mut self,
		template: &Template,
		loaded: Option<&LoadedTemplate>,
	) -> TplResult<String> {
		self.diagnostics
			.extend(template.diagnostics.iter().cloned());

		for definition in &template.definitions {
			self.stack
				.register_closing(definition.name.clone(), definition.children.clone());
		}

		let Some(parent) = &template.extends else {
			return compile_nodes(&template.nodes, self);
		};

		let loader = self.loader.ok_or_else(|| {
			TplError::NoLoader {
				tag: EXTENDS_TAG.to_string(),
			}
		})?;

		let parent_loaded = if parent == PARENT_TEMPLATE {
			let Some(current) = loaded else {
				return Err(TplError::TemplateNotFound {
					name: parent.clone(),
				});
			};

			loader.load(&current.name, current.origin + 1)?
		} else {
			loader.load(parent, 0)?
		};

		tracing::debug!(
			parent = %parent_loaded.name,
			origin = parent_loaded.origin,
			"following extends"
		);

		let parent_template = self.compiler.parse(&parent_loaded.source)?;
		self.nested(|ctx| ctx.compile_chain(&parent_template, Some(&parent_loaded)))
	}

	/// Compile the definition of `name` at its current position on the
	/// inheritance stack. A name without a definition there compiles to `""`.
	pub fn resolve(&mut self, name: &str) -> TplResult<String> {
		match self.stack.take(name)? {
			Lookup::Missing => {
				tracing::trace!(name, "no definition to resolve");
				Ok(String::new())
			}
			Lookup::Compiled(content) => {
				tracing::trace!(name, "reusing compiled definition");
				Ok(content)
			}
			Lookup::Pending { index, children } => {
				tracing::trace!(name, index, "resolving definition");

				let previous = self.stack.enter(name);
				let result = self.nested(|ctx| compile_nodes(&children, ctx));
				self.stack.leave(name, previous);

				let content = result?;
				self.stack.memoize(name, index, content.clone());
				Ok(content)
			}
		}
	}

	/// Compile the definition overridden by the one currently being resolved.
	pub fn render_parent(&mut self) -> TplResult<String> {
		let Some(name) = self.stack.current().map(str::to_string) else {
			return Err(TplError::NoActiveBlock);
		};

		self.resolve(&name)
	}

	/// Compile the template named by the `src` attribute as an independent
	/// document and return its output.
	pub fn include(&mut self, attrs: &Attributes) -> TplResult<String> {
		let src = attrs.get("src");
		if src.is_empty() {
			tracing::debug!("include without src");
			return Ok(String::new());
		}

		if self.includes.iter().any(|name| name == src) {
			tracing::debug!(src, "template is already being compiled, skipping include");
			return Ok(String::new());
		}

		let loader = self.loader.ok_or_else(|| {
			TplError::NoLoader {
				tag: INCLUDE_TAG.to_string(),
			}
		})?;

		self.nested(|ctx| {
			let loaded = loader.load(src, 0)?;
			let template = ctx.compiler.parse(&loaded.source)?;
			tracing::debug!(src, origin = loaded.origin, "including template");

			let mut includes = ctx.includes.clone();
			includes.push(loaded.name.clone());

			let mut inner = CompileContext {
				compiler: ctx.compiler,
				loader: Some(loader),
				stack: BlockStack::new(),
				depth: ctx.depth,
				includes,
				diagnostics: vec![],
			};

			let output = inner.compile_chain(&template, Some(&loaded))?;
			ctx.diagnostics.append(&mut inner.diagnostics);
			Ok(output)
		})
	}

	/// Run `compile` one level deeper, failing once the configured depth is
	/// reached.
	fn nested<T>(&mut self, compile: impl FnOnce(&mut Self) -> TplResult<T>) -> TplResult<T> {
		let limit = self.compiler.config().max_depth;
		if self.depth >= limit {
			return Err(TplError::DepthExceeded { limit });
		}

		self.depth += 1;
		let result = compile(self);
		self.depth -= 1;
		result
	}

	fn annotate(&self, mut output: String) -> String {
		if !self.compiler.config().annotate || self.diagnostics.is_empty() {
			return output;
		}

		output.push_str("\n<!-- tplc diagnostics:\n");
		for diagnostic in &self.diagnostics {
			output.push_str("  ");
			output.push_str(&diagnostic.to_string());
			output.push('\n');
		}
		output.push_str("-->\n");
		output
	}
}
