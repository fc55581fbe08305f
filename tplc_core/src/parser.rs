use serde::Serialize;

use crate::Attributes;
use crate::Compiler;
use crate::DEFINITION_TAG;
use crate::EXTENDS_TAG;
use crate::INCLUDE_TAG;
use crate::Node;
use crate::PARENT_TAG;
use crate::Point;
use crate::Position;
use crate::TplError;
use crate::TplResult;
use crate::lexer::tokenize;
use crate::tokens::Fragment;

/// A problem found while parsing that does not stop compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
#[non_exhaustive]
pub enum ParseDiagnostic {
	/// A block was opened but never closed. Its content is dropped.
	UnclosedBlock {
		tag: String,
		line: usize,
		column: usize,
	},
	/// A `<tpl:Block>` without a `name` attribute. It is registered under the
	/// empty name.
	UnnamedBlock { line: usize, column: usize },
	/// A second `extends` marker. Only the first one is used.
	IgnoredExtends {
		parent: String,
		line: usize,
		column: usize,
	},
}

impl std::fmt::Display for ParseDiagnostic {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::UnclosedBlock { tag, line, column } => {
				write!(
					f,
					"{line}:{column}: did not find closing tag for block <tpl:{tag}>, content has \
					 been ignored"
				)
			}
			Self::UnnamedBlock { line, column } => {
				write!(f, "{line}:{column}: <tpl:{DEFINITION_TAG}> has no name attribute")
			}
			Self::IgnoredExtends {
				parent,
				line,
				column,
			} => {
				write!(
					f,
					"{line}:{column}: template already extends another template, `{parent}` is \
					 ignored"
				)
			}
		}
	}
}

/// The children of a closed `<tpl:Block name="…">`, in the order the
/// definitions were closed in the source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Definition {
	pub name: String,
	pub children: Vec<Node>,
}

/// A parsed template: the node tree plus everything collected while building
/// it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Template {
	/// Top-level nodes.
	pub nodes: Vec<Node>,
	/// Block definitions to register on the inheritance stack before the
	/// nodes are compiled.
	pub definitions: Vec<Definition>,
	/// The template this one extends, from `{{tpl:extends parent="…"}}`.
	pub extends: Option<String>,
	pub diagnostics: Vec<ParseDiagnostic>,
}

/// A block that has been opened but not yet closed.
struct OpenBlock {
	tag: String,
	attrs: Attributes,
	/// The definition name when this is a `<tpl:Block>`.
	definition: Option<String>,
	children: Vec<Node>,
	position: Position,
}

/// Builds the node tree from lexer fragments using an explicit stack of open
/// blocks.
struct TreeBuilder<'c> {
	compiler: &'c Compiler,
	stack: Vec<OpenBlock>,
	template: Template,
}

impl<'c> TreeBuilder<'c> {
	fn new(compiler: &'c Compiler) -> Self {
		Self {
			compiler,
			stack: vec![],
			template: Template::default(),
		}
	}

	fn push_node(&mut self, node: Node) {
		let nodes = match self.stack.last_mut() {
			Some(open) => &mut open.children,
			None => &mut self.template.nodes,
		};

		nodes.push(node);
	}

	/// Append literal text, merging it with a directly preceding text node.
	fn push_text(&mut self, text: &str) {
		let nodes = match self.stack.last_mut() {
			Some(open) => &mut open.children,
			None => &mut self.template.nodes,
		};

		if let Some(Node::Text { content }) = nodes.last_mut() {
			content.push_str(text);
		} else {
			nodes.push(Node::text(text));
		}
	}

	fn open(
		&mut self,
		name: &str,
		raw: &str,
		self_closing: bool,
		position: Position,
	) -> TplResult<()> {
		let limit = self.compiler.config().max_depth;
		if !self_closing && self.stack.len() >= limit {
			return Err(TplError::NestingTooDeep {
				tag: name.to_string(),
				limit,
				line: position.start.line,
				column: position.start.column,
			});
		}

		let attrs = Attributes::parse(raw);
		let definition = if name == DEFINITION_TAG {
			if attrs.is_blank("name") {
				self.template
					.diagnostics
					.push(ParseDiagnostic::UnnamedBlock {
						line: position.start.line,
						column: position.start.column,
					});
			}
			Some(attrs.get("name").to_string())
		} else {
			None
		};

		let open = OpenBlock {
			tag: name.to_string(),
			attrs,
			definition,
			children: vec![],
			position,
		};

		if self_closing {
			self.close_block(open);
		} else {
			self.stack.push(open);
		}

		Ok(())
	}

	fn close(&mut self, name: &str, position: Position) -> TplResult<()> {
		let Some(open) = self.stack.pop() else {
			return Err(TplError::UnexpectedClosingTag {
				found: name.to_string(),
				line: position.start.line,
				column: position.start.column,
			});
		};

		if open.tag != name {
			return Err(TplError::MismatchedClosingTag {
				found: name.to_string(),
				open: open.tag,
				line: position.start.line,
				column: position.start.column,
			});
		}

		self.close_block(open);
		Ok(())
	}

	/// Turn a closed block into a node. A definition hands its children over
	/// to the template's definition list.
	fn close_block(&mut self, open: OpenBlock) {
		let node = match open.definition {
			Some(name) => {
				self.template.definitions.push(Definition {
					name: name.clone(),
					children: open.children,
				});

				Node::BlockDefinition {
					tag: open.tag,
					name,
					attrs: open.attrs,
					closed: true,
				}
			}
			None => {
				Node::Block {
					tag: open.tag,
					attrs: open.attrs,
					children: open.children,
					closed: true,
				}
			}
		};

		self.push_node(node);
	}

	fn value(&mut self, name: &str, raw: &str, text: &str, position: Position) {
		if name.eq_ignore_ascii_case(PARENT_TAG) {
			self.push_node(Node::Parent);
		} else if name.eq_ignore_ascii_case(EXTENDS_TAG) {
			let attrs = Attributes::parse(raw);
			if attrs.is_blank("parent") {
				return;
			}

			let parent = attrs.get("parent").to_string();
			if self.template.extends.is_some() {
				self.template
					.diagnostics
					.push(ParseDiagnostic::IgnoredExtends {
						parent,
						line: position.start.line,
						column: position.start.column,
					});
			} else {
				self.template.extends = Some(parent);
			}
		} else if name.eq_ignore_ascii_case(INCLUDE_TAG) {
			self.push_node(Node::Include {
				attrs: Attributes::parse(raw),
			});
		} else if self.compiler.is_value(name) {
			self.push_node(Node::Value {
				tag: name.to_string(),
				attrs: Attributes::parse(raw),
				raw_attrs: raw.trim_start().to_string(),
			});
		} else {
			tracing::debug!(tag = name, "passing through unknown value tag");
			self.push_text(text);
		}
	}

	/// Unwind blocks that were never closed. They stay in the tree, marked as
	/// unclosed, and compile to nothing.
	fn finish(mut self) -> Template {
		while let Some(open) = self.stack.pop() {
			tracing::warn!(
				tag = %open.tag,
				line = open.position.start.line,
				column = open.position.start.column,
				"block is never closed"
			);

			self.template
				.diagnostics
				.push(ParseDiagnostic::UnclosedBlock {
					tag: open.tag.clone(),
					line: open.position.start.line,
					column: open.position.start.column,
				});

			let node = match open.definition {
				Some(name) => {
					Node::BlockDefinition {
						tag: open.tag,
						name,
						attrs: open.attrs,
						closed: false,
					}
				}
				None => {
					Node::Block {
						tag: open.tag,
						attrs: open.attrs,
						children: open.children,
						closed: false,
					}
				}
			};

			self.push_node(node);
		}

		self.template
	}
}

/// Parse template source into a [`Template`], recognizing only the tags that
/// `compiler` has handlers for (plus the built-in ones).
pub(crate) fn build_template(compiler: &Compiler, source: &str) -> TplResult<Template> {
	let fragments = tokenize(source, compiler.config().strip_comments);
	let mut builder = TreeBuilder::new(compiler);
	let mut cursor = Point::default();

	for spanned in &fragments {
		// Stripped comments leave gaps between fragments.
		cursor.advance_str(&source[cursor.offset..spanned.span.start]);
		let text = spanned.text(source);
		let position = Position::spanning(cursor, text);
		cursor = position.end;

		match spanned.fragment {
			Fragment::Text | Fragment::Comment => builder.push_text(text),
			Fragment::Open {
				name,
				attrs,
				self_closing,
			} => {
				if compiler.is_block(name) {
					builder.open(name, attrs, self_closing, position)?;
				} else {
					tracing::debug!(tag = name, "passing through unknown block tag");
					builder.push_text(text);
				}
			}
			Fragment::Close { name } => {
				if compiler.is_block(name) {
					builder.close(name, position)?;
				} else {
					builder.push_text(text);
				}
			}
			Fragment::Value { name, attrs } => builder.value(name, attrs, text, position),
		}
	}

	Ok(builder.finish())
}
