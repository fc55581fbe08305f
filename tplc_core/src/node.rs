use serde::Serialize;

use crate::Attributes;
use crate::CompileContext;
use crate::TplResult;

/// A node of the template tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
#[non_exhaustive]
pub enum Node {
	/// Literal text, emitted verbatim.
	Text { content: String },
	/// `{{tpl:Tag attrs}}`. The raw attribute text is kept for handlers that
	/// interpret it themselves.
	Value {
		tag: String,
		attrs: Attributes,
		raw_attrs: String,
	},
	/// `<tpl:Tag attrs>…</tpl:Tag>`. Only a closed block produces output.
	Block {
		tag: String,
		attrs: Attributes,
		children: Vec<Node>,
		closed: bool,
	},
	/// `<tpl:Block name="…">…</tpl:Block>`. Its children live on the
	/// inheritance stack, the node only knows which name to resolve.
	BlockDefinition {
		tag: String,
		name: String,
		attrs: Attributes,
		closed: bool,
	},
	/// `{{tpl:parent}}`
	Parent,
	/// `{{tpl:include src="…"}}`
	Include { attrs: Attributes },
}

impl Node {
	pub fn text(content: impl Into<String>) -> Self {
		Self::Text {
			content: content.into(),
		}
	}

	/// The tag name for tag nodes.
	pub fn tag(&self) -> Option<&str> {
		match self {
			Self::Value { tag, .. } | Self::Block { tag, .. } | Self::BlockDefinition { tag, .. } => {
				Some(tag)
			}
			Self::Text { .. } | Self::Parent | Self::Include { .. } => None,
		}
	}

	pub fn children(&self) -> &[Node] {
		match self {
			Self::Block { children, .. } => children,
			_ => &[],
		}
	}

	pub fn compile(&self, ctx: &mut CompileContext<'_>) -> TplResult<String> {
		match self {
			Self::Text { content } => Ok(content.clone()),
			Self::Value {
				tag,
				attrs,
				raw_attrs,
			} => ctx.compiler().compile_value(tag, attrs, raw_attrs),
			Self::Block { closed: false, .. } | Self::BlockDefinition { closed: false, .. } => {
				Ok(String::new())
			}
			Self::Block {
				tag,
				attrs,
				children,
				..
			} => {
				let content = compile_nodes(children, ctx)?;
				ctx.compiler().compile_block(tag, attrs, content)
			}
			Self::BlockDefinition {
				tag, name, attrs, ..
			} => {
				let content = ctx.resolve(name)?;
				ctx.compiler().compile_block(tag, attrs, content)
			}
			Self::Parent => ctx.render_parent(),
			Self::Include { attrs } => ctx.include(attrs),
		}
	}
}

/// Compile `nodes` in order and concatenate the output.
pub fn compile_nodes(nodes: &[Node], ctx: &mut CompileContext<'_>) -> TplResult<String> {
	let mut output = String::new();
	for node in nodes {
		output.push_str(&node.compile(ctx)?);
	}

	Ok(output)
}
