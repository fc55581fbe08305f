use std::collections::HashMap;

use crate::Node;
use crate::TplError;
use crate::TplResult;

/// One registered definition of a named block.
#[derive(Debug, Clone, PartialEq)]
enum Slot {
	/// Children waiting to be compiled.
	Pending(Vec<Node>),
	/// Taken out of the stack while its children are compiled.
	Compiling,
	/// Memoized output.
	Compiled(String),
}

#[derive(Debug, Default)]
struct Entry {
	/// Index of the definition the next resolution reads. Raised by one while
	/// a definition compiles, so `{{tpl:parent}}` inside it reads the next one.
	position: usize,
	definitions: Vec<Slot>,
}

/// What [`BlockStack::take`] found for a name.
#[derive(Debug, PartialEq)]
pub(crate) enum Lookup {
	/// Nothing registered at the current position.
	Missing,
	Compiled(String),
	/// The children to compile, which must be handed back through
	/// [`BlockStack::memoize`].
	Pending { index: usize, children: Vec<Node> },
}

/// The block-inheritance stack of one compile run.
///
/// Every closed `<tpl:Block name="…">` registers its children here, in the
/// order the definitions were closed (a child template's definitions before
/// its parent's). Resolving a name compiles the definition at the name's
/// current position, which is the overriding one; while it compiles, the
/// position is raised so that `{{tpl:parent}}` resolves to the overridden
/// definition. Compiled definitions are memoized.
///
/// The stack belongs to a [`CompileContext`](crate::CompileContext) and must
/// be [`reset`](Self::reset) between independent documents.
#[derive(Debug, Default)]
pub struct BlockStack {
	entries: HashMap<String, Entry>,
	/// The name whose definition is currently being compiled.
	current: Option<String>,
}

impl BlockStack {
	pub fn new() -> Self {
		Self::default()
	}

	/// Append the children of a closed definition of `name`.
	pub fn register_closing(&mut self, name: impl Into<String>, children: Vec<Node>) {
		self.entries
			.entry(name.into())
			.or_default()
			.definitions
			.push(Slot::Pending(children));
	}

	/// Forget every definition and the active resolution.
	pub fn reset(&mut self) {
		self.entries.clear();
		self.current = None;
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// The name currently being resolved, if any.
	pub fn current(&self) -> Option<&str> {
		self.current.as_deref()
	}

	pub fn position(&self, name: &str) -> usize {
		self.entries.get(name).map_or(0, |entry| entry.position)
	}

	/// The number of definitions registered for `name`.
	pub fn definition_count(&self, name: &str) -> usize {
		self.entries
			.get(name)
			.map_or(0, |entry| entry.definitions.len())
	}

	/// Whether the definition at `index` for `name` has been compiled.
	pub fn is_compiled(&self, name: &str, index: usize) -> bool {
		self.entries
			.get(name)
			.and_then(|entry| entry.definitions.get(index))
			.is_some_and(|definition| matches!(definition, Slot::Compiled(_)))
	}

	/// Look up the definition at the current position of `name`. Pending
	/// children are moved out and the slot is marked as compiling.
	pub(crate) fn take(&mut self, name: &str) -> TplResult<Lookup> {
		let Some(entry) = self.entries.get_mut(name) else {
			return Ok(Lookup::Missing);
		};

		let index = entry.position;
		let Some(definition) = entry.definitions.get_mut(index) else {
			return Ok(Lookup::Missing);
		};

		match std::mem::replace(definition, Slot::Compiling) {
			Slot::Pending(children) => Ok(Lookup::Pending { index, children }),
			Slot::Compiled(content) => {
				let lookup = Lookup::Compiled(content.clone());
				*definition = Slot::Compiled(content);
				Ok(lookup)
			}
			Slot::Compiling => {
				Err(TplError::InheritanceCycle {
					name: name.to_string(),
				})
			}
		}
	}

	/// Start compiling a definition of `name`. Returns the previously active
	/// name, to be handed back to [`leave`](Self::leave).
	pub(crate) fn enter(&mut self, name: &str) -> Option<String> {
		if let Some(entry) = self.entries.get_mut(name) {
			entry.position += 1;
		}

		self.current.replace(name.to_string())
	}

	pub(crate) fn leave(&mut self, name: &str, previous: Option<String>) {
		if let Some(entry) = self.entries.get_mut(name) {
			entry.position = entry.position.saturating_sub(1);
		}

		self.current = previous;
	}

	pub(crate) fn memoize(&mut self, name: &str, index: usize, content: String) {
		if let Some(definition) = self
			.entries
			.get_mut(name)
			.and_then(|entry| entry.definitions.get_mut(index))
		{
			*definition = Slot::Compiled(content);
		}
	}
}
