use std::ops::Range;

/// A lexical piece of template source. Tag fragments borrow their name and
/// raw attribute text from the source; whether a tag is actually known is
/// decided later by the tree builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'s> {
	/// Literal text between tags.
	Text,
	/// `<tpl:Name attrs>` or, with `self_closing`, `<tpl:Name attrs/>`.
	Open {
		name: &'s str,
		attrs: &'s str,
		self_closing: bool,
	},
	/// `</tpl:Name>`
	Close { name: &'s str },
	/// `{{tpl:Name attrs}}`
	Value { name: &'s str, attrs: &'s str },
	/// `<!-- # comment -->`
	Comment,
}

/// A fragment together with the byte range it covers in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<'s> {
	pub fragment: Fragment<'s>,
	pub span: Range<usize>,
}

impl<'s> Spanned<'s> {
	pub fn new(fragment: Fragment<'s>, span: Range<usize>) -> Self {
		Self { fragment, span }
	}

	/// The exact source text of this fragment.
	pub fn text<'a>(&self, source: &'a str) -> &'a str {
		&source[self.span.clone()]
	}
}
