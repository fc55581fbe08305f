use std::ops::Range;

use logos::Lexer;
use logos::Logos;

use crate::tokens::Fragment;
use crate::tokens::Spanned;

const TAG_PREFIX: &str = "tpl:";
const CLOSE_PREFIX: &str = "/tpl:";
const VALUE_PREFIX: &str = "{tpl:";
const COMMENT_OPEN: &str = "!-- #";
const COMMENT_CLOSE: &str = "-->";

/// Raw tokens produced by logos. Markup is only ever triggered by a single
/// `<` or `{` byte so that a failed attempt never swallows the start of a
/// real tag; failed attempts surface as errors and are treated as text.
#[derive(Logos, Debug, PartialEq)]
enum RawToken<'s> {
	#[token("<", lex_angle)]
	Angle(Fragment<'s>),
	#[token("{", lex_brace)]
	Brace(Fragment<'s>),
	#[regex(r"[^<{]+")]
	Text,
}

/// The longest prefix of `text` that is a valid tag name.
fn tag_name(text: &str) -> &str {
	let end = text
		.find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
		.unwrap_or(text.len());
	&text[..end]
}

/// Attribute text must be separated from the tag name by whitespace.
fn is_attribute_text(attrs: &str) -> bool {
	attrs.is_empty() || attrs.starts_with(char::is_whitespace)
}

fn lex_angle<'s>(lex: &mut Lexer<'s, RawToken<'s>>) -> Option<Fragment<'s>> {
	let rest = lex.remainder();

	if let Some(after) = rest.strip_prefix(TAG_PREFIX) {
		let name = tag_name(after);
		if name.is_empty() {
			return None;
		}

		let tail = &after[name.len()..];
		let close = tail.find('>')?;
		let inner = &tail[..close];
		let (attrs, self_closing) = match inner.strip_suffix('/') {
			Some(attrs) => (attrs, true),
			None => (inner, false),
		};

		if !is_attribute_text(attrs) {
			return None;
		}

		lex.bump(TAG_PREFIX.len() + name.len() + close + 1);
		return Some(Fragment::Open {
			name,
			attrs,
			self_closing,
		});
	}

	if let Some(after) = rest.strip_prefix(CLOSE_PREFIX) {
		let name = tag_name(after);
		if name.is_empty() || !after[name.len()..].starts_with('>') {
			return None;
		}

		lex.bump(CLOSE_PREFIX.len() + name.len() + 1);
		return Some(Fragment::Close { name });
	}

	if let Some(after) = rest.strip_prefix(COMMENT_OPEN) {
		let end = memstr(after.as_bytes(), COMMENT_CLOSE.as_bytes())?;
		lex.bump(COMMENT_OPEN.len() + end + COMMENT_CLOSE.len());
		return Some(Fragment::Comment);
	}

	None
}

fn lex_brace<'s>(lex: &mut Lexer<'s, RawToken<'s>>) -> Option<Fragment<'s>> {
	let after = lex.remainder().strip_prefix(VALUE_PREFIX)?;
	let name = tag_name(after);
	if name.is_empty() {
		return None;
	}

	let tail = &after[name.len()..];
	let close = tail.find('}')?;
	if !tail[close..].starts_with("}}") {
		return None;
	}

	let attrs = &tail[..close];
	if !is_attribute_text(attrs) {
		return None;
	}

	lex.bump(VALUE_PREFIX.len() + name.len() + close + 2);
	Some(Fragment::Value { name, attrs })
}

/// Walks the logos token stream, coalescing text runs and dropping template
/// comments when asked to.
struct FragmentWalker<'s> {
	/// Whether `<!-- # … -->` comments are removed from the output.
	strip_comments: bool,
	/// Start of the text run currently being collected.
	text: Option<Range<usize>>,
	/// Collected fragments.
	fragments: Vec<Spanned<'s>>,
}

impl<'s> FragmentWalker<'s> {
	fn new(strip_comments: bool) -> Self {
		Self {
			strip_comments,
			text: None,
			fragments: vec![],
		}
	}

	fn extend_text(&mut self, span: Range<usize>) {
		match &mut self.text {
			Some(text) => text.end = span.end,
			None => self.text = Some(span),
		}
	}

	fn flush_text(&mut self) {
		if let Some(span) = self.text.take() {
			self.fragments.push(Spanned::new(Fragment::Text, span));
		}
	}

	fn process(&mut self, source: &'s str) {
		for (result, span) in RawToken::lexer(source).spanned() {
			match result {
				Ok(RawToken::Text) | Err(()) => self.extend_text(span),
				Ok(RawToken::Angle(Fragment::Comment)) if !self.strip_comments => {
					self.extend_text(span);
				}
				Ok(RawToken::Angle(Fragment::Comment)) => {
					tracing::trace!(?span, "dropping template comment");
					self.flush_text();
				}
				Ok(RawToken::Angle(fragment) | RawToken::Brace(fragment)) => {
					self.flush_text();
					self.fragments.push(Spanned::new(fragment, span));
				}
			}
		}

		self.flush_text();
	}
}

/// Split template source into text, tag and comment fragments.
pub fn tokenize(source: &str, strip_comments: bool) -> Vec<Spanned<'_>> {
	let mut walker = FragmentWalker::new(strip_comments);
	walker.process(source);
	walker.fragments
}

pub fn memstr(haystack: &[u8], needle: &[u8]) -> Option<usize> {
	haystack
		.windows(needle.len())
		.position(|window| window == needle)
}
