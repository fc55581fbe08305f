use std::collections::BTreeMap;
use std::fmt::Display;

use derive_more::Deref;
use logos::Logos;
use serde::Deserialize;
use serde::Serialize;

/// Scanner for `name="value"` pairs. Anything between pairs is skipped.
#[derive(Logos, Debug, PartialEq)]
enum AttributeToken {
	#[regex(r#"[a-zA-Z0-9_:-]+="[^"]*""#)]
	Pair,
}

/// The attributes of a single tag occurrence.
///
/// Values are always double quoted in template source and there is no escape
/// mechanism: the first `"` after the opening quote ends the value. Lookups
/// never fail, a missing attribute reads as the empty string.
///
/// ```rust
/// use tplc_core::Attributes;
///
/// let attrs = Attributes::parse(r#"name="a" lang="fr" name="b""#);
/// assert_eq!(attrs.get("name"), "b");
/// assert_eq!(attrs.get("missing"), "");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, String>);

impl Attributes {
	/// Parse raw attribute text. When a name appears more than once the last
	/// occurrence wins.
	pub fn parse(raw: &str) -> Self {
		let mut attributes = Self::default();
		let mut lexer = AttributeToken::lexer(raw);

		while let Some(token) = lexer.next() {
			if token != Ok(AttributeToken::Pair) {
				continue;
			}

			let pair = lexer.slice();
			let Some((name, quoted)) = pair.split_once('=') else {
				continue;
			};

			attributes.set(name, &quoted[1..quoted.len() - 1]);
		}

		attributes
	}

	/// The value of `name`, or `""` when it is absent.
	pub fn get(&self, name: &str) -> &str {
		self.0.get(name).map_or("", String::as_str)
	}

	pub fn is_set(&self, name: &str) -> bool {
		self.0.contains_key(name)
	}

	/// True when `name` is absent or only contains whitespace.
	pub fn is_blank(&self, name: &str) -> bool {
		self.get(name).trim().is_empty()
	}

	/// Inject or overwrite an attribute after parsing.
	pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.0.insert(name.into(), value.into());
	}
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut attributes = Self::default();
		for (name, value) in iter {
			attributes.set(name, value);
		}
		attributes
	}
}

impl Display for Attributes {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		for (index, (name, value)) in self.0.iter().enumerate() {
			if index > 0 {
				write!(f, " ")?;
			}
			write!(f, "{name}=\"{value}\"")?;
		}

		Ok(())
	}
}
