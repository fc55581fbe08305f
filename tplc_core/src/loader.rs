use std::collections::HashMap;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use crate::TplError;
use crate::TplResult;

/// The `extends` target that loads the current template's name from the next
/// search path.
pub const PARENT_TEMPLATE: &str = "__parent__";

/// A template source returned by a [`TemplateLoader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedTemplate {
	pub name: String,
	pub source: String,
	/// Index of the search path the template was found in.
	pub origin: usize,
}

/// Finds template sources by name across an ordered list of search paths.
pub trait TemplateLoader {
	/// Load `name`, searching from the search path at index `from`.
	fn load(&self, name: &str, from: usize) -> TplResult<LoadedTemplate>;
}

/// Loads templates from directories, e.g. a theme followed by its parent
/// themes.
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
	paths: Vec<PathBuf>,
}

impl FileLoader {
	pub fn new<P: Into<PathBuf>>(paths: impl IntoIterator<Item = P>) -> Self {
		Self {
			paths: paths.into_iter().map(Into::into).collect(),
		}
	}

	pub fn paths(&self) -> &[PathBuf] {
		&self.paths
	}
}

/// Keep only the normal components of a template name so that it can't
/// leave the search path.
fn relative_name(name: &str) -> PathBuf {
	Path::new(name)
		.components()
		.filter_map(|component| {
			match component {
				Component::Normal(part) => Some(part),
				_ => None,
			}
		})
		.collect()
}

impl TemplateLoader for FileLoader {
	fn load(&self, name: &str, from: usize) -> TplResult<LoadedTemplate> {
		let relative = relative_name(name);
		if relative.as_os_str().is_empty() {
			return Err(TplError::TemplateNotFound {
				name: name.to_string(),
			});
		}

		for (origin, directory) in self.paths.iter().enumerate().skip(from) {
			let path = directory.join(&relative);
			if !path.is_file() {
				continue;
			}

			tracing::debug!(name, origin, path = %path.display(), "loading template");
			let source = std::fs::read_to_string(&path)?;

			return Ok(LoadedTemplate {
				name: name.to_string(),
				source,
				origin,
			});
		}

		Err(TplError::TemplateNotFound {
			name: name.to_string(),
		})
	}
}

/// Holds template sources in memory. Each layer plays the part of one search
/// path.
///
/// ```rust
/// use tplc_core::Compiler;
/// use tplc_core::MemoryLoader;
///
/// let loader = MemoryLoader::new()
/// 	.with_layer([("home.html", r#"{{tpl:extends parent="layout.html"}}<tpl:Block name="body">home</tpl:Block>"#)])
/// 	.with_layer([("layout.html", r#"<main><tpl:Block name="body">empty</tpl:Block></main>"#)]);
///
/// let output = Compiler::new().compile_template(&loader, "home.html").unwrap();
/// assert_eq!(output, "<main>home</main>");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
	layers: Vec<HashMap<String, String>>,
}

impl MemoryLoader {
	pub fn new() -> Self {
		Self::default()
	}

	/// Append a search layer holding `templates`.
	#[must_use]
	pub fn with_layer<K, V>(mut self, templates: impl IntoIterator<Item = (K, V)>) -> Self
	where
		K: Into<String>,
		V: Into<String>,
	{
		self.layers.push(
			templates
				.into_iter()
				.map(|(name, source)| (name.into(), source.into()))
				.collect(),
		);
		self
	}

	/// Add a template to the last layer, creating the first layer if needed.
	pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) -> &mut Self {
		if self.layers.is_empty() {
			self.layers.push(HashMap::new());
		}

		if let Some(layer) = self.layers.last_mut() {
			layer.insert(name.into(), source.into());
		}

		self
	}
}

impl TemplateLoader for MemoryLoader {
	fn load(&self, name: &str, from: usize) -> TplResult<LoadedTemplate> {
		self.layers
			.iter()
			.enumerate()
			.skip(from)
			.find_map(|(origin, layer)| {
				layer.get(name).map(|source| {
					LoadedTemplate {
						name: name.to_string(),
						source: source.clone(),
						origin,
					}
				})
			})
			.ok_or_else(|| {
				TplError::TemplateNotFound {
					name: name.to_string(),
				}
			})
	}
}
