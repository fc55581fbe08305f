use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::TplError;
use crate::TplResult;

/// Default limit for nested inheritance resolution, includes and extends
/// chains.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["tplc.toml", ".tplc.toml", ".config/tplc.toml"];

/// Configuration loaded from a `tplc.toml` file.
///
/// ```toml
/// max_depth = 64
/// strip_comments = true
/// annotate = false
///
/// [templates]
/// paths = ["themes/child/tpl", "themes/default/tpl"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
	/// How deep block resolution, `include` and `extends` may nest before
	/// compilation fails with [`TplError::DepthExceeded`]. Also the deepest
	/// block nesting the parser accepts ([`TplError::NestingTooDeep`]).
	#[serde(default = "default_max_depth")]
	pub max_depth: usize,
	/// Remove `<!-- # … -->` template comments from the output.
	#[serde(default = "default_strip_comments")]
	pub strip_comments: bool,
	/// Append an HTML comment listing parse diagnostics to compiled output.
	#[serde(default)]
	pub annotate: bool,
	#[serde(default)]
	pub templates: TemplatesConfig,
}

impl Default for CompilerConfig {
	fn default() -> Self {
		Self {
			max_depth: DEFAULT_MAX_DEPTH,
			strip_comments: true,
			annotate: false,
			templates: TemplatesConfig::default(),
		}
	}
}

fn default_max_depth() -> usize {
	DEFAULT_MAX_DEPTH
}

fn default_strip_comments() -> bool {
	true
}

/// Template search paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatesConfig {
	/// Directories searched in order, relative to the config root. The first
	/// one is the active theme; later ones are what `__parent__` falls back
	/// to.
	#[serde(default)]
	pub paths: Vec<PathBuf>,
}

impl CompilerConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if the file does not exist.
	pub fn load(root: &Path) -> TplResult<Option<CompilerConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config: CompilerConfig =
			toml::from_str(&content).map_err(|e| TplError::ConfigParse(e.to_string()))?;

		tracing::debug!(path = %config_path.display(), "loaded config");
		Ok(Some(config))
	}

	/// The template search paths joined onto `root`. Without configured paths
	/// templates are looked up in `root` itself.
	pub fn template_paths(&self, root: &Path) -> Vec<PathBuf> {
		if self.templates.paths.is_empty() {
			return vec![root.to_path_buf()];
		}

		self.templates
			.paths
			.iter()
			.map(|path| root.join(path))
			.collect()
	}
}
