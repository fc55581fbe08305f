use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn tplc_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("tplc"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("TPLC_LOG");
	cmd
}

/// A child theme extending a base theme, with `tplc.toml` listing both.
pub fn write_theme(root: &Path) -> std::io::Result<()> {
	let child = root.join("child");
	let base = root.join("base");
	std::fs::create_dir_all(&child)?;
	std::fs::create_dir_all(&base)?;

	std::fs::write(
		root.join("tplc.toml"),
		"[templates]\npaths = [\"child\", \"base\"]\n",
	)?;
	std::fs::write(
		child.join("home.html"),
		"{{tpl:extends parent=\"__parent__\"}}<tpl:Block name=\"title\">Child \
		 {{tpl:parent}}</tpl:Block>",
	)?;
	std::fs::write(
		base.join("home.html"),
		"<h1><tpl:Block name=\"title\">Base</tpl:Block></h1>{{tpl:include \
		 src=\"footer.html\"}}\n",
	)?;
	std::fs::write(base.join("footer.html"), "<footer>{{tpl:BlogName}}</footer>")?;

	Ok(())
}
