mod common;

use clap::Parser;
use predicates::prelude::PredicateBooleanExt;
use serde_json::Value;
use similar_asserts::assert_eq;
use tplc_cli::Commands;
use tplc_cli::TplcCli;
use tplc_cli::TreeFormat;
use tplc_core::AnyEmptyResult;

#[test]
fn compile_flattens_theme_inheritance() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_theme(tmp.path())?;

	common::tplc_cmd()
		.arg("compile")
		.arg("home.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("<h1>Child Base</h1><footer>{{tpl:BlogName}}</footer>\n");

	Ok(())
}

#[test]
fn compile_writes_output_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_theme(tmp.path())?;
	let output = tmp.path().join("home.php");

	common::tplc_cmd()
		.arg("compile")
		.arg("home.html")
		.arg("--path")
		.arg(tmp.path())
		.arg("--output")
		.arg(&output)
		.assert()
		.success()
		.stdout(predicates::str::contains("compiled `home.html`"));

	let content = std::fs::read_to_string(&output)?;
	assert_eq!(content, "<h1>Child Base</h1><footer>{{tpl:BlogName}}</footer>\n");

	Ok(())
}

#[test]
fn compile_without_config_uses_the_root() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("page.html"),
		"<tpl:Block name=\"a\">x</tpl:Block><!-- # dropped -->",
	)?;

	common::tplc_cmd()
		.arg("compile")
		.arg("page.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("x");

	Ok(())
}

#[test]
fn compile_unknown_template_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::tplc_cmd()
		.arg("compile")
		.arg("missing.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("template not found").and(
			predicates::str::contains("missing.html"),
		));

	Ok(())
}

#[test]
fn compile_closing_tags() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("broken.html"),
		"<tpl:Block name=\"a\"><tpl:Block name=\"b\"></tpl:Other></tpl:Block>",
	)?;
	std::fs::write(
		tmp.path().join("stray.html"),
		"text</tpl:Block>",
	)?;

	// `Other` has no handler, so its closing tag is plain text.
	common::tplc_cmd()
		.arg("compile")
		.arg("broken.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("");

	common::tplc_cmd()
		.arg("compile")
		.arg("stray.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("unexpected closing tag"));

	Ok(())
}

#[test]
fn tree_prints_outline() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_theme(tmp.path())?;

	common::tplc_cmd()
		.arg("tree")
		.arg("home.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("extends __parent__\nblock \"title\"\ndefinition \"title\"\n  text \"Child \"\n  parent\n");

	Ok(())
}

#[test]
fn tree_prints_json() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_theme(tmp.path())?;

	let assert = common::tplc_cmd()
		.arg("tree")
		.arg("home.html")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path().join("base"))
		.assert()
		.success();

	let json: Value = serde_json::from_slice(&assert.get_output().stdout)?;
	assert_eq!(json["extends"], Value::Null);
	assert_eq!(json["nodes"][0]["type"], "text");
	assert_eq!(json["nodes"][0]["content"], "<h1>");
	assert_eq!(json["nodes"][1]["type"], "blockDefinition");
	assert_eq!(json["nodes"][1]["name"], "title");
	assert_eq!(json["nodes"][3]["type"], "include");
	assert_eq!(json["nodes"][3]["attrs"]["src"], "footer.html");
	assert_eq!(json["definitions"][0]["children"][0]["content"], "Base");

	Ok(())
}

#[test]
fn check_passes_for_clean_templates() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_theme(tmp.path())?;

	common::tplc_cmd()
		.arg("check")
		.arg("home.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("has no problems"));

	Ok(())
}

#[test]
fn check_reports_diagnostics_from_included_templates() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("page.html"),
		"<main>{{tpl:include src=\"part.html\"}}</main>",
	)?;
	std::fs::write(tmp.path().join("part.html"), "\n<tpl:Block name=\"x\">")?;

	common::tplc_cmd()
		.arg("check")
		.arg("page.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stdout(
			predicates::str::contains("2:1: did not find closing tag for block <tpl:Block>")
				.and(predicates::str::contains("1 problem(s) found")),
		);

	Ok(())
}

#[test]
fn invalid_config_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("tplc.toml"), "max_depth = \"deep\"\n")?;

	common::tplc_cmd()
		.arg("check")
		.arg("page.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("failed to parse config file"));

	Ok(())
}

#[test]
fn parse_subcommands() {
	let cli = TplcCli::parse_from(["tplc", "tree", "home.html", "--format", "json"]);
	assert!(matches!(
		cli.command,
		Some(Commands::Tree { ref name, format: TreeFormat::Json }) if name == "home.html"
	));

	let cli = TplcCli::parse_from(["tplc", "compile", "home.html", "-o", "out.php", "--verbose"]);
	assert!(cli.verbose);
	assert!(matches!(
		cli.command,
		Some(Commands::Compile { ref output, .. }) if output.as_deref() == Some(std::path::Path::new("out.php"))
	));

	let cli = TplcCli::parse_from(["tplc", "check", "home.html", "--no-color"]);
	assert!(cli.no_color);
	assert!(matches!(cli.command, Some(Commands::Check { .. })));
}
