#![allow(deprecated)] // cargo_bin is deprecated in assert_cmd but replacement not yet stable

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

type TestResult<T = ()> = std::result::Result<T, Box<dyn Error>>;

/// A throwaway project directory holding interface files and config.
struct SampleProject {
    dir: TempDir,
}

impl SampleProject {
    fn new() -> TestResult<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, name: &str, contents: &str) -> TestResult<PathBuf> {
        let path = self.root().join(name);
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// An interface with an inherited rename, a keyword warning and an ignore.
    fn write_zoo(&self) -> TestResult<PathBuf> {
        self.write(
            "zoo.json",
            r#"{
                "module": "zoo",
                "directives": [
                    {"directive": "rename", "scope": "Animal", "name": "speak", "to": "talk"},
                    {"directive": "rename", "name": "internal", "to": "$ignore"},
                    {"directive": "namewarn", "name": "print", "message": "'print' is a keyword",
                     "keywords": [{"name": "rename", "value": "_%s"}]}
                ],
                "classes": [
                    {"name": "Animal", "members": [{"nodeType": "cdecl", "name": "speak", "decl": "f()."}]},
                    {"name": "Dog", "bases": ["Animal"],
                     "members": [{"nodeType": "cdecl", "name": "speak", "decl": "f()."}]}
                ],
                "declarations": [
                    {"nodeType": "cdecl", "name": "print", "decl": "f()."},
                    {"nodeType": "cdecl", "name": "internal", "decl": "f()."}
                ]
            }"#,
        )
    }
}

#[test]
fn resolve_reports_inherited_rename() -> TestResult {
    let project = SampleProject::new()?;
    project.write_zoo()?;

    Command::cargo_bin("wrapname")?
        .current_dir(project.root())
        .args(["resolve", "zoo.json", "--format", "json"])
        .assert()
        .success()
        .stdout(contains(r#""target":"talk""#))
        .stdout(contains(r#""member":"Dog_talk""#))
        .stdout(contains(r#""module":"zoo""#));

    Ok(())
}

#[test]
fn resolve_text_output_marks_ignored_and_warns() -> TestResult {
    let project = SampleProject::new()?;
    project.write_zoo()?;

    Command::cargo_bin("wrapname")?
        .current_dir(project.root())
        .args(["resolve", "zoo.json", "--format", "text"])
        .assert()
        .success()
        .stdout(contains("internal"))
        .stdout(contains("(ignored)"))
        .stdout(contains("_wrap__print"))
        .stderr(contains("'print' is a keyword"));

    Ok(())
}

#[test]
fn resolve_text_output_reports_each_warning_once() -> TestResult {
    let project = SampleProject::new()?;
    project.write_zoo()?;

    let output = Command::cargo_bin("wrapname")?
        .current_dir(project.root())
        .args(["resolve", "zoo.json", "--format", "text"])
        .output()?;
    assert!(output.status.success());

    let stderr = String::from_utf8(output.stderr)?;
    assert_eq!(stderr.matches("'print' is a keyword").count(), 1);

    Ok(())
}

#[test]
fn resolve_quiet_suppresses_warnings() -> TestResult {
    let project = SampleProject::new()?;
    project.write_zoo()?;

    Command::cargo_bin("wrapname")?
        .current_dir(project.root())
        .args(["resolve", "zoo.json", "--format", "text", "--quiet"])
        .assert()
        .success()
        .stdout(contains("_wrap__print"))
        .stderr(contains("'print' is a keyword").not());

    Ok(())
}

#[test]
fn resolve_keeps_file_order() -> TestResult {
    let project = SampleProject::new()?;
    project.write(
        "a.json",
        r#"{"declarations": [{"nodeType": "cdecl", "name": "alpha", "decl": "f()."}]}"#,
    )?;
    project.write(
        "b.json",
        r#"{"declarations": [{"nodeType": "cdecl", "name": "beta", "decl": "f()."}]}"#,
    )?;

    let output = Command::cargo_bin("wrapname")?
        .current_dir(project.root())
        .args(["resolve", "b.json", "a.json", "--format", "json"])
        .output()?;
    assert!(output.status.success());

    let reports: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let names: Vec<&str> = reports
        .as_array()
        .ok_or("expected an array of reports")?
        .iter()
        .filter_map(|r| r["symbols"][0]["name"].as_str())
        .collect();
    assert_eq!(names, vec!["beta", "alpha"]);

    Ok(())
}

#[test]
fn resolve_exits_with_one_on_name_errors() -> TestResult {
    let project = SampleProject::new()?;
    project.write(
        "bad.json",
        r#"{
            "directives": [{"directive": "namewarn", "name": "del", "message": "'del' is reserved",
                            "keywords": [{"name": "error", "value": "1"}]}],
            "declarations": [{"nodeType": "cdecl", "name": "del", "decl": "f()."}]
        }"#,
    )?;

    Command::cargo_bin("wrapname")?
        .current_dir(project.root())
        .args(["resolve", "bad.json"])
        .assert()
        .code(1)
        .stderr(contains("name error"));

    Ok(())
}

#[test]
fn resolve_missing_file_is_an_error() -> TestResult {
    let project = SampleProject::new()?;

    Command::cargo_bin("wrapname")?
        .current_dir(project.root())
        .args(["resolve", "missing.json", "--format", "json"])
        .assert()
        .code(2)
        .stderr(contains("CommandFailed"));

    Ok(())
}

#[test]
fn mangle_operator_symbol() -> TestResult {
    Command::cargo_bin("wrapname")?
        .args(["mangle", "Foo::operator+", "--format", "text"])
        .assert()
        .success()
        .stdout(contains("Foo_operatora___"));

    Ok(())
}

#[test]
fn names_uses_configured_templates() -> TestResult {
    let project = SampleProject::new()?;
    project.write(".wrapname.toml", "[naming]\nwrapper = \"XS_%f\"\n")?;

    Command::cargo_bin("wrapname")?
        .current_dir(project.root())
        .args(["names", "wrapper", "foo", "--format", "text"])
        .assert()
        .success()
        .stdout(contains("XS_foo"));

    Command::cargo_bin("wrapname")?
        .current_dir(project.root())
        .args(["names", "construct", "Point", "--copy", "--format", "text"])
        .assert()
        .success()
        .stdout(contains("copy_Point"));

    Ok(())
}

#[test]
fn names_rejects_unknown_role() -> TestResult {
    Command::cargo_bin("wrapname")?
        .args(["names", "bogus", "foo"])
        .assert()
        .code(2)
        .stderr(contains("Unknown naming role"));

    Ok(())
}

#[test]
fn config_prints_effective_settings() -> TestResult {
    let project = SampleProject::new()?;
    project.write(".wrapname.toml", "module = \"zoo\"\n")?;

    Command::cargo_bin("wrapname")?
        .current_dir(project.root())
        .args(["config"])
        .assert()
        .success()
        .stdout(contains("module = \"zoo\""))
        .stdout(contains("warn_protected = true"));

    Ok(())
}
