//! End-to-end tests for the `yacpm ls` command.

#[allow(dead_code)]
mod common;
use common::prelude::*;

const INSTALLED: &str = r#"{
    "packages": {"glfw": "a1b2c3d", "imgui": "f00ba4"},
    "dependency_packages": {
        "glad": {"version": "c0ffee", "^requested": "main", "^dependents": ["glfw"]}
    }
}"#;

fn installed_fixture() -> TestFixture {
    TestFixture::new()
        .with_manifest(INSTALLED)
        .with_file(
            "yacpkgs/glfw/yacpkg.json",
            r#"{"repository": "https://github.com/glfw/glfw", "^current_version": "a1b2c3d"}"#,
        )
        .with_file(
            "yacpkgs/glad/yacpkg.json",
            r#"{"repository": "https://github.com/Dav1dde/glad", "^current_version": "c0ffee"}"#,
        )
}

#[test]
fn test_ls_lists_packages() {
    let fixture = installed_fixture();

    fixture
        .command()
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("Packages:"))
        .stdout(predicate::str::contains("glfw a1b2c3d\n"))
        .stdout(predicate::str::contains("imgui f00ba4 [not installed]"))
        .stdout(predicate::str::contains("glad c0ffee (required by glfw)"));
}

#[test]
fn test_ls_direct_only() {
    let fixture = installed_fixture();

    fixture
        .command()
        .args(["ls", "--direct"])
        .assert()
        .success()
        .stdout(predicate::str::contains("glfw"))
        .stdout(predicate::str::contains("glad").not());
}

#[test]
fn test_ls_missing_manifest() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .arg("ls")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Manifest not found"));
}

#[test]
fn test_ls_does_not_modify_files() {
    let fixture = installed_fixture();

    fixture.command().arg("ls").assert().success();

    assert_eq!(fixture.manifest(), INSTALLED);
    fixture
        .child("yacpkgs/packages.cmake")
        .assert(predicate::path::missing());
}
