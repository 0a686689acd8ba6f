//! CLI integration tests using the real distpack binary

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

use common::TestProject;

#[allow(deprecated)]
fn distpack_cmd(project: &TestProject) -> Command {
    let mut cmd = Command::cargo_bin("distpack").unwrap();
    cmd.current_dir(project.path()).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let project = TestProject::new();
    distpack_cmd(&project)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("pack"))
        .stdout(predicate::str::contains("release"));
}

#[test]
fn test_release_writes_bundles_and_descriptor() {
    let project = TestProject::new();
    distpack_cmd(&project)
        .arg("release")
        .assert()
        .success()
        .stderr(predicate::str::contains("Built 2 bundle(s)"))
        .stderr(predicate::str::contains("Packed"))
        .stderr(predicate::str::contains("ibsheet-vue@1.2.0"));

    assert!(project.out_dir().join("ibsheet-vue.es.js").is_file());
    assert!(project.out_dir().join("ibsheet-vue.umd.js").is_file());
    assert!(project.read_out("package.json").contains("\"name\": \"ibsheet-vue\""));
}

#[test]
fn test_build_then_pack() {
    let project = TestProject::new();
    distpack_cmd(&project).arg("build").assert().success();
    assert!(!project.out_dir().join("package.json").exists());

    distpack_cmd(&project).arg("pack").assert().success();
    assert!(project.out_dir().join("package.json").is_file());
}

#[test]
fn test_pack_without_build_fails() {
    let project = TestProject::new();
    distpack_cmd(&project)
        .arg("pack")
        .assert()
        .failure()
        .stderr(predicate::str::contains("IntegrityError: pack step failed"))
        .stderr(predicate::str::contains("run `distpack build` first"));
}

#[test]
fn test_config_flag_from_another_directory() {
    let project = TestProject::new();
    let elsewhere = tempfile::TempDir::new().unwrap();

    #[allow(deprecated)]
    Command::cargo_bin("distpack")
        .unwrap()
        .current_dir(elsewhere.path())
        .env("NO_COLOR", "1")
        .args(["build", "--config"])
        .arg(project.config_path())
        .assert()
        .success();

    assert!(project.out_dir().join("ibsheet-vue.umd.js").is_file());
}

#[test]
fn test_unknown_format_is_a_configuration_error() {
    let project = TestProject::new();
    project.write_file(
        "distpack.toml",
        &common::CONFIG.replace(
            "entry = \"src/components/index.ts\"",
            "entry = \"src/components/index.ts\"\nformats = [\"es\", \"system\"]",
        ),
    );

    distpack_cmd(&project)
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ConfigurationError:"))
        .stderr(predicate::str::contains("configuration error"))
        .stderr(predicate::str::contains("system"));
    assert!(!project.path().join("dist").exists());
}

#[test]
fn test_release_with_missing_version_fails_before_build() {
    let project = TestProject::new();
    project.write_file(
        "package.json",
        r#"{ "name": "ibsheet-vue-component", "license": "MIT" }"#,
    );

    distpack_cmd(&project)
        .arg("release")
        .assert()
        .failure()
        .stderr(predicate::str::contains("pack step failed"))
        .stderr(predicate::str::contains("missing required field 'version'"));
    assert!(!project.path().join("dist").exists());
}

#[test]
fn test_missing_entry_names_the_file() {
    let project = TestProject::new();
    std::fs::remove_file(project.path().join("src/components/index.ts")).unwrap();

    distpack_cmd(&project)
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("InputError: build step failed"))
        .stderr(predicate::str::contains("src/components/index.ts"))
        .stderr(predicate::str::contains("entry point not found"));
    assert!(!project.path().join("dist").exists());
}

#[test]
fn test_release_without_umd_fails_before_build() {
    let project = TestProject::new();
    project.write_file(
        "distpack.toml",
        &common::CONFIG.replace(
            "entry = \"src/components/index.ts\"",
            "entry = \"src/components/index.ts\"\nformats = [\"es\", \"cjs\"]",
        ),
    );

    distpack_cmd(&project)
        .arg("release")
        .assert()
        .failure()
        .stderr(predicate::str::contains("IntegrityError:"))
        .stderr(predicate::str::contains("needs a umd bundle"));
    assert!(!project.path().join("dist").exists());
}

#[test]
fn test_out_dir_over_sources_is_refused() {
    let project = TestProject::new();
    project.write_file(
        "distpack.toml",
        &common::CONFIG.replace(
            "entry = \"src/components/index.ts\"",
            "entry = \"src/components/index.ts\"\nout_dir = \"src\"",
        ),
    );

    distpack_cmd(&project)
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ConfigurationError:"))
        .stderr(predicate::str::contains("contains library.entry"));
    assert!(project.path().join("src/components/index.ts").is_file());
}
