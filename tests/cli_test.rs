//! Integration tests for the modbuild binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SIMPLE_CONFIG: &str = r#"
module_name: Foo::Bar
test_command: sh {file}
"#;

fn setup_dist(config: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("modbuild.yml"), config).unwrap();
    fs::create_dir_all(temp.path().join("lib/Foo")).unwrap();
    fs::write(
        temp.path().join("lib/Foo/Bar.pm"),
        "package Foo::Bar;\nour $VERSION = '1.0';\n1;\n",
    )
    .unwrap();
    temp
}

fn modbuild(dir: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin("modbuild"));
    cmd.current_dir(dir).arg("--no-rc").env_remove("MODBUILD_PATH");
    cmd
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("modbuild"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Build, test and install"))
        .stdout(predicate::str::contains("modbuild help"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("modbuild"));
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn help_action_lists_actions() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_dist(SIMPLE_CONFIG);
    modbuild(temp.path())
        .args(["--no-color", "help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Foo-Bar 1.0"))
        .stdout(predicate::str::contains("prereq_report"))
        .stdout(predicate::str::contains("fakeinstall"));
    Ok(())
}

#[test]
fn no_action_without_default_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_dist(SIMPLE_CONFIG);
    modbuild(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No action specified"));
    Ok(())
}

#[test]
fn default_action_runs_without_arguments() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_dist("module_name: Foo::Bar\ndefault_action: build\n");
    modbuild(temp.path()).assert().success();
    assert!(temp.path().join("blib/lib/Foo/Bar.pm").is_file());
    Ok(())
}

#[test]
fn unknown_action_points_to_help() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_dist(SIMPLE_CONFIG);
    modbuild(temp.path())
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "No action 'frobnicate' defined, try running the 'help' action.",
        ));
    Ok(())
}

#[test]
fn missing_identity_is_a_config_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("modbuild.yml"), "verbose: true\n")?;
    modbuild(temp.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Can't determine distribution name"));
    Ok(())
}

#[test]
fn build_stages_libraries_and_scripts() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_dist(SIMPLE_CONFIG);
    fs::create_dir_all(temp.path().join("bin"))?;
    fs::write(temp.path().join("bin/foo-tool"), "#!/bin/sh\necho foo\n")?;

    modbuild(temp.path()).arg("build").assert().success();

    assert!(temp.path().join("blib/lib/Foo/Bar.pm").is_file());
    assert!(temp.path().join("blib/script/foo-tool").is_file());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(temp.path().join("blib/script/foo-tool"))?
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }
    Ok(())
}

#[test]
fn base_dir_flag_selects_the_distribution() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_dist(SIMPLE_CONFIG);
    let elsewhere = TempDir::new()?;

    modbuild(elsewhere.path())
        .arg("-C")
        .arg(temp.path())
        .arg("code")
        .assert()
        .success();
    assert!(temp.path().join("blib/lib/Foo/Bar.pm").is_file());
    Ok(())
}

#[test]
fn runs_from_a_subdirectory() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_dist(SIMPLE_CONFIG);
    modbuild(&temp.path().join("lib/Foo"))
        .arg("code")
        .assert()
        .success();
    assert!(temp.path().join("blib/lib/Foo/Bar.pm").is_file());
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_action_reports_each_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_dist(SIMPLE_CONFIG);
    fs::create_dir_all(temp.path().join("t"))?;
    fs::write(
        temp.path().join("t/staged.t"),
        "test -f \"$MODBUILD_BLIB/lib/Foo/Bar.pm\"\n",
    )?;
    fs::write(temp.path().join("t/basic.t"), "exit 0\n")?;

    modbuild(temp.path())
        .args(["--no-color", "test"])
        .assert()
        .success()
        .stdout(predicate::str::contains("t/basic.t .. ok"))
        .stdout(predicate::str::contains("t/staged.t .. ok"))
        .stdout(predicate::str::contains("All tests successful."));
    Ok(())
}

#[cfg(unix)]
#[test]
fn failing_test_fails_the_run() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_dist(SIMPLE_CONFIG);
    fs::create_dir_all(temp.path().join("t"))?;
    fs::write(temp.path().join("t/good.t"), "exit 0\n")?;
    fs::write(temp.path().join("t/bad.t"), "echo broken >&2\nexit 1\n")?;

    modbuild(temp.path())
        .args(["--no-color", "test"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("t/bad.t .. FAILED"))
        .stderr(predicate::str::contains("broken"))
        .stderr(predicate::str::contains("1 of 2"));
    Ok(())
}

#[test]
fn missing_action_requirement_blocks_the_action() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_dist(
        r#"
module_name: Foo::Bar
test_requires:
  No::Such::Module: "1.0"
"#,
    );
    fs::create_dir_all(temp.path().join("t"))?;
    fs::write(temp.path().join("t/basic.t"), "exit 0\n")?;

    modbuild(temp.path())
        .arg("test")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Prerequisites for action 'test'"))
        .stderr(predicate::str::contains(
            "ERROR: [test_requires] No::Such::Module is not installed",
        ));
    Ok(())
}

#[test]
fn configure_only_warns_about_missing_requirements() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_dist(
        r#"
module_name: Foo::Bar
configure_requires:
  No::Such::Module: "1.0"
"#,
    );

    modbuild(temp.path())
        .arg("configure")
        .assert()
        .success()
        .stderr(predicate::str::contains("No::Such::Module is not installed"));
    assert!(temp.path().join("_build/config.yml").is_file());
    Ok(())
}

#[test]
fn configure_persists_arguments_for_later_runs() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_dist(SIMPLE_CONFIG);
    let target = TempDir::new()?;
    let install_base = format!("install_base={}", target.path().display());

    modbuild(temp.path())
        .args(["configure", &install_base])
        .assert()
        .success();
    modbuild(temp.path()).arg("install").assert().success();

    assert!(target.path().join("lib/Foo/Bar.pm").is_file());
    Ok(())
}

#[test]
fn install_honours_destdir() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_dist(SIMPLE_CONFIG);
    let stage = TempDir::new()?;
    let destdir = format!("--destdir={}", stage.path().display());

    modbuild(temp.path())
        .args(["install", "install_base=/opt/foo", &destdir])
        .assert()
        .success();

    assert!(stage.path().join("opt/foo/lib/Foo/Bar.pm").is_file());
    Ok(())
}

#[test]
fn fakeinstall_copies_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_dist(SIMPLE_CONFIG);
    let target = TempDir::new()?;
    let install_base = format!("install_base={}", target.path().display());

    modbuild(temp.path())
        .args(["fakeinstall", &install_base])
        .assert()
        .success()
        .stdout(predicate::str::contains("Installing"))
        .stdout(predicate::str::contains("Bar.pm"));
    assert!(!target.path().join("lib").exists());
    Ok(())
}

#[test]
fn rc_file_supplies_default_arguments() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_dist(SIMPLE_CONFIG);
    let target = TempDir::new()?;
    let rc = temp.path().join("rc.yml");
    fs::write(
        &rc,
        format!("install: install_base={}\n", target.path().display()),
    )?;

    Command::new(cargo_bin("modbuild"))
        .current_dir(temp.path())
        .env("MODBUILDRC", &rc)
        .arg("install")
        .assert()
        .success();
    assert!(target.path().join("lib/Foo/Bar.pm").is_file());
    Ok(())
}

#[test]
fn dist_creates_an_archive() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_dist(SIMPLE_CONFIG);
    fs::write(temp.path().join("README"), "Foo::Bar\n")?;

    modbuild(temp.path()).arg("dist").assert().success();

    assert!(temp.path().join("Foo-Bar-1.0.tar.gz").is_file());
    assert!(!temp.path().join("Foo-Bar-1.0").exists());
    Ok(())
}

#[test]
fn clean_and_realclean_remove_products() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_dist(SIMPLE_CONFIG);
    modbuild(temp.path()).arg("configure").assert().success();
    modbuild(temp.path()).arg("build").assert().success();
    assert!(temp.path().join("blib").is_dir());

    modbuild(temp.path()).arg("clean").assert().success();
    assert!(!temp.path().join("blib").exists());
    assert!(temp.path().join("_build/config.yml").is_file());

    modbuild(temp.path()).arg("realclean").assert().success();
    assert!(!temp.path().join("_build").exists());
    Ok(())
}

#[test]
fn prereq_report_marks_failures() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_dist(
        r#"
module_name: Foo::Bar
requires:
  modbuild: "0"
recommends:
  No::Such::Module: "2.0"
"#,
    );

    modbuild(temp.path())
        .args(["--no-color", "prereq_report"])
        .assert()
        .success()
        .stdout(predicate::str::contains("requires"))
        .stdout(predicate::str::contains("recommends"))
        .stdout(predicate::str::contains("No::Such::Module"))
        .stdout(predicate::str::contains("missing"))
        .stdout(predicate::str::contains("<none>"));
    Ok(())
}

#[test]
fn invalid_argument_is_reported() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_dist(SIMPLE_CONFIG);
    modbuild(temp.path())
        .args(["build", "test"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid argument 'test'"));
    Ok(())
}
