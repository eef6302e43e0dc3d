//! CLI integration tests.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn checkout() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join(".spackstack"), "").unwrap();

    let template = root.join("configs/templates/skylab-dev");
    fs::create_dir_all(&template).unwrap();
    fs::write(
        template.join("spack.yaml"),
        "spack:\n  specs: [jedi-ufs-env]\n  packages:\n    all:\n      compiler: [gcc@12.2.0]\n",
    )
    .unwrap();

    fs::create_dir_all(root.join("configs/sites/hera")).unwrap();
    fs::create_dir_all(root.join("configs/sites/orion")).unwrap();
    fs::create_dir_all(root.join("configs/common")).unwrap();

    let containers = root.join("configs/containers");
    fs::create_dir_all(&containers).unwrap();
    fs::write(
        containers.join("docker-ubuntu-gcc-openmpi.yaml"),
        "spack:\n  container:\n    format: docker\n",
    )
    .unwrap();

    temp
}

fn cmd(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("spack-stack").unwrap();
    cmd.env_remove("SPACK_STACK_ROOT")
        .env_remove("SPACK_STACK_LOG")
        .env("XDG_CONFIG_HOME", root.join("xdg"))
        .arg("--root")
        .arg(root);
    cmd
}

#[test]
fn lists_templates() {
    let temp = checkout();
    cmd(temp.path())
        .arg("templates")
        .assert()
        .success()
        .stdout(predicate::str::contains("skylab-dev"))
        .stdout(predicate::str::contains("empty"));
}

#[test]
fn lists_sites() {
    let temp = checkout();
    cmd(temp.path())
        .arg("sites")
        .assert()
        .success()
        .stdout(predicate::str::contains("hera"))
        .stdout(predicate::str::contains("orion"));
}

#[test]
fn unknown_template_creates_nothing() {
    let temp = checkout();
    let out = temp.path().join("envs");

    cmd(temp.path())
        .args(["create", "env", "--template", "no-such-template", "--dir"])
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"))
        .stderr(predicate::str::contains("spack-stack templates"));

    assert!(!out.exists());
}

#[test]
fn broken_template_gets_no_listing_hint() {
    let temp = checkout();
    let broken = temp.path().join("configs/templates/broken");
    fs::create_dir_all(&broken).unwrap();
    fs::write(broken.join("spack.yaml"), "spack: [unclosed\n").unwrap();

    cmd(temp.path())
        .args(["create", "env", "--template", "broken", "--dir"])
        .arg(temp.path().join("envs"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"))
        .stderr(predicate::str::contains("spack-stack templates").not());
}

#[test]
fn verbose_logs_resolved_checkout() {
    let temp = checkout();
    cmd(temp.path())
        .args(["-v", "sites"])
        .assert()
        .success()
        .stderr(predicate::str::contains("resolved stack checkout"));
}

#[test]
fn unknown_container_creates_nothing() {
    let temp = checkout();
    let out = temp.path().join("envs");

    cmd(temp.path())
        .args(["create", "ctr", "podman-rocky", "--template", "skylab-dev", "--dir"])
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid container"));

    assert!(!out.exists());
}

#[test]
fn creates_container_manifest() {
    let temp = checkout();
    let out = temp.path().join("envs");

    cmd(temp.path())
        .args([
            "create",
            "ctr",
            "docker-ubuntu-gcc-openmpi",
            "--template",
            "skylab-dev",
            "--dir",
        ])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("skylab-dev.docker-ubuntu-gcc-openmpi"));

    let manifest =
        fs::read_to_string(out.join("skylab-dev.docker-ubuntu-gcc-openmpi/spack.yaml")).unwrap();
    assert!(manifest.contains("app: skylab-dev"));
    assert!(manifest.contains("jedi-ufs-env"));
}

#[test]
fn unknown_site_fails() {
    let temp = checkout();
    let out = temp.path().join("envs");

    cmd(temp.path())
        .args(["create", "env", "--site", "atlantis", "--dir"])
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("site 'atlantis' does not exist"));
}

#[test]
fn bad_options_file() {
    let temp = checkout();
    let options = temp.path().join("options.yaml");
    fs::write(&options, "templat: skylab-dev\n").unwrap();

    cmd(temp.path())
        .args(["create", "env", "--from-file"])
        .arg(&options)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}
