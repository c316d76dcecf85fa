//! Integration tests for the orgbox binary

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use serial_test::serial;

    fn orgbox() -> Command {
        cargo_bin_cmd!("orgbox")
    }

    #[test]
    fn help_displays() {
        orgbox()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Scratch org provisioning and package install automation",
            ));
    }

    #[test]
    fn version_displays() {
        orgbox()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("orgbox"));
    }

    #[test]
    fn config_path() {
        orgbox()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        orgbox()
            .args(["--no-local", "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"));
    }

    #[test]
    fn custom_config_is_honored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[cli]\nbinary = \"sf-custom\"\n").unwrap();

        orgbox()
            .args(["--no-local", "--config"])
            .arg(&path)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("sf-custom"));
    }

    #[test]
    #[serial]
    fn org_list_runs() {
        orgbox()
            .args(["org", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No orgs").or(predicate::str::contains("NAME")));
    }

    #[test]
    #[serial]
    fn delete_missing_org() {
        orgbox()
            .args(["org", "delete", "nonexistent-org", "--yes"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Org not found"));
    }

    #[test]
    #[serial]
    fn password_missing_org() {
        orgbox()
            .args(["org", "password", "nonexistent-org"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Org not found"));
    }

    #[test]
    #[serial]
    fn package_install_missing_org() {
        orgbox()
            .args(["package", "install", "nonexistent-org", "04t000000000000"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Org not found"));
    }

    #[test]
    fn package_install_rejects_bad_spec() {
        orgbox()
            .args(["package", "install", "dev", "not-a-package"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid package spec"));
    }

    #[test]
    fn checkout_without_pool_fails_with_hint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.toml");
        std::fs::write(&path, "").unwrap();

        orgbox()
            .args(["--no-local", "--config"])
            .arg(&path)
            .args(["org", "checkout", "pooled-dev"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No pool id configured"));
    }

    #[test]
    fn org_create_requires_name() {
        orgbox()
            .args(["org", "create"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("required"));
    }
}
