//! Integration tests for fleetcache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn fleetcache() -> Command {
        cargo_bin_cmd!("fleetcache")
    }

    /// Write a config whose inventory, assignments and commands stay inside `dir`
    fn write_config(dir: &Path) -> PathBuf {
        let key = dir.join("id.pub");
        fs::write(&key, "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAITest ops@ci\n").unwrap();

        fs::write(
            dir.join("inventory.json"),
            r#"[
                {"id": "web-1", "name": "web-1", "hostname": "web-1.internal",
                 "operating_system": {"family": "ubuntu"},
                 "private_addresses": ["10.0.1.20"]},
                {"id": "db-1", "name": "db-1", "hostname": "db-1.internal",
                 "operating_system": {"family": "centos"},
                 "private_addresses": ["10.0.1.30"]}
            ]"#,
        )
        .unwrap();

        let config = format!(
            r#"
[server]
group_prefix = "cache-server"

[exec]
timeout_secs = 30
run_command = ["sh", "-c", "cat > /dev/null"]
provision_command = ["printf", "%s", '[{{"id": "srv-1", "name": "srv-1", "private_addresses": ["10.0.9.1"]}}]']

[admin]
enabled = true
user = "ops"
public_key_path = "{key}"

[inventory]
path = "{inventory}"
assignment_path = "{assignments}"
"#,
            key = key.display(),
            inventory = dir.join("inventory.json").display(),
            assignments = dir.join("servers.json").display(),
        );

        let path = dir.join("config.toml");
        fs::write(&path, config).unwrap();
        path
    }

    #[test]
    fn help_displays() {
        fleetcache()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Shared package-cache proxy provisioning for fleets of cloud nodes",
            ));
    }

    #[test]
    fn version_displays() {
        fleetcache()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("fleetcache"));
    }

    #[test]
    fn render_client_script() {
        fleetcache()
            .args(["render", "client", "--address", "10.0.0.5"])
            .assert()
            .success()
            .stdout(
                "sed -i 's/http:\\/\\//http:\\/\\/10.0.0.5:3142\\//' /etc/apt/sources.list\n\
                 apt-get check\n",
            );
    }

    #[test]
    fn render_server_script() {
        fleetcache()
            .args(["render", "server", "--family", "debian"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("apt-get -y install apt-cacher\n"));
    }

    #[test]
    fn render_windows_is_unsupported() {
        fleetcache()
            .args(["render", "server", "--family", "windows"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("does not support windows scripts"));
    }

    #[test]
    fn render_unknown_strategy() {
        fleetcache()
            .args(["render", "server", "--strategy", "gems"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown cache strategy: gems"));
    }

    #[test]
    fn config_path_honors_flag() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path());

        fleetcache()
            .arg("--config")
            .arg(&path)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path());

        fleetcache()
            .arg("--config")
            .arg(&path)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[server]"))
            .stdout(predicate::str::contains("timeout_secs = 30"));
    }

    #[test]
    fn strategies_lists_apt() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path());

        fleetcache()
            .arg("--config")
            .arg(&path)
            .arg("strategies")
            .assert()
            .success()
            .stdout(predicate::str::contains("apt"))
            .stdout(predicate::str::contains("3142"));
    }

    #[test]
    fn client_without_assignment_fails_with_hint() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path());

        fleetcache()
            .arg("--config")
            .arg(&path)
            .args(["client", "web-1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No cache server assignment found"))
            .stderr(predicate::str::contains("Run: fleetcache server"));
    }

    #[test]
    fn server_dry_run_saves_nothing() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path());

        fleetcache()
            .arg("--config")
            .arg(&path)
            .args(["server", "--dry-run"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Would create node cache-server-ubuntu-3"))
            .stdout(predicate::str::contains("useradd -m -s /bin/bash ops"))
            .stdout(predicate::str::contains("apt-get -y install apt-cacher"));

        assert!(!temp.path().join("servers.json").exists());
    }

    #[cfg(unix)]
    #[test]
    fn server_then_client_end_to_end() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path());

        fleetcache()
            .arg("--config")
            .arg(&path)
            .arg("server")
            .assert()
            .success()
            .stdout(predicate::str::contains("Created cache server"))
            .stdout(predicate::str::contains("apt cache installed"));

        let assignments = fs::read_to_string(temp.path().join("servers.json")).unwrap();
        assert!(assignments.contains("\"srv-1\""));
        assert!(assignments.contains("cache-server-ubuntu"));

        let inventory = fs::read_to_string(temp.path().join("inventory.json")).unwrap();
        assert!(inventory.contains("srv-1"));

        // Second run reuses the server it just created
        fleetcache()
            .arg("--config")
            .arg(&path)
            .arg("server")
            .assert()
            .success()
            .stdout(predicate::str::contains("Reused cache server"));

        fleetcache()
            .arg("--config")
            .arg(&path)
            .args(["client", "web-1", "db-1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("web-1: enabled apt"))
            .stdout(predicate::str::contains("db-1: no compatible cache server"));
    }

    #[test]
    fn client_unknown_node() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path());
        fs::write(temp.path().join("servers.json"), "{}").unwrap();

        fleetcache()
            .arg("--config")
            .arg(&path)
            .args(["client", "ghost-7"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Node not found in inventory: ghost-7"));
    }
}
