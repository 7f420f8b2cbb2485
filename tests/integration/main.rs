//! Integration tests for gexpin

mod gateway_tests;

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn gexpin() -> Command {
        cargo_bin_cmd!("gexpin")
    }

    fn config_file(dir: &TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn help_displays() {
        gexpin()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("pin gx packages"));
    }

    #[test]
    fn version_displays() {
        gexpin()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("gexpin"));
    }

    #[test]
    fn config_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        gexpin()
            .arg("--config")
            .arg(&path)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("custom.toml"));
    }

    #[test]
    fn config_show() {
        let dir = TempDir::new().unwrap();
        let path = config_file(&dir, "[ipfs]\napi_url = \"http://10.1.2.3:5001\"\n");
        gexpin()
            .arg("--config")
            .arg(&path)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[server]"))
            .stdout(predicate::str::contains("http://10.1.2.3:5001"));
    }

    #[test]
    fn config_init_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        gexpin()
            .arg("--config")
            .arg(&path)
            .args(["config", "init"])
            .assert()
            .success();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("log_path = \"pinlogs\""));
    }

    #[test]
    fn invalid_config_fails() {
        let dir = TempDir::new().unwrap();
        let path = config_file(&dir, "[server\n");
        gexpin()
            .arg("--config")
            .arg(&path)
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn status_reports_unreachable_daemon() {
        let dir = TempDir::new().unwrap();
        let path = config_file(&dir, "[ipfs]\napi_url = \"http://127.0.0.1:9\"\n");
        gexpin()
            .arg("--config")
            .arg(&path)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("Appears to be down"));
    }

    #[test]
    fn serve_rejects_bad_listen_address() {
        let dir = TempDir::new().unwrap();
        let path = config_file(&dir, "");
        gexpin()
            .arg("--config")
            .arg(&path)
            .args(["serve", "--listen", "not-an-address"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("server.listen"));
    }
}
