use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn wayshare_cmd(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("wayshare").expect("binary exists");
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("RUST_LOG");
    cmd
}

fn write_provider(dir: &TempDir, file: &str, json: &str) {
    std::fs::write(dir.path().join(file), json).unwrap();
}

#[test]
fn wayshare_help_prints_usage() {
    let home = TempDir::new().unwrap();
    wayshare_cmd(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Screenshot and link sharing through configurable web providers",
        ));
}

#[test]
fn daemon_requires_wayland_env() {
    let home = TempDir::new().unwrap();
    wayshare_cmd(&home)
        .env_remove("WAYLAND_DISPLAY")
        .arg("--daemon")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Wayland environment required"));
}

#[test]
fn capture_requires_run_flag() {
    let home = TempDir::new().unwrap();
    wayshare_cmd(&home)
        .args(["--capture", "region"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "required arguments were not provided",
        ));
}

#[test]
fn list_groups_providers_and_reports_broken_files() {
    let home = TempDir::new().unwrap();
    let providers = TempDir::new().unwrap();
    write_provider(
        &providers,
        "imgur.json",
        r#"{"Name":"Imgur","RequestType":"POST","RequestURL":"https://api.example.com/upload","FileFormName":"image"}"#,
    );
    write_provider(
        &providers,
        "short.json",
        r#"{"Name":"Shortener","RequestType":"GET","RequestURL":"https://short.example.com"}"#,
    );
    write_provider(&providers, "broken.json", r#"{"Name":"Broken"}"#);

    wayshare_cmd(&home)
        .arg("--list")
        .arg("--providers-dir")
        .arg(providers.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Imgur (POST https://api.example.com/upload)"))
        .stdout(predicate::str::contains("Shortener (GET https://short.example.com)"))
        .stdout(predicate::str::contains("Skipped:"))
        .stdout(predicate::str::contains("broken.json"));
}

#[test]
fn run_unknown_provider_fails() {
    let home = TempDir::new().unwrap();
    let providers = TempDir::new().unwrap();

    wayshare_cmd(&home)
        .args(["--run", "Nope", "--providers-dir"])
        .arg(providers.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No provider named 'Nope'"));
}

#[test]
fn invalid_config_is_reported() {
    let home = TempDir::new().unwrap();
    let config_dir = home.path().join("wayshare");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "[request\n").unwrap();

    wayshare_cmd(&home)
        .arg("--list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}
