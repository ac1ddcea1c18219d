#![allow(deprecated)]
use assert_cmd::Command;
use mockito::Matcher;
use predicates::prelude::*;
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "STORYHOOK_CONFIG",
    "STORY_REPO",
    "GITHUB_WEBHOOK_SECRET",
    "GITHUB_TOKEN",
    "GITHUB_API_BASE",
    "PORT",
];

fn storyhook() -> Command {
    let mut cmd = Command::cargo_bin("storyhook").unwrap();
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

// ---------------------------------------------------------------------------
// storyhook resolve
// ---------------------------------------------------------------------------

#[test]
fn resolve_prints_story_locator() {
    storyhook()
        .args(["resolve", "--story-repo", "acme/stories"])
        .write_stdin("Part of acme/stories#42, see thread.")
        .assert()
        .success()
        .stdout("https://api.github.com/repos/acme/stories/issues/42\n");
}

#[test]
fn resolve_accepts_web_url_and_custom_api_base() {
    storyhook()
        .args([
            "resolve",
            "--story-repo",
            "acme/stories",
            "--api-base",
            "https://ghe.example.com/api/v3/",
        ])
        .write_stdin("Story: https://github.com/acme/stories/issues/9")
        .assert()
        .success()
        .stdout("https://ghe.example.com/api/v3/repos/acme/stories/issues/9\n");
}

#[test]
fn resolve_reads_story_repo_from_env() {
    storyhook()
        .env("STORY_REPO", "acme/stories")
        .arg("resolve")
        .write_stdin("acme/stories#3")
        .assert()
        .success()
        .stdout(predicate::str::ends_with("/repos/acme/stories/issues/3\n"));
}

#[test]
fn resolve_without_reference_fails() {
    storyhook()
        .args(["resolve", "--story-repo", "acme/stories"])
        .write_stdin("mentions bigacme/stories#4 and acme/other#1")
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("no reference to acme/stories found"));
}

#[test]
fn resolve_json_output() {
    let out = storyhook()
        .args(["--json", "resolve", "--story-repo", "acme/stories"])
        .write_stdin("acme/stories#7")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["repo"], "acme/stories");
    assert_eq!(value["number"], 7);
    assert_eq!(
        value["url"],
        "https://api.github.com/repos/acme/stories/issues/7"
    );
}

// ---------------------------------------------------------------------------
// storyhook tick
// ---------------------------------------------------------------------------

#[test]
fn tick_rewrites_matching_line_only() {
    let story = "## Tasks\n- [ ] api (acme/worker#7)\n- [ ] docs (acme/worker#70)\n";
    storyhook()
        .args(["tick", "--owner", "acme", "--repo", "worker", "--number", "7"])
        .write_stdin(story)
        .assert()
        .success()
        .stdout("## Tasks\n- [x] api (acme/worker#7)\n- [ ] docs (acme/worker#70)\n")
        .stderr(predicate::str::contains("ticked 1 line for acme/worker#7"));
}

#[test]
fn tick_without_match_echoes_body_unchanged() {
    let story = "- [x] done (acme/worker#7)\nno trailing newline";
    storyhook()
        .args(["tick", "--owner", "acme", "--repo", "worker", "--number", "7"])
        .write_stdin(story)
        .assert()
        .success()
        .stdout(story)
        .stderr(predicate::str::contains("ticked 0 lines"));
}

#[test]
fn tick_json_output() {
    let out = storyhook()
        .args([
            "-j", "tick", "--owner", "acme", "--repo", "worker", "--number", "7",
        ])
        .write_stdin("- [ ] a (acme/worker#7)\n- [ ] b (acme/worker#7)")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["lines"], 2);
    assert_eq!(
        value["body"],
        "- [x] a (acme/worker#7)\n- [x] b (acme/worker#7)"
    );
}

#[test]
fn tick_requires_number() {
    storyhook()
        .args(["tick", "--owner", "acme", "--repo", "worker"])
        .write_stdin("")
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// storyhook serve / install: configuration errors surface before any I/O
// ---------------------------------------------------------------------------

#[test]
fn serve_without_story_repo_fails() {
    storyhook()
        .args(["serve", "--port", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("story_repo is not set"));
}

#[test]
fn serve_rejects_bad_path_from_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storyhook.yaml");
    std::fs::write(&path, "story_repo: acme/stories\nwebhook_path: hooks\n").unwrap();

    storyhook()
        .arg("--config")
        .arg(&path)
        .args(["serve", "--port", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must start with '/'"));
}

#[test]
fn serve_with_missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    storyhook()
        .arg("--config")
        .arg(dir.path().join("nope.yaml"))
        .args(["serve", "--story-repo", "acme/stories"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"));
}

#[test]
fn install_without_token_fails() {
    storyhook()
        .args([
            "install",
            "--story-repo",
            "acme/stories",
            "--webhook-url",
            "https://hooks.example.com/",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GITHUB_TOKEN"));
}

// ---------------------------------------------------------------------------
// storyhook install against a mock GitHub API
// ---------------------------------------------------------------------------

const HOOK_URL: &str = "https://hooks.example.com/";

fn repo_json(server: &mockito::ServerGuard, name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "full_name": format!("acme/{name}"),
        "hooks_url": format!("{}/repos/acme/{name}/hooks", server.url()),
    })
}

fn install(server: &mockito::ServerGuard) -> Command {
    let mut cmd = storyhook();
    cmd.env("GITHUB_TOKEN", "ghp_test")
        .env("GITHUB_API_BASE", server.url())
        .env("GITHUB_WEBHOOK_SECRET", "hook secret")
        .args([
            "install",
            "--story-repo",
            "acme/stories",
            "--webhook-url",
            HOOK_URL,
        ]);
    cmd
}

#[test]
fn install_creates_missing_hooks_and_skips_present_ones() {
    let mut server = mockito::Server::new();
    let repos = serde_json::json!([repo_json(&server, "worker"), repo_json(&server, "api")]);
    let list = server
        .mock("GET", "/orgs/acme/repos")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer ghp_test")
        .with_status(200)
        .with_body(repos.to_string())
        .create();
    server
        .mock("GET", "/repos/acme/worker/hooks")
        .with_status(200)
        .with_body("[]")
        .create();
    server
        .mock("GET", "/repos/acme/api/hooks")
        .with_status(200)
        .with_body(serde_json::json!([{"config": {"url": HOOK_URL}}]).to_string())
        .create();
    let created = server
        .mock("POST", "/repos/acme/worker/hooks")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "events": ["issues"],
            "config": {"url": HOOK_URL, "content_type": "json", "secret": "hook secret"}
        })))
        .with_status(201)
        .with_body("{}")
        .create();
    let untouched = server
        .mock("POST", "/repos/acme/api/hooks")
        .expect(0)
        .create();

    install(&server)
        .assert()
        .success()
        .stdout(predicate::str::contains("installed  acme/worker"))
        .stdout(predicate::str::contains("present    acme/api"))
        .stdout(predicate::str::contains(
            "acme: 1 installed, 1 already present, 0 failed",
        ));

    list.assert();
    created.assert();
    untouched.assert();
}

#[test]
fn install_reports_failed_repository_and_exits_nonzero() {
    let mut server = mockito::Server::new();
    let repos = serde_json::json!([repo_json(&server, "worker"), repo_json(&server, "broken")]);
    server
        .mock("GET", "/orgs/acme/repos")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(repos.to_string())
        .create();
    server
        .mock("GET", "/repos/acme/worker/hooks")
        .with_status(200)
        .with_body("[]")
        .create();
    server
        .mock("GET", "/repos/acme/broken/hooks")
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create();
    let created = server
        .mock("POST", "/repos/acme/worker/hooks")
        .with_status(201)
        .with_body("{}")
        .create();

    install(&server)
        .assert()
        .failure()
        .stdout(predicate::str::contains("installed  acme/worker"))
        .stdout(predicate::str::contains("failed     acme/broken"))
        .stdout(predicate::str::contains(
            "acme: 1 installed, 0 already present, 1 failed",
        ))
        .stderr(predicate::str::contains(
            "1 repository in 'acme' could not be configured",
        ));

    created.assert();
}

#[test]
fn install_json_output_lists_each_repository() {
    let mut server = mockito::Server::new();
    let repos = serde_json::json!([repo_json(&server, "worker")]);
    server
        .mock("GET", "/orgs/acme/repos")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(repos.to_string())
        .create();
    server
        .mock("GET", "/repos/acme/worker/hooks")
        .with_status(200)
        .with_body(serde_json::json!([{"config": {"url": HOOK_URL}}]).to_string())
        .create();

    let out = install(&server)
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["org"], "acme");
    assert_eq!(value["installed"], serde_json::json!([]));
    assert_eq!(value["already_installed"], serde_json::json!(["acme/worker"]));
    assert_eq!(value["failed"], serde_json::json!([]));
}

#[test]
fn install_fails_when_repositories_cannot_be_listed() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/orgs/acme/repos")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body(r#"{"message":"Resource not accessible"}"#)
        .create();

    install(&server)
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("403"));
}
