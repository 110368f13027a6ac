//! End-to-end tests for the `vgb` binary
//!
//! Run-level failures (configuration, input directory) must stop the batch
//! before any result file is written. One full run goes against a wiremock
//! backend with real time, which is fine because the stream completes on the
//! first poll.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::{
    matchers::{body_string_contains, method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Command isolated from the caller's environment and `.env` file
fn vgb(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("vgb").unwrap();
    cmd.current_dir(cwd)
        .env_remove("API_KEY")
        .env_remove("BACKEND_URL")
        .env_remove("LOG_LEVEL")
        .env_remove("LOG_OUTPUT");
    cmd
}

fn result_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| name.starts_with("results_"))
        .collect();
    names.sort();
    names
}

#[test]
fn test_remote_backend_without_api_key_aborts() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.wav"), b"audio").unwrap();

    vgb(dir.path())
        .arg(dir.path())
        .arg("--backend-url")
        .arg("https://api.voiceguard.example/query")
        .arg("--output-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("API key is required"));

    assert!(result_files(dir.path()).is_empty());
}

#[test]
fn test_invalid_backend_url_aborts() {
    let dir = TempDir::new().unwrap();

    vgb(dir.path())
        .arg(dir.path())
        .arg("--backend-url")
        .arg("::not-a-url::")
        .arg("--api-key")
        .arg("k")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid backend URL"));
}

#[test]
fn test_invalid_directory_aborts() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing");

    vgb(dir.path())
        .arg(&missing)
        .arg("--backend-url")
        .arg("http://localhost:9/query")
        .arg("--output-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a valid directory"));

    assert!(result_files(dir.path()).is_empty());
}

#[test]
fn test_no_matching_files_writes_nothing() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("notes.txt"), b"not audio").unwrap();

    vgb(dir.path())
        .arg(dir.path())
        .arg("--backend-url")
        .arg("http://127.0.0.1:9/query")
        .arg("--output-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("No files found"));

    assert!(result_files(dir.path()).is_empty());
}

#[test]
fn test_rejects_unknown_output_format() {
    let dir = TempDir::new().unwrap();

    vgb(dir.path())
        .arg(dir.path())
        .arg("--output")
        .arg("xml")
        .assert()
        .failure()
        .code(2);
}

#[tokio::test]
async fn test_full_run_writes_both_artifacts() {
    let server = MockServer::start().await;
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    fs::write(input.path().join("call.WAV"), b"RIFF not really audio").unwrap();
    fs::write(input.path().join("skip.txt"), b"ignored").unwrap();

    Mock::given(method("POST"))
        .and(body_string_contains("mutation CreateFileBlob"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "createFileBlob": { "id": "blob-1", "url": format!("{}/upload/1", server.uri()) } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/upload/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("mutation CreateFiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "createFiles": { "files": [{ "id": "file-1" }] } }
        })))
        .mount(&server)
        .await;

    let stream = json!({
        "data": {
            "getStreamByOriginalFileId": {
                "id": "stream-1",
                "streamStatus": "COMPLETED",
                "streamResult": { "conclusion": "AUTHENTIC", "probability": 0.03 },
                "segments": []
            }
        }
    });
    Mock::given(method("POST"))
        .and(body_string_contains("getStreamByOriginalFileId"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stream))
        .mount(&server)
        .await;

    vgb(output.path())
        .arg(input.path())
        .arg("--extensions")
        .arg("wav")
        .arg("--backend-url")
        .arg(format!("{}/query", server.uri()))
        .arg("--output")
        .arg("both")
        .arg("--output-dir")
        .arg(output.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Processing complete"))
        .stdout(predicate::str::contains("1 completed, 0 timed out, 0 errored"));

    let files = result_files(output.path());
    assert_eq!(files.len(), 2, "{:?}", files);
    assert!(files[0].ends_with(".csv"));
    assert!(files[1].ends_with(".json"));

    let csv = fs::read_to_string(output.path().join(&files[0])).unwrap();
    assert!(csv.starts_with("original_filename,file_id,stream_id,status,conclusion,probability,reason"));
    assert!(csv.contains("call.WAV,file-1,stream-1,COMPLETED,AUTHENTIC,0.03,"), "{}", csv);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output.path().join(&files[1])).unwrap()).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["file_id"], "file-1");
    assert_eq!(json[0]["stream_data"]["id"], "stream-1");
}
