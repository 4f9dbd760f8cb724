use assert_cmd::Command;
use predicates::prelude::*;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::Path;

fn aichatconf() -> Command {
    let mut cmd = Command::cargo_bin("aichatconf").unwrap();
    for var in [
        "AICHATCONF_CONFIG",
        "AICHATCONF_CLIENT",
        "AICHATCONF_EXCLUDE",
        "OLLAMA_HOST",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn write_config(dir: &Path, text: &str) -> std::path::PathBuf {
    let path = dir.join("config.yaml");
    std::fs::write(&path, text).unwrap();
    path
}

/// Minimal Ollama stand-in on a background thread
fn serve_ollama() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { return };
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut content_length = 0;
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                if header.trim().is_empty() {
                    break;
                }
                if let Some((name, value)) = header.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut body = vec![0; content_length];
            reader.read_exact(&mut body).unwrap();
            let body = String::from_utf8(body).unwrap();

            let (status, payload) = if request_line.starts_with("GET /api/tags") {
                (
                    "200 OK",
                    r#"{"models":[{"name":"qwen2.5:7b"},{"name":"llama3:8b"},{"name":"nomic-embed-text"}]}"#
                        .to_string(),
                )
            } else if body.contains("qwen2.5:7b") {
                (
                    "200 OK",
                    r#"{"parameters":"temperature 0.7\ntop_p 0.8","model_info":{"qwen2.context_length":32768},"capabilities":["completion","tools"]}"#
                        .to_string(),
                )
            } else if body.contains("nomic-embed-text") {
                ("404 Not Found", r#"{"error":"model not found"}"#.to_string())
            } else {
                ("200 OK", "{}".to_string())
            };
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                payload.len(),
                payload
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{}/v1", addr)
}

#[test]
fn test_help() {
    aichatconf()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--no-sort"));
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    aichatconf()
        .arg("-c")
        .arg(dir.path().join("missing.yaml"))
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("missing.yaml"));
}

#[test]
fn test_empty_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "# nothing here\n");
    aichatconf()
        .arg("-c")
        .arg(&config)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_client_not_found_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "clients:\n  - name: ollama\n");
    let output = dir.path().join("out.yaml");
    aichatconf()
        .arg("-c")
        .arg(&config)
        .arg("-n")
        .arg("nope")
        .arg("-o")
        .arg(&output)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("nope"));
    assert!(!output.exists());
}

#[test]
fn test_unreachable_server_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "clients:\n  - name: ollama\n    api_base: http://127.0.0.1:9/v1\n",
    );
    aichatconf()
        .arg("-c")
        .arg(&config)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_sync_writes_output_file() {
    let api_base = serve_ollama();
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        &format!(
            "# my aichat config\nmodel: ollama:llama3:8b\nclients:\n  - type: openai-compatible\n    name: ollama\n    api_base: {}\n    models:\n      - name: llama3:8b # keep me\n        max_input_tokens: 8192\n      - name: phi3\n",
            api_base
        ),
    );
    let output = dir.path().join("out.yaml");

    aichatconf()
        .arg("-c")
        .arg(&config)
        .args(["-e", "embed", "-m", "qwen"])
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("remove model: phi3"))
        .stderr(predicate::str::contains("add model: qwen2.5:7b"));

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.starts_with("# my aichat config\nmodel: ollama:qwen2.5:7b\n"));
    assert!(written.contains("      - name: llama3:8b # keep me\n        max_input_tokens: 8192\n"));
    assert!(!written.contains("phi3"));

    let value: serde_yaml::Value = serde_yaml::from_str(&written).unwrap();
    let models = value["clients"][0]["models"].as_sequence().unwrap();
    let names: Vec<_> = models.iter().map(|m| m["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["llama3:8b", "qwen2.5:7b"]);
    assert_eq!(models[1]["max_input_tokens"].as_u64(), Some(32768));
    assert_eq!(models[1]["supports_function_calling"].as_bool(), Some(true));
}

#[test]
fn test_sync_to_stdout_quiet() {
    let api_base = serve_ollama();
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        &format!("clients:\n- name: local\n  api_base: {}\n", api_base),
    );

    let output = aichatconf()
        .arg("-c")
        .arg(&config)
        .args(["-n", "local", "-q"])
        .env("AICHATCONF_EXCLUDE", "qwen,embed")
        .assert()
        .success()
        .stderr(predicate::str::is_empty())
        .get_output()
        .stdout
        .clone();

    let printed = String::from_utf8(output).unwrap();
    assert!(printed.starts_with(&format!("clients:\n- name: local\n  api_base: {}\n", api_base)));
    let value: serde_yaml::Value = serde_yaml::from_str(&printed).unwrap();
    let models = value["clients"][0]["models"].as_sequence().unwrap();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0]["name"].as_str(), Some("llama3:8b"));
}
