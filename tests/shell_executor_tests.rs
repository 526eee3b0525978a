//! Integration tests for the shell command executor

use apid::subprocess::{
    CommandExecutor, ExitStatus, ProcessError, ShellExecutor, COMMAND_TIMEOUT,
};
use apid::variables::Variables;
use serde_json::json;
use std::time::{Duration, Instant};

fn sh() -> ShellExecutor {
    ShellExecutor::production().with_shell("/bin/sh")
}

#[tokio::test]
async fn test_echo_trailing_newline_is_stripped() {
    let output = sh().exec("echo hi", &Variables::new()).await.unwrap();
    assert_eq!(output.text(), "hi");
    assert_eq!(output.status, ExitStatus::Success);
}

#[tokio::test]
async fn test_empty_command_fails_without_spawning() {
    let started = Instant::now();
    let err = sh().exec("", &Variables::new()).await.unwrap_err();
    assert!(matches!(err, ProcessError::EmptyCommand));
    assert!(started.elapsed() < Duration::from_millis(100));
}

#[tokio::test]
async fn test_non_zero_exit_is_returned_not_raised() {
    let output = sh()
        .exec("echo partial; exit 3", &Variables::new())
        .await
        .unwrap();
    assert_eq!(output.text(), "partial");
    assert_eq!(output.status.code(), Some(3));
    assert!(!output.success());
}

#[tokio::test]
async fn test_flattened_variables_reach_the_shell() {
    let mut vars = Variables::new();
    vars.insert(
        "var",
        json!({"user-name": "ada", "tags": ["x", "y"], "retries": 3}),
    );

    let output = sh()
        .exec(
            "echo \"$VAR_USER_NAME $VAR_TAGS_1 $VAR_RETRIES\"",
            &vars,
        )
        .await
        .unwrap();
    assert_eq!(output.text(), "ada y 3");

    let blob = sh().exec("printf '%s\\n' \"$VAR\"", &vars).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&blob.text()).unwrap();
    assert_eq!(parsed["user-name"], json!("ada"));
}

#[tokio::test]
async fn test_stdin_is_empty() {
    let output = sh().exec("cat; echo done", &Variables::new()).await.unwrap();
    assert_eq!(output.text(), "done");
}

#[tokio::test]
async fn test_default_ceiling_terminates_long_commands() {
    let executor = sh();
    assert_eq!(executor.timeout(), COMMAND_TIMEOUT);

    let started = Instant::now();
    let err = executor
        .exec("sleep 30", &Variables::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ProcessError::Timeout(d) if d == COMMAND_TIMEOUT));
    let elapsed = started.elapsed();
    assert!(elapsed >= COMMAND_TIMEOUT);
    assert!(elapsed < COMMAND_TIMEOUT + Duration::from_secs(5));
}

#[tokio::test]
async fn test_nul_in_a_variable_does_not_abort_the_command() {
    let mut vars = Variables::new();
    vars.insert("z", json!("a\u{0}b"));
    vars.insert("greeting", json!("hi"));

    let output = sh()
        .exec("echo \"${Z-unset} $GREETING\"", &vars)
        .await
        .unwrap();
    assert_eq!(output.text(), "unset hi");
}
