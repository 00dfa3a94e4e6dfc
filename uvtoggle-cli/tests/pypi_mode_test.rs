//! Integration tests for the uvtoggle binary
//!
//! Only the --pypi path and argument errors are exercised end to end; they
//! are the invocations that need neither network nor git. A failed uv sync
//! is expected and must not affect the exit code.

use std::path::Path;
use std::process::{Command, Output};

use anyhow::Result;
use serial_test::serial;
use tempfile::TempDir;

fn run_uvtoggle(project_dir: &Path, args: &[&str]) -> Result<Output> {
    let output = Command::new(env!("CARGO_BIN_EXE_uvtoggle"))
        .args(args)
        .current_dir(project_dir)
        .output()?;
    Ok(output)
}

const WITH_OVERRIDE: &str = r#"[project]
name = "demo"
version = "0.1.0"
# deliberate comment
dependencies = ["foo"]

[tool.uv.sources]
foo = { path = "pypi/foo", editable = true }
"#;

#[test]
#[serial]
fn pypi_mode_removes_the_override() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let pyproject = temp_dir.path().join("pyproject.toml");
    std::fs::write(&pyproject, WITH_OVERRIDE)?;

    let output = run_uvtoggle(temp_dir.path(), &["foo", "--pypi"])?;
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Removed custom source for foo"));

    let content = std::fs::read_to_string(&pyproject)?;
    assert!(!content.contains("pypi/foo"));
    assert!(content.contains("# deliberate comment"));
    assert!(content.contains("dependencies = [\"foo\"]"));
    Ok(())
}

#[test]
#[serial]
fn pypi_mode_is_a_no_op_without_an_override() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let pyproject = temp_dir.path().join("pyproject.toml");
    let original = "[project]\nname = \"demo\"\ndependencies = [\"foo\"]\n";
    std::fs::write(&pyproject, original)?;

    let output = run_uvtoggle(temp_dir.path(), &["foo", "--pypi"])?;
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Already using the PyPI version for foo"));

    // byte-for-byte no-op
    assert_eq!(std::fs::read_to_string(&pyproject)?, original);
    Ok(())
}

#[test]
#[serial]
fn missing_pyproject_is_a_hard_error() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let output = run_uvtoggle(temp_dir.path(), &["foo", "--pypi"])?;
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No pyproject.toml found"));
    Ok(())
}

#[test]
#[serial]
fn conflicting_mode_flags_are_a_usage_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    std::fs::write(temp_dir.path().join("pyproject.toml"), WITH_OVERRIDE)?;

    let output = run_uvtoggle(temp_dir.path(), &["foo", "--local", "--pypi"])?;
    assert!(!output.status.success());

    // the file must not have been touched
    let content = std::fs::read_to_string(temp_dir.path().join("pyproject.toml"))?;
    assert_eq!(content, WITH_OVERRIDE);
    Ok(())
}

#[test]
#[serial]
fn remove_editable_reports_when_nothing_is_editable() -> Result<()> {
    let temp_dir = TempDir::new()?;
    std::fs::write(
        temp_dir.path().join("pyproject.toml"),
        "[project]\nname = \"demo\"\n",
    )?;

    let output = run_uvtoggle(temp_dir.path(), &["--remove-editable"])?;
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No editable sources found"));
    Ok(())
}
