use std::process::Command;

fn anat_seg() -> Command {
    Command::new(env!("CARGO_BIN_EXE_anat_seg"))
}

#[test]
fn test_no_arguments_prints_help_to_stderr() {
    let output = anat_seg().output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage:"), "stderr was: {stderr}");
    assert!(stderr.contains("--output-dir"));
}

#[test]
fn test_version_flag() {
    let output = anat_seg().arg("--version").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("anat_seg {}", env!("CARGO_PKG_VERSION"))
    );
}
