use assert_cmd::Command;

/// Build a `tasklog` invocation.
pub fn tasklog_cmd() -> Command {
    Command::cargo_bin("tasklog").expect("binary")
}

/// Run `tasklog exec` in test mode and return captured stdout.
pub fn exec_test_mode(lines: &[&str]) -> Vec<u8> {
    let mut cmd = tasklog_cmd();
    cmd.arg("--test-mode").arg("exec");
    for line in lines {
        cmd.arg(line);
    }
    cmd.assert().success().get_output().stdout.clone()
}
