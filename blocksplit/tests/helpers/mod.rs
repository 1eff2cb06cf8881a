//! Runs the compiled `blocksplit` binary for the integration tests.
#![allow(
    dead_code,
    reason = "is used in integration tests but unable to find a way to silence these warnings"
)]

use std::fs::File;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::ExitStatus;
use std::process::Stdio;
use std::time::Duration;

use wait_timeout::ChildExt;

#[derive(Debug)]
pub(crate) struct Run {
    pub(crate) status: ExitStatus,
    pub(crate) output_dir: PathBuf,
    pub(crate) log_file: PathBuf,
    pub(crate) err_file: PathBuf,
}

impl Run {
    pub(crate) fn log(&self) -> String {
        std::fs::read_to_string(&self.log_file).expect("Failed to read the log file.")
    }

    /// The contents of the block file written for the decomposition with the given rank.
    pub(crate) fn dec_file(&self, model_name: &str, rank: usize) -> String {
        std::fs::read_to_string(self.output_dir.join(format!("{model_name}.{rank}.dec")))
            .expect("Failed to read the written block file.")
    }

    pub(crate) fn cleanup(self) -> std::io::Result<()> {
        std::fs::remove_dir_all(self.output_dir)
    }
}

pub(crate) fn instance(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("instances")
        .join(name)
}

/// Run blocksplit on the given instance, writing the decompositions and the logs to a fresh
/// directory named after `test_name`.
pub(crate) fn run_blocksplit(
    instance_name: &str,
    test_name: &str,
    args: impl IntoIterator<Item = String>,
) -> Run {
    const TEST_TIMEOUT: Duration = Duration::from_secs(60);

    let blocksplit = PathBuf::from(env!("CARGO_BIN_EXE_blocksplit"));

    let output_dir = Path::new(env!("CARGO_TARGET_TMPDIR")).join(test_name);
    if output_dir.exists() {
        std::fs::remove_dir_all(&output_dir).expect("Failed to clear the output directory.");
    }
    std::fs::create_dir_all(&output_dir).expect("Failed to create the output directory.");

    let log_file_path = output_dir.join("blocksplit.log");
    let err_file_path = output_dir.join("blocksplit.err");

    let mut command = Command::new(blocksplit);
    let _ = command.arg("--output-dir").arg(&output_dir);
    for arg in args {
        let _ = command.arg(arg);
    }

    let mut child = command
        .arg(instance(instance_name))
        .stdout(File::create(&log_file_path).expect("Failed to create log file."))
        .stderr(File::create(&err_file_path).expect("Failed to create error file."))
        .stdin(Stdio::null())
        .spawn()
        .expect("Failed to run blocksplit.");

    let status = match child.wait_timeout(TEST_TIMEOUT) {
        Ok(None) => panic!("blocksplit took more than {} seconds", TEST_TIMEOUT.as_secs()),
        Ok(Some(status)) => status,
        Err(e) => panic!("error starting blocksplit: {e}"),
    };

    Run {
        status,
        output_dir,
        log_file: log_file_path,
        err_file: err_file_path,
    }
}
