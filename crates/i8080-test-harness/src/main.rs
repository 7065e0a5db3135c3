//! Runs the 8080 CP/M test programs and reports cycle accuracy.
//!
//! Expects the images under `cpu_tests/` relative to the working directory.
//! A missing image is reported and skipped; a cycle mismatch is reported in
//! the summary line and does not change the exit code.

use std::io;
use std::process;

use i8080_test_harness::{MemoryImage, SUITE, TestRunner, run_suite};
use intel_8080::I8080;

fn main() {
    let memory = match MemoryImage::new() {
        Ok(memory) => memory,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    let mut runner = TestRunner::new(I8080::new(), memory, io::stdout());
    run_suite(&mut runner, &SUITE);
}
