//! End-to-end runs of small hand-assembled CP/M programs.

use std::io::Write;

use emu_core::Cpu;
use i8080_test_harness::{
    LOAD_ORIGIN, LoadError, MemoryImage, RunError, TestCase, TestRunner, run_suite,
};
use intel_8080::I8080;
use tempfile::NamedTempFile;

fn image_file(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(bytes).expect("write image");
    file
}

/// `TestCase` holds `&'static str` paths so the suite can be a const.
fn static_path(file: &NamedTempFile) -> &'static str {
    Box::leak(file.path().to_string_lossy().into_owned().into_boxed_str())
}

fn runner() -> TestRunner<I8080, Vec<u8>> {
    let memory = MemoryImage::new().expect("64K allocation");
    TestRunner::new(I8080::new(), memory, Vec::new()).with_instruction_limit(100_000)
}

/// Prints a message with BDOS 9, a character with BDOS 2, then warm boots.
#[rustfmt::skip]
const HELLO: &[u8] = &[
    0x31, 0x00, 0xF0,       // 0100 LXI SP, 0xF000
    0x11, 0x13, 0x01,       // 0103 LXI D, msg
    0x0E, 0x09,             // 0106 MVI C, 9
    0xCD, 0x05, 0x00,       // 0108 CALL 5
    0x1E, b'!',             // 010B MVI E, '!'
    0x0E, 0x02,             // 010D MVI C, 2
    0xCD, 0x05, 0x00,       // 010F CALL 5
    0xC7,                   // 0112 RST 0
    b'O', b'K', b'$',       // 0113 msg
];

/// Cycles for HELLO: the program itself plus two trapped BDOS calls
/// (`IN` + `RET` each) and the warm boot `OUT`.
const HELLO_CYCLES: u64 = 10 + 10 + 7 + 17 + (10 + 10) + 7 + 7 + 17 + (10 + 10) + 11 + 10;

#[test]
fn hello_prints_and_matches_cycles() {
    let image = image_file(HELLO);
    let mut runner = runner();

    let result = runner.run(image.path(), HELLO_CYCLES).expect("run completes");

    assert_eq!(result.instructions, 13);
    assert_eq!(result.cycles.get(), HELLO_CYCLES);
    assert_eq!(result.diff, 0);

    let output = String::from_utf8(runner.into_console()).expect("ascii output");
    let expected = format!(
        "*** TEST: {}\nOK!\n*** 13 instructions executed on {HELLO_CYCLES} cycles (expected={HELLO_CYCLES}, diff=0)\n\n",
        image.path().display()
    );
    assert_eq!(output, expected);
}

#[test]
fn cycle_mismatch_is_reported_not_failed() {
    let image = image_file(HELLO);
    let mut runner = runner();

    let result = runner.run(image.path(), HELLO_CYCLES + 7).expect("run completes");

    assert_eq!(result.diff, 7);
}

#[test]
fn second_run_matches_isolated_run() {
    // A program that dirties registers, the stack and high memory.
    #[rustfmt::skip]
    let noisy: &[u8] = &[
        0x31, 0x00, 0x90,       // LXI SP, 0x9000
        0x21, 0x00, 0x80,       // LXI H, 0x8000
        0x36, 0xEE,             // MVI M, 0xEE
        0x37,                   // STC
        0xFB,                   // EI
        0xC3, 0x00, 0x00,       // JMP 0
    ];
    let noisy = image_file(noisy);
    let hello = image_file(HELLO);

    let mut isolated = runner();
    let alone = isolated.run(hello.path(), HELLO_CYCLES).expect("isolated run");

    let mut reused = runner();
    reused.run(noisy.path(), 0).expect("first run");
    assert_eq!(reused.memory().read(0x8000), 0xEE);
    let second = reused.run(hello.path(), HELLO_CYCLES).expect("second run");

    assert_eq!(second, alone);
    assert_eq!(reused.memory().read(0x8000), 0x00, "memory was zeroed");
    assert_eq!(reused.cpu().registers(), isolated.cpu().registers());
}

#[test]
fn traps_survive_an_image_that_covers_them() {
    // Origin 0 puts the image over both trap addresses; the traps must win.
    let mut bytes = vec![0x76; 0x20]; // HLT everywhere
    bytes[0x10..0x13].copy_from_slice(&[0xC3, 0x00, 0x00]);
    let image = image_file(&bytes);
    let case = TestCase {
        path: static_path(&image),
        origin: 0,
        expected_cycles: 10,
    };

    let mut runner = runner();
    let result = runner.run_case(&case).expect("run completes");

    assert_eq!(&runner.memory().as_slice()[0x00..0x02], &[0xD3, 0x00]);
    assert_eq!(&runner.memory().as_slice()[0x05..0x08], &[0xDB, 0x00, 0xC9]);
    // Execution starts at the origin, which is now the warm boot trap.
    assert_eq!(result.instructions, 1);
    assert_eq!(result.diff, 0);
}

#[test]
fn load_failure_skips_only_that_case() {
    let hello = image_file(HELLO);
    let cases = [
        TestCase::new("cpu_tests/DOES_NOT_EXIST.COM", 1),
        TestCase::new(static_path(&hello), HELLO_CYCLES),
    ];

    let mut runner = runner();
    let outcomes = run_suite(&mut runner, &cases);

    assert!(matches!(
        outcomes[0],
        Err(RunError::Load(LoadError::Open { .. }))
    ));
    let result = outcomes[1].as_ref().expect("second case runs");
    assert_eq!(result.diff, 0);
}

#[test]
fn read_failure_skips_only_that_case() {
    let dir = tempfile::tempdir().expect("temp dir");
    let dir_path: &'static str =
        Box::leak(dir.path().to_string_lossy().into_owned().into_boxed_str());
    let hello = image_file(HELLO);
    let cases = [
        TestCase::new(dir_path, 1),
        TestCase::new(static_path(&hello), HELLO_CYCLES),
    ];

    let mut runner = runner();
    let outcomes = run_suite(&mut runner, &cases);

    assert!(matches!(
        outcomes[0],
        Err(RunError::Load(LoadError::Read { .. }))
    ));
    let result = outcomes[1].as_ref().expect("second case runs");
    assert_eq!(result.diff, 0);
    let output = String::from_utf8(runner.into_console()).expect("ascii output");
    let marker = format!("*** TEST: {}\n", hello.path().display());
    assert!(output.starts_with(&marker), "no test marker for the failed load");
    assert!(output.contains("OK!"));
}

#[test]
fn oversized_image_fails_with_load_error() {
    let image = image_file(&vec![0u8; 0x1_0000 - usize::from(LOAD_ORIGIN)]);
    let mut runner = runner();

    let err = runner.run(image.path(), 0).unwrap_err();

    assert!(matches!(err, RunError::Load(LoadError::TooLarge { .. })));
    assert!(runner.memory().as_slice().iter().all(|&b| b == 0));
    let output = String::from_utf8(runner.into_console()).expect("ascii output");
    assert!(output.is_empty(), "no test marker for an image that never loaded");
}
