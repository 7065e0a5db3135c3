//! Minimal CP/M harness for the classic 8080 test programs.
//!
//! CP/M memory layout, as far as the test programs care:
//! - 0x0000: Warm boot. We place `OUT 0` here; any port write ends the run.
//! - 0x0005: BDOS entry. We place `IN 0; RET`; the port read performs the
//!   system call and the `RET` returns to the caller.
//! - 0x0100: Program load address (TPA start) and entry point.
//!
//! The CPU core decides when port I/O happens; this crate decides what it
//! means. Memory and the completion flag live in a `Session` that the core
//! borrows for each `step()`.

use std::collections::TryReserveError;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use emu_core::{Bus, Cpu, Observable, Ticks, Value};
use thiserror::Error;

/// Size of the 8080 address space.
pub const MEMORY_SIZE: usize = 0x1_0000;

/// Load address and entry point for `.COM` images.
pub const LOAD_ORIGIN: u16 = 0x0100;

const WARM_BOOT: u16 = 0x0000;
const BDOS_ENTRY: u16 = 0x0005;

/// `OUT 0`
const WARM_BOOT_TRAP: [u8; 2] = [0xD3, 0x00];
/// `IN 0; RET`
const BDOS_TRAP: [u8; 3] = [0xDB, 0x00, 0xC9];

/// BDOS function 2: console output of the character in E.
const C_WRITE: u8 = 2;
/// BDOS function 9: console output of the `$`-terminated string at DE.
const C_WRITESTR: u8 = 9;
const STRING_TERMINATOR: u8 = b'$';

/// Value every BDOS call hands back to the CPU through the port read.
const BDOS_RESULT: u8 = 0xFF;

/// One test program and the cycle count a correct core needs to finish it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestCase {
    pub path: &'static str,
    pub origin: u16,
    pub expected_cycles: u64,
}

impl TestCase {
    #[must_use]
    pub const fn new(path: &'static str, expected_cycles: u64) -> Self {
        Self {
            path,
            origin: LOAD_ORIGIN,
            expected_cycles,
        }
    }
}

/// The test programs, in the order they run.
pub const SUITE: [TestCase; 4] = [
    TestCase::new("cpu_tests/TST8080.COM", 4_924),
    TestCase::new("cpu_tests/CPUTEST.COM", 255_653_383),
    TestCase::new("cpu_tests/8080PRE.COM", 7_817),
    TestCase::new("cpu_tests/8080EXM.COM", 23_803_381_171),
];

/// Outcome of one completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionResult {
    pub instructions: u64,
    pub cycles: Ticks,
    pub expected_cycles: Ticks,
    /// `expected_cycles - cycles`. Zero for an accurate core.
    pub diff: i128,
}

impl ExecutionResult {
    #[must_use]
    pub fn new(instructions: u64, cycles: Ticks, expected_cycles: Ticks) -> Self {
        Self {
            instructions,
            cycles,
            expected_cycles,
            diff: expected_cycles.diff(cycles),
        }
    }
}

impl std::fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} instructions executed on {} cycles (expected={}, diff={})",
            self.instructions, self.cycles, self.expected_cycles, self.diff
        )
    }
}

/// The 64K buffer could not be reserved.
#[derive(Debug, Error)]
#[error("can't allocate {size} bytes of memory", size = MEMORY_SIZE)]
pub struct AllocationError(#[from] TryReserveError);

/// A test image could not be placed in memory.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("can't open file '{}'.", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("while reading file '{}'", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("file {} can't fit in memory.", .path.display())]
    TooLarge { path: PathBuf, size: u64, origin: u16 },
}

/// Why a run produced no `ExecutionResult`.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("program did not finish within {0} instructions")]
    InstructionLimit(u64),
    #[error("console output failed")]
    Console(#[source] io::Error),
}

/// Flat, unprotected 64K of RAM.
pub struct MemoryImage {
    bytes: Box<[u8]>,
}

impl MemoryImage {
    /// Allocate a zeroed image without aborting the process on failure.
    pub fn new() -> Result<Self, AllocationError> {
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(MEMORY_SIZE)?;
        bytes.resize(MEMORY_SIZE, 0);
        Ok(Self {
            bytes: bytes.into_boxed_slice(),
        })
    }

    #[must_use]
    pub fn read(&self, address: u16) -> u8 {
        self.bytes[usize::from(address)]
    }

    pub fn write(&mut self, address: u16, value: u8) {
        self.bytes[usize::from(address)] = value;
    }

    /// Zero every byte.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    /// Copy `data` to `address`, wrapping at the top of the address space.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        let mut addr = address;
        for &byte in data {
            self.write(addr, byte);
            addr = addr.wrapping_add(1);
        }
    }

    /// Read a raw image file to `origin`. Returns the number of bytes loaded.
    ///
    /// The size is checked before anything is copied, so a rejected image
    /// leaves memory as it was.
    pub fn load_file(&mut self, path: &Path, origin: u16) -> Result<usize, LoadError> {
        let mut file = File::open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let size = file
            .metadata()
            .map_err(|source| LoadError::Read {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        if size + u64::from(origin) >= MEMORY_SIZE as u64 {
            return Err(LoadError::TooLarge {
                path: path.to_path_buf(),
                size,
                origin,
            });
        }

        let start = usize::from(origin);
        let end = start + size as usize;
        file.read_exact(&mut self.bytes[start..end])
            .map_err(|source| LoadError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(end - start)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

/// Patch the warm boot and BDOS entry points with the instructions that
/// reach `SyscallTrap`.
pub fn install_traps(memory: &mut MemoryImage) {
    memory.load(WARM_BOOT, &WARM_BOOT_TRAP);
    memory.load(BDOS_ENTRY, &BDOS_TRAP);
}

/// Stand-in for the CP/M BDOS and warm boot vector.
pub struct SyscallTrap<W> {
    console: W,
    finished: bool,
    /// First console write failure of the current run.
    console_error: Option<io::Error>,
}

impl<W: Write> SyscallTrap<W> {
    pub fn new(console: W) -> Self {
        Self {
            console,
            finished: false,
            console_error: None,
        }
    }

    /// True once the program has jumped to warm boot.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Prepare for a new run.
    pub fn reset(&mut self) {
        self.finished = false;
        self.console_error = None;
    }

    /// Handle the `IN` at the BDOS entry point.
    pub fn port_in(&mut self, memory: &MemoryImage, cpu: &dyn Observable) -> u8 {
        let function = cpu.query("c").and_then(Value::as_u8);
        match function {
            Some(C_WRITE) => {
                if let Some(ch) = cpu.query("e").and_then(Value::as_u8) {
                    self.emit(&[ch]);
                }
            }
            Some(C_WRITESTR) => {
                if let Some(start) = cpu.query("de").and_then(Value::as_u16) {
                    let text = Self::bdos_string(memory, start);
                    self.emit(&text);
                }
            }
            _ => {}
        }
        BDOS_RESULT
    }

    /// Handle the `OUT` at warm boot. Idempotent.
    pub fn port_out(&mut self) {
        self.finished = true;
    }

    /// Bytes from `start` up to (not including) the first `$`. Gives up
    /// after one pass over the address space.
    fn bdos_string(memory: &MemoryImage, start: u16) -> Vec<u8> {
        let mut text = Vec::new();
        let mut addr = start;
        for _ in 0..MEMORY_SIZE {
            let byte = memory.read(addr);
            if byte == STRING_TERMINATOR {
                break;
            }
            text.push(byte);
            addr = addr.wrapping_add(1);
        }
        text
    }

    fn emit(&mut self, bytes: &[u8]) {
        if self.console_error.is_some() {
            return;
        }
        if let Err(e) = self.console.write_all(bytes) {
            self.console_error = Some(e);
        }
    }

    /// Flush the console, returning the first failure seen this run.
    fn finish_output(&mut self) -> io::Result<()> {
        if let Some(e) = self.console_error.take() {
            return Err(e);
        }
        self.console.flush()
    }

    pub fn console(&self) -> &W {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut W {
        &mut self.console
    }
}

/// Everything the CPU can reach during a run.
pub struct Session<W> {
    pub memory: MemoryImage,
    pub trap: SyscallTrap<W>,
}

impl<W: Write> Bus for Session<W> {
    fn read(&mut self, address: u16) -> u8 {
        self.memory.read(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        self.memory.write(address, value);
    }

    fn io_read(&mut self, _port: u8, cpu: &dyn Observable) -> u8 {
        self.trap.port_in(&self.memory, cpu)
    }

    fn io_write(&mut self, _port: u8, _value: u8, _cpu: &dyn Observable) {
        self.trap.port_out();
    }
}

/// Drives one CPU core through test programs, reusing its memory.
pub struct TestRunner<C, W> {
    cpu: C,
    session: Session<W>,
    instruction_limit: Option<u64>,
}

impl<C: Cpu, W: Write> TestRunner<C, W> {
    pub fn new(cpu: C, memory: MemoryImage, console: W) -> Self {
        Self {
            cpu,
            session: Session {
                memory,
                trap: SyscallTrap::new(console),
            },
            instruction_limit: None,
        }
    }

    /// Fail a run with `RunError::InstructionLimit` instead of looping
    /// forever when the program never reaches warm boot.
    #[must_use]
    pub fn with_instruction_limit(mut self, limit: u64) -> Self {
        self.instruction_limit = Some(limit);
        self
    }

    /// Run the image at `path` from `LOAD_ORIGIN` until it jumps to warm
    /// boot, and compare its cycle count with `expected_cycles`.
    pub fn run(
        &mut self,
        path: impl AsRef<Path>,
        expected_cycles: u64,
    ) -> Result<ExecutionResult, RunError> {
        self.run_at(path.as_ref(), LOAD_ORIGIN, expected_cycles)
    }

    pub fn run_case(&mut self, case: &TestCase) -> Result<ExecutionResult, RunError> {
        self.run_at(Path::new(case.path), case.origin, case.expected_cycles)
    }

    fn run_at(
        &mut self,
        path: &Path,
        origin: u16,
        expected_cycles: u64,
    ) -> Result<ExecutionResult, RunError> {
        self.cpu.reset();
        self.session.trap.reset();
        self.session.memory.clear();

        self.session.memory.load_file(path, origin)?;
        writeln!(self.session.trap.console_mut(), "*** TEST: {}", path.display())
            .map_err(RunError::Console)?;

        install_traps(&mut self.session.memory);
        self.cpu.set_pc(origin);

        let mut instructions: u64 = 0;
        while !self.session.trap.is_finished() {
            if self.instruction_limit.is_some_and(|limit| instructions >= limit) {
                return Err(RunError::InstructionLimit(instructions));
            }
            instructions += 1;
            self.cpu.step(&mut self.session);
        }

        let result = ExecutionResult::new(
            instructions,
            self.cpu.cycles(),
            Ticks::new(expected_cycles),
        );

        self.session.trap.finish_output().map_err(RunError::Console)?;
        let console = self.session.trap.console_mut();
        write!(console, "\n*** {result}\n\n")
            .and_then(|()| console.flush())
            .map_err(RunError::Console)?;

        Ok(result)
    }

    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    pub fn memory(&self) -> &MemoryImage {
        &self.session.memory
    }

    pub fn trap(&self) -> &SyscallTrap<W> {
        &self.session.trap
    }

    /// Give back the console sink.
    pub fn into_console(self) -> W {
        self.session.trap.console
    }
}

/// Run every case in order. Failed cases are reported on stderr and do not
/// stop the cases after them.
pub fn run_suite<C: Cpu, W: Write>(
    runner: &mut TestRunner<C, W>,
    cases: &[TestCase],
) -> Vec<Result<ExecutionResult, RunError>> {
    cases
        .iter()
        .map(|case| {
            let outcome = runner.run_case(case);
            if let Err(e) = &outcome {
                eprintln!("error: {e}");
            }
            outcome
        })
        .collect()
}
