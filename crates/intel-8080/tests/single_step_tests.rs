//! Hand-written single-instruction vectors, laid out like `SingleStepTests`.
//!
//! Each case gives the register file and touched RAM before and after one
//! `step()`, plus the cycles the instruction must report. Vectors live in
//! `tests/data/single_step.json`.

use emu_core::{Bus, Cpu, SimpleBus};
use intel_8080::I8080;
use serde::Deserialize;

const VECTORS: &str = include_str!("data/single_step.json");

/// JSON test case format.
#[derive(Deserialize)]
struct TestCase {
    name: String,
    initial: CpuState,
    #[serde(rename = "final")]
    final_state: CpuState,
    cycles: u32,
}

/// JSON CPU state format.
#[derive(Deserialize)]
struct CpuState {
    pc: u16,
    sp: u16,
    a: u8,
    b: u8,
    c: u8,
    d: u8,
    e: u8,
    f: u8,
    h: u8,
    l: u8,
    ram: Vec<(u16, u8)>,
}

fn setup(cpu: &mut I8080, bus: &mut SimpleBus, state: &CpuState) {
    for &(addr, value) in &state.ram {
        bus.write(addr, value);
    }

    let regs = cpu.registers_mut();
    regs.a = state.a;
    regs.f = state.f;
    regs.b = state.b;
    regs.c = state.c;
    regs.d = state.d;
    regs.e = state.e;
    regs.h = state.h;
    regs.l = state.l;
    regs.sp = state.sp;
    regs.pc = state.pc;
}

/// Compare the CPU/bus state against expected, returning a list of mismatches.
fn compare(cpu: &I8080, bus: &SimpleBus, expected: &CpuState) -> Vec<String> {
    let regs = cpu.registers();
    let mut errors = Vec::new();

    let pairs: [(&str, u16, u16); 10] = [
        ("A", regs.a.into(), expected.a.into()),
        ("F", regs.f.into(), expected.f.into()),
        ("B", regs.b.into(), expected.b.into()),
        ("C", regs.c.into(), expected.c.into()),
        ("D", regs.d.into(), expected.d.into()),
        ("E", regs.e.into(), expected.e.into()),
        ("H", regs.h.into(), expected.h.into()),
        ("L", regs.l.into(), expected.l.into()),
        ("SP", regs.sp, expected.sp),
        ("PC", regs.pc, expected.pc),
    ];
    for (name, actual, want) in pairs {
        if actual != want {
            errors.push(format!("{name}: got {actual:#06X}, want {want:#06X}"));
        }
    }

    for &(addr, want) in &expected.ram {
        let actual = bus.peek(addr);
        if actual != want {
            errors.push(format!("RAM[{addr:#06X}]: got {actual:#04X}, want {want:#04X}"));
        }
    }

    errors
}

#[test]
fn single_step_vectors() {
    let cases: Vec<TestCase> = serde_json::from_str(VECTORS).expect("vectors parse");
    assert!(!cases.is_empty());

    let mut failures = Vec::new();
    for case in &cases {
        let mut cpu = I8080::new();
        let mut bus = SimpleBus::new();
        setup(&mut cpu, &mut bus, &case.initial);

        let cycles = cpu.step(&mut bus);

        let mut errors = compare(&cpu, &bus, &case.final_state);
        if cycles != case.cycles {
            errors.push(format!("cycles: got {cycles}, want {}", case.cycles));
        }
        if !errors.is_empty() {
            failures.push(format!("{}: {}", case.name, errors.join(", ")));
        }
    }

    assert!(failures.is_empty(), "failed vectors:\n{}", failures.join("\n"));
}
