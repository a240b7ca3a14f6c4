use criterion::{criterion_group, criterion_main, Criterion};
use tetrad::{compile, step, Program, State, Vm, VmConfig, VmError};

pub fn single_step_benchmark(c: &mut Criterion) {
    let program = match compile("inc a") {
        Ok(instr) => Program::new(vec![instr]),
        Err(err) => panic!("{}", err),
    };
    c.bench_function("single step", |b| {
        b.iter(|| -> Result<State, VmError> { step(State::default(), &program) })
    });
}

pub fn reset_vm_benchmark(c: &mut Criterion) {
    let config = VmConfig::default_suppressed("programs/answer.asm");
    let mut vm = Vm::new(config).unwrap();
    c.bench_function("reset vm", |b| {
        b.iter(|| -> Result<(), VmError> {
            vm.reset();

            Ok(())
        })
    });
}

pub fn answer_benchmark(c: &mut Criterion) {
    let config = VmConfig::default_suppressed("programs/answer.asm");
    let mut vm = Vm::new(config).unwrap();
    c.bench_function("answer", |b| {
        b.iter(|| -> Result<(), VmError> {
            vm.run()?;
            vm.reset();

            Ok(())
        })
    });
}

pub fn multiply_benchmark(c: &mut Criterion) {
    let config = VmConfig::default_suppressed("programs/multiply.asm");
    let mut vm = Vm::new(config).unwrap();
    c.bench_function("multiply", |b| {
        b.iter(|| -> Result<(), VmError> {
            vm.run()?;
            vm.reset();

            Ok(())
        })
    });
}

pub fn countdown_benchmark(c: &mut Criterion) {
    let config =
        VmConfig::default_suppressed("programs/countdown.asm").with_registers([0, 1000, 0, 0]);
    let mut vm = Vm::new(config).unwrap();
    c.bench_function("countdown", |b| {
        b.iter(|| -> Result<(), VmError> {
            vm.run()?;
            vm.reset();

            Ok(())
        })
    });
}

criterion_group!(
    vm,
    single_step_benchmark,
    reset_vm_benchmark,
    answer_benchmark,
    multiply_benchmark,
    countdown_benchmark
);
criterion_main!(vm);
