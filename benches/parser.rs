use criterion::{criterion_group, criterion_main, Criterion};
use tetrad::{compile, CompileError, ParseError, Parser};

pub fn parse_benchmark(c: &mut Criterion) {
    c.bench_function("parse", |b| {
        b.iter(|| -> Result<(), ParseError> {
            let parser = Parser::new("programs/multiply.asm")?;
            parser.for_each(|_instr| {});

            Ok(())
        })
    });
}

pub fn compile_line_benchmark(c: &mut Criterion) {
    c.bench_function("compile line", |b| {
        b.iter(|| -> Result<(), CompileError> {
            compile("jnz a -2")?;

            Ok(())
        })
    });
}

criterion_group!(parser, parse_benchmark, compile_line_benchmark);
criterion_main!(parser);
