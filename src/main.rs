use clap::{App, Arg, ArgMatches};
use std::error::Error;
use std::time::Instant;
use tetrad::{Register, Vm, VmConfig, REGISTER_COUNT};

fn args() -> ArgMatches {
    App::new("tetrad")
        .about("a tiny four register machine interpreter")
        .version("0.1.0")
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .takes_value(true)
                .required(true)
                .help("assembly source file to interpret"),
        )
        .arg(
            Arg::new("register")
                .short('r')
                .long("register")
                .takes_value(true)
                .multiple_occurrences(true)
                .required(false)
                .help("initial value of a register, given as name=value (e.g. c=1)"),
        )
        .arg(
            Arg::new("max-steps")
                .short('l')
                .long("max-steps")
                .takes_value(true)
                .required(false)
                .help("aborts the program after this many executed instructions"),
        )
        .arg(
            Arg::new("ir")
                .short('i')
                .long("ir")
                .required(false)
                .takes_value(false)
                .help("prints intermediate representation of instructions"),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .takes_value(false)
                .required(false)
                .help("prints the machine state before each executed instruction"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .required(false)
                .takes_value(false)
                .help("suppresses all output other than what the program is producing"),
        )
        .get_matches()
}

fn register_assignment(arg: &str) -> Result<(Register, i64), Box<dyn Error>> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got {:?}", arg))?;
    let reg = Register::from_name(name.trim())
        .ok_or_else(|| format!("unknown register {:?}, expected one of a, b, c, d", name))?;

    Ok((reg, value.trim().parse()?))
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = args();
    let file_name = args.value_of("file").ok_or("missing source file")?;
    let ir = args.is_present("ir");
    let debug = args.is_present("debug");
    let quiet = args.is_present("quiet");

    let mut registers = [0; REGISTER_COUNT];
    for arg in args.values_of("register").into_iter().flatten() {
        let (reg, value) = register_assignment(arg)?;
        registers[reg.index()] = value;
    }
    let mut config = VmConfig::new(file_name, ir, debug, false).with_registers(registers);
    if let Some(limit) = args.value_of("max-steps") {
        config = config.with_step_limit(limit.parse()?);
    }

    if !quiet {
        println!("loading and compiling the provided source, creating the virtual machine...");
    }
    let start = Instant::now();
    let mut vm = Vm::new(config)?;
    let end = Instant::now();
    if !quiet {
        println!(
            "compiled {} instructions in {} ms ({} ns)",
            vm.program().len(),
            end.duration_since(start).as_millis(),
            end.duration_since(start).as_nanos()
        );
    }

    if !ir {
        if !quiet {
            println!("starting to execute program...\n");
        }
        let start = Instant::now();
        vm.run()?;
        let end = Instant::now();
        if !quiet {
            let state = vm.state();
            println!(
                "\nhalted at pc {} after {} steps, took {} ms ({} ns)",
                state.pc,
                vm.steps(),
                end.duration_since(start).as_millis(),
                end.duration_since(start).as_nanos()
            );
            for reg in Register::ALL {
                println!("{} = {}", reg, state.registers[reg]);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::register_assignment;
    use std::error::Error;
    use tetrad::Register;

    #[test]
    fn parse_register_assignment() -> Result<(), Box<dyn Error>> {
        assert_eq!(register_assignment("c=1")?, (Register::C, 1));
        assert_eq!(register_assignment("a = -7")?, (Register::A, -7));
        assert!(register_assignment("e=1").is_err());
        assert!(register_assignment("a").is_err());
        assert!(register_assignment("b=x").is_err());

        Ok(())
    }
}
