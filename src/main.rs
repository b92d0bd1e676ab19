use clap::{App, Arg, ArgMatches};
use coco::catalog::MAX_INPUTS;
use coco::{error, info, source, warn};
use coco::{compiler, Compiler, CompilerConfig, Lexer, Parser, SyntaxErrors, Vm, VmConfig};
use coco::DEFAULT_MEMORY_SIZE;
use std::error::Error;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Instant;

fn args() -> ArgMatches {
    App::new("coco")
        .about("an interpreter and thumb-2 compiler for controller code")
        .version("0.1.0")
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .takes_value(true)
                .required(true)
                .help("controller code source file to run, has to end in .coco"),
        )
        .arg(
            Arg::new("interpret")
                .short('I')
                .required(false)
                .takes_value(false)
                .help("run the program in the interpreter (default)"),
        )
        .arg(
            Arg::new("compile")
                .short('C')
                .required(false)
                .takes_value(false)
                .conflicts_with("interpret")
                .help("compile the program to thumb-2 assembly"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .takes_value(true)
                .required(false)
                .help("where to write the assembly, defaults to the source path with .s"),
        )
        .arg(
            Arg::new("arg")
                .short('a')
                .long("arg")
                .takes_value(true)
                .multiple_occurrences(true)
                .allow_hyphen_values(true)
                .required(false)
                .help("program input fetched by INP, at most two"),
        )
        .arg(
            Arg::new("memory-size")
                .short('s')
                .long("memory-size")
                .takes_value(true)
                .required(false)
                .help("the number of memory cells (each cell stores one i32)"),
        )
        .arg(
            Arg::new("raw")
                .short('r')
                .long("raw")
                .required(false)
                .takes_value(false)
                .help("prints the parsed instructions instead of running them"),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .takes_value(false)
                .required(false)
                .help("prints debug information before each executed instruction"),
        )
        .arg(
            Arg::new("debug-memory")
                .short('m')
                .long("debug-memory")
                .takes_value(false)
                .required(false)
                .help("prints a memory dump before each executed instruction"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .takes_value(false)
                .required(false)
                .help("prints the raw code, the tokens and the parsed instructions"),
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

/// Assembly symbol for a source path, `sum-up.coco` becomes `sum_up`
fn symbol_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// Number of inputs `INP` is validated against
fn input_count(compile: bool, input: &[i32]) -> usize {
    if compile {
        compiler::INPUT_COUNT
    } else {
        input.len()
    }
}

/// Logs every syntax error but the last one, which becomes the error `main` exits with
fn report(errors: SyntaxErrors) -> Result<(), Box<dyn Error>> {
    let mut errors = errors.into_errors();
    let last = errors.pop();
    for err in &errors {
        error!("{}", err);
    }
    match last {
        Some(err) => Err(err.to_string().into()),
        None => Ok(()),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = args();
    let file_name = args.value_of("file").ok_or("no source file supplied")?;
    if !source::has_extension(file_name) {
        return Err(format!(
            "the supplied file `{}` does not have the file extension `.{}`",
            file_name,
            source::EXTENSION
        )
        .into());
    }
    let memory_size = match args.value_of("memory-size") {
        Some(size) => size.parse()?,
        None => DEFAULT_MEMORY_SIZE,
    };
    let input = match args.values_of("arg") {
        Some(values) => values
            .map(|value| value.parse::<i32>())
            .collect::<Result<Vec<_>, _>>()?,
        None => vec![],
    };
    if input.len() > MAX_INPUTS {
        return Err(format!("at most {} input values are supported", MAX_INPUTS).into());
    }
    let compile = args.is_present("compile");
    if compile && !input.is_empty() {
        warn!("compiled code reads its input at runtime, ignoring the values passed with -a");
    }
    let raw = args.is_present("raw");
    let debug = args.is_present("debug");
    let debug_memory = args.is_present("debug-memory");
    let verbose = args.is_present("verbose");
    coco::log::QUIET.store(args.is_present("quiet"), Ordering::Relaxed);

    info!("reading, validating and parsing `{}`...", file_name);
    let start = Instant::now();
    let lines = source::read(file_name)?;
    if verbose {
        println!("_______Raw Code_______");
        for line in &lines {
            println!("{}", line);
        }
    }

    let tokens = match Lexer::new(&lines, input_count(compile, &input)).lex() {
        Ok(tokens) => tokens,
        Err(errors) => return report(errors),
    };
    if verbose {
        println!("_______Tokenized Tokens_______");
        println!("{:?}", tokens);
    }

    let instructions = Parser::new(tokens).parse()?;
    if verbose {
        println!("_______Parsed Tokens_______");
        for instr in &instructions {
            println!("{}", instr);
        }
    }
    let end = Instant::now();
    info!(
        "loaded {} instruction(s) in {} ms ({} ns)",
        instructions.len(),
        end.duration_since(start).as_millis(),
        end.duration_since(start).as_nanos()
    );

    if compile {
        let output = match args.value_of("output") {
            Some(output) => output.to_string(),
            None => Path::new(file_name)
                .with_extension("s")
                .to_string_lossy()
                .into_owned(),
        };
        let config = CompilerConfig::new(&symbol_name(file_name), memory_size);
        let asm = Compiler::new(instructions, config).compile();
        std::fs::write(&output, asm)?;
        info!("assembly written to `{}`", output);

        return Ok(());
    }

    if args.is_present("output") {
        warn!("--output is only used together with -C, ignoring it");
    }
    let config = VmConfig::new(memory_size, input, raw, debug, debug_memory, false);
    let mut vm = Vm::new(instructions, config)?;
    if raw {
        return Ok(());
    }
    if verbose {
        println!("_______Interpreted Result_______");
    }
    let start = Instant::now();
    let result = vm.run()?;
    let end = Instant::now();
    info!(
        "halted with {} after {} ms ({} ns)",
        result,
        end.duration_since(start).as_millis(),
        end.duration_since(start).as_nanos()
    );

    Ok(())
}
