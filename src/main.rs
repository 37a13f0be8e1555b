#[macro_use]
extern crate clap;

use std::fs::File;
use std::io::prelude::*;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process;

use clap::Arg;
use quad::{Interpreter, Program, QuadError};

#[derive(Debug)]
enum Error {
    Io(std::io::Error, PathBuf),
    Quad(QuadError),
}

impl From<QuadError> for Error {
    fn from(err: QuadError) -> Error {
        Error::Quad(err)
    }
}

fn main() {
    // Parse command line arguments
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("SOURCE")
                .help("Sets the Quad file to execute")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("trace")
                .short("t")
                .long("trace")
                .help("Prints each instruction to stderr before executing it"),
        )
        .get_matches();

    let source = matches.value_of("SOURCE").unwrap();
    let trace = matches.is_present("trace");

    if let Err(err) = execute(source, trace) {
        match err {
            Error::Io(err, path) => eprintln!("Reading file \"{}\" failed: {}", path.display(), err),
            Error::Quad(err) => eprintln!("{}:{}: error: {}", source, err.lineno, err.kind),
        }
        process::exit(1);
    }
}

fn execute(source: &str, trace: bool) -> Result<(), Error> {
    let source_path = Path::new(source);

    // Read input file
    let source_file =
        File::open(source_path).map_err(|err| Error::Io(err, source_path.to_owned()))?;
    let mut reader = BufReader::new(source_file);
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|err| Error::Io(err, source_path.to_owned()))?;

    let program = Program::load(&text)?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut interpreter =
        Interpreter::new(&program, stdin.lock(), stdout.lock()).with_trace(trace);
    interpreter.run()?;

    Ok(())
}
