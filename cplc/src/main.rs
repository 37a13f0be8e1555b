#[macro_use]
extern crate clap;

use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process;

use clap::Arg;

#[derive(Debug)]
enum IOErrorContext {
    ReadInput,
    WriteOutput,
}

#[derive(Debug)]
enum Error {
    Compile(cplc::Error),
    Io(std::io::Error, IOErrorContext, PathBuf),
}

impl From<cplc::Error> for Error {
    fn from(err: cplc::Error) -> Error {
        Error::Compile(err)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err, context, path) => write!(
                f,
                "{} file \"{}\" failed: {}",
                match context {
                    IOErrorContext::ReadInput => "Reading input",
                    IOErrorContext::WriteOutput => "Writing output",
                },
                path.display(),
                err
            ),
            Error::Compile(err) => write!(f, "{}", err),
        }
    }
}

fn main() {
    // Parse command line arguments
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("INPUT")
                .help("Sets the CPL source file to compile")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("OUTPUT")
                .help("Sets the Quad file to write to [default: out.quad]"),
        )
        .arg(
            Arg::with_name("listing")
                .short("l")
                .long("listing")
                .help("Prints the numbered instruction listing to stdout"),
        )
        .get_matches();

    let input = matches.value_of("INPUT").unwrap();
    let output = matches.value_of("output");
    let listing = matches.is_present("listing");

    if let Err(err) = cplc(input, output, listing) {
        eprintln!("{}", err);
        process::exit(1);
    }
}

fn cplc(input: &str, output: Option<&str>, listing: bool) -> Result<(), Error> {
    let input_path = Path::new(input);

    // Read input file
    let input_file = File::open(input_path)
        .map_err(|err| Error::Io(err, IOErrorContext::ReadInput, input_path.to_owned()))?;
    let mut buf_reader = BufReader::new(input_file);
    let mut source = String::new();

    buf_reader
        .read_to_string(&mut source)
        .map_err(|err| Error::Io(err, IOErrorContext::ReadInput, input_path.to_owned()))?;

    // Perform compilation
    let code = cplc::compile(&source)?;

    if listing {
        for (index, line) in code.lines().enumerate() {
            println!("{}: {}", index + 1, line);
        }
    }

    let output_path: PathBuf = output.map(PathBuf::from).unwrap_or_else(|| "out.quad".into());

    // Write output file
    let output_file = File::create(&output_path)
        .map_err(|err| Error::Io(err, IOErrorContext::WriteOutput, output_path.clone()))?;
    let mut writer = BufWriter::new(output_file);
    writer
        .write_all(code.as_bytes())
        .and_then(|_| writer.write_all(b"\n"))
        .map_err(|err| Error::Io(err, IOErrorContext::WriteOutput, output_path))?;

    Ok(())
}
