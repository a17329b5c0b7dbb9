//! basc - a Locomotive BASIC compiler for the Amstrad CPC
//!
//! This is the command-line interface of the compiler. It drives the
//! pipeline end to end and owns the process-level contract:
//!
//! - exit code 0: success
//! - exit code 1: fatal diagnostic (reported as `file:line:col: kind: message`)
//! - exit code 2: I/O error
//! - exit code 3: usage error
//!
//! Output files are written atomically: the text goes to a `.tmp` path
//! first and is renamed into place, so a failed run never leaves a
//! partial `.asm` behind.

use clap::error::ErrorKind;
use clap::Parser as ClapParser;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::exit;

use basc::codegen::{CodeGenerator, GeneratedOutput, Z80Backend};
use basc::diagnostics::ToDiagnostic;
use basc::lexer::tokenize;
use basc::parser::Parser;
use basc::source::SourceFile;

/// basc - a Locomotive BASIC compiler for the Amstrad CPC
#[derive(ClapParser, Debug)]
#[command(name = "basc")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input BASIC source file (.bas)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output file (default: input name with .asm extension)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Load address for the org directive (decimal, &hex, or 0xhex)
    #[arg(long, value_parser = parse_org, default_value = "&4000")]
    org: u16,

    /// Also write a .lst listing next to the output
    #[arg(long)]
    listing: bool,

    /// Also write a .map symbol map next to the output
    #[arg(long)]
    map: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Accepts `16384`, `&4000`, and `0x4000` spellings.
fn parse_org(text: &str) -> Result<u16, String> {
    let parsed = if let Some(hex) = text.strip_prefix('&') {
        u16::from_str_radix(hex, 16)
    } else if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16)
    } else {
        text.parse()
    };
    parsed.map_err(|_| format!("'{}' is not a valid 16-bit address", text))
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 3,
            };
            let _ = err.print();
            exit(code);
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .default_filter_or(if args.verbose { "debug" } else { "warn" }),
    )
    .init();

    let source = match SourceFile::from_path(&args.input) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("basc: {}", err);
            exit(2);
        }
    };
    info!("compiling {}", source.name);

    let tokens = match tokenize(&source) {
        Ok(tokens) => tokens,
        Err(err) => fail(&source, &err),
    };
    debug!("{} tokens", tokens.len());

    let (program, mut symbols) = match Parser::new(&tokens).parse() {
        Ok(parsed) => parsed,
        Err(err) => fail(&source, &err),
    };
    debug!("{} lines", program.lines.len());

    if let Err(err) = symbols.resolve() {
        fail(&source, &err);
    }

    let backend = Z80Backend::new()
        .with_org(args.org)
        .with_listing(args.listing)
        .with_map(args.map);
    let output = match backend.generate(&source, &program, &mut symbols) {
        Ok(output) => output,
        Err(err) => fail(&source, &err),
    };

    for warning in &output.warnings {
        eprintln!("{}", warning.render_warning(&source.name));
    }

    let asm_path = args
        .output
        .unwrap_or_else(|| args.input.with_extension("asm"));
    if let Err(err) = write_outputs(&asm_path, &output) {
        eprintln!("basc: cannot write '{}': {}", asm_path.display(), err);
        exit(2);
    }
    info!("wrote {}", asm_path.display());
}

/// Reports a fatal diagnostic and exits with code 1.
fn fail(source: &SourceFile, err: &dyn ToDiagnostic) -> ! {
    eprintln!("{}", err.to_diagnostic().render(&source.name));
    exit(1)
}

/// Writes the assembly and the optional side-channels, each atomically.
fn write_outputs(asm_path: &Path, output: &GeneratedOutput) -> std::io::Result<()> {
    write_atomic(asm_path, &output.asm)?;
    if let Some(listing) = &output.listing {
        write_atomic(&asm_path.with_extension("lst"), listing)?;
    }
    if let Some(map) = &output.map {
        write_atomic(&asm_path.with_extension("map"), map)?;
    }
    Ok(())
}

/// Write-then-rename, removing the temporary on failure.
fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, content)?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    Ok(())
}
