use std::{
    error::Error,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use arch::InstructionTable;
use clap::Parser;
use color_print::{cformat, cprintln};
use hcasm::{listing, object, Assembler, Config};
use tracing::Level;

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, Parser)]
#[command(author, version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Input source file
    #[arg(default_value = "main.asm")]
    input: PathBuf,

    /// Output path without extension (default: input without extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Instruction table (.json, .yaml or .yml), default: bundled 68HC11
    #[arg(short, long)]
    table: Option<PathBuf>,

    /// Config file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data bytes per object record
    #[arg(long)]
    record_len: Option<usize>,

    /// Allow more than one ORG directive
    #[arg(long)]
    multiple_org: bool,

    /// Also write a YAML symbol map
    #[arg(short, long)]
    symbols: bool,

    /// Dump colored listing
    #[arg(short, long)]
    dump: bool,

    /// One of `TRACE`, `DEBUG`, `INFO`, `WARN`, or `ERROR`
    #[arg(short, long, default_value_t = Level::INFO)]
    log_level: Level,
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(io::stderr)
        .init();

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            cprintln!("<red,bold>error</>: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// `Ok(false)` when the source itself failed to assemble.
fn run(args: Args) -> Result<bool, Box<dyn Error>> {
    println!("HC11 Assembler");

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(len) = args.record_len {
        config.record_len = len;
    }
    config.multiple_org |= args.multiple_org;
    config.symbols |= args.symbols;
    tracing::debug!(?config);

    println!("1. Load Instruction Table");
    let loaded;
    let table = match &args.table {
        Some(path) => {
            println!("  < {}", path.display());
            loaded = InstructionTable::load(path)?;
            &loaded
        }
        None => InstructionTable::builtin(),
    };
    println!("  - {} mnemonics", table.len());

    println!("2. Read Source");
    println!("  < {}", args.input.display());
    let raw = fs::read(&args.input)
        .map_err(|e| cformat!("<r,s>Failed to open File</>: {}: {}", args.input.display(), e))?;
    let source: Vec<String> = String::from_utf8_lossy(&raw)
        .lines()
        .map(str::to_string)
        .collect();
    println!("  - {} lines", source.len());

    let stem = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension(""));

    println!("3. Assemble");
    let program = match Assembler::new(table)
        .multiple_org(config.multiple_org)
        .assemble(&source)
    {
        Ok(program) => program,
        Err(err) => {
            err.print_diag(&args.input.display().to_string(), &source);
            if config.listing {
                write_lines(&output(&stem, "lst"), &[err.to_string()])?;
            }
            return Ok(false);
        }
    };
    println!(
        "  - found #{} labels, #{} constants",
        program.symbols.labels().len(),
        program.symbols.constants().len()
    );

    println!("4. Output");
    let runs = program.runs()?;
    if config.listing {
        write_lines(&output(&stem, "lst"), &listing::plain(&program.lines, &source)?)?;
    }
    if config.srec {
        write_lines(&output(&stem, "s19"), &object::s_records(&runs, config.record_len))?;
    }
    if config.hex {
        write_lines(&output(&stem, "hex"), &object::hex_dump(&runs, config.record_len))?;
    }
    if config.symbols {
        let path = output(&stem, "sym.yaml");
        println!("  > {}", path.display());
        fs::write(&path, listing::symbol_map(&program.symbols)?)?;
    }

    if args.dump {
        println!("----------------------------------------------------");
        for line in listing::colored(&program.lines, &source)? {
            println!("{}", line);
        }
        println!("----------------------------------------------------");
        for line in listing::symbols(&program.symbols) {
            println!("{}", line);
        }
        println!("----------------------------------------------------");
    }
    Ok(true)
}

fn output(stem: &Path, ext: &str) -> PathBuf {
    let mut path = stem.as_os_str().to_owned();
    path.push(".");
    path.push(ext);
    path.into()
}

fn write_lines(path: &Path, lines: &[String]) -> io::Result<()> {
    println!("  > {}", path.display());
    let mut file = io::BufWriter::new(fs::File::create(path)?);
    for line in lines {
        writeln!(file, "{}", line)?;
    }
    file.flush()
}
