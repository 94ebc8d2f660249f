use std::env;
use std::path::PathBuf;

use packcheck::ir::{DataLayout, Module};
use packcheck::utils::fs::{pack_create_file, pack_read, pack_write};
use packcheck::utils::log::{init_log, pack_error_and_exit};
use packcheck::{pack_info, start_analyzer, PACKCHECK_DEFAULT_LAYOUT};

const HELP: &str = "\
Usage: packcheck [OPTIONS] <module.json>

Detect type-punning / packing violations in a JSON-encoded module.

Options:
    -DL=<spec>     Override the data layout (LLVM-style specification string)
    -EMIT=JSON     Write the findings to a JSON file
    -OUT=<path>    Findings file path (default: packcheck_findings.json)
    -h, --help     Print this help text

Exits with code 1 if any finding was reported.";

struct PackArgs {
    input: Option<PathBuf>,
    layout: Option<String>,
    emit_json: bool,
    out: PathBuf,
}

impl Default for PackArgs {
    fn default() -> Self {
        Self {
            input: None,
            layout: None,
            emit_json: false,
            out: PathBuf::from("packcheck_findings.json"),
        }
    }
}

fn config_parse() -> PackArgs {
    let mut args = PackArgs::default();
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", HELP);
                std::process::exit(0);
            }
            "-EMIT=JSON" => args.emit_json = true,
            s if s.starts_with("-DL=") => args.layout = Some(s["-DL=".len()..].to_string()),
            s if s.starts_with("-OUT=") => args.out = PathBuf::from(&s["-OUT=".len()..]),
            s if s.starts_with('-') => {
                pack_error_and_exit(format!("Unknown option `{}`; try --help", s))
            }
            _ => args.input = Some(PathBuf::from(arg)),
        }
    }
    args
}

fn main() {
    init_log().expect("Failed to set up the packcheck log system");

    let args = config_parse();
    let input = match args.input {
        Some(path) => path,
        None => pack_error_and_exit("No module file given; try --help"),
    };

    let spec = args
        .layout
        .unwrap_or_else(|| PACKCHECK_DEFAULT_LAYOUT.to_string());
    let layout = DataLayout::parse(&spec)
        .unwrap_or_else(|e| pack_error_and_exit(format!("Bad data layout: {}", e)));

    let file = pack_read(&input, "Failed to open the module file");
    let module: Module = serde_json::from_reader(file)
        .unwrap_or_else(|e| pack_error_and_exit(format!("Failed to decode the module: {}", e)));

    let findings = start_analyzer(&module, &layout);
    pack_info!(
        "{} finding(s) in module `{}`",
        findings.len(),
        module.name
    );

    if args.emit_json {
        let rendered = serde_json::to_string_pretty(&findings)
            .unwrap_or_else(|e| pack_error_and_exit(format!("Failed to render findings: {}", e)));
        let file = pack_create_file(&args.out, "Failed to create the findings file");
        pack_write(file, rendered.as_bytes(), "Failed to write the findings file");
    }

    std::process::exit(if findings.is_empty() { 0 } else { 1 })
}
