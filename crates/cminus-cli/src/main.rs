//! `cminus` command-line driver (component J): source file in, diagnostics
//! or a compiled artifact out.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use cminus_core::{CompileOptions, OptLevel};

/// C- compiler.
#[derive(Parser)]
#[command(name = "cminus", about = "C- compiler")]
struct Cli {
    /// Source file to compile.
    source: PathBuf,

    /// Print the parsed AST (debug form) and exit without codegen.
    #[arg(short = 'a', long = "print-ast")]
    print_ast: bool,

    /// Print the generated LLVM IR.
    #[arg(short = 'b', long = "print-ir")]
    print_ir: bool,

    /// Output path for the object file or linked executable.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Stop after producing an object file; skip linking.
    #[arg(short = 'c')]
    object_only: bool,

    /// Optimization level: 0, 1, 2, 3.
    #[arg(short = 'O', long = "opt", default_value = "0")]
    opt_level: u8,

    /// Report the compile result as JSON instead of human-readable text.
    #[arg(long)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let exit_code = run(cli);
    process::exit(exit_code);
}

fn parse_opt_level(level: u8) -> OptLevel {
    match level {
        0 => OptLevel::O0,
        1 => OptLevel::O1,
        2 => OptLevel::O2,
        _ => OptLevel::O3,
    }
}

fn run(cli: Cli) -> i32 {
    let source = match fs::read_to_string(&cli.source) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("cminus: cannot read '{}': {}", cli.source.display(), e);
            return 1;
        }
    };

    let mut out = cminus_parser::parse(&source);
    let file_name = cli.source.to_string_lossy().into_owned();

    for diag in &out.diagnostics {
        eprint!("{}", diag.render(&file_name, &source));
    }

    if cli.print_ast {
        println!("{:#?}", out.program);
        return if out.diagnostics.is_empty() { 0 } else { 1 };
    }

    let mut options = CompileOptions::new(cli.source.clone());
    options.output_path = cli.output.clone();
    options.opt_level = parse_opt_level(cli.opt_level);
    options.object_only = cli.object_only;
    options.print_ast = cli.print_ast;
    options.print_ir = cli.print_ir;
    options.json_output = cli.json;

    match cminus_codegen::compile(&out.program, &out.diagnostics, &mut out.symbols, &mut out.interner, &options) {
        Ok(result) => {
            if cli.print_ir {
                if let Some(ir) = &result.ir {
                    println!("{ir}");
                }
            }
            if cli.json {
                match serde_json::to_string_pretty(&result) {
                    Ok(json) => println!("{json}"),
                    Err(e) => eprintln!("cminus: failed to serialize result: {e}"),
                }
            }
            0
        }
        // Diagnostics were already rendered above; codegen's refusal is
        // just the authoritative gate, not new information for the user.
        Err(cminus_codegen::CodegenError::HadDiagnostics(_)) => 1,
        Err(e) => {
            eprintln!("cminus: {e}");
            1
        }
    }
}
