//! Orchestrates one compile: parsed program -> verified module -> (object
//! file -> linked executable), honoring [`CompileOptions`].

use std::path::PathBuf;
use std::process::Command;

use cminus_ast::Program;
use cminus_core::{CompileOptions, Diagnostic, OptLevel, StringInterner, SymbolTable};
use inkwell::context::Context;
use inkwell::passes::PassBuilderOptions;
use inkwell::targets::{CodeModel, FileType, InitializationConfig, RelocMode, Target, TargetMachine};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::emitter::Codegen;
use crate::error::CodegenError;

/// Machine-readable summary of one compile, reportable as JSON via `--json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileResult {
    pub object_path: PathBuf,
    pub executable_path: Option<PathBuf>,
    /// Present when `-b` asked for the textual IR to be retained.
    pub ir: Option<String>,
}

fn opt_to_inkwell(level: OptLevel) -> inkwell::OptimizationLevel {
    match level {
        OptLevel::O0 => inkwell::OptimizationLevel::None,
        OptLevel::O1 => inkwell::OptimizationLevel::Less,
        OptLevel::O2 => inkwell::OptimizationLevel::Default,
        OptLevel::O3 => inkwell::OptimizationLevel::Aggressive,
    }
}

fn passes_for(level: OptLevel) -> &'static str {
    match level {
        OptLevel::O0 => "default<O0>",
        OptLevel::O1 => "default<O1>",
        OptLevel::O2 => "default<O2>",
        OptLevel::O3 => "default<O3>",
    }
}

/// Lowers `program` to textual LLVM IR without touching the filesystem or
/// running any passes -- used by `-b` and by tests that assert on IR shape.
///
/// Refuses with [`CodegenError::HadDiagnostics`] if `diagnostics` is
/// non-empty: per §7, codegen never runs against a program that recorded a
/// parse/semantic diagnostic.
pub fn compile_to_ir(
    program: &Program,
    diagnostics: &[Diagnostic],
    symbols: &mut SymbolTable,
    interner: &mut StringInterner,
) -> Result<String, CodegenError> {
    if !diagnostics.is_empty() {
        return Err(CodegenError::HadDiagnostics(diagnostics.len()));
    }
    // A fresh Context per compile, matching the rest of this crate's rule
    // that no LLVM state outlives a single compile call.
    let context = Context::create();
    let mut codegen = Codegen::new(&context, "cminus");
    codegen.emit_program(program, symbols, interner)?;
    let module = codegen.finish();
    module.verify().map_err(|e| CodegenError::Llvm(e.to_string()))?;
    Ok(module.print_to_string().to_string())
}

/// Full pipeline: emit IR, verify, optimize, emit an object file, and
/// (unless `options.object_only`) link it into an executable with the
/// system `cc`.
///
/// Refuses with [`CodegenError::HadDiagnostics`] if `diagnostics` is
/// non-empty: per §7, codegen never runs against a program that recorded a
/// parse/semantic diagnostic.
pub fn compile(
    program: &Program,
    diagnostics: &[Diagnostic],
    symbols: &mut SymbolTable,
    interner: &mut StringInterner,
    options: &CompileOptions,
) -> Result<CompileResult, CodegenError> {
    if !diagnostics.is_empty() {
        return Err(CodegenError::HadDiagnostics(diagnostics.len()));
    }
    let context = Context::create();
    let mut codegen = Codegen::new(&context, "cminus");
    codegen.emit_program(program, symbols, interner)?;
    let module = codegen.finish();
    module.verify().map_err(|e| CodegenError::Llvm(e.to_string()))?;

    let ir = options.print_ir.then(|| module.print_to_string().to_string());

    Target::initialize_native(&InitializationConfig::default())
        .map_err(|e| CodegenError::Llvm(e))?;
    let triple = TargetMachine::get_default_triple();
    module.set_triple(&triple);
    let target = Target::from_triple(&triple).map_err(|e| CodegenError::Llvm(e.to_string()))?;
    let target_machine = target
        .create_target_machine(
            &triple,
            "generic",
            "",
            opt_to_inkwell(options.opt_level),
            RelocMode::Default,
            CodeModel::Default,
        )
        .ok_or_else(|| CodegenError::Llvm("could not create a target machine for the host triple".into()))?;

    let pass_options = PassBuilderOptions::create();
    module
        .run_passes(passes_for(options.opt_level), &target_machine, pass_options)
        .map_err(|e| CodegenError::Llvm(e.to_string()))?;

    let object_path = object_output_path(options);
    target_machine
        .write_to_file(&module, FileType::Object, &object_path)
        .map_err(|e| CodegenError::Llvm(e.to_string()))?;
    debug!(path = %object_path.display(), "wrote object file");

    let executable_path = if options.object_only {
        None
    } else {
        let exe_path = executable_output_path(options);
        link_executable(&object_path, &exe_path)?;
        info!(path = %exe_path.display(), "linked executable");
        Some(exe_path)
    };

    Ok(CompileResult { object_path, executable_path, ir })
}

fn object_output_path(options: &CompileOptions) -> PathBuf {
    if options.object_only {
        options
            .output_path
            .clone()
            .unwrap_or_else(|| options.source_path.with_extension("o"))
    } else {
        options.source_path.with_extension("o")
    }
}

fn executable_output_path(options: &CompileOptions) -> PathBuf {
    options.output_path.clone().unwrap_or_else(|| {
        let mut path = options.source_path.clone();
        path.set_extension("");
        path
    })
}

/// Links a single object file into an executable via the system `cc`,
/// pulling in libc for `printf`/`exit` the same way a hand-invoked
/// `cc foo.o -o foo` would.
fn link_executable(object_path: &PathBuf, exe_path: &PathBuf) -> Result<(), CodegenError> {
    let status = Command::new("cc")
        .arg(object_path)
        .arg("-o")
        .arg(exe_path)
        .status()
        .map_err(CodegenError::Io)?;
    if !status.success() {
        return Err(CodegenError::LinkerFailed(format!("cc exited with {status}")));
    }
    Ok(())
}
