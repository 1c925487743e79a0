//! Per-unit compilation driver.
//!
//! Two phases over one scope tree: the check pass collects every
//! diagnostic in the unit, and only a clean unit reaches the write
//! pass. A unit with any violation produces no output tree. Units are
//! independent; a batch runs them in parallel over a shared read-only
//! registry.

use crate::context::{Diagnostic, FatalError, GenerationContext};
use crate::dispatch::{ContributorRegistry, TreeDispatcher};
use crate::ir::{CompilationUnit, TypeRegistry};
use crate::js::JsProgram;
use crate::scope::ScopeBuilder;
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub struct CompileOptions {
    pub unit: CompilationUnit,
    /// The frontend's global binding/type model; usually shared across
    /// every unit of a run.
    pub types: Arc<TypeRegistry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileResult {
    pub file_path: String,
    /// None whenever the diagnostics contain an error.
    pub program: Option<JsProgram>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn compile_unit(
    registry: &ContributorRegistry,
    options: &CompileOptions,
) -> Result<CompileResult, FatalError> {
    let unit = &options.unit;
    let tree = ScopeBuilder::build(unit, options.types.clone());
    let mut ctx = GenerationContext::new(&unit.file_path, &tree, options.types.clone());
    let dispatcher = TreeDispatcher::new(registry);

    for decl in &unit.types {
        dispatcher.run_checks(decl, &mut ctx);
    }
    if ctx.has_errors() {
        debug!(
            "{}: {} diagnostics, skipping generation",
            unit.file_path,
            ctx.diagnostics().len()
        );
        return Ok(CompileResult {
            file_path: unit.file_path.clone(),
            program: None,
            diagnostics: ctx.into_diagnostics(),
        });
    }

    let mut statements = Vec::new();
    for decl in &unit.types {
        statements.extend(dispatcher.write_node(decl, &mut ctx)?);
    }
    debug!("{}: generated {} statements", unit.file_path, statements.len());
    Ok(CompileResult {
        file_path: unit.file_path.clone(),
        program: Some(JsProgram {
            file_path: unit.file_path.clone(),
            statements,
        }),
        diagnostics: ctx.into_diagnostics(),
    })
}

/// Batch driver: units are translated concurrently, each with its own
/// scope tree and context. A fatal error in one unit never affects the
/// others.
pub fn compile_units(
    registry: &ContributorRegistry,
    batch: &[CompileOptions],
) -> Vec<Result<CompileResult, FatalError>> {
    batch
        .par_iter()
        .map(|options| compile_unit(registry, options))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// JSON ENTRY POINT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompileJob {
    unit: CompilationUnit,
    #[serde(default)]
    types: TypeRegistry,
}

/// Host-tooling entry: one JSON job in, one JSON result out. Fatal
/// errors and malformed jobs come back as `{"error": …}`.
pub fn compile_unit_json(registry: &ContributorRegistry, job_json: &str) -> String {
    let job: CompileJob = match serde_json::from_str(job_json) {
        Ok(parsed) => parsed,
        Err(e) => return error_json(&format!("failed to parse compile job: {}", e)),
    };
    let options = CompileOptions {
        unit: job.unit,
        types: Arc::new(job.types),
    };
    match compile_unit(registry, &options) {
        Ok(result) => {
            serde_json::to_string(&result).unwrap_or_else(|e| error_json(&e.to_string()))
        }
        Err(fatal) => error_json(&fatal.to_string()),
    }
}

fn error_json(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}
