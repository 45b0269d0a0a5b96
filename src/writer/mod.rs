//! Code generation: `ContractInterface` → TypeScript sources.
//!
//! `generate` is a pure function; the same interface and options always
//! render to the same bytes. `write_artifacts` replaces whatever is on disk.

pub mod api;
pub mod menu;

use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::engine::SessionOptions;
use crate::error::PipelineError;
use crate::model::{ContractInterface, GenerationArtifact};

pub const API_PATH: &str = "src/api.ts";
pub const CLI_PATH: &str = "src/cli.ts";

const HEADER: &str = "Auto-generated by compactgen – DO NOT EDIT";

const RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if",
    "import", "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw",
    "true", "try", "typeof", "var", "void", "while", "with", "yield", "let", "static",
    "await", "implements", "interface", "package", "private", "protected", "public",
    // generated locals and helpers
    "contract", "api", "rl", "result", "choice", "state", "error", "readState", "toReceipt",
    "operations", "stateVariables", "MENU", "TRUTHY", "FALSY", "ERROR_HINTS", "runCli",
    "parseInteger", "parseBoolean", "parseBytes", "pickChoice", "formatValue", "reportError",
];

/// Render both artifacts for an interface. The choice and hint tables in
/// `options` are baked into the generated CLI.
pub fn generate(iface: &ContractInterface, options: &SessionOptions) -> Vec<GenerationArtifact> {
    vec![
        GenerationArtifact {
            path: PathBuf::from(API_PATH),
            contents: api::render(iface),
        },
        GenerationArtifact {
            path: PathBuf::from(CLI_PATH),
            contents: menu::render(iface, options),
        },
    ]
}

/// Write artifacts below `out_dir`, creating directories as needed.
/// Returns the absolute paths that were written.
pub fn write_artifacts(
    artifacts: &[GenerationArtifact],
    out_dir: &Path,
) -> Result<Vec<PathBuf>, PipelineError> {
    let mut written = Vec::with_capacity(artifacts.len());

    for artifact in artifacts {
        let path = out_dir.join(&artifact.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| PipelineError::GenerationIo {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, &artifact.contents).map_err(|source| PipelineError::GenerationIo {
            path: path.clone(),
            source,
        })?;
        info!("Wrote {} ({} bytes)", path.display(), artifact.contents.len());
        written.push(path);
    }

    Ok(written)
}

/// Generate and write in one go.
pub fn emit(
    iface: &ContractInterface,
    options: &SessionOptions,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, PipelineError> {
    write_artifacts(&generate(iface, options), out_dir)
}

/// Circuit and parameter names that would clash with a keyword or a
/// generated helper get a trailing underscore.
fn ts_ident(name: &str) -> String {
    if RESERVED.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}
