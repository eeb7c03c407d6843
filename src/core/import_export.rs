// Copyright @yucwang 2026

use std::fmt;
use std::path::Path;

use super::scene_matcher::{ transfer_tangents, StructuralMismatch, TransferReport };
use super::session::{ PasswordPrompt, Session };
use crate::io::format_registry::{ ExportError, FormatSelector, ImportError };

#[derive(Debug)]
pub enum PassError {
    Import(ImportError),
    Mismatch(StructuralMismatch),
    Export(ExportError),
}

impl From<ImportError> for PassError {
    fn from(err: ImportError) -> Self {
        PassError::Import(err)
    }
}

impl From<StructuralMismatch> for PassError {
    fn from(err: StructuralMismatch) -> Self {
        PassError::Mismatch(err)
    }
}

impl From<ExportError> for PassError {
    fn from(err: ExportError) -> Self {
        PassError::Export(err)
    }
}

impl fmt::Display for PassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassError::Import(err) => write!(f, "import failed: {}", err),
            PassError::Mismatch(err) => write!(f, "{}", err),
            PassError::Export(err) => write!(f, "export failed: {}", err),
        }
    }
}

impl std::error::Error for PassError {}

/// Imports both scenes, copies tangent space from `second` onto `first`,
/// and writes the result to `output`. Nothing is written unless the walk
/// finished without a structural mismatch.
pub fn import_export<P, Q, R>(session: &mut Session, first: P, second: Q, output: R,
                              format: FormatSelector,
                              prompt: &mut dyn PasswordPrompt) -> Result<TransferReport, PassError>
    where P: AsRef<Path>, Q: AsRef<Path>, R: AsRef<Path> {
    let (first, second, output) = (first.as_ref(), second.as_ref(), output.as_ref());

    let mut dst = import(session, first, prompt)?;
    let src = import(session, second, prompt)?;

    let report = transfer_tangents(&mut dst, &src)?;
    log::info!("{} nodes visited, {} meshes processed, {} skipped.",
               report.nodes_visited, report.meshes_processed.len(), report.skipped.len());

    log::info!("------- Export started ({}) -------", output.display());
    match session.save_scene(&dst, output, format, false) {
        Ok(()) => log::info!("------- Export succeeded -------"),
        Err(err) => {
            log::error!("------- Export failed -------");
            return Err(err.into());
        }
    }

    Ok(report)
}

fn import(session: &mut Session, path: &Path,
          prompt: &mut dyn PasswordPrompt) -> Result<super::scene::Scene, ImportError> {
    log::info!("------- Import started ({}) -------", path.display());
    match session.load_scene(path, prompt) {
        Ok(scene) => {
            log::info!("------- Import succeeded -------");
            Ok(scene)
        }
        Err(err) => {
            log::error!("------- Import failed -------");
            Err(err)
        }
    }
}
