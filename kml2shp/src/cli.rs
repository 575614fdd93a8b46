//! Implémentation de la commande de conversion
//!
//! Surface volontairement mince: validation du chemin, dérivation du
//! nom de base de sortie, appel du coeur `kmlshape`, message d'une
//! ligne en cas d'erreur.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

/// Exécute la conversion; demande le chemin interactivement s'il
/// n'a pas été passé en argument
pub fn cmd_convert(input: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let input = match input {
        Some(path) => path,
        None => prompt_input_path()?,
    };

    anyhow::ensure!(
        input.exists(),
        "File not found: {} (check the path and try again)",
        input.display()
    );

    let output_base = match output {
        Some(base) => base,
        None => derive_output_base(&input),
    };

    info!(
        input = %input.display(),
        output = %output_base.display(),
        "Starting conversion"
    );

    let result = kmlshape::convert(&input, &output_base)
        .with_context(|| format!("Conversion failed for {}", input.display()))?;

    println!("Successfully converted {} polygons", result.shape_count);
    println!("Created: {}", result.files.shp.display());

    Ok(())
}

/// Demande le chemin d'entrée sur stdin
fn prompt_input_path() -> Result<PathBuf> {
    print!("Enter KML/KMZ file path: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read input path")?;

    let trimmed = strip_quotes(line.trim());
    anyhow::ensure!(!trimmed.is_empty(), "Please provide a file path");

    Ok(PathBuf::from(trimmed))
}

/// Retire une paire de guillemets (simples ou doubles) entourant le
/// chemin, fréquente lors d'un copier-coller depuis un explorateur
fn strip_quotes(path: &str) -> &str {
    for quote in ['"', '\''] {
        if path.len() >= 2 && path.starts_with(quote) && path.ends_with(quote) {
            return &path[1..path.len() - 1];
        }
    }
    path
}

/// Dérive le nom de base de sortie: `<répertoire>/<stem>_converted`
fn derive_output_base(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());

    input.with_file_name(format!("{}_converted", stem))
}
