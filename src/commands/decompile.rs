use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;
use std::time::Instant;

use crate::config::{self, Config, DEFAULT_CONFIG_FILE};
use crate::decompiler::{parse_dump, Decompiler};

/// Decompile a JSON AST dump to Ren'Py script (stdout or `output`)
pub fn execute(file: &str, config_path: Option<&str>, output: Option<&str>, indent: Option<usize>) -> Result<()> {
    let start = Instant::now();

    let path = Path::new(file);
    if !path.exists() {
        anyhow::bail!("File not found: {}", file);
    }

    // 1. Load configuration: explicit path, else unrpy.toml when present
    let config = match config_path {
        Some(config_path) => config::load_config(config_path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => config::load_config(DEFAULT_CONFIG_FILE)?,
        None => Config::default(),
    };

    let mut options = config.decompile_options();
    if let Some(indent) = indent {
        config::validate_indent_width(indent)?;
        options.indent_width = indent;
    }

    // 2. Read and parse the dump
    let source = fs::read_to_string(path)
        .context(format!("Failed to read {}", file))?;
    let nodes = parse_dump(&source)
        .map_err(|e| anyhow::anyhow!("failed to parse AST dump `{}`: {}", file, e))?;

    // 3. Decompile
    let mut decompiler = Decompiler::new(options);
    if let Some(translator) = config.translation {
        decompiler = decompiler.with_translator(translator);
    }
    let result = decompiler
        .decompile(&nodes)
        .with_context(|| format!("failed to decompile `{}`", file))?;

    for diagnostic in &result.diagnostics {
        eprintln!("{} {}", "warning:".yellow().bold(), diagnostic);
    }

    // 4. Write the script
    match output {
        Some(output) => {
            fs::write(output, &result.text)
                .context(format!("Failed to write {}", output))?;
            let elapsed = start.elapsed();
            eprintln!("   {} `{}` -> `{}` in {:.2}s",
                "Decompiled".green().bold(),
                file,
                output,
                elapsed.as_secs_f64()
            );
        }
        None => print!("{}", result.text),
    }

    Ok(())
}
