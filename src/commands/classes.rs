use anyhow::Result;
use colored::Colorize;

use crate::decompiler::atl::ATL_HANDLERS;
use crate::decompiler::statements::STATEMENT_HANDLERS;
use crate::decompiler::NodeKind;

/// List every recognized AST class with its kind and handler table
pub fn execute() -> Result<()> {
    for (class, kind) in NodeKind::classes() {
        let table = if kind.is_atl() { "atl" } else { "statement" };
        let registered = if kind.is_atl() {
            ATL_HANDLERS.is_registered(kind)
        } else {
            STATEMENT_HANDLERS.is_registered(kind)
        };

        let handler = if registered {
            table.green().to_string()
        } else {
            "fallback".yellow().to_string()
        };
        println!("{:<36} {} {}", class, format!("{:<22}", kind).dimmed(), handler);
    }

    Ok(())
}
