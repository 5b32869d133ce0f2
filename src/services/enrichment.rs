//! Prompt enrichment from structural code metadata.
//!
//! Renders what is known about a file (classes, interfaces, standalone
//! functions) into a readable summary appended to generation prompts.
//! Lookup is best-effort: no record means an empty enrichment, never a
//! failed prompt.

use std::fmt::Write as _;

use crate::domain::models::{FileRecord, FunctionRecord, ParameterRecord};
use crate::domain::ports::MetadataStore;

/// Retrieval adapter: summary for `file_name`, or empty when the store has
/// no record for it.
pub fn summarize(store: &dyn MetadataStore, _code: &str, file_name: &str) -> String {
    match store.file_record(file_name) {
        Some(record) => describe_file(&record),
        None => String::new(),
    }
}

fn signature(name: &str, parameters: &[ParameterRecord], return_types: &[String]) -> String {
    let params: Vec<String> = parameters
        .iter()
        .map(|p| format!("{}: {}", p.name, p.type_name))
        .collect();

    let mut sig = format!("{}({})", name, params.join(", "));
    if !return_types.is_empty() {
        let _ = write!(sig, " -> {}", return_types.join(", "));
    }
    sig
}

fn describe_function(function: &FunctionRecord) -> String {
    signature(&function.name, &function.parameters, &function.return_types)
}

/// Render the structural summary of one file.
pub fn describe_file(file: &FileRecord) -> String {
    let mut out = String::new();

    let _ = write!(out, "You are analyzing a file named '{}'", file.path);
    if !file.module.is_empty() {
        let _ = write!(out, " from the module '{}'", file.module);
    }
    out.push_str(".\n\n");

    if !file.classes.is_empty() {
        let _ = writeln!(out, "The file contains {} classes:\n", file.classes.len());

        for class in &file.classes {
            let _ = writeln!(out, "- Class '{}':", class.name);

            out.push_str("  Fields:\n");
            for field in &class.fields {
                let _ = writeln!(out, "  - {}: {}", field.name, field.type_name);
            }
            out.push('\n');

            if !class.methods.is_empty() {
                out.push_str("  Methods:\n");
                for method in &class.methods {
                    let _ = writeln!(out, "  - {}", describe_function(&method.function));
                }
                out.push('\n');
            }
        }
    }

    if !file.interfaces.is_empty() {
        let _ = writeln!(out, "The file contains {} interfaces:\n", file.interfaces.len());

        for interface in &file.interfaces {
            let _ = writeln!(out, "- Interface '{}':", interface.name);

            if !interface.methods.is_empty() {
                out.push_str("  Methods:\n");
                for method in &interface.methods {
                    let _ = writeln!(out, "  - {}", describe_function(method));
                }
                out.push('\n');
            }
        }
    }

    if !file.functions.is_empty() {
        let _ = writeln!(
            out,
            "The file contains {} standalone functions:\n",
            file.functions.len()
        );

        for function in &file.functions {
            let _ = writeln!(out, "- {}", describe_function(function));
        }
    }

    out.push_str("\nUse this structure when choosing what to exercise in the tests.\n");
    out
}
