use std::path::Path;
use std::process;

use policydoc_eval::PathQuery;

use crate::commands::load_json_or_exit;
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_path(document: &Path, query: &str, output: OutputFormat, quiet: bool) {
    let doc = load_json_or_exit(document, "document", output, quiet);

    let compiled = match PathQuery::parse(query) {
        Ok(q) => q,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    // Every match is printed, including each hit of a filter query.
    let matches = compiled.select(&doc);

    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => {
            for m in matches {
                match m {
                    serde_json::Value::String(s) => println!("{}", s),
                    other => println!("{}", other),
                }
            }
        }
        OutputFormat::Json => {
            let result = serde_json::json!({
                "query": query,
                "singular": compiled.is_singular(),
                "matches": matches,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&result)
                    .unwrap_or_else(|e| format!("serialization error: {}", e))
            );
        }
    }
}
