use std::path::Path;
use std::process;

use policydoc_eval::{merge_fields, Evaluator, FunctionRegistry, MemorySink};
use policydoc_mapping::MappingContext;

use crate::commands::{build_or_exit, load_json_or_exit};
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_resolve(
    template: &Path,
    custom: Option<&Path>,
    policy: &Path,
    fields: &[String],
    output: OutputFormat,
    quiet: bool,
) {
    let mut context = MappingContext::new(build_or_exit(template, output, quiet));
    if let Some(custom) = custom {
        context = context.with_custom(build_or_exit(custom, output, quiet));
    }

    let document = load_json_or_exit(policy, "policy", output, quiet);

    // The JSON policy doubles as the typed object; no custom functions are
    // available from the command line.
    let registry: FunctionRegistry<serde_json::Value> = FunctionRegistry::new();
    let evaluator = Evaluator::new(&registry);
    let mut sink = MemorySink::new();

    let names: Vec<String> = if fields.is_empty() {
        context.field_names().into_iter().map(str::to_string).collect()
    } else {
        fields.to_vec()
    };
    tracing::debug!(
        template = %template.display(),
        fields = names.len(),
        "resolving fields"
    );

    let report = match merge_fields(
        &context,
        &evaluator,
        &document,
        &document,
        &mut sink,
        names.iter().map(String::as_str),
    ) {
        Ok(r) => {
            tracing::info!(
                filled = r.filled.len(),
                empty = r.empty.len(),
                unmapped = r.unmapped.len(),
                "merge complete"
            );
            r
        }
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => {
            for name in &names {
                if let Some(value) = sink.field(name) {
                    println!("{} = {}", name, value);
                }
            }
            for name in &report.unmapped {
                eprintln!("warning: no mapping for field '{}'", name);
            }
        }
        OutputFormat::Json => {
            let values: serde_json::Map<String, serde_json::Value> = names
                .iter()
                .filter_map(|name| {
                    sink.field(name)
                        .map(|v| (name.clone(), serde_json::Value::from(v)))
                })
                .collect();
            let result = serde_json::json!({
                "fields": values,
                "report": report,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&result)
                    .unwrap_or_else(|e| format!("serialization error: {}", e))
            );
        }
    }
}
