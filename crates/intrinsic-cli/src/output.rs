use std::fmt::Write as _;

use intrinsic_core::Envelope;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::CliError;

pub fn render(
    envelope: &Envelope<Value>,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    let payload = match format {
        OutputFormat::Json if pretty => serde_json::to_string_pretty(envelope)?,
        OutputFormat::Json => serde_json::to_string(envelope)?,
        OutputFormat::Table => render_table(envelope)?,
    };
    println!("{payload}");
    Ok(())
}

fn render_table(envelope: &Envelope<Value>) -> Result<String, CliError> {
    let mut out = String::new();
    let meta = &envelope.meta;
    // Writing into a String cannot fail.
    let _ = writeln!(out, "request_id  : {}", meta.request_id);
    let _ = writeln!(out, "schema      : {}", meta.schema_version);
    let _ = writeln!(out, "generated_at: {}", meta.generated_at);
    let _ = writeln!(out, "source      : {}", meta.source);
    let _ = writeln!(out, "latency_ms  : {}", meta.latency_ms);

    if !meta.warnings.is_empty() {
        out.push_str("warnings:\n");
        for warning in &meta.warnings {
            let _ = writeln!(out, "  - {warning}");
        }
    }

    match envelope.data.get("valuations").and_then(Value::as_array) {
        Some(valuations) => {
            for valuation in valuations {
                write_valuation(&mut out, valuation);
            }
        }
        None => {
            out.push_str("data:\n");
            for line in serde_json::to_string_pretty(&envelope.data)?.lines() {
                let _ = writeln!(out, "  {line}");
            }
        }
    }

    if !envelope.errors.is_empty() {
        out.push_str("errors:\n");
        for error in &envelope.errors {
            let _ = writeln!(out, "  - {}: {}", error.code, error.message);
        }
    }

    Ok(out.trim_end().to_owned())
}

fn write_valuation(out: &mut String, valuation: &Value) {
    let number = |value: &Value, key: &str| value.get(key).and_then(Value::as_f64);
    let method = valuation
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or("?");
    let basis = if method == "ocf" { "per share" } else { "aggregate" };

    let _ = writeln!(out, "valuation ({method}):");
    if let Some(value) = number(valuation, "intrinsic_value") {
        let _ = writeln!(out, "  intrinsic_value: {value:.2} ({basis})");
    }
    if let Some(rate) = valuation
        .get("discount")
        .and_then(|discount| {
            number(discount, "override_rate").or_else(|| number(discount, "derived_rate"))
        })
    {
        let _ = writeln!(out, "  discount_rate  : {:.2}%", rate * 100.0);
    }
    if let Some(growth) = valuation.get("growth") {
        let rate = number(growth, "rate").unwrap_or_default();
        let provenance = growth
            .get("provenance")
            .and_then(Value::as_str)
            .unwrap_or("?");
        let _ = writeln!(out, "  growth_rate    : {:.2}% ({provenance})", rate * 100.0);
    }
    if let Some(terminal) = valuation.get("terminal") {
        let capped = terminal
            .get("capped")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let _ = writeln!(
            out,
            "  terminal       : {:.2}{}",
            number(terminal, "contribution").unwrap_or_default(),
            if capped { " (capped)" } else { "" }
        );
    }

    let _ = writeln!(
        out,
        "  {:>4}  {:>8}  {:>16}  {:>8}  {:>16}",
        "year", "growth", "projected", "factor", "discounted"
    );
    let rows = valuation
        .get("rows")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for row in rows {
        let _ = writeln!(
            out,
            "  {:>4}  {:>7.2}%  {:>16.2}  {:>8.4}  {:>16.2}",
            row.get("year").and_then(Value::as_u64).unwrap_or_default(),
            number(row, "growth_rate").unwrap_or_default() * 100.0,
            number(row, "projected_value").unwrap_or_default(),
            number(row, "discount_factor").unwrap_or_default(),
            number(row, "discounted_value").unwrap_or_default(),
        );
    }
}
