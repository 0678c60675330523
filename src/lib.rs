pub mod cli;
pub mod duration;
pub mod filter;
pub mod palette;
pub mod trace_id;

use crate::filter::{ATTRIBUTE_SPAN_DURATION, ATTRIBUTE_TRACE_DURATION};
use colored::{ColoredString, Colorize};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use serde_json::json;
use similar::{ChangeTag, TextDiff};
use std::fmt::Write;
use std::path::Path;

pub use cli::{Cli, ColorMode, Commands, OutputFormat, cli_parse};
pub use duration::{DurationError, format_duration, parse_duration};
pub use filter::{DurationField, Filter, parse, serialize, split_unquoted_whitespace};
pub use palette::{Color, Palette, PaletteConfig, PaletteError, load_palette_config};
pub use trace_id::is_valid_trace_id;

/// A colored service assignment produced by the colors command.
struct ColorAssignment {
    service: String,
    color: Color,
    error: bool,
}

fn create_styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|header| Cell::new(header).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    table
}

fn write_output_file(
    path: &std::path::Path,
    content: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, content)
        .map_err(|e| format!("Failed to write output file '{}': {}", path.display(), e).into())
}

fn push_group_summary(
    rows: &mut Vec<(&'static str, String)>,
    group: &'static str,
    values: &[String],
) {
    if !values.is_empty() {
        rows.push((group, values.join(", ")));
    }
}

fn push_duration_summary(
    rows: &mut Vec<(&'static str, String)>,
    group: &'static str,
    field: &DurationField,
) {
    let mut bounds = Vec::new();
    if let Some(min) = &field.min {
        bounds.push(describe_bound(">=", min));
    }
    if let Some(max) = &field.max {
        bounds.push(describe_bound("<=", max));
    }
    if !bounds.is_empty() {
        rows.push((group, bounds.join(", ")));
    }
}

/// Show a duration bound with its normalized form, or a note when the
/// literal does not validate.
fn describe_bound(op: &str, raw: &str) -> String {
    match parse_duration(raw) {
        Ok(duration) => format!("{op} {raw} ({})", format_duration(duration)),
        Err(_) => format!("{op} {raw} (not a valid duration)"),
    }
}

fn print_duration_warnings(filter: &Filter) {
    let fields = [
        (ATTRIBUTE_SPAN_DURATION, &filter.span_duration),
        (ATTRIBUTE_TRACE_DURATION, &filter.trace_duration),
    ];
    for (attribute, field) in fields {
        for (bound, value) in [("lower", &field.min), ("upper", &field.max)] {
            if let Some(value) = value
                && let Err(e) = parse_duration(value)
            {
                eprintln!("Warning: {attribute} {bound} bound: {e}");
            }
        }
    }
}

fn format_parse_text(query: &str, filter: &Filter, show_tokens: bool) -> String {
    let mut out = String::new();

    if show_tokens {
        let tokens = split_unquoted_whitespace(query);
        let _ = writeln!(out, "Tokens ({})", tokens.len());
        for (index, token) in tokens.iter().enumerate() {
            let _ = writeln!(out, "{:>4}  {}", index + 1, token);
        }
        let _ = writeln!(out);
    }

    if filter.is_empty() {
        let _ = writeln!(out, "Filter is empty (matches all traces).");
    }

    let mut rows: Vec<(&'static str, String)> = Vec::new();
    push_group_summary(&mut rows, "service name", &filter.service_name);
    push_group_summary(&mut rows, "span name", &filter.span_name);
    push_group_summary(&mut rows, "namespace", &filter.namespace);
    push_group_summary(&mut rows, "status", &filter.status);
    push_duration_summary(&mut rows, "span duration", &filter.span_duration);
    push_duration_summary(&mut rows, "trace duration", &filter.trace_duration);

    if !rows.is_empty() {
        let mut table = create_styled_table(&["Group", "Values"]);
        for (group, values) in &rows {
            table.add_row(vec![Cell::new(group), Cell::new(values)]);
        }
        let _ = writeln!(out, "{table}");
    }

    if !filter.custom_matchers.is_empty() {
        let _ = writeln!(out, "Custom matchers ({})", filter.custom_matchers.len());
        for matcher in &filter.custom_matchers {
            let _ = writeln!(out, "  {matcher}");
        }
    }

    let _ = writeln!(out, "\nCanonical: {}", serialize(filter));
    out
}

fn format_parse_json(query: &str, filter: &Filter, show_tokens: bool) -> String {
    let mut body = json!({
        "query": query,
        "filter": filter,
        "canonical": serialize(filter),
    });
    if show_tokens {
        body["tokens"] = json!(split_unquoted_whitespace(query));
    }

    serde_json::to_string_pretty(&json!({ "parse": body }))
        .unwrap_or_else(|_| "{\"error\": \"Failed to serialize parse report\"}".to_string())
}

fn format_format_json(file: &Path, filter: &Filter, canonical: &str) -> String {
    serde_json::to_string_pretty(&json!({
        "format": {
            "file": file.display().to_string(),
            "filter": filter,
            "canonical": canonical,
        }
    }))
    .unwrap_or_else(|_| "{\"error\": \"Failed to serialize format report\"}".to_string())
}

fn format_check_text(query: &str, canonical: &str, round_trip: bool) -> String {
    let mut out = String::new();
    if round_trip {
        let _ = writeln!(out, "{} {}", "Round trip OK:".green(), canonical);
    } else {
        let _ = writeln!(out, "{}", "Round trip mismatch".red().bold());
        out.push_str(&render_round_trip_diff(query, canonical));
    }
    out
}

fn format_check_json(query: &str, canonical: &str, round_trip: bool) -> String {
    serde_json::to_string_pretty(&json!({
        "check": {
            "query": query,
            "canonical": canonical,
            "round_trip": round_trip,
        }
    }))
    .unwrap_or_else(|_| "{\"error\": \"Failed to serialize check report\"}".to_string())
}

/// Line diff between the input query and its canonical form, with removals
/// in red and insertions in green.
fn render_round_trip_diff(original: &str, canonical: &str) -> String {
    let diff = TextDiff::from_lines(original, canonical);
    let mut out = String::new();
    for change in diff.iter_all_changes() {
        let (sign, color): (&str, fn(&str) -> ColoredString) = match change.tag() {
            ChangeTag::Delete => ("-", |s| s.red()),
            ChangeTag::Insert => ("+", |s| s.green()),
            ChangeTag::Equal => continue,
        };
        let line = format!("{sign} {}", change.to_string().trim_end_matches('\n'));
        let _ = writeln!(out, "{}", color(&line));
    }
    out
}

fn assign_colors(
    palette: &Palette,
    services: &[String],
    errors: &[String],
    indexed: bool,
) -> Vec<ColorAssignment> {
    let mut names: Vec<String> = services.to_vec();
    for error_service in errors {
        if !names.contains(error_service) {
            names.push(error_service.clone());
        }
    }

    names
        .into_iter()
        .enumerate()
        .map(|(index, service)| {
            let error = errors.contains(&service);
            let color = if error {
                palette.error_color_for(&service)
            } else if indexed {
                palette.color_at(index)
            } else {
                palette.color_for(&service)
            };
            ColorAssignment {
                service,
                color,
                error,
            }
        })
        .collect()
}

fn format_colors_text(assignments: &[ColorAssignment]) -> String {
    let mut out = String::new();
    let mut table = create_styled_table(&["Service", "Color", "Swatch"]);
    for assignment in assignments {
        let mut service_cell = Cell::new(&assignment.service);
        if assignment.error {
            service_cell = service_cell.fg(comfy_table::Color::Red);
        }
        table.add_row(vec![
            service_cell,
            Cell::new(assignment.color.to_string()),
            Cell::new("██████").fg(comfy_table::Color::Rgb {
                r: assignment.color.r,
                g: assignment.color.g,
                b: assignment.color.b,
            }),
        ]);
    }
    let _ = writeln!(out, "{table}");
    out
}

fn format_colors_json(assignments: &[ColorAssignment]) -> String {
    let entries: Vec<_> = assignments
        .iter()
        .map(|assignment| {
            json!({
                "service": assignment.service,
                "color": assignment.color.to_string(),
                "error": assignment.error,
            })
        })
        .collect();

    serde_json::to_string_pretty(&json!({ "colors": entries }))
        .unwrap_or_else(|_| "{\"error\": \"Failed to serialize color report\"}".to_string())
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = cli_parse();
    let format = cli.format;
    let output = &cli.output;
    let color_mode = cli.color;
    let verbose = cli.verbose;

    // Set up color handling based on user preference
    match color_mode {
        ColorMode::Always => {
            // Force colors on
            unsafe {
                std::env::set_var("CLICOLOR_FORCE", "1");
            }
        }
        ColorMode::Never => {
            // Disable colors
            unsafe {
                std::env::set_var("NO_COLOR", "1");
            }
        }
        ColorMode::Auto => {
            // Default behavior - let the terminal decide
        }
    }

    // If in verbose mode, display some diagnostic information
    if verbose > 0 {
        eprintln!("Verbosity level: {}", verbose);
        eprintln!("Color mode: {:?}", color_mode);
        if let Some(out_path) = output {
            eprintln!("Output will be written to: {}", out_path.display());
        }
    }

    match &cli.command {
        Commands::Parse { query, tokens } => {
            if is_valid_trace_id(query.trim()) {
                eprintln!(
                    "Note: '{}' looks like a trace id rather than query text",
                    query.trim()
                );
            }
            let filter = parse(query);

            match format {
                OutputFormat::Text => {
                    let text = format_parse_text(query, &filter, *tokens);
                    print!("{text}");
                    if let Some(path) = output {
                        write_output_file(path, &text)?;
                    }
                }
                OutputFormat::Json => {
                    let json = format_parse_json(query, &filter, *tokens);
                    println!("{}", json);
                    if let Some(path) = output {
                        write_output_file(path, &json)?;
                    }
                }
            }
        }
        Commands::Format { file } => {
            let raw = std::fs::read_to_string(file).map_err(|e| {
                format!("Failed to read filter document '{}': {}", file.display(), e)
            })?;
            let filter: Filter = json5::from_str(&raw).map_err(|e| {
                format!("Failed to parse filter document '{}': {}", file.display(), e)
            })?;
            let canonical = serialize(&filter);

            match format {
                OutputFormat::Text => {
                    let text = format!("{canonical}\n");
                    print!("{text}");
                    if let Some(path) = output {
                        write_output_file(path, &text)?;
                    }
                }
                OutputFormat::Json => {
                    let json = format_format_json(file, &filter, &canonical);
                    println!("{}", json);
                    if let Some(path) = output {
                        write_output_file(path, &json)?;
                    }
                }
            }
        }
        Commands::Check { query } => {
            let filter = parse(query);
            print_duration_warnings(&filter);
            let canonical = serialize(&filter);
            let round_trip = canonical == *query;

            match format {
                OutputFormat::Text => {
                    let text = format_check_text(query, &canonical, round_trip);
                    print!("{text}");
                    if let Some(path) = output {
                        write_output_file(path, &text)?;
                    }
                }
                OutputFormat::Json => {
                    let json = format_check_json(query, &canonical, round_trip);
                    println!("{}", json);
                    if let Some(path) = output {
                        write_output_file(path, &json)?;
                    }
                }
            }

            if !round_trip {
                return Err("query text changed after a parse/serialize round trip".into());
            }
        }
        Commands::Colors {
            services,
            errors,
            indexed,
            config,
        } => {
            let palette_config = match config {
                Some(path) => load_palette_config(path)
                    .map_err(|e| format!("Failed to load palette config: {}", e))?,
                None => PaletteConfig::default(),
            };
            let palette =
                Palette::new(palette_config).map_err(|e| format!("Invalid palette config: {}", e))?;
            let assignments = assign_colors(&palette, services, errors, *indexed);

            match format {
                OutputFormat::Text => {
                    let text = format_colors_text(&assignments);
                    print!("{text}");
                    if let Some(path) = output {
                        write_output_file(path, &text)?;
                    }
                }
                OutputFormat::Json => {
                    let json = format_colors_json(&assignments);
                    println!("{}", json);
                    if let Some(path) = output {
                        write_output_file(path, &json)?;
                    }
                }
            }
        }
    }

    Ok(())
}
