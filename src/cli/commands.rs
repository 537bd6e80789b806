use crate::adapter::ExcelAdapter;
use crate::config::{load_push_config, PushConfig, PushType};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::request::{load_request, ReadRequest};
use crate::types::{CellValue, Entity, PushObject, ReadItem, TableRow};
use anyhow::{anyhow, bail, Context};
use clap::ValueEnum;
use colored::Colorize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// What a `read` without a request file asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReadMode {
    /// Cell values, formulas read as their cached result
    Values,
    /// Formula, comment, hyperlink and data type of every cell
    Contents,
    /// Header row plus data rows as objects
    Objects,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Options of the `push` command
#[derive(Debug, Clone)]
pub struct PushArgs {
    pub workbook: PathBuf,
    pub input: PathBuf,
    pub config: Option<PathBuf>,
    pub worksheet: Option<String>,
    pub push_type: PushType,
    pub type_name: String,
    pub rows: bool,
    pub verbose: bool,
}

/// Execute the push command
pub fn push(args: PushArgs) -> anyhow::Result<()> {
    println!("{}", "📤 sheetbridge - Pushing objects".bold().green());
    println!("   Workbook: {}", args.workbook.display());
    println!("   Input:    {}", args.input.display());
    println!("   Push type: {}\n", args.push_type.to_string().bright_yellow());

    let mut config = match &args.config {
        Some(path) => Some(
            load_push_config(path).with_context(|| format!("Failed to read push config {}", path.display()))?,
        ),
        None => None,
    };
    if let Some(worksheet) = &args.worksheet {
        config.get_or_insert_with(PushConfig::default).worksheet = worksheet.clone();
    }

    let objects = load_objects(&args.input, &args.type_name, args.rows)?;
    if args.verbose {
        println!("{}", format!("📖 Loaded {} objects", objects.len()).cyan());
    }

    let mut adapter = ExcelAdapter::open(&args.workbook)?;
    let pushed = adapter.push(objects, args.push_type, config);
    let diagnostics = adapter.take_diagnostics();
    print_diagnostics(&diagnostics, args.verbose);
    fail_on_errors(&diagnostics)?;

    println!(
        "{}",
        format!("✅ Pushed {} objects to {}", pushed.len(), args.workbook.display())
            .bold()
            .green()
    );
    Ok(())
}

/// Options of the `read` command
#[derive(Debug, Clone)]
pub struct ReadArgs {
    pub workbook: PathBuf,
    pub worksheet: Option<String>,
    pub range: Option<String>,
    pub mode: ReadMode,
    pub request: Option<PathBuf>,
    pub format: OutputFormat,
    pub verbose: bool,
}

/// Execute the read command
pub fn read(args: ReadArgs) -> anyhow::Result<()> {
    let request = match &args.request {
        Some(path) => load_request(path).with_context(|| format!("Failed to read request {}", path.display()))?,
        None => build_request(&args)?,
    };

    let mut adapter = ExcelAdapter::open(&args.workbook)?;
    let items = adapter.pull(Some(request));
    let diagnostics = adapter.take_diagnostics();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
        OutputFormat::Table => print_items(&items),
    }

    print_diagnostics(&diagnostics, args.verbose);
    fail_on_errors(&diagnostics)
}

fn build_request(args: &ReadArgs) -> anyhow::Result<ReadRequest> {
    let worksheet = args.worksheet.clone().unwrap_or_default();
    let range = args.range.as_deref().unwrap_or("");
    let request = match args.mode {
        ReadMode::Values => ReadRequest::cell_values(worksheet, range),
        ReadMode::Contents => ReadRequest::cell_contents(worksheet, range),
        ReadMode::Objects => ReadRequest::objects(worksheet, range, None),
    };
    request.ok_or_else(|| anyhow!("'{}' is not a valid cell range", range))
}

/// Execute the sheets command
pub fn sheets(workbook: PathBuf, filter: Option<String>) -> anyhow::Result<()> {
    let mut adapter = ExcelAdapter::open(&workbook)?;
    let items = adapter.pull(Some(ReadRequest::worksheets(filter.as_deref())));
    let diagnostics = adapter.take_diagnostics();

    println!("{}", format!("📊 Worksheets in {}", workbook.display()).bold().green());
    for item in &items {
        if let ReadItem::Worksheet(sheet) = item {
            println!("   {:>3}  {}", sheet.index, sheet.name.bright_blue().bold());
        }
    }
    if items.is_empty() && !diagnostics.has_errors() {
        println!("{}", "   No matching worksheets".yellow());
    }

    print_diagnostics(&diagnostics, false);
    fail_on_errors(&diagnostics)
}

/// Objects from a JSON or YAML file. A top-level array gives one object per
/// element; with `rows` each element must itself be an array of cells.
pub fn load_objects(path: &Path, type_name: &str, rows: bool) -> anyhow::Result<Vec<PushObject>> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let value: Value = if is_json {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };

    let elements = match value {
        Value::Array(items) => items,
        other => vec![other],
    };

    elements
        .into_iter()
        .enumerate()
        .map(|(i, element)| {
            if !rows {
                return Ok(PushObject::Object(Entity::new(type_name, element)));
            }
            match element {
                Value::Array(cells) => Ok(PushObject::Row(cells.iter().map(CellValue::from_json).collect::<TableRow>())),
                _ => bail!("Element {} of {} is not a row of cells", i + 1, path.display()),
            }
        })
        .collect()
}

fn print_items(items: &[ReadItem]) {
    for item in items {
        match item {
            ReadItem::Row(row) => println!("{}", join_cells(row.content.iter())),
            ReadItem::Contents(cells) => {
                for cell in cells {
                    if cell.value.is_empty() && cell.formula.is_empty() && cell.comment.is_empty() {
                        continue;
                    }
                    print!("{:<8} {}", cell.address.to_string().cyan(), cell.value);
                    if !cell.formula.is_empty() {
                        print!("  {}", format!("={}", cell.formula).bright_yellow());
                    }
                    if !cell.comment.is_empty() {
                        print!("  💬 {}", cell.comment);
                    }
                    if !cell.hyperlink.is_empty() {
                        print!("  🔗 {}", cell.hyperlink);
                    }
                    println!();
                }
            }
            ReadItem::Custom(object) => {
                let extra = object
                    .custom_data
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, CellValue::from_json(v)))
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("{} {}", object.name.bright_blue().bold(), extra);
            }
            ReadItem::Object(entity) => println!("{}: {}", entity.type_name.bright_blue(), entity.value),
            ReadItem::Worksheet(sheet) => println!("{}", sheet.name),
        }
    }
}

fn join_cells<'a>(cells: impl Iterator<Item = &'a CellValue>) -> String {
    cells.map(CellValue::to_string).collect::<Vec<_>>().join("\t")
}

/// Print diagnostics to stderr. Notes only show with `verbose`.
pub fn print_diagnostics(diagnostics: &Diagnostics, verbose: bool) {
    for entry in diagnostics.entries() {
        match entry {
            Diagnostic::Error(_) => eprintln!("{}", format!("❌ {}", entry).red()),
            Diagnostic::Warning(_) => eprintln!("{}", format!("⚠️  {}", entry).yellow()),
            Diagnostic::Note(_) if verbose => eprintln!("{}", format!("ℹ️  {}", entry).cyan()),
            Diagnostic::Note(_) => {}
        }
    }
}

fn fail_on_errors(diagnostics: &Diagnostics) -> anyhow::Result<()> {
    let count = diagnostics.errors().count();
    if count > 0 {
        bail!("{} error(s) reported by the Excel adapter", count);
    }
    Ok(())
}
