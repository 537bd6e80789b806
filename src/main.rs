use clap::{Parser, Subcommand};
use sheetbridge::cli::{self, OutputFormat, PushArgs, ReadArgs, ReadMode};
use sheetbridge::PushType;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sheetbridge")]
#[command(about = "Push object collections into Excel worksheets and read them back.")]
#[command(long_about = "sheetbridge - objects <-> Excel tables

COMMANDS:
  push    - Write objects from a JSON/YAML file as a table
  read    - Read cell values, cell contents or objects
  sheets  - List worksheets

EXAMPLES:
  sheetbridge push book.xlsx beams.yaml -w Beams
  sheetbridge push book.xlsx beams.json -c layout.yaml -t update-only
  sheetbridge read book.xlsx -w Beams -r A1:D20 --mode objects --format json
  sheetbridge read book.xlsx --request batch.yaml
  sheetbridge sheets book.xlsx --filter beam

LOGGING:
  SHEETBRIDGE_LOG=sheetbridge=debug sheetbridge read book.xlsx")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Write objects to a worksheet.

The input file holds a list of objects (JSON or YAML). Each object becomes a
row; its fields become columns in declaration order. Nested objects are kept
as JSON text unless the config sets goDeepInProperties.

PUSH TYPES:
  AdapterDefault      same as DeleteThenCreate
  DeleteThenCreate    replace the worksheet
  CreateNonExisting   only write if the worksheet does not exist yet
  UpdateOnly          overwrite cells of an existing worksheet
  UpdateOrCreateOnly  update if present, create otherwise

CONFIG (YAML or JSON):
  worksheet: Beams
  startingCell: B2
  objectProperties: [Name, Length]
  propertiesToIgnore: [Guid]
  goDeepInProperties: true
  transposeObjectTable: false
  includePropertyNames: true")]
    /// Write objects from a file to a worksheet
    Push {
        /// Target workbook (.xlsx or .xlsm); created if missing
        workbook: PathBuf,

        /// JSON or YAML file with the objects to push
        input: PathBuf,

        /// Push config file (JSON or YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Target worksheet, overrides the config
        #[arg(short, long)]
        worksheet: Option<String>,

        /// How to treat an existing worksheet
        #[arg(short = 't', long, default_value = "AdapterDefault")]
        push_type: PushType,

        /// Type name given to the pushed objects
        #[arg(long, default_value = "Record")]
        type_name: String,

        /// Input elements are rows of cells, written verbatim
        #[arg(long)]
        rows: bool,

        /// Show notes and progress
        #[arg(short, long)]
        verbose: bool,
    },

    /// Read from a worksheet
    Read {
        /// Workbook to read
        workbook: PathBuf,

        /// Worksheet name (default: first worksheet)
        #[arg(short, long)]
        worksheet: Option<String>,

        /// Range such as A1:D20, A:C or B2 (default: used area)
        #[arg(short, long)]
        range: Option<String>,

        /// What to read
        #[arg(short, long, value_enum, default_value = "values")]
        mode: ReadMode,

        /// Request file (JSON or YAML); overrides worksheet, range and mode
        #[arg(long)]
        request: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Show notes
        #[arg(short, long)]
        verbose: bool,
    },

    /// List worksheets
    Sheets {
        /// Workbook to inspect
        workbook: PathBuf,

        /// Case-insensitive substring the name must contain
        #[arg(long)]
        filter: Option<String>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SHEETBRIDGE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| "sheetbridge=warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Push {
            workbook,
            input,
            config,
            worksheet,
            push_type,
            type_name,
            rows,
            verbose,
        } => cli::push(PushArgs {
            workbook,
            input,
            config,
            worksheet,
            push_type,
            type_name,
            rows,
            verbose,
        }),

        Commands::Read {
            workbook,
            worksheet,
            range,
            mode,
            request,
            format,
            verbose,
        } => cli::read(ReadArgs {
            workbook,
            worksheet,
            range,
            mode,
            request,
            format,
            verbose,
        }),

        Commands::Sheets { workbook, filter } => cli::sheets(workbook, filter),
    }
}
