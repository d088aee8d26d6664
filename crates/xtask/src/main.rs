use std::path::{Path, PathBuf};

use build_protocol_types::protocol_schema;
use clap::Parser;

const SCHEMA_FILE_NAME: &str = "build_protocol.json";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tasks for the build protocol workspace")]
enum Cli {
    /// Generate the JSON Schema of the build protocol messages
    GenerateSchema {
        /// Directory to write the schema to, defaults to `schema/` in the
        /// workspace root.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli {
        Cli::GenerateSchema { output_dir } => {
            let output_dir = match output_dir {
                Some(dir) => dir,
                None => workspace_root()?.join("schema"),
            };
            let output_path = generate_schema(&output_dir)?;
            println!("Schema written to {}", output_path.display());
        }
    }

    Ok(())
}

fn workspace_root() -> Result<PathBuf, Box<dyn std::error::Error>> {
    Ok(PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .map(ToOwned::to_owned)
        .ok_or("Failed to find workspace root")?)
}

fn generate_schema(output_dir: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let schema_json = serde_json::to_string_pretty(&protocol_schema())?;

    fs_err::create_dir_all(output_dir)?;
    let output_path = output_dir.join(SCHEMA_FILE_NAME);
    fs_err::write(&output_path, format!("{}\n", schema_json))?;
    Ok(output_path)
}
