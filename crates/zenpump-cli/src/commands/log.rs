use std::io::{BufRead, Write};
use std::path::PathBuf;

use chrono::{Local, Utc};
use clap::Subcommand;
use zenpump_core::storage::{export_file_name, write_export};
use zenpump_core::Database;

#[derive(Subcommand)]
pub enum LogAction {
    /// Record output for one session
    Add {
        /// Left side in ml
        #[arg(long, default_value = "0")]
        left: f64,
        /// Right side in ml
        #[arg(long, default_value = "0")]
        right: f64,
    },
    /// List records, newest first
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a record
    Delete {
        /// Record ID
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Export all records as CSV
    Export {
        /// Output file (defaults to milk-records-<timestamp>.csv)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

pub fn run(action: LogAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        LogAction::Add { left, right } => {
            let record = db.add_record(left, right)?;
            println!("Record added: {}", record.id);
            println!("  total: {} ml", record.total_ml());
        }
        LogAction::List { json } => {
            let records = db.list_records()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("No records.");
            } else {
                for r in &records {
                    println!(
                        "{}  {}  left {} ml  right {} ml  total {} ml",
                        r.id,
                        r.submitted_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
                        r.left_ml,
                        r.right_ml,
                        r.total_ml()
                    );
                }
            }
        }
        LogAction::Delete { id, yes } => {
            if !yes && !confirm(&format!("Delete record {id}? [y/N] "))? {
                println!("cancelled");
                return Ok(());
            }
            if db.delete_record(&id)? {
                println!("Record deleted: {id}");
            } else {
                return Err(format!("record not found: {id}").into());
            }
        }
        LogAction::Export { output } => {
            let records = db.list_records()?;
            let path = output.unwrap_or_else(|| PathBuf::from(export_file_name(Utc::now())));
            let rows = write_export(&path, &records)?;
            println!("Exported {rows} records to {}", path.display());
        }
    }
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool, std::io::Error> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
