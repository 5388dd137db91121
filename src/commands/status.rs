use crate::models::{get_cursor_path, RunCursor};
use crate::services::PriceStoreMerger;
use std::path::{Path, PathBuf};

pub fn run(data_dir: PathBuf) {
    println!("📊 Price Data Status\n");

    match show_status(&data_dir) {
        Ok(()) => {}
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn show_status(data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let cursor_path = get_cursor_path(data_dir);
    let cursor = RunCursor::load(&cursor_path);

    println!("📁 Data dir:    {}", data_dir.display());
    if cursor_path.exists() {
        println!("🔖 Next index:  {}", cursor.last_index);
    } else {
        println!("🔖 Next index:  0 (no previous run)");
    }

    let merger = PriceStoreMerger::new(data_dir);
    let store = merger.load_latest()?;

    if store.is_empty() {
        println!("⚠️  No prices stored yet. Run 'pull' first.");
        return Ok(());
    }

    println!("💰 Stored items: {}", store.len());

    if let Some(snapshot) = merger.latest_snapshot() {
        println!("🗂️  Latest snapshot: {}", snapshot.display());
    }

    Ok(())
}
