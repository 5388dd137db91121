use crate::models::{get_cursor_path, RunCursor};
use std::path::PathBuf;

pub fn run(data_dir: PathBuf) {
    let cursor_path = get_cursor_path(&data_dir);

    match RunCursor::default().save(&cursor_path) {
        Ok(()) => println!("🔄 Run cursor reset to 0 ({})", cursor_path.display()),
        Err(e) => {
            eprintln!("❌ Failed to reset cursor: {}", e);
            std::process::exit(1);
        }
    }
}
