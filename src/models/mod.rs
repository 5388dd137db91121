mod price;
mod run_config;
mod run_cursor;

pub use price::{PriceMap, PricePoint, PriceStore, PriceSummary};
pub use run_config::RunConfig;
pub use run_cursor::{get_cursor_path, RunCursor};
