pub mod config;
pub mod program;
pub mod progress;
pub mod run;

use pacer_core::SqliteProgressStore;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

fn open_progress() -> pacer_core::error::Result<SqliteProgressStore> {
    SqliteProgressStore::open()
}
