//! CLI smoke entry point.
//!
//! Loads `BOARD_*` configuration, opens the store and prints one status line
//! per check so wiring problems show up without a host application.

use board_core::{BoardConfig, CrudRepository, SqliteArticleRepository};
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = BoardConfig::from_env();

    if let Some(log_dir) = &config.log_dir {
        if let Err(err) = board_core::init_logging(&config.log_level, log_dir) {
            eprintln!("board logging=error message={err}");
        }
    }

    println!("board_core ping={}", board_core::ping());
    println!("board_core version={}", board_core::core_version());

    let conn = match config.open_store() {
        Ok(conn) => conn,
        Err(err) => {
            log::error!("event=cli_probe module=cli status=error error={err}");
            eprintln!("board store=error message={err}");
            return ExitCode::FAILURE;
        }
    };

    let articles = SqliteArticleRepository::try_new(&conn, config.auditing())
        .and_then(|repo| repo.count());
    match articles {
        Ok(count) => {
            println!("board store=ok articles={count}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("event=cli_probe module=cli status=error error={err}");
            eprintln!("board store=error message={err}");
            ExitCode::FAILURE
        }
    }
}
