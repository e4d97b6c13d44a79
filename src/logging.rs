use console::style;
use env_logger::{Builder, Env};
use log::{Level, LevelFilter};
use std::io::Write;

/// Initialize logger based on verbose flag.
///
/// `RUST_LOG` takes precedence over the flag.
pub fn init_logger(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let env = Env::default().filter_or("RUST_LOG", default);

    let mut builder = Builder::new();
    builder
        .filter_level(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_env(env)
        .format(|buf, record| writeln!(buf, "{} {}", level_tag(record.level()), record.args()));
    // a second init (e.g. from tests) keeps the first logger
    let _ = builder.try_init();
}

fn level_tag(level: Level) -> String {
    match level {
        Level::Error => format!("{}", style("ERROR").red().bold()),
        Level::Warn => format!("{}", style("WARN ").yellow().bold()),
        Level::Info => format!("{}", style("INFO ").green()),
        Level::Debug => format!("{}", style("DEBUG").cyan()),
        Level::Trace => format!("{}", style("TRACE").dim()),
    }
}
