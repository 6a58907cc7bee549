//! x11info - Main entry point
//!
//! Prints what an X server reports about itself

use std::env;
use std::io;
use std::process;

use x11info::config::Config;
use x11info::security::XauthorityFile;
use x11info::{connection, probe, report, ConnectionTarget, Error, VERSION};

fn print_usage() {
    println!("x11info v{}", VERSION);
    println!("X server information printer");
    println!();
    println!("Usage: x11info [OPTIONS]");
    println!();
    println!("The display is taken from DISPLAY and the authorization data from");
    println!("XAUTHORITY (default: ~/.Xauthority).");
    println!();
    println!("Options:");
    println!("  -h, --help            Show this help message");
    println!();
    println!("Examples:");
    println!("  x11info");
    println!("  DISPLAY=remote-server.com:0 x11info");
    println!("  RUST_LOG=debug x11info");
    println!();
}

/// What the command line asks for
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Report,
    Help,
}

/// Parse the arguments that follow the program name
fn parse_args<I>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = String>,
{
    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            other => return Err(format!("Unknown option: {}", other)),
        }
    }

    Ok(Command::Report)
}

fn run(config: &Config) -> x11info::Result<()> {
    let target = ConnectionTarget::parse(&config.display)?;
    log::debug!("Display: {} ({:?})", target, target.transport);

    let credentials = XauthorityFile::new(&config.xauthority);
    let report = probe(&target, &credentials, connection::resolve)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    report::write_report(&mut out, &report).map_err(Error::Output)
}

fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match parse_args(env::args().skip(1)) {
        Ok(Command::Report) => {}
        Ok(Command::Help) => {
            print_usage();
            process::exit(0);
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            eprintln!();
            print_usage();
            process::exit(1);
        }
    }

    let config = Config::from_env();
    if config.display_defaulted {
        log::warn!(
            "No DISPLAY environment variable found, trying default X display name '{}'",
            config.display
        );
    }

    if let Err(err) = run(&config) {
        eprintln!("FATAL ERROR: {}", err);
        process::exit(1);
    }
}
