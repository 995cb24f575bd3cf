// Entry point: parse the tiny CLI surface, load config, bring up logging,
// build the module chain, and hand off to the supervisor.

use proton::logging::{self, Level};
use proton::module::{EchoModule, ModuleChain};
use proton::{config, Supervisor};
use std::process::ExitCode;

const USAGE: &str = "usage: proton [-c <config-file>] [-h]\n\n\
    -c <file>   path to config file (default: proton.conf)\n\
    -h          print this help and exit\n";

struct Args {
    config_path: String,
}

fn parse_args() -> Result<Args, ()> {
    let mut config_path = "proton.conf".to_string();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print!("{USAGE}");
                std::process::exit(0);
            }
            "-c" => {
                config_path = iter.next().ok_or(())?;
            }
            _ => return Err(()),
        }
    }
    Ok(Args { config_path })
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(()) => {
            eprint!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let cfg = config::load(&args.config_path);
    logging::log_init(&cfg.error_log, Level::Info);

    proton::logf!(Level::Info, "main", "loaded config from {}", args.config_path);

    let supervisor = Supervisor::new(cfg);
    let result = supervisor.run(|| ModuleChain::new(vec![Box::new(EchoModule)]));

    logging::log_close();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}
