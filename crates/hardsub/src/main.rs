use std::process::ExitCode;

use hardsub::cli::parse_cli;
use hardsub::settings::resolve_settings;
use hardsub::{logging, run};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let (cli, sources) = parse_cli();
    logging::init(cli.verbose);

    let settings = match resolve_settings(&cli, &sources) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    match run(&settings).await {
        Ok(summary) => {
            if let Some(dir) = &summary.kept_dir {
                println!("Frames kept in: {}", dir.display());
            }
            println!("\nSubtitles saved to: {}", summary.output.display());
            println!("Total lines: {}", summary.lines);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
