use combustion_sweep::chemistry::synthetic::SyntheticChemistry;
use combustion_sweep::config::{load_config, SweepConfig};
use combustion_sweep::io::write_json_file;
use combustion_sweep::sweep::{LogProgress, SweepDriver};
use combustion_sweep::SweepReport;
use std::env;
use std::path::Path;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config = match env::args().nth(1) {
        Some(path) if path == "-h" || path == "--help" => return Err(usage()),
        Some(path) => load_config(Path::new(&path))?,
        None => SweepConfig::default(),
    };
    let resolved = config.resolve()?;
    let request = resolved.request;

    let engine = SyntheticChemistry::default();
    let driver = SweepDriver::new(resolved.params);
    let result = driver
        .run_centered(&engine, &request, LogProgress)
        .map_err(|e| e.to_string())?;

    let report = SweepReport::from_result(&result);
    report.print_text_summary();

    if let Some(path) = &config.output.report_json {
        write_json_file(path, &report)?;
        println!("\nSaved sweep report to {}", path.display());
    }
    Ok(())
}

fn usage() -> String {
    "Usage: sweep_demo [config.json]".to_string()
}
