/*
MIT License
Copyright (c) 2021 Germán Molina
Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/
use clap::{Parser, ValueEnum};
use hothouse::SimulationOptions;
use log::LevelFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Lights a scene with the sun and the sky, and reports the
/// flux density on each triangle.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Inputs {
    /// The simulation case, in JSON format
    #[arg(short, long)]
    input: String,

    /// Where to write the results. They are printed if not given.
    #[arg(short, long)]
    output: Option<String>,

    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

fn run(args: &Inputs) -> Result<(), String> {
    let options = SimulationOptions::from_file(&args.input).map_err(|e| e.to_string())?;
    let results = options.run().map_err(|e| e.to_string())?;
    log::info!(
        "the sun is at an altitude of {:.2} degrees and an azimuth of {:.2} degrees",
        results.solar_altitude,
        results.solar_azimuth
    );

    let json = serde_json::to_string_pretty(&results).map_err(|e| e.to_string())?;
    match &args.output {
        Some(path) => std::fs::write(path, json)
            .map_err(|e| format!("could not write results to '{}': {}", path, e)),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}

fn main() {
    let args = Inputs::parse();
    env_logger::Builder::from_default_env()
        .filter_level(args.log_level.into())
        .init();

    if let Err(e) = run(&args) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
