use anyhow::{Context, Result};
use clap::Parser;
use photopost::model::RunOutcome;
use photopost::{CliGenerator, Config, Pipeline};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[clap(about = "Turn a folder of photos into a LinkedIn post")]
struct Opts {
    /// Directory scanned for .png/.jpg/.jpeg files.
    #[clap(short, long, default_value = "photos")]
    input: PathBuf,
    #[clap(short, long, default_value = "outputs")]
    output_dir: PathBuf,
    /// Generative AI command line tool.
    #[clap(long, default_value = "gemini")]
    tool: String,
    /// Extra argument placed before the prompt; repeatable.
    #[clap(long = "tool-arg", allow_hyphen_values = true)]
    tool_args: Vec<String>,
    #[clap(short, long, default_value = "gemini-1.5-pro")]
    model: String,
    /// Do not pass --model to the tool.
    #[clap(long, conflicts_with = "model")]
    no_model: bool,
    /// Seconds to wait for each tool call, 0 waits forever.
    #[clap(long, default_value_t = 300)]
    timeout: u64,
}

impl Opts {
    fn config(&self) -> Config {
        Config {
            input_dir: self.input.clone(),
            output_dir: self.output_dir.clone(),
            model: (!self.no_model).then(|| self.model.clone()),
        }
    }

    fn generator(&self) -> CliGenerator {
        let timeout = (self.timeout > 0).then(|| Duration::from_secs(self.timeout));
        CliGenerator::new(&self.tool)
            .with_args(self.tool_args.clone())
            .with_timeout(timeout)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opts = Opts::parse();
    let mut pipeline = Pipeline::new(opts.config(), opts.generator());
    let outcome = pipeline
        .run(&mut std::io::stdout().lock())
        .context("photopost setup failed")?;
    let report = pipeline.into_report();
    match outcome {
        RunOutcome::NoImages => println!("No images found in '{}'.", opts.input.display()),
        RunOutcome::NoAnalyses => println!("No analyses were generated from the photos."),
        RunOutcome::SynthesisFailed => println!("No post was generated."),
        RunOutcome::Published { .. } => {}
    }
    if !report.failures.is_empty() {
        log::warn!(
            "{} of {} images analyzed, {} failures",
            report.analyzed,
            report.images,
            report.failures.len()
        );
    }
    Ok(())
}
