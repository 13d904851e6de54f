mod utils;

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use qadapter::core::{self, ConfigMap, QueueAdapter, settings};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Write a new adapter configuration file
  Init {
    /// PBS, SGE or SLURM
    queue_type: String,
    output: PathBuf,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    template: Option<PathBuf>,
    /// Queue directive as key=value, repeatable
    #[arg(short = 'o', long = "option", value_parser = utils::parse_option)]
    options: Vec<(String, serde_json::Value)>,
  },
  /// Print an adapter configuration
  Show {
    #[arg(long)]
    adapter: Option<PathBuf>,
  },
  /// Submit a prepared job script and print its job id
  Submit {
    script: PathBuf,
    #[arg(long)]
    adapter: Option<PathBuf>,
  },
  /// Print the number of jobs a user has in the queue
  Njobs {
    #[arg(long)]
    user: Option<String>,
    #[arg(long)]
    adapter: Option<PathBuf>,
  },
  /// Remember an adapter configuration as the default
  SetDefault {
    file: PathBuf,
    /// Store in ./qadapter.conf instead of the global settings
    #[arg(long)]
    local: bool,
  },
}

pub fn main() -> Result<()> {
  let cli = Cli::parse();
  core::init_logging();

  match cli.command {
    Commands::Init {
      queue_type,
      output,
      name,
      template,
      options,
    } => {
      let options: ConfigMap = options.into_iter().collect();
      let adapter = QueueAdapter::create(&queue_type, name.as_deref(), template.as_deref(), options)
        .context("Failed to create queue adapter")?;
      core::save_adapter(&adapter, &output).context("Failed to write adapter configuration")?;
      println!("✅ {} adapter written to {:?}", adapter.queue_type(), output);
    }
    Commands::Show { adapter } => {
      let adapter = core::resolve_adapter(adapter.as_deref()).context("Failed to load adapter")?;
      let config = serde_json::Value::Object(adapter.to_config());
      println!("{}", serde_json::to_string_pretty(&config)?);
      println!("# template file: {}", adapter.template_file().display());
    }
    Commands::Submit { script, adapter } => {
      let adapter = core::resolve_adapter(adapter.as_deref()).context("Failed to load adapter")?;
      match adapter.submit_to_queue(&script)? {
        Some(job_id) => println!("{}", job_id),
        None => bail!("Job submission with {} failed", adapter.submit_program()),
      }
    }
    Commands::Njobs { user, adapter } => {
      let adapter = core::resolve_adapter(adapter.as_deref()).context("Failed to load adapter")?;
      match adapter.get_njobs_in_queue(user.as_deref()) {
        Some(njobs) => println!("{}", njobs),
        None => bail!("Could not determine the number of jobs in the queue"),
      }
    }
    Commands::SetDefault { file, local } => {
      // Fail early on a file that does not describe an adapter
      core::load_adapter(&file).context("Failed to load adapter")?;
      let file = std::path::absolute(&file)?;
      if local {
        let dir = env::current_dir().context("Failed to get current directory")?;
        let mut current = settings::get_settings_local(&dir).unwrap_or_default();
        current.default_adapter = Some(file.clone());
        settings::set_settings_local(&dir, &current)?;
      } else {
        let mut current = settings::get_settings_global()?;
        current.default_adapter = Some(file.clone());
        settings::set_settings_global(&current)?;
      }
      println!("✅ Default adapter set to {:?}", file);
    }
  }
  Ok(())
}
