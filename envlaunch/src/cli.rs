use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use envlaunch_core::config::env_keys::launcher as launcher_keys;
use envlaunch_core::config::{ActivationMode, PartialConfig, PausePolicy};

/// envlaunch - activate a named conda environment and launch an application in it
#[derive(Parser, Debug)]
#[command(name = "envlaunch")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Arguments for the default `run` command
    #[command(flatten)]
    pub launch: LaunchArgs,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Activate the environment and run the application (default)
    Run(LaunchArgs),

    /// Resolve root, environment and interpreter without launching anything
    Check {
        #[command(flatten)]
        launch: LaunchArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List environments under the installation root
    Envs {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the list as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Where environments come from.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Environment name (or prefix path) to activate
    #[arg(short = 'n', long = "env", value_name = "NAME")]
    pub env: Option<String>,

    /// Installation root (default: ~/anaconda3, ~/miniconda3 or ~/miniforge3)
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Extra directory to search for named environments (repeatable)
    #[arg(long = "envs-dir", value_name = "DIR")]
    pub envs_dirs: Vec<PathBuf>,

    /// YAML config file (default: ./envlaunch.yaml when present)
    #[arg(short, long, value_name = "FILE", env = launcher_keys::ENVLAUNCH_CONFIG)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct LaunchArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Application entry point, e.g. run_gui.py
    #[arg(value_name = "SCRIPT")]
    pub script: Option<PathBuf>,

    /// Arguments passed through to the application
    #[arg(last = true, value_name = "ARGS")]
    pub args: Vec<String>,

    /// Interpreter looked up on the activated PATH; "none" runs SCRIPT directly
    #[arg(long, value_name = "NAME")]
    pub interpreter: Option<String>,

    /// Activation mode: auto, script or static
    #[arg(long, value_name = "MODE")]
    pub activation: Option<ActivationMode>,

    /// Keep the console open afterwards: always, on-error or never
    #[arg(long, value_name = "WHEN")]
    pub pause: Option<PausePolicy>,

    /// Same as --pause never
    #[arg(long, conflicts_with = "pause")]
    pub no_pause: bool,

    /// Working directory for the application
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,
}

impl SourceArgs {
    pub fn to_partial(&self) -> PartialConfig {
        PartialConfig {
            env: self.env.clone(),
            root: self.root.clone(),
            envs_dirs: self.envs_dirs.clone(),
            ..Default::default()
        }
    }
}

impl LaunchArgs {
    /// Pause policy given on the command line, if any.
    pub fn pause_override(&self) -> Option<PausePolicy> {
        if self.no_pause {
            Some(PausePolicy::Never)
        } else {
            self.pause
        }
    }

    /// Command-line configuration layer.
    pub fn to_partial(&self) -> PartialConfig {
        PartialConfig {
            script: self.script.clone(),
            interpreter: self.interpreter.clone(),
            activation: self.activation,
            pause: self.pause_override(),
            working_dir: self.cwd.clone(),
            args: self.args.clone(),
            ..self.source.to_partial()
        }
    }
}
