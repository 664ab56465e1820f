use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Emit per-instruction trace logs
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the structure of a class file
    Inspect {
        /// The class file to read
        path: PathBuf,
    },
    /// Execute a method inside the sandbox
    Run {
        /// The class file to read
        path: PathBuf,

        /// The method to execute
        #[arg(long, default_value = "main")]
        method: String,

        /// The descriptor of the method to execute
        #[arg(long, default_value = "([Ljava/lang/String;)V")]
        descriptor: String,
    },
}
