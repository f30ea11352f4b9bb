use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "class-meta")]
#[command(about = "Describe Java classes: fields, accessors, container shapes and annotations")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Source root (directory, .java file or source archive); repeatable.
    #[arg(long, value_name = "PATH", global = true)]
    pub source: Vec<PathBuf>,

    #[arg(long, value_name = "FILE", global = true)]
    pub db: Option<PathBuf>,

    #[arg(long, value_name = "N", global = true)]
    pub cache_size: Option<usize>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    Describe {
        type_name: String,

        /// Annotation type whose arguments are recorded; repeatable.
        #[arg(long, value_name = "TYPE")]
        marker: Vec<String>,

        #[arg(long)]
        refresh: bool,
    },
    Warmup {
        #[arg(value_name = "TYPE")]
        types: Vec<String>,

        #[arg(long)]
        all: bool,

        #[arg(long, value_name = "TYPE")]
        marker: Vec<String>,
    },
    Stats,
    Clear,
}
