// Copyright 2019-2024 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! The `carbites` command-line surface: `split` chunks one CAR into many,
//! `join` recombines them.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::split::Strategy;

#[derive(Debug, Parser)]
#[command(name = "carbites", version, about = "Split and join CARv1 files")]
pub struct Cli {
    /// Increase log verbosity; repeat for more (-v, -vv, -vvv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    Simple,
    Treewalk,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Simple => Strategy::Simple,
            StrategyArg::Treewalk => Strategy::Treewalk,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Split a CAR file into multiple smaller CAR files.
    Split {
        /// Input CAR file. Reads from standard input if omitted (simple
        /// strategy only; treewalk requires a seekable file).
        input: Option<PathBuf>,

        #[arg(short = 't', long, value_enum, default_value = "simple")]
        strategy: StrategyArg,

        /// Target chunk size in bytes.
        #[arg(short, long, default_value_t = 1024 * 1024)]
        size: usize,
    },
    /// Join multiple CAR files back into one.
    Join {
        /// Input CAR files, in order. Requires at least one.
        #[arg(num_args = 1..)]
        inputs: Vec<PathBuf>,

        #[arg(short = 't', long, value_enum, default_value = "simple")]
        strategy: StrategyArg,

        #[arg(short, long)]
        output: PathBuf,
    },
}

impl Command {
    pub fn run(self) -> anyhow::Result<()> {
        match self {
            Command::Split {
                input,
                strategy,
                size,
            } => run_split(input, strategy.into(), size),
            Command::Join {
                inputs,
                strategy,
                output,
            } => run_join(inputs, strategy.into(), output),
        }
    }
}

fn run_split(input: Option<PathBuf>, strategy: Strategy, target_size: usize) -> anyhow::Result<()> {
    let (dir, stem) = match &input {
        Some(path) => (
            path.parent().map(PathBuf::from).unwrap_or_default(),
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "car".to_string()),
        ),
        None => (PathBuf::new(), "stdin".to_string()),
    };

    let mut index = 0usize;
    let mut write_chunk = |chunk: &[u8]| -> anyhow::Result<()> {
        let path = dir.join(format!("{stem}-{index}.car"));
        let mut out = BufWriter::new(File::create(&path)?);
        out.write_all(chunk)?;
        tracing::info!(path = %path.display(), bytes = chunk.len(), "wrote chunk");
        index += 1;
        Ok(())
    };

    match strategy {
        Strategy::Simple => {
            let reader: Box<dyn std::io::Read> = match &input {
                Some(path) => Box::new(File::open(path)?),
                None => Box::new(std::io::stdin()),
            };
            let mut splitter = crate::split::simple::SimpleSplitter::new(reader, target_size)?;
            while let Some(chunk) = splitter.next()? {
                write_chunk(&chunk)?;
            }
        }
        Strategy::Treewalk => {
            let path = input
                .ok_or_else(|| crate::error::Error::InvalidArgument(
                    "treewalk splitting requires a seekable input file, not standard input".into(),
                ))?;
            let mut splitter =
                crate::split::treewalk::TreewalkSplitter::from_path(path, target_size)?;
            while let Some(chunk) = splitter.next()? {
                write_chunk(&chunk)?;
            }
        }
    }

    Ok(())
}

fn run_join(inputs: Vec<PathBuf>, strategy: Strategy, output: PathBuf) -> anyhow::Result<()> {
    if inputs.is_empty() {
        return Err(crate::error::Error::InvalidArgument(
            "join requires at least one input CAR file".into(),
        )
        .into());
    }

    let files = inputs
        .iter()
        .map(File::open)
        .collect::<Result<Vec<_>, _>>()?;

    let joined = match strategy {
        Strategy::Simple => crate::split::simple::join_simple(files)?,
        Strategy::Treewalk => crate::join::join_treewalk(files)?,
    };

    let mut out = BufWriter::new(File::create(&output)?);
    out.write_all(&joined)?;
    tracing::info!(path = %output.display(), bytes = joined.len(), "wrote joined CAR");
    Ok(())
}
