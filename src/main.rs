// rsas - an interpreter for a subset of the SAS language.
// Copyright (C) 2026 Free Software Foundation, Inc.
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <http://www.gnu.org/licenses/>.

use std::{
    fs::read_to_string,
    io::{self, Read},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;

use rsas::{
    output::{ConsoleSink, FileSink, Sink},
    Engine,
};

/// rsas, an interpreter for a subset of the SAS language.
///
/// With --sas, --log, and --lst the interpreter runs in batch mode, reading
/// the program from a file and writing the log and listing to files.
/// Without them the program is read from standard input, the log goes to
/// stderr, and the listing goes to stdout.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// SAS program to run; omitted, the program is read from stdin.
    #[arg(long = "sas", value_name = "PATH")]
    sas: Option<PathBuf>,

    /// Write the log to this file (overwritten) instead of stderr.
    #[arg(long = "log", value_name = "PATH")]
    log: Option<PathBuf>,

    /// Write the listing to this file (overwritten) instead of stdout.
    #[arg(long = "lst", value_name = "PATH")]
    lst: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let source = match &cli.sas {
        Some(path) => read_to_string(path)
            .with_context(|| format!("{}: read failed", path.display()))?,
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("reading program from stdin failed")?;
            source
        }
    };

    let log: Box<dyn Sink> = match &cli.log {
        Some(path) => Box::new(
            FileSink::create(path)
                .with_context(|| format!("{}: create failed", path.display()))?,
        ),
        None => Box::new(ConsoleSink::stderr()),
    };
    let listing: Box<dyn Sink> = match &cli.lst {
        Some(path) => Box::new(
            FileSink::create(path)
                .with_context(|| format!("{}: create failed", path.display()))?,
        ),
        None => Box::new(ConsoleSink::stdout()),
    };

    let mut engine = Engine::new(log, listing);
    let status = engine.execute_program(&source);
    Ok(ExitCode::from(status.code() as u8))
}
