// Copyright 2023, 2024 Viktor Reusch
//
// This file is part of gpx_sort.
//
// gpx_sort is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by the
// Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// gpx_sort is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or
// FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License
// for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with gpx_sort. If not, see <https://www.gnu.org/licenses/>.

//! This is a very simple command-line interface for the GPX track sorter.

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use gpx_sort::sort_file;
use tracing_subscriber::EnvFilter;

/// Sort the tracks of a GPX file by name.
///
/// The result is written to `sorted_<INPUT>` in the current directory.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// GPX file to sort.
    #[arg(default_value = "NPL.gpx")]
    input: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match sort_file(&cli.input) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Sorting {} failed with: {err}", cli.input.display());
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_defaults_to_npl() {
        let cli = Cli::parse_from(["gpx_sort"]);
        assert_eq!(cli.input, PathBuf::from("NPL.gpx"));
    }

    #[test]
    fn input_from_argument() {
        let cli = Cli::parse_from(["gpx_sort", "tours.gpx"]);
        assert_eq!(cli.input, PathBuf::from("tours.gpx"));
    }
}
