// Copyright 2024 Viktor Reusch
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

//! Library for sorting the tracks of a [GPX](https://www.topografix.com/gpx.asp)
//! file by their name.
//!
//! Apart from the order of the tracks and GPX prefixes, which are replaced by
//! the default namespace, everything is written back as it was read.
//! See [`sort`] for streams and [`sort_file`] for files.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

pub mod document;
pub mod tracks;

use document::Document;

/// Prefix of the output file name.
const OUTPUT_PREFIX: &str = "sorted_";

/// Error returned from [`sort`] and [`sort_file`].
#[derive(Error, Debug)]
pub enum Error {
    /// Reading or writing failed.
    #[error("I/O failed: {0}")]
    Io(#[from] io::Error),
    /// The input is not valid UTF-8.
    #[error("input is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    /// The XML parser rejected the input.
    #[error("parsing XML failed: {0}")]
    Xml(#[from] quick_xml::Error),
    /// The input is not a well-formed XML document.
    #[error("malformed XML: {0}")]
    Malformed(String),
    /// A track has no name to sort by.
    #[error("track {index} has no name")]
    MissingName {
        /// Position of the track among all tracks.
        index: usize,
    },
    /// The input path does not end in a file name.
    #[error("input path has no file name")]
    NoFileName,
}

/// Read a GPX file and write it with sorted tracks.
///
/// A complete GPX file is read from `source`. Its tracks are sorted with
/// [`tracks::sort_tracks`] and the document is written to `sink`. Nothing is
/// written unless reading and sorting succeeded.
///
/// # Example
/// ```
/// # use gpx_sort::sort;
/// #
/// let source = r#"<?xml version="1.0" encoding="UTF-8"?>
/// <gpx xmlns="http://www.topografix.com/GPX/1/1" version="1.1">
///     <trk><name>Beta</name></trk>
///     <trk><name>Alpha</name></trk>
/// </gpx>"#;
/// let mut sink = vec![];
///
/// sort(source.as_bytes(), &mut sink).expect("sorting failed");
///
/// let gpx = String::from_utf8(sink).expect("GPX data is not valid UTF-8");
/// assert!(gpx.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
/// assert!(gpx.find("Alpha").unwrap() < gpx.find("Beta").unwrap());
/// ```
pub fn sort(mut source: impl Read, sink: impl io::Write) -> Result<(), Error> {
    let mut bytes = vec![];
    source.read_to_end(&mut bytes)?;
    let text = std::str::from_utf8(&bytes)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut document = Document::parse(text)?;
    let count = tracks::sort_tracks(&mut document)?;
    debug!(bytes = bytes.len(), tracks = count, "sorted document");

    document.write(sink)
}

/// Path of the sorted copy of `input`.
///
/// This is the file name of `input` prefixed with `sorted_`, relative to the
/// current working directory.
///
/// # Example
/// ```
/// # use std::path::Path;
/// # use gpx_sort::sorted_file_name;
/// #
/// let output = sorted_file_name("tours/NPL.gpx").unwrap();
/// assert_eq!(output, Path::new("sorted_NPL.gpx"));
/// ```
pub fn sorted_file_name(input: impl AsRef<Path>) -> Result<PathBuf, Error> {
    let name = input.as_ref().file_name().ok_or(Error::NoFileName)?;
    let mut output = OsString::from(OUTPUT_PREFIX);
    output.push(name);
    Ok(PathBuf::from(output))
}

/// Sort the tracks of the GPX file at `input`.
///
/// The result is written to [`sorted_file_name`], replacing an existing file.
/// The output file is only created after the whole document was sorted, so
/// a failing run leaves no output behind.
///
/// Returns the path of the written file.
pub fn sort_file(input: impl AsRef<Path>) -> Result<PathBuf, Error> {
    let input = input.as_ref();
    let output = sorted_file_name(input)?;

    let mut sorted = vec![];
    sort(File::open(input)?, &mut sorted)?;
    fs::write(&output, sorted)?;

    info!("wrote {}", output.display());
    Ok(output)
}
