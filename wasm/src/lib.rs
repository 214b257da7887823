// Copyright 2022, 2024 Viktor Reusch
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

//! This is a WASM wrapper for `gpx_sort`.

use wasm_bindgen::{prelude::wasm_bindgen, JsError};

/// Sort the tracks of the GPX file `source` and return the sorted file.
///
/// Errors are turned into JS exceptions carrying the message of
/// [`gpx_sort::Error`].
#[wasm_bindgen]
pub fn sort(source: &[u8]) -> Result<Box<[u8]>, JsError> {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    Ok(sort_bytes(source)?)
}

/// Buffer-to-buffer variant of [`gpx_sort::sort`].
fn sort_bytes(source: &[u8]) -> Result<Box<[u8]>, gpx_sort::Error> {
    let mut sink = Vec::with_capacity(source.len());
    gpx_sort::sort(source, &mut sink)?;
    Ok(sink.into_boxed_slice())
}
