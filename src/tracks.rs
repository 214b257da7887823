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

//! Reordering of the tracks of a GPX document.

use std::mem;

use quick_xml::events::Event;
use tracing::debug;

use crate::document::{Document, Element, Node};
use crate::Error;

/// Local name of GPX tracks.
const TRACK: &str = "trk";
/// Local name of the element holding the sort key.
const NAME: &str = "name";

/// Whether `element` is a GPX track.
pub fn is_track(element: &Element) -> bool {
    element.is_gpx(TRACK)
}

/// Text of the first `name` element within `track`.
///
/// Returns `None` if the track has no name.
pub fn track_name(track: &Element) -> Result<Option<String>, Error> {
    // An empty name element yields the empty key instead of failing.
    track.find_gpx(NAME).map(Element::text).transpose()
}

/// Sort the tracks of `document` by name and move them behind all other
/// children of the root.
///
/// The sort is stable, so tracks with equal names keep their order. Each
/// track takes the text directly following it along. If any track has no
/// name, [`Error::MissingName`] is returned and `document` is unchanged.
///
/// Returns the number of tracks.
pub fn sort_tracks(document: &mut Document) -> Result<usize, Error> {
    let root = &mut document.root;
    let keys = root
        .child_elements()
        .filter(|element| is_track(element))
        .enumerate()
        .map(|(index, track)| track_name(track)?.ok_or(Error::MissingName { index }))
        .collect::<Result<Vec<_>, _>>()?;

    let mut kept = vec![];
    let mut groups: Vec<Vec<Node>> = vec![];
    let mut in_tail = false;
    for node in mem::take(&mut root.children) {
        if matches!(&node, Node::Element(element) if is_track(element)) {
            groups.push(vec![node]);
            in_tail = true;
            continue;
        }

        let is_text = matches!(&node, Node::Leaf(Event::Text(_) | Event::CData(_)));
        match groups.last_mut() {
            Some(group) if in_tail && is_text => group.push(node),
            _ => {
                in_tail = false;
                kept.push(node);
            }
        }
    }

    let mut tracks: Vec<_> = keys.into_iter().zip(groups).collect();
    tracks.sort_by(|(a, _), (b, _)| a.cmp(b));
    let count = tracks.len();
    debug!(count, "sorted tracks");

    kept.extend(tracks.into_iter().flat_map(|(_, group)| group));
    root.children = kept;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Document {
        Document::parse(&format!(
            r#"<gpx xmlns="http://www.topografix.com/GPX/1/1" version="1.1">{body}</gpx>"#
        ))
        .unwrap()
    }

    fn names(document: &Document) -> Vec<String> {
        document
            .root
            .child_elements()
            .map(|element| match track_name(element).unwrap() {
                Some(name) if is_track(element) => name,
                _ => element.local_name().to_string(),
            })
            .collect()
    }

    fn body(document: &Document) -> String {
        let mut sink = vec![];
        document.write(&mut sink).unwrap();
        let output = String::from_utf8(sink).unwrap();
        let start = output.find("version=\"1.1\">").unwrap() + "version=\"1.1\">".len();
        let end = output.rfind("</gpx>").unwrap();
        output[start..end].to_string()
    }

    #[test]
    fn sorts_by_name() {
        let mut document = parse(
            "<trk><name>Beta</name></trk><trk><name>Alpha</name><desc>1</desc></trk>\
             <trk><name>Alpha</name><desc>2</desc></trk>",
        );

        assert_eq!(sort_tracks(&mut document).unwrap(), 3);
        assert_eq!(
            body(&document),
            "<trk><name>Alpha</name><desc>1</desc></trk><trk><name>Alpha</name><desc>2</desc></trk>\
             <trk><name>Beta</name></trk>"
        );
    }

    #[test]
    fn compares_case_sensitive() {
        let mut document = parse(
            "<trk><name>b</name></trk><trk><name>B</name></trk>\
             <trk><name>a</name></trk><trk><name>Ä</name></trk>",
        );

        sort_tracks(&mut document).unwrap();
        assert_eq!(names(&document), ["B", "a", "b", "Ä"]);
    }

    #[test]
    fn moves_tracks_behind_other_elements() {
        let mut document = parse(
            "<metadata/><trk><name>Z</name></trk><wpt lat=\"0\" lon=\"0\"/>\
             <trk><name>Y</name></trk><rte/>",
        );

        sort_tracks(&mut document).unwrap();
        assert_eq!(names(&document), ["metadata", "wpt", "rte", "Y", "Z"]);
    }

    #[test]
    fn tracks_take_their_tail_along() {
        let mut document = parse(
            "\n  <metadata/>\n  <trk><name>B</name></trk>\n  <trk><name>A</name></trk>\n",
        );

        sort_tracks(&mut document).unwrap();
        assert_eq!(
            body(&document),
            "\n  <metadata/>\n  <trk><name>A</name></trk>\n<trk><name>B</name></trk>\n  "
        );
    }

    #[test]
    fn comment_ends_tail() {
        let mut document = parse("<trk><name>B</name></trk> <!--c--> <trk><name>A</name></trk>");

        sort_tracks(&mut document).unwrap();
        assert_eq!(
            body(&document),
            "<!--c--> <trk><name>A</name></trk><trk><name>B</name></trk> "
        );
    }

    #[test]
    fn keeps_track_contents() {
        let track = "<trk><name>A &amp; B</name><trkseg><trkpt lat=\"1\" lon=\"2\">\
                     <ele>3</ele></trkpt></trkseg></trk>";
        let mut document = parse(&format!("<trk><name>C</name></trk>{track}"));

        sort_tracks(&mut document).unwrap();
        assert_eq!(body(&document), format!("{track}<trk><name>C</name></trk>"));
    }

    #[test]
    fn empty_name_sorts_first() {
        let mut document = parse("<trk><name>A</name></trk><trk><name/></trk>");

        sort_tracks(&mut document).unwrap();
        assert_eq!(names(&document), ["", "A"]);
    }

    #[test]
    fn missing_name_leaves_document_unchanged() {
        let mut document = parse("<trk><name>B</name></trk><trk><desc>none</desc></trk>");
        let before = body(&document);

        match sort_tracks(&mut document) {
            Err(Error::MissingName { index }) => assert_eq!(index, 1),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(body(&document), before);
    }

    #[test]
    fn ignores_foreign_tracks() {
        let mut document = Document::parse(
            r#"<gpx xmlns="http://www.topografix.com/GPX/1/1" xmlns:x="urn:x"><x:trk/><trk><name>A</name></trk></gpx>"#,
        )
        .unwrap();

        assert_eq!(sort_tracks(&mut document).unwrap(), 1);
        let children: Vec<_> = document.root.child_elements().collect();
        assert_eq!(children[0].namespace(), Some("urn:x"));
    }

    #[test]
    fn sorting_twice_changes_nothing() {
        let mut document = parse(
            "\n<trk><name>C</name></trk>\n<metadata/>\n<trk><name>A</name></trk>\n\
             <trk><name>B</name></trk>\n",
        );

        sort_tracks(&mut document).unwrap();
        let once = body(&document);
        sort_tracks(&mut document).unwrap();
        assert_eq!(body(&document), once);
    }
}
