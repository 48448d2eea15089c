// Part-list translation: part groups, nesting, the implicit group

use musicxml_msr::msr::{PartGroupChild, PartGroupSymbol};
use musicxml_msr::{convert, ConversionSettings};

fn convert_ok(xml: &str) -> musicxml_msr::Conversion {
    convert(xml, ConversionSettings::default()).expect("conversion should succeed")
}

fn score_with_part_list(part_list: &str, parts: &str) -> String {
    format!(
        "<score-partwise version=\"3.1\">\
           <part-list>{part_list}</part-list>\
           {parts}\
         </score-partwise>"
    )
}

#[test]
fn test_single_group_wraps_its_part() {
    let xml = score_with_part_list(
        "<part-group number=\"1\" type=\"start\">\
           <group-symbol>bracket</group-symbol>\
         </part-group>\
         <score-part id=\"P1\"><part-name>Violin</part-name></score-part>\
         <part-group number=\"1\" type=\"stop\"/>",
        "<part id=\"P1\"><measure number=\"1\"/></part>",
    );
    let conversion = convert_ok(&xml);
    let score = &conversion.score;

    assert_eq!(score.part_groups.len(), 1);
    let group = &score.part_groups[0];
    assert_eq!(group.number, 1);
    assert_eq!(group.symbol, PartGroupSymbol::Bracket);
    assert_eq!(group.part_ids(), vec!["P1"]);

    assert_eq!(score.parts.len(), 1);
    assert_eq!(score.parts[0].name, "Violin");
}

#[test]
fn test_ungrouped_part_gets_an_implicit_group() {
    let xml = score_with_part_list(
        "<score-part id=\"P1\"><part-name>Flute</part-name></score-part>",
        "<part id=\"P1\"><measure number=\"1\"/></part>",
    );
    let conversion = convert_ok(&xml);

    assert_eq!(conversion.score.part_groups.len(), 1);
    let group = &conversion.score.part_groups[0];
    assert_eq!(group.name, "Implicit");
    assert_eq!(group.part_ids(), vec!["P1"]);
}

#[test]
fn test_nested_groups_fold_into_their_parent() {
    // strings bracket around a violins square, violas outside the square
    let xml = score_with_part_list(
        "<part-group number=\"1\" type=\"start\">\
           <group-name>Strings</group-name>\
           <group-symbol default-x=\"-30\">bracket</group-symbol>\
         </part-group>\
         <part-group number=\"2\" type=\"start\">\
           <group-symbol default-x=\"-15\">square</group-symbol>\
         </part-group>\
         <score-part id=\"P1\"><part-name>Violin I</part-name></score-part>\
         <score-part id=\"P2\"><part-name>Violin II</part-name></score-part>\
         <part-group number=\"2\" type=\"stop\"/>\
         <score-part id=\"P3\"><part-name>Viola</part-name></score-part>\
         <part-group number=\"1\" type=\"stop\"/>",
        "<part id=\"P1\"><measure number=\"1\"/></part>\
         <part id=\"P2\"><measure number=\"1\"/></part>\
         <part id=\"P3\"><measure number=\"1\"/></part>",
    );
    let conversion = convert_ok(&xml);
    let score = &conversion.score;

    assert_eq!(score.part_groups.len(), 1);
    let outer = &score.part_groups[0];
    assert_eq!(outer.name, "Strings");
    // every part reachable from the top-level group
    assert_eq!(outer.part_ids(), vec!["P1", "P2", "P3"]);

    // the violins sit in the nested square group
    let inner = outer
        .children
        .iter()
        .find_map(|child| match child {
            PartGroupChild::Group(group) => Some(group),
            PartGroupChild::Part(_) => None,
        })
        .expect("nested group should exist");
    assert_eq!(inner.number, 2);
    assert_eq!(inner.symbol, PartGroupSymbol::Square);
    assert_eq!(inner.part_ids(), vec!["P1", "P2"]);
}

#[test]
fn test_unclosed_group_is_closed_at_part_list_end_with_warning() {
    let xml = score_with_part_list(
        "<part-group number=\"1\" type=\"start\">\
           <group-symbol>brace</group-symbol>\
         </part-group>\
         <score-part id=\"P1\"><part-name>Piano</part-name></score-part>",
        "<part id=\"P1\"><measure number=\"1\"/></part>",
    );
    let conversion = convert_ok(&xml);

    assert_eq!(conversion.score.part_groups.len(), 1);
    assert_eq!(conversion.score.part_groups[0].part_ids(), vec!["P1"]);
    assert!(conversion
        .diagnostics
        .records
        .iter()
        .any(|r| r.message.contains("never stopped")));
}

#[test]
fn test_stop_for_unknown_group_is_reported_not_fatal() {
    let xml = score_with_part_list(
        "<score-part id=\"P1\"><part-name>Oboe</part-name></score-part>\
         <part-group number=\"7\" type=\"stop\"/>",
        "<part id=\"P1\"><measure number=\"1\"/></part>",
    );
    let conversion = convert_ok(&xml);

    assert!(conversion.diagnostics.has_errors());
    assert_eq!(conversion.score.parts.len(), 1);
}

#[test]
fn test_duplicate_part_id_is_reported() {
    let xml = score_with_part_list(
        "<score-part id=\"P1\"><part-name>A</part-name></score-part>\
         <score-part id=\"P1\"><part-name>B</part-name></score-part>",
        "<part id=\"P1\"><measure number=\"1\"/></part>",
    );
    let conversion = convert_ok(&xml);

    assert_eq!(conversion.score.parts.len(), 1);
    assert!(conversion
        .diagnostics
        .records
        .iter()
        .any(|r| r.message.contains("duplicate part ID")));
}
