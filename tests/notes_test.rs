// Note assembly: chord promotion, tuplet nesting, grace-note groups

use musicxml_msr::msr::{
    Articulation, DynamicsKind, NoteKind, SlurKind, TupletElement, VoiceElement,
};
use musicxml_msr::{convert, ConversionSettings};

fn convert_ok(xml: &str) -> musicxml_msr::Conversion {
    convert(xml, ConversionSettings::default()).expect("conversion should succeed")
}

/// Wrap measure content in a one-part score.
fn one_part_score(measure: &str) -> String {
    format!(
        "<score-partwise version=\"3.1\">\
           <part-list>\
             <score-part id=\"P1\"><part-name>Music</part-name></score-part>\
           </part-list>\
           <part id=\"P1\">\
             <measure number=\"1\">\
               <attributes><divisions>1</divisions></attributes>\
               {measure}\
             </measure>\
           </part>\
         </score-partwise>"
    )
}

fn note(step: char, octave: i32, duration: i32, extra: &str) -> String {
    format!(
        "<note>\
           <pitch><step>{step}</step><octave>{octave}</octave></pitch>\
           <duration>{duration}</duration>\
           {extra}\
         </note>"
    )
}

fn first_voice_elements(conversion: &musicxml_msr::Conversion) -> &[VoiceElement] {
    &conversion.score.parts[0].staves[&1].voices[&1].chunks[0].elements
}

#[test]
fn test_two_notes_with_chord_flag_become_one_chord() {
    let measure = format!(
        "{}{}",
        note('C', 4, 4, "<voice>1</voice><staff>1</staff>"),
        "<note>\
           <chord/>\
           <pitch><step>E</step><octave>4</octave></pitch>\
           <duration>4</duration>\
         </note>"
    );
    let conversion = convert_ok(&one_part_score(&measure));
    let elements = first_voice_elements(&conversion);

    assert_eq!(elements.len(), 1, "the first note must be spliced out");
    let VoiceElement::Chord(chord) = &elements[0] else {
        panic!("expected a chord, got {:?}", elements[0]);
    };
    assert_eq!(chord.notes.len(), 2);
    assert_eq!(chord.divisions, 4);
    assert!(chord
        .notes
        .iter()
        .all(|n| n.kind == NoteKind::ChordMember && n.divisions == 4));
    assert_eq!(chord.notes[0].pitch.unwrap().step, 'C');
    assert_eq!(chord.notes[1].pitch.unwrap().step, 'E');
}

#[test]
fn test_chord_absorbs_first_note_decorations() {
    let measure = format!(
        "{}{}{}",
        note(
            'C',
            4,
            4,
            "<notations><articulations><staccato/></articulations></notations>"
        ),
        "<note>\
           <chord/>\
           <pitch><step>G</step><octave>4</octave></pitch>\
           <duration>4</duration>\
         </note>",
        note('D', 4, 4, ""),
    );
    let conversion = convert_ok(&one_part_score(&measure));
    let elements = first_voice_elements(&conversion);

    assert_eq!(elements.len(), 2, "chord then the following plain note");
    let VoiceElement::Chord(chord) = &elements[0] else {
        panic!("expected a chord first");
    };
    assert_eq!(chord.articulations, vec![Articulation::Staccato]);
    // moved, not copied
    assert!(chord.notes[0].articulations.is_empty());

    let VoiceElement::Note(after) = &elements[1] else {
        panic!("expected a plain note after the chord");
    };
    assert_eq!(after.kind, NoteKind::Standalone);
}

#[test]
fn test_decorations_on_a_later_chord_member_reach_the_chord() {
    let measure = format!(
        "{}{}{}",
        note('C', 4, 4, ""),
        "<note>\
           <chord/>\
           <pitch><step>E</step><octave>4</octave></pitch>\
           <duration>4</duration>\
           <notations>\
             <slur number=\"1\" type=\"start\"/>\
             <dynamics><p/></dynamics>\
           </notations>\
         </note>",
        note('G', 4, 4, ""),
    );
    let conversion = convert_ok(&one_part_score(&measure));
    let elements = first_voice_elements(&conversion);

    assert_eq!(elements.len(), 2, "chord then the following plain note");
    let VoiceElement::Chord(chord) = &elements[0] else {
        panic!("expected a chord first");
    };
    assert_eq!(chord.slurs.len(), 1);
    assert_eq!(chord.slurs[0].kind, SlurKind::Start);
    assert_eq!(chord.dynamics.len(), 1);
    assert_eq!(chord.dynamics[0].kind, DynamicsKind::P);

    // nothing leaks onto the next note
    let VoiceElement::Note(after) = &elements[1] else {
        panic!("expected a plain note after the chord");
    };
    assert!(after.slurs.is_empty());
    assert!(after.dynamics.is_empty());
}

#[test]
fn test_triplet_produces_one_tuplet_with_three_members() {
    let time_modification =
        "<time-modification><actual-notes>3</actual-notes><normal-notes>2</normal-notes>\
         <normal-type>quarter</normal-type></time-modification>";
    let measure = format!(
        "{}{}{}",
        note(
            'C',
            4,
            2,
            &format!("{time_modification}<notations><tuplet type=\"start\" number=\"1\"/></notations>")
        ),
        note('D', 4, 2, time_modification),
        note(
            'E',
            4,
            2,
            &format!("{time_modification}<notations><tuplet type=\"stop\" number=\"1\"/></notations>")
        ),
    );
    let conversion = convert_ok(&one_part_score(&measure));
    let elements = first_voice_elements(&conversion);

    assert_eq!(elements.len(), 1);
    let VoiceElement::Tuplet(tuplet) = &elements[0] else {
        panic!("expected a tuplet, got {:?}", elements[0]);
    };
    assert_eq!(tuplet.actual_notes, 3);
    assert_eq!(tuplet.normal_notes, 2);
    assert_eq!(tuplet.normal_type.as_deref(), Some("quarter"));
    assert_eq!(tuplet.elements.len(), 3);
    for element in &tuplet.elements {
        let TupletElement::Note(member) = element else {
            panic!("expected only notes in the tuplet");
        };
        assert_eq!(member.kind, NoteKind::TupletMember);
        assert_eq!(member.divisions, 2);
        // drawn as two thirds of the sounding duration
        assert_eq!(member.display_divisions, 2 * 2 / 3);
    }
}

#[test]
fn test_nested_tuplets() {
    let ratio =
        "<time-modification><actual-notes>3</actual-notes><normal-notes>2</normal-notes></time-modification>";
    let measure = format!(
        "{}{}{}{}",
        note(
            'C',
            4,
            2,
            &format!("{ratio}<notations><tuplet type=\"start\" number=\"1\"/></notations>")
        ),
        note(
            'D',
            4,
            1,
            &format!("{ratio}<notations><tuplet type=\"start\" number=\"2\"/></notations>")
        ),
        note(
            'E',
            4,
            1,
            &format!("{ratio}<notations><tuplet type=\"stop\" number=\"2\"/></notations>")
        ),
        note(
            'F',
            4,
            2,
            &format!("{ratio}<notations><tuplet type=\"stop\" number=\"1\"/></notations>")
        ),
    );
    let conversion = convert_ok(&one_part_score(&measure));
    let elements = first_voice_elements(&conversion);

    assert_eq!(elements.len(), 1);
    let VoiceElement::Tuplet(outer) = &elements[0] else {
        panic!("expected the outer tuplet");
    };
    assert_eq!(outer.number, 1);
    assert_eq!(outer.elements.len(), 3, "note, inner tuplet, note");
    let TupletElement::Tuplet(inner) = &outer.elements[1] else {
        panic!("expected the inner tuplet in the middle");
    };
    assert_eq!(inner.number, 2);
    assert_eq!(inner.elements.len(), 2);
}

#[test]
fn test_grace_notes_group_before_the_real_note() {
    // 2 divisions per quarter so a grace eighth gets a nonzero duration
    let xml = "<score-partwise version=\"3.1\">\
         <part-list>\
           <score-part id=\"P1\"><part-name>Music</part-name></score-part>\
         </part-list>\
         <part id=\"P1\">\
           <measure number=\"1\">\
             <attributes><divisions>2</divisions></attributes>\
             <note><grace slash=\"yes\"/>\
               <pitch><step>D</step><octave>5</octave></pitch>\
               <type>eighth</type>\
             </note>\
             <note><grace slash=\"yes\"/>\
               <pitch><step>C</step><octave>5</octave></pitch>\
               <type>eighth</type>\
             </note>\
             <note>\
               <pitch><step>B</step><octave>4</octave></pitch>\
               <duration>8</duration>\
             </note>\
           </measure>\
         </part>\
       </score-partwise>";
    let conversion = convert_ok(xml);
    let elements = first_voice_elements(&conversion);

    assert_eq!(elements.len(), 2);
    let VoiceElement::GraceNotes(group) = &elements[0] else {
        panic!("expected the grace group first");
    };
    assert!(group.slashed);
    assert_eq!(group.notes.len(), 2);
    assert!(group.notes.iter().all(|n| n.kind == NoteKind::Grace));
    // an eighth at 8 divisions per whole note
    assert_eq!(group.notes[0].divisions, 1);

    assert!(matches!(elements[1], VoiceElement::Note(_)));
}

#[test]
fn test_rest_is_a_rest_kind_note() {
    let measure = "<note><rest/><duration>4</duration><voice>1</voice></note>";
    let conversion = convert_ok(&one_part_score(measure));
    let elements = first_voice_elements(&conversion);

    assert_eq!(elements.len(), 1);
    let VoiceElement::Note(rest) = &elements[0] else {
        panic!("expected a note element");
    };
    assert_eq!(rest.kind, NoteKind::Rest);
    assert!(rest.pitch.is_none());
}

#[test]
fn test_chord_member_rest_is_rejected() {
    let measure = format!(
        "{}{}",
        note('C', 4, 4, ""),
        "<note><chord/><rest/><duration>4</duration></note>"
    );
    let conversion = convert_ok(&one_part_score(&measure));

    assert!(conversion.diagnostics.has_errors());
    // the first note stays a plain note
    let elements = first_voice_elements(&conversion);
    assert!(matches!(elements[0], VoiceElement::Note(_)));
}

#[test]
fn test_missing_tuplet_stop_is_force_closed_at_part_end() {
    let ratio =
        "<time-modification><actual-notes>3</actual-notes><normal-notes>2</normal-notes></time-modification>";
    let measure = format!(
        "{}{}",
        note(
            'C',
            4,
            2,
            &format!("{ratio}<notations><tuplet type=\"start\" number=\"1\"/></notations>")
        ),
        note('D', 4, 2, ratio),
    );
    let conversion = convert_ok(&one_part_score(&measure));
    let elements = first_voice_elements(&conversion);

    assert_eq!(elements.len(), 1);
    let VoiceElement::Tuplet(tuplet) = &elements[0] else {
        panic!("expected the tuplet to be closed anyway");
    };
    assert_eq!(tuplet.elements.len(), 2);
}
