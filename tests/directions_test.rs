// Directions: pending decorations, tempo marks, octave shifts

use num_rational::Rational32;
use musicxml_msr::msr::{
    DynamicsKind, OctaveShiftKind, Placement, VoiceElement, WedgeKind,
};
use musicxml_msr::{convert, ConversionSettings};

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

fn note(step: char) -> String {
    format!(
        "<note>\
           <pitch><step>{step}</step><octave>4</octave></pitch>\
           <duration>4</duration>\
         </note>"
    )
}

fn first_voice_elements(conversion: &musicxml_msr::Conversion) -> &[VoiceElement] {
    &conversion.score.parts[0].staves[&1].voices[&1].chunks[0].elements
}

#[test]
fn test_dynamics_and_wedge_attach_to_the_next_note() {
    let measure = format!(
        "<direction placement=\"below\">\
           <direction-type><dynamics><ff/></dynamics></direction-type>\
           <direction-type><wedge type=\"crescendo\"/></direction-type>\
         </direction>\
         {}{}",
        note('C'),
        note('D')
    );
    let conversion =
        convert(&one_part_score(&measure), ConversionSettings::default()).unwrap();
    let elements = first_voice_elements(&conversion);

    assert_eq!(elements.len(), 2);
    let VoiceElement::Note(first) = &elements[0] else {
        panic!("expected a note");
    };
    assert_eq!(first.dynamics.len(), 1);
    assert_eq!(first.dynamics[0].kind, DynamicsKind::FF);
    assert_eq!(first.dynamics[0].placement, Some(Placement::Below));
    assert_eq!(first.wedges.len(), 1);
    assert_eq!(first.wedges[0].kind, WedgeKind::Crescendo);

    // drained: the second note gets nothing
    let VoiceElement::Note(second) = &elements[1] else {
        panic!("expected a note");
    };
    assert!(second.dynamics.is_empty());
    assert!(second.wedges.is_empty());
}

#[test]
fn test_rest_takes_decorations_with_a_warning_by_default() {
    let measure = format!(
        "<direction><direction-type><dynamics><p/></dynamics></direction-type></direction>\
         <note><rest/><duration>4</duration></note>\
         {}",
        note('C')
    );
    let conversion =
        convert(&one_part_score(&measure), ConversionSettings::default()).unwrap();
    let elements = first_voice_elements(&conversion);

    let VoiceElement::Note(rest) = &elements[0] else {
        panic!("expected the rest");
    };
    assert_eq!(rest.dynamics.len(), 1);
    assert!(conversion
        .diagnostics
        .records
        .iter()
        .any(|r| r.message.contains("attached to a rest")));
}

#[test]
fn test_delay_option_holds_decorations_past_rests() {
    let measure = format!(
        "<direction><direction-type><dynamics><p/></dynamics></direction-type></direction>\
         <note><rest/><duration>4</duration></note>\
         {}",
        note('C')
    );
    let settings = ConversionSettings {
        delay_rest_decorations: true,
        ..ConversionSettings::default()
    };
    let conversion = convert(&one_part_score(&measure), settings).unwrap();
    let elements = first_voice_elements(&conversion);

    let VoiceElement::Note(rest) = &elements[0] else {
        panic!("expected the rest");
    };
    assert!(rest.dynamics.is_empty());

    let VoiceElement::Note(pitched) = &elements[1] else {
        panic!("expected the pitched note");
    };
    assert_eq!(pitched.dynamics.len(), 1);
    assert_eq!(pitched.dynamics[0].kind, DynamicsKind::P);
}

#[test]
fn test_metronome_becomes_a_tempo_with_its_words() {
    let measure = format!(
        "<direction placement=\"above\">\
           <direction-type><words>Allegro</words></direction-type>\
           <direction-type>\
             <metronome>\
               <beat-unit>quarter</beat-unit>\
               <beat-unit-dot/>\
               <per-minute>96</per-minute>\
             </metronome>\
           </direction-type>\
         </direction>\
         {}",
        note('C')
    );
    let conversion =
        convert(&one_part_score(&measure), ConversionSettings::default()).unwrap();
    let elements = first_voice_elements(&conversion);

    let VoiceElement::Tempo(tempo) = &elements[0] else {
        panic!("expected the tempo first, got {:?}", elements[0]);
    };
    assert_eq!(tempo.beat_unit, Rational32::new(3, 8), "dotted quarter");
    assert_eq!(tempo.per_minute, 96);
    assert_eq!(tempo.indication.as_deref(), Some("Allegro"));

    // the words went into the tempo, not onto the note
    let VoiceElement::Note(note) = &elements[1] else {
        panic!("expected the note");
    };
    assert!(note.words.is_empty());
}

#[test]
fn test_metronome_without_per_minute_is_skipped() {
    let measure = format!(
        "<direction>\
           <direction-type>\
             <metronome><beat-unit>quarter</beat-unit></metronome>\
           </direction-type>\
         </direction>\
         {}",
        note('C')
    );
    let conversion =
        convert(&one_part_score(&measure), ConversionSettings::default()).unwrap();
    let elements = first_voice_elements(&conversion);

    assert!(matches!(elements[0], VoiceElement::Note(_)));
    assert!(conversion
        .diagnostics
        .records
        .iter()
        .any(|r| r.message.contains("per-minute")));
}

#[test]
fn test_octave_shift_lands_on_the_voice() {
    let measure = format!(
        "<direction>\
           <direction-type><octave-shift type=\"down\" size=\"15\"/></direction-type>\
         </direction>\
         {}\
         <direction>\
           <direction-type><octave-shift type=\"stop\" size=\"15\"/></direction-type>\
         </direction>",
        note('C')
    );
    let conversion =
        convert(&one_part_score(&measure), ConversionSettings::default()).unwrap();
    let elements = first_voice_elements(&conversion);

    assert_eq!(elements.len(), 3);
    let VoiceElement::OctaveShift(open) = &elements[0] else {
        panic!("expected the octave shift");
    };
    assert_eq!(open.kind, OctaveShiftKind::Down);
    assert_eq!(open.size, 15);
    let VoiceElement::OctaveShift(close) = &elements[2] else {
        panic!("expected the closing shift");
    };
    assert_eq!(close.kind, OctaveShiftKind::Stop);
}

#[test]
fn test_bad_octave_shift_size_is_an_error_and_skipped() {
    let measure = format!(
        "<direction>\
           <direction-type><octave-shift type=\"down\" size=\"11\"/></direction-type>\
         </direction>\
         {}",
        note('C')
    );
    let conversion =
        convert(&one_part_score(&measure), ConversionSettings::default()).unwrap();

    assert!(conversion.diagnostics.has_errors());
    let elements = first_voice_elements(&conversion);
    assert!(matches!(elements[0], VoiceElement::Note(_)));
}

#[test]
fn test_rehearsal_and_pedal_marks() {
    let measure = format!(
        "<direction>\
           <direction-type><rehearsal enclosure=\"circle\">B</rehearsal></direction-type>\
         </direction>\
         <direction>\
           <direction-type><pedal type=\"start\" line=\"yes\"/></direction-type>\
         </direction>\
         {}",
        note('C')
    );
    let conversion =
        convert(&one_part_score(&measure), ConversionSettings::default()).unwrap();
    let elements = first_voice_elements(&conversion);

    let VoiceElement::Rehearsal(rehearsal) = &elements[0] else {
        panic!("expected the rehearsal mark");
    };
    assert_eq!(rehearsal.text, "B");
    let VoiceElement::Pedal(pedal) = &elements[1] else {
        panic!("expected the pedal mark");
    };
    assert!(pedal.line);
}
