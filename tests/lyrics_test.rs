// Lyric stanzas: syllabics, inferred chunks, melisma across slurs

use musicxml_msr::msr::{LyricsChunkKind, VoiceElement};
use musicxml_msr::{convert, ConversionSettings};

fn one_part_score(measure: &str) -> String {
    format!(
        "<score-partwise version=\"3.1\">\
           <part-list>\
             <score-part id=\"P1\"><part-name>Voice</part-name></score-part>\
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

fn note_with(step: char, extra: &str) -> String {
    format!(
        "<note>\
           <pitch><step>{step}</step><octave>4</octave></pitch>\
           <duration>4</duration>\
           {extra}\
         </note>"
    )
}

fn lyric(syllabic: &str, text: &str) -> String {
    format!("<lyric number=\"1\"><syllabic>{syllabic}</syllabic><text>{text}</text></lyric>")
}

#[test]
fn test_syllabics_build_the_stanza_in_order() {
    let measure = format!(
        "{}{}{}",
        note_with('C', &lyric("begin", "mu")),
        note_with('D', &lyric("middle", "si")),
        note_with('E', &lyric("end", "cal")),
    );
    let conversion =
        convert(&one_part_score(&measure), ConversionSettings::default()).unwrap();
    let voice = &conversion.score.parts[0].staves[&1].voices[&1];

    let stanza = voice.lyrics.get(&1).expect("stanza 1 should exist");
    assert_eq!(stanza.chunks.len(), 3);
    assert_eq!(stanza.chunks[0].kind, LyricsChunkKind::Begin);
    assert_eq!(stanza.chunks[0].text, "mu");
    assert_eq!(stanza.chunks[1].kind, LyricsChunkKind::Middle);
    assert_eq!(stanza.chunks[2].kind, LyricsChunkKind::End);
    assert_eq!(stanza.chunks[2].text, "cal");

    // every chunk is bound to its note
    assert!(stanza.chunks.iter().all(|c| c.note.is_some()));

    // the notes know they carry lyrics
    let elements = &voice.chunks[0].elements;
    for element in elements {
        let VoiceElement::Note(note) = element else {
            panic!("expected only notes");
        };
        assert!(note.has_lyrics);
    }
}

#[test]
fn test_two_stanzas_collect_separately() {
    let measure = note_with(
        'C',
        "<lyric number=\"1\"><syllabic>single</syllabic><text>day</text></lyric>\
         <lyric number=\"2\"><syllabic>single</syllabic><text>night</text></lyric>",
    );
    let conversion =
        convert(&one_part_score(&measure), ConversionSettings::default()).unwrap();
    let voice = &conversion.score.parts[0].staves[&1].voices[&1];

    assert_eq!(voice.lyrics.len(), 2);
    assert_eq!(voice.lyrics[&1].chunks[0].text, "day");
    assert_eq!(voice.lyrics[&2].chunks[0].text, "night");
}

#[test]
fn test_elision_joins_fragments_with_a_space() {
    let measure = note_with(
        'C',
        "<lyric number=\"1\">\
           <syllabic>single</syllabic>\
           <text>ma</text>\
           <elision> </elision>\
           <syllabic>single</syllabic>\
           <text>il</text>\
         </lyric>",
    );
    let conversion =
        convert(&one_part_score(&measure), ConversionSettings::default()).unwrap();
    let voice = &conversion.score.parts[0].staves[&1].voices[&1];

    assert_eq!(voice.lyrics[&1].chunks[0].text, "ma il");
}

#[test]
fn test_tied_note_with_empty_lyric_carries_the_syllable() {
    let measure = format!(
        "{}{}",
        note_with(
            'C',
            &format!(
                "<notations><tied type=\"start\"/></notations>{}",
                lyric("single", "sun")
            )
        ),
        note_with('C', "<notations><tied type=\"stop\"/></notations><lyric number=\"1\"/>"),
    );
    let conversion =
        convert(&one_part_score(&measure), ConversionSettings::default()).unwrap();
    let voice = &conversion.score.parts[0].staves[&1].voices[&1];

    let stanza = &voice.lyrics[&1];
    assert_eq!(stanza.chunks.len(), 2);
    assert_eq!(stanza.chunks[0].kind, LyricsChunkKind::Single);
    assert_eq!(stanza.chunks[1].kind, LyricsChunkKind::Tied);
    assert!(stanza.chunks[1].text.is_empty());
}

#[test]
fn test_rest_with_empty_lyric_is_a_skip() {
    let measure = format!(
        "{}<note><rest/><duration>4</duration><lyric number=\"1\"/></note>",
        note_with('C', &lyric("single", "air"))
    );
    let conversion =
        convert(&one_part_score(&measure), ConversionSettings::default()).unwrap();
    let voice = &conversion.score.parts[0].staves[&1].voices[&1];

    let stanza = &voice.lyrics[&1];
    assert_eq!(stanza.chunks.len(), 2);
    assert_eq!(stanza.chunks[1].kind, LyricsChunkKind::Skip);
}

#[test]
fn test_melisma_inside_a_slur() {
    let measure = format!(
        "{}{}{}",
        note_with(
            'C',
            &format!(
                "<notations><slur number=\"1\" type=\"start\"/></notations>{}",
                lyric("begin", "glo")
            )
        ),
        note_with('D', "<lyric number=\"1\"/>"),
        note_with(
            'E',
            "<notations><slur number=\"1\" type=\"stop\"/></notations><lyric number=\"1\"/>"
        ),
    );
    let conversion =
        convert(&one_part_score(&measure), ConversionSettings::default()).unwrap();
    let voice = &conversion.score.parts[0].staves[&1].voices[&1];

    let stanza = &voice.lyrics[&1];
    assert_eq!(stanza.chunks.len(), 3);
    assert_eq!(stanza.chunks[0].kind, LyricsChunkKind::Begin);
    assert_eq!(stanza.chunks[1].kind, LyricsChunkKind::Slur);
    // the slur stops on the third note, but its lyric still belongs to
    // the melisma
    assert_eq!(stanza.chunks[2].kind, LyricsChunkKind::Slur);
}

#[test]
fn test_melisma_running_beyond_the_word_end() {
    let measure = format!(
        "{}{}",
        note_with(
            'C',
            &format!(
                "<notations><slur number=\"1\" type=\"start\"/></notations>{}",
                lyric("end", "ria")
            )
        ),
        note_with(
            'D',
            "<notations><slur number=\"1\" type=\"stop\"/></notations><lyric number=\"1\"/>"
        ),
    );
    let conversion =
        convert(&one_part_score(&measure), ConversionSettings::default()).unwrap();
    let voice = &conversion.score.parts[0].staves[&1].voices[&1];

    let stanza = &voice.lyrics[&1];
    assert_eq!(stanza.chunks.len(), 2);
    assert_eq!(stanza.chunks[0].kind, LyricsChunkKind::End);
    assert_eq!(stanza.chunks[1].kind, LyricsChunkKind::SlurBeyondEnd);
}

#[test]
fn test_empty_lyric_outside_any_context_records_nothing() {
    let measure = note_with('C', "<lyric number=\"1\"/>");
    let conversion =
        convert(&one_part_score(&measure), ConversionSettings::default()).unwrap();
    let voice = &conversion.score.parts[0].staves[&1].voices[&1];

    assert!(voice.lyrics.is_empty());
}
