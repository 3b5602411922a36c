use super::*;

#[test]
fn parses_wrapped_whisper_json() {
    let json = r#"{
        "language": "en",
        "segments": [
            {"id": 0, "start": 0.0, "end": 3.0, "text": " ok"},
            {"id": 1, "start": 3.0, "end": 12.0, "text": " this is amazing and important"},
            {"id": 2, "start": 12.0, "end": 12.0, "text": " dropped"}
        ]
    }"#;
    let segs = parse_json_transcript(json).unwrap();
    assert_eq!(segs.len(), 2);
    assert_eq!(segs[1].text(), "this is amazing and important");
}

#[test]
fn parses_bare_json_array() {
    let segs = parse_json_transcript(r#"[{"start": 1.5, "end": 9.0, "text": "note"}]"#).unwrap();
    assert_eq!(segs.len(), 1);
    assert_eq!(segs[0].start(), 1.5);
}

#[test]
fn malformed_json_is_a_serde_error() {
    let err = parse_json_transcript("{not json").unwrap_err();
    assert!(matches!(err, ReelError::Serde(_)));
}

#[test]
fn parses_srt_with_and_without_index_lines() {
    let input = "1\n00:00:01,000 --> 00:00:03,500\nHello\nworld!\n\n00:00:04,250 --> 00:00:10,000\nNext line\n";
    let segs = parse_srt(input).unwrap();
    assert_eq!(segs.len(), 2);
    assert_eq!(segs[0].text(), "Hello world!");
    assert_eq!(segs[0].end(), 3.5);
    assert_eq!(segs[1].start(), 4.25);
}

#[test]
fn srt_rejects_garbage_timestamps() {
    assert!(parse_srt("1\n00:00:aa,000 --> 00:00:03,500\nx\n").is_err());
}

#[test]
fn srt_rejects_hours_that_overflow() {
    let input = "1\n18446744073709551615:00:00,000 --> 18446744073709551615:00:01,000\nx\n";
    assert!(matches!(parse_srt(input), Err(ReelError::Serde(_))));
}

#[test]
fn format_detection_prefers_extension_then_content() {
    assert_eq!(
        TranscriptFormat::detect(Path::new("a.srt"), "{"),
        TranscriptFormat::Srt
    );
    assert_eq!(
        TranscriptFormat::detect(Path::new("a.txt"), "  [ ]"),
        TranscriptFormat::Json
    );
    assert_eq!(
        TranscriptFormat::detect(Path::new("a"), "1\n00:00:01,000 --> 00:00:02,000\n"),
        TranscriptFormat::Srt
    );
}

#[test]
fn transcript_file_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("talk.json");
    std::fs::write(&path, r#"[{"start": 0.0, "end": 6.0, "text": "key idea"}]"#).unwrap();
    let segs = TranscriptFile::new(&path)
        .transcribe(Path::new("ignored.mp4"))
        .unwrap();
    assert_eq!(segs.len(), 1);
}
