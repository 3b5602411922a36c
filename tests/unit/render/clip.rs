use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use super::*;
use crate::encode::probe::MediaInfo;
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::{Canvas, Fps};
use crate::progress::RecordingSink;
use crate::select::highlight::select;
use crate::transcript::segment::Segment;

#[derive(Default)]
struct FakeEncoder {
    runs: Mutex<Vec<Invocation>>,
    fail_calls: HashSet<usize>,
    cancel_on_call: Option<(usize, CancelToken)>,
    has_audio: bool,
}

impl Encoder for FakeEncoder {
    fn run(&self, invocation: &Invocation) -> ReelResult<()> {
        let mut runs = self.runs.lock().unwrap();
        let call = runs.len();
        runs.push(invocation.clone());
        if let Some((at, token)) = &self.cancel_on_call
            && *at == call
        {
            token.cancel();
            return Err(ReelError::cancelled("killed"));
        }
        if self.fail_calls.contains(&call) {
            return Err(ReelError::Encoder {
                label: invocation.label().to_string(),
                status: "exit status: 1".to_string(),
                stderr: "Invalid data found when processing input".to_string(),
            });
        }
        Ok(())
    }

    fn probe(&self, _path: &Path) -> ReelResult<MediaInfo> {
        Ok(MediaInfo {
            duration: Some(60.0),
            has_video: true,
            has_audio: self.has_audio,
            width: Some(1920),
            height: Some(1080),
        })
    }
}

fn settings() -> ClipSettings {
    ClipSettings {
        geometry: OutputGeometry {
            canvas: Canvas::new(1280, 720).unwrap(),
            fps: Fps::new(30, 1).unwrap(),
            normalize: true,
        },
        caption: CaptionStyle::default(),
        font_file: PathBuf::from("/fonts/Sans.ttf"),
        fade: FADE_SECONDS,
    }
}

fn three_highlights() -> Vec<Highlight> {
    let segments = vec![
        Segment::new(0.0, 8.0, "this is important").unwrap(),
        Segment::new(10.0, 17.0, "wow look at that").unwrap(),
        Segment::new(20.0, 26.0, "a quiet moment").unwrap(),
    ];
    select(&segments, 3, 90.0)
}

#[test]
fn invocation_trims_source_and_overlays_caption() {
    let encoder = FakeEncoder::default();
    let renderer = ClipRenderer::new(&encoder, settings());
    let highlight = &three_highlights()[0];
    let layout = renderer.layout(highlight);
    let source = SourceMedia::new("/media/talk.mp4", true);
    let inv = renderer.invocation(&source, highlight, &layout, Path::new("/out"));

    let args = inv.args().join(" ");
    assert!(args.contains("-ss 0.000000 -t 8.000000 -i /media/talk.mp4"));
    assert!(!args.contains("lavfi"));
    assert_eq!(
        inv.output(),
        Path::new("/out").join(highlight.clip_id.as_str())
    );

    let graph = inv.filter_complex().unwrap();
    assert!(graph.starts_with(
        "[0:v]scale=1280:720:force_original_aspect_ratio=decrease,pad=1280:720:(ow-iw)/2:(oh-ih)/2:color=black,setsar=1,fps=30/1,setpts=PTS-STARTPTS,"
    ));
    assert!(graph.contains(
        "drawtext=fontfile='/fonts/Sans.ttf':text='this is important':expansion=none:fontsize=28:fontcolor=white:box=1:boxcolor=black@0.25:boxborderw=8:x=(w-text_w)/2:y=h-151"
    ));
    assert!(graph.contains(
        "fade=t=in:st=0.000000:d=0.500000,fade=t=out:st=7.500000:d=0.500000,format=yuv420p[v]"
    ));
    assert!(graph.contains("[0:a]asetpts=PTS-STARTPTS,aresample=48000"));
    assert!(graph.ends_with("afade=t=out:st=7.500000:d=0.500000[a]"));
    assert!(args.contains("-map [v] -map [a] -t 8.000000"));
}

#[test]
fn silent_source_gets_synthesized_audio() {
    let encoder = FakeEncoder::default();
    let renderer = ClipRenderer::new(&encoder, settings());
    let highlight = &three_highlights()[1];
    let layout = renderer.layout(highlight);
    let source = SourceMedia::new("/media/screen.mp4", false);
    let inv = renderer.invocation(&source, highlight, &layout, Path::new("/out"));

    assert_eq!(inv.inputs(), vec!["/media/screen.mp4", "anullsrc=r=48000:cl=stereo"]);
    assert!(inv.filter_complex().unwrap().contains("[1:a]asetpts"));
}

#[test]
fn captions_are_escaped_into_the_graph() {
    let encoder = FakeEncoder::default();
    let renderer = ClipRenderer::new(&encoder, settings());
    let segments = vec![Segment::new(0.0, 9.0, "note: it's 50% [off], a=b; ok").unwrap()];
    let highlight = &select(&segments, 1, 90.0)[0];
    let layout = renderer.layout(highlight);
    let inv = renderer.invocation(
        &SourceMedia::new("/m.mp4", true),
        highlight,
        &layout,
        Path::new("/out"),
    );
    assert!(inv.filter_complex().unwrap().contains(
        "text='note\\: it\u{2019}s 50% \\[off\\]\\, a\\=b\\; ok'"
    ));
}

#[test]
fn long_captions_become_one_drawtext_per_line() {
    let encoder = FakeEncoder::default();
    let mut s = settings();
    s.caption.max_line_width = 18;
    let renderer = ClipRenderer::new(&encoder, s);
    let segments = vec![Segment::new(0.0, 9.0, "this is a really important caption").unwrap()];
    let highlight = &select(&segments, 1, 90.0)[0];
    let layout = renderer.layout(highlight);
    assert_eq!(layout.lines(), ["this is a really", "important caption"]);
    let inv = renderer.invocation(
        &SourceMedia::new("/m.mp4", true),
        highlight,
        &layout,
        Path::new("/out"),
    );
    assert_eq!(inv.filter_complex().unwrap().matches("drawtext=").count(), 2);
}

#[test]
fn one_failed_clip_does_not_stop_the_batch() {
    let encoder = FakeEncoder {
        fail_calls: HashSet::from([1]),
        ..FakeEncoder::default()
    };
    let renderer = ClipRenderer::new(&encoder, settings());
    let highlights = three_highlights();
    let sink = Arc::new(RecordingSink::new());
    let progress = Progress::new(sink.clone());

    let clips = renderer
        .render_all(
            &SourceMedia::new("/m.mp4", true),
            &highlights,
            Path::new("/out"),
            1,
            &progress,
        )
        .unwrap();

    assert_eq!(encoder.runs.lock().unwrap().len(), 3);
    assert_eq!(clips.len(), 2);
    assert_eq!(clips[0].clip_id(), &highlights[0].clip_id);
    assert_eq!(clips[1].clip_id(), &highlights[2].clip_id);
    assert_eq!(sink.values(), vec![50, 60, 70]);
}

#[test]
fn parallel_rendering_keeps_highlight_order() {
    let encoder = FakeEncoder {
        fail_calls: HashSet::from([0]),
        ..FakeEncoder::default()
    };
    let renderer = ClipRenderer::new(&encoder, settings());
    let highlights = three_highlights();
    let clips = renderer
        .render_all(
            &SourceMedia::new("/m.mp4", true),
            &highlights,
            Path::new("/out"),
            3,
            &Progress::new(Arc::new(RecordingSink::new())),
        )
        .unwrap();

    assert_eq!(encoder.runs.lock().unwrap().len(), 3);
    assert_eq!(clips.len(), 2);
    let ids: Vec<_> = clips.iter().map(|c| c.clip_id().clone()).collect();
    let expected: Vec<_> = highlights
        .iter()
        .map(|h| h.clip_id.clone())
        .filter(|id| ids.contains(id))
        .collect();
    assert_eq!(ids, expected);
}

#[test]
fn cancellation_aborts_the_batch() {
    let token = CancelToken::new();
    let encoder = FakeEncoder {
        cancel_on_call: Some((0, token.clone())),
        ..FakeEncoder::default()
    };
    let renderer = ClipRenderer::new(&encoder, settings());
    let err = renderer
        .render_all(
            &SourceMedia::new("/m.mp4", true),
            &three_highlights(),
            Path::new("/out"),
            1,
            &Progress::new(Arc::new(RecordingSink::new())),
        )
        .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(encoder.runs.lock().unwrap().len(), 1);
}

#[test]
fn inspect_reports_missing_source() {
    let encoder = FakeEncoder::default();
    let err = SourceMedia::inspect(&encoder, Path::new("/definitely/not/here.mp4")).unwrap_err();
    assert!(matches!(err, ReelError::MissingInput(_)));
}

#[test]
fn inspect_reads_audio_presence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("src.mp4");
    std::fs::write(&path, b"fake").unwrap();
    let encoder = FakeEncoder::default();
    let source = SourceMedia::inspect(&encoder, &path).unwrap();
    assert!(!source.has_audio());
}
