use super::*;
use crate::encode::filter::{Filter, FilterChain};
use crate::encode::profile::CLIP_PROFILE;

#[test]
fn builder_orders_inputs_graph_and_output() {
    let mut chain = FilterChain::new();
    chain.push(Filter::ResetPts);
    let mut graph = FilterGraph::new();
    graph.chain(["0:v"], chain, ["v"]);

    let inv = Invocation::builder("clip")
        .trimmed_input(Path::new("/in/source.mp4"), 12.5, 7.0)
        .lavfi_input(&LavfiSource::SilentStereo { sample_rate: 48_000 })
        .filter_complex(&graph)
        .map_pad("v")
        .map_stream("1:a:0")
        .output_duration(7.0)
        .profile(&CLIP_PROFILE)
        .finish("/out/a.mp4");

    let args = inv.args().join(" ");
    assert!(args.starts_with("-hide_banner -nostdin -loglevel error -y "));
    assert!(args.contains("-ss 12.500000 -t 7.000000 -i /in/source.mp4"));
    assert!(args.contains("-f lavfi -i anullsrc=r=48000:cl=stereo"));
    assert!(args.contains("-filter_complex [0:v]setpts=PTS-STARTPTS[v]"));
    assert!(args.contains("-map [v] -map 1:a:0"));
    assert!(args.ends_with("-movflags +faststart /out/a.mp4"));
    assert_eq!(inv.output(), Path::new("/out/a.mp4"));
    assert_eq!(inv.inputs(), vec!["/in/source.mp4", "anullsrc=r=48000:cl=stereo"]);
    assert_eq!(inv.filter_complex(), Some("[0:v]setpts=PTS-STARTPTS[v]"));
}

#[test]
fn audio_extraction_targets_mono_16k_wav() {
    let inv = audio_extraction(Path::new("talk.mp4"), Path::new("talk.wav"));
    let args = inv.args().join(" ");
    assert!(args.contains("-i talk.mp4"));
    assert!(args.contains("-vn -ac 1 -ar 16000 -c:a pcm_s16le"));
    assert!(args.ends_with("talk.wav"));
}

#[test]
fn diagnostic_tail_keeps_last_lines() {
    let text: String = (0..100).map(|i| format!("line {i}\n\n")).collect();
    let tail = diagnostic_tail(text.as_bytes());
    assert_eq!(tail.lines().count(), DIAGNOSTIC_TAIL_LINES);
    assert!(tail.ends_with("line 99"));
    assert!(tail.starts_with("line 60"));
}

#[test]
fn settings_validate_rejects_zero_timeout() {
    let settings = EncoderSettings {
        timeout_secs: 0,
        ..EncoderSettings::default()
    };
    assert!(matches!(
        settings.validate(),
        Err(ReelError::Validation(_))
    ));
    assert!(EncoderSettings::default().validate().is_ok());
}

#[cfg(unix)]
mod process {
    use super::*;

    fn shell(timeout_secs: u64, cancel: CancelToken) -> SystemEncoder {
        SystemEncoder::new(
            &EncoderSettings {
                ffmpeg: PathBuf::from("sh"),
                ffprobe: PathBuf::from("sh"),
                timeout_secs,
            },
            cancel,
        )
    }

    fn script(label: &str, body: &str, output: &Path) -> Invocation {
        Invocation::new(label, vec!["-c".to_string(), body.to_string()], output)
    }

    #[test]
    fn success_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out.txt");
        let enc = shell(10, CancelToken::new());
        enc.run(&script("ok", "exit 0", &out)).unwrap();
        assert!(out.parent().unwrap().is_dir());
    }

    #[test]
    fn failure_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let enc = shell(10, CancelToken::new());
        let err = enc
            .run(&script(
                "bad",
                "echo 'Invalid argument' >&2; exit 3",
                &dir.path().join("x"),
            ))
            .unwrap_err();
        match err {
            ReelError::Encoder { label, stderr, .. } => {
                assert_eq!(label, "bad");
                assert_eq!(stderr, "Invalid argument");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn long_run_is_killed_at_deadline() {
        let dir = tempfile::tempdir().unwrap();
        let enc = shell(1, CancelToken::new());
        let started = Instant::now();
        let err = enc
            .run(&script("slow", "sleep 30", &dir.path().join("x")))
            .unwrap_err();
        assert!(matches!(err, ReelError::Timeout { .. }), "{err}");
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn cancellation_kills_running_child() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancelToken::new();
        let enc = shell(60, cancel.clone());
        let trigger = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(200));
            cancel.cancel();
        });
        let started = Instant::now();
        let err = enc
            .run(&script("long", "sleep 30", &dir.path().join("x")))
            .unwrap_err();
        trigger.join().unwrap();
        assert!(err.is_cancelled(), "{err}");
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn descendants_holding_the_pipes_do_not_stretch_the_deadline() {
        let dir = tempfile::tempdir().unwrap();
        let enc = shell(1, CancelToken::new());
        let started = Instant::now();
        let err = enc
            .run(&script(
                "wrapped",
                "sleep 30 & sh -c 'sleep 30'; wait",
                &dir.path().join("x"),
            ))
            .unwrap_err();
        assert!(matches!(err, ReelError::Timeout { .. }), "{err}");
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn cancelled_token_prevents_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let enc = shell(10, cancel);
        let marker = dir.path().join("marker");
        let body = format!("touch '{}'", marker.display());
        let err = enc.run(&script("never", &body, &marker)).unwrap_err();
        assert!(err.is_cancelled());
        assert!(!marker.exists());
    }

    #[test]
    fn missing_program_is_reported() {
        let enc = SystemEncoder::new(
            &EncoderSettings {
                ffmpeg: PathBuf::from("/nonexistent/ffmpeg-binary"),
                ..EncoderSettings::default()
            },
            CancelToken::new(),
        );
        assert!(!enc.is_available());
        let err = enc
            .run(&Invocation::new("x", Vec::new(), "out.mp4"))
            .unwrap_err();
        assert!(err.to_string().contains("failed to spawn"));
    }
}
