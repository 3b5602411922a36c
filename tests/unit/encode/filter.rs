use super::*;

fn canvas() -> Canvas {
    Canvas::new(1280, 720).unwrap()
}

fn fps() -> Fps {
    Fps::new(30, 1).unwrap()
}

fn drawtext(text: &str) -> DrawText {
    DrawText {
        text: text.to_string(),
        font_file: PathBuf::from("/usr/share/fonts/DejaVuSans.ttf"),
        font_size: 28,
        font_color: "white".to_string(),
        box_color: "black@0.25".to_string(),
        box_border: 8,
        x: "(w-text_w)/2".to_string(),
        y: "h-151".to_string(),
    }
}

#[test]
fn drawtext_quotes_and_escapes_text_once() {
    let s = Filter::DrawText(drawtext("wow: it's here, [really]")).to_string();
    assert!(s.starts_with("drawtext=fontfile='/usr/share/fonts/DejaVuSans.ttf':"));
    assert!(s.contains("text='wow\\: it\u{2019}s here\\, \\[really\\]'"));
    assert!(s.contains(":expansion=none:"));
    assert!(s.contains(":box=1:boxcolor=black@0.25:boxborderw=8:"));
    assert!(s.ends_with(":x=(w-text_w)/2:y=h-151"));
}

#[test]
fn hostile_caption_cannot_break_out_of_the_graph() {
    let mut chain = FilterChain::new();
    chain.push(Filter::DrawText(drawtext("x'];[0:v]nullsink;[a")));
    let mut graph = FilterGraph::new();
    graph.chain(["0:v"], chain, ["v"]);
    let s = graph.to_string();
    // the only unescaped separators are the graph's own
    assert_eq!(s.matches('\'').count(), 4);
    assert!(!s.contains("];["));
    assert!(s.ends_with("[v]"));
}

#[test]
fn font_paths_are_escaped() {
    assert_eq!(
        escape_path(Path::new("C:\\Fonts\\arial.ttf")),
        "C\\:\\\\Fonts\\\\arial.ttf"
    );
}

#[test]
fn fades_use_fixed_precision() {
    let [fade_in, fade_out] = fade_pair(9.0, 0.5, false);
    assert_eq!(fade_in.to_string(), "fade=t=in:st=0.000000:d=0.500000");
    assert_eq!(fade_out.to_string(), "fade=t=out:st=8.500000:d=0.500000");
    let [a_in, _] = fade_pair(9.0, 0.5, true);
    assert_eq!(a_in.to_string(), "afade=t=in:st=0.000000:d=0.500000");
}

#[test]
fn fades_shrink_for_very_short_streams() {
    let [fade_in, fade_out] = fade_pair(0.6, 0.5, false);
    assert_eq!(fade_in.to_string(), "fade=t=in:st=0.000000:d=0.300000");
    assert_eq!(fade_out.to_string(), "fade=t=out:st=0.300000:d=0.300000");
}

#[test]
fn normalize_video_serializes_in_order() {
    let mut chain = FilterChain::new();
    chain.extend(normalize_video(canvas(), fps()));
    assert_eq!(
        chain.to_string(),
        "scale=1280:720:force_original_aspect_ratio=decrease,\
         pad=1280:720:(ow-iw)/2:(oh-ih)/2:color=black,setsar=1,fps=30/1"
    );
}

#[test]
fn graph_joins_labeled_chains() {
    let mut v = FilterChain::new();
    v.push(Filter::ResetPts);
    let mut a = FilterChain::new();
    a.push(Filter::ResetAudioPts)
        .push(Filter::AudioStereo { sample_rate: AUDIO_SAMPLE_RATE });
    let mut concat = FilterChain::new();
    concat.push(Filter::Concat {
        segments: 2,
        video: 1,
        audio: 0,
    });

    let mut graph = FilterGraph::new();
    graph
        .chain(["0:v"], v, ["v0"])
        .chain(["0:a"], a, ["a0"])
        .chain(["v0", "v1"], concat, ["outv"]);
    assert_eq!(
        graph.to_string(),
        "[0:v]setpts=PTS-STARTPTS[v0];\
         [0:a]asetpts=PTS-STARTPTS,aformat=sample_fmts=fltp:sample_rates=48000:channel_layouts=stereo[a0];\
         [v0][v1]concat=n=2:v=1:a=0[outv]"
    );
    assert_eq!(graph.chains().len(), 3);
}

#[test]
fn lavfi_sources() {
    let color = LavfiSource::Color {
        color: "black".to_string(),
        canvas: canvas(),
        fps: fps(),
        duration: 3.0,
    };
    assert_eq!(color.to_string(), "color=c=black:s=1280x720:r=30/1:d=3.000000");
    assert_eq!(
        LavfiSource::SilentStereo { sample_rate: 48_000 }.to_string(),
        "anullsrc=r=48000:cl=stereo"
    );
}
