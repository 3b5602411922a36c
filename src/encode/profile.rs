use crate::encode::filter::AUDIO_SAMPLE_RATE;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateControl {
    /// Target bitrate, e.g. `2M`.
    Bitrate(&'static str),
    /// Constant rate factor.
    Crf(u8),
}

/// Fixed codec/container settings. Profiles are constants, never tuned per clip, so every file
/// produced with the same profile can be concatenated without re-timing surprises.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeProfile {
    pub video_codec: &'static str,
    pub preset: &'static str,
    pub rate: RateControl,
    pub pix_fmt: &'static str,
    pub audio_codec: &'static str,
    pub audio_bitrate: &'static str,
    pub sample_rate: u32,
    pub channels: u8,
    pub faststart: bool,
}

impl EncodeProfile {
    pub fn push_to(&self, args: &mut Vec<String>) {
        args.push("-c:v".to_string());
        args.push(self.video_codec.to_string());
        args.push("-preset".to_string());
        args.push(self.preset.to_string());
        match self.rate {
            RateControl::Bitrate(rate) => {
                args.push("-b:v".to_string());
                args.push(rate.to_string());
            }
            RateControl::Crf(crf) => {
                args.push("-crf".to_string());
                args.push(crf.to_string());
            }
        }
        args.push("-pix_fmt".to_string());
        args.push(self.pix_fmt.to_string());
        args.push("-c:a".to_string());
        args.push(self.audio_codec.to_string());
        args.push("-b:a".to_string());
        args.push(self.audio_bitrate.to_string());
        args.push("-ar".to_string());
        args.push(self.sample_rate.to_string());
        args.push("-ac".to_string());
        args.push(self.channels.to_string());
        if self.faststart {
            args.push("-movflags".to_string());
            args.push("+faststart".to_string());
        }
    }
}

/// Per-clip and per-card profile: fast, fixed bitrate.
pub const CLIP_PROFILE: EncodeProfile = EncodeProfile {
    video_codec: "libx264",
    preset: "ultrafast",
    rate: RateControl::Bitrate("2M"),
    pix_fmt: "yuv420p",
    audio_codec: "aac",
    audio_bitrate: "128k",
    sample_rate: AUDIO_SAMPLE_RATE,
    channels: 2,
    faststart: true,
};

/// Final reel profile: one quality-targeted pass over the whole concatenation.
pub const REEL_PROFILE: EncodeProfile = EncodeProfile {
    video_codec: "libx264",
    preset: "medium",
    rate: RateControl::Crf(20),
    pix_fmt: "yuv420p",
    audio_codec: "aac",
    audio_bitrate: "192k",
    sample_rate: AUDIO_SAMPLE_RATE,
    channels: 2,
    faststart: true,
};
