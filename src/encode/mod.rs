pub(crate) mod ffmpeg;
pub(crate) mod filter;
pub(crate) mod probe;
pub(crate) mod profile;
