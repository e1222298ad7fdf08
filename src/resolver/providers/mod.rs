// Built-in strategy providers
//
// Platform-native providers live outside this crate and are registered by
// the embedding application; only the universal yt-dlp provider ships here.

mod ytdlp;

pub use ytdlp::YtDlpProvider;
