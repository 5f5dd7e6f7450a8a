pub mod base;
pub mod ytdlp;
