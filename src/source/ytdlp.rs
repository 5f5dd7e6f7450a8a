use std::io::BufRead;
use std::process::{Command, Stdio};

use log::{debug, trace, warn};

use crate::common::SourceID;
use crate::config::Config;
use crate::source::base::{FetchError, RawRecord, VideoSource};

/// Lists videos by running `yt-dlp --dump-json --flat-playlist`
#[derive(Debug, Clone)]
pub struct YtDlpSource {
    command: Vec<String>,
    playlist_end: usize,
}

impl YtDlpSource {
    pub fn new(cfg: &Config) -> YtDlpSource {
        YtDlpSource {
            command: cfg.ytdlp_command.clone(),
            playlist_end: cfg.playlist_end,
        }
    }

    fn args(&self, url: &str) -> Vec<String> {
        let mut args: Vec<String> = self.command.iter().skip(1).cloned().collect();
        args.push("--dump-json".into());
        args.push("--flat-playlist".into());
        args.push("--playlist-end".into());
        args.push(self.playlist_end.to_string());
        args.push(url.into());
        args
    }
}

/// Parse line-delimited JSON, skipping blank and malformed lines. Stops after
/// `limit` records.
pub fn parse_listing<R: BufRead>(reader: R, limit: usize) -> Result<Vec<RawRecord>, FetchError> {
    let mut ret = vec![];
    for (num, line) in reader.split(b'\n').enumerate() {
        if ret.len() >= limit {
            break;
        }
        let line = line?;
        let line = String::from_utf8_lossy(&line);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match RawRecord::from_json_line(line) {
            Some(rec) => ret.push(rec),
            None => debug!("Skipping malformed line {}: {:.80}", num + 1, line),
        }
    }
    Ok(ret)
}

impl VideoSource for YtDlpSource {
    fn fetch(&self, id: &SourceID) -> Result<Vec<RawRecord>, FetchError> {
        let program = self.command.first().map(String::as_str).unwrap_or("yt-dlp");
        let args = self.args(&id.url());
        debug!("Running {} with args {:#?}", program, args);

        let output = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| FetchError::Spawn {
                program: program.into(),
                source,
            })?;

        if !output.status.success() {
            // Partial output is still worth showing
            warn!(
                "{} exited with {} for {:?}: {}",
                program,
                output.status,
                id.id_str(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        trace!("Raw output: {}", String::from_utf8_lossy(&output.stdout));

        let records = parse_listing(&output.stdout[..], self.playlist_end)?;
        debug!("Parsed {} records for {:?}", records.len(), id.id_str());
        Ok(records)
    }
}
