//! Looping video backdrop decoding
//!
//! Frames are decoded by an `ffmpeg` child process into raw RGBA on stdout,
//! read on a worker thread and handed to the render loop through a bounded
//! channel. Audio is never decoded.

use crate::config::VideoConfig;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use studio_core::StudioError;
use thiserror::Error;

/// Frames buffered between the decoder and the render loop
const FRAME_QUEUE: usize = 2;

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("failed to start {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("decoder has no output stream")]
    NoOutput,

    #[error("failed to start frame reader: {0}")]
    Reader(std::io::Error),
}

impl From<VideoError> for StudioError {
    fn from(err: VideoError) -> Self {
        StudioError::VideoError(err.to_string())
    }
}

/// A running looping video decode
pub struct VideoPlayer {
    child: Child,
    frames: Receiver<Vec<u8>>,
    reader: Option<JoinHandle<()>>,
    width: u32,
    height: u32,
}

impl VideoPlayer {
    /// Start decoding `source` (path or URL) scaled to the configured size
    pub fn spawn(source: &str, config: &VideoConfig) -> Result<Self, VideoError> {
        let (width, height) = (config.width.max(1), config.height.max(1));
        let mut child = Command::new(&config.ffmpeg)
            .args(decoder_args(source, width, height))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| VideoError::Spawn {
                binary: config.ffmpeg.clone(),
                source,
            })?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(VideoError::NoOutput);
        };

        let (tx, rx) = mpsc::sync_channel(FRAME_QUEUE);
        let frame_len = width as usize * height as usize * 4;
        let label = source.to_string();
        let reader = thread::Builder::new()
            .name("studio-video".into())
            .spawn(move || read_frames(stdout, frame_len, tx, &label));
        let reader = match reader {
            Ok(handle) => handle,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(VideoError::Reader(e));
            }
        };

        log::info!("Video backdrop decoding {} at {}x{}", source, width, height);
        Ok(Self {
            child,
            frames: rx,
            reader: Some(reader),
            width,
            height,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Newest decoded frame since the last call, dropping older ones
    pub fn latest_frame(&self) -> Option<Vec<u8>> {
        self.frames.try_iter().last()
    }

    /// Kill the decoder and wait for the reader to finish
    pub fn stop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}

impl Drop for VideoPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// ffmpeg arguments: loop forever at native rate, no audio, raw RGBA to stdout
pub fn decoder_args(source: &str, width: u32, height: u32) -> Vec<String> {
    vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-stream_loop".into(),
        "-1".into(),
        "-re".into(),
        "-i".into(),
        source.into(),
        "-an".into(),
        "-vf".into(),
        format!("scale={}:{}", width, height),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "rgba".into(),
        "-".into(),
    ]
}

fn read_frames(mut stdout: impl Read, frame_len: usize, tx: SyncSender<Vec<u8>>, label: &str) {
    let mut delivered = 0u64;
    loop {
        let mut frame = vec![0u8; frame_len];
        if stdout.read_exact(&mut frame).is_err() {
            break;
        }
        delivered += 1;
        match tx.try_send(frame) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => break,
        }
    }
    if delivered == 0 {
        log::warn!(
            "Video backdrop playback blocked: decoder produced no frames for {}",
            label
        );
    } else {
        log::debug!("Video decoder for {} stopped after {} frames", label, delivered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_are_muted_looping_rgba() {
        let args = decoder_args("clip.mp4", 640, 360);
        let joined = args.join(" ");
        assert!(joined.contains("-stream_loop -1"));
        assert!(joined.contains("-an"));
        assert!(joined.contains("-i clip.mp4"));
        assert!(joined.contains("scale=640:360"));
        assert!(joined.contains("-pix_fmt rgba"));
        assert_eq!(args.last().map(String::as_str), Some("-"));
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let config = VideoConfig {
            ffmpeg: "/nonexistent/studio-ffmpeg".into(),
            ..VideoConfig::default()
        };
        let err = VideoPlayer::spawn("clip.mp4", &config).err().unwrap();
        assert!(matches!(err, VideoError::Spawn { .. }));
        let studio: StudioError = err.into();
        assert!(matches!(studio, StudioError::VideoError(_)));
    }

    #[test]
    fn reader_delivers_whole_frames_only() {
        let data: Vec<u8> = (0..10u8).collect();
        let (tx, rx) = mpsc::sync_channel(4);
        read_frames(&data[..], 4, tx, "test");
        let frames: Vec<Vec<u8>> = rx.try_iter().collect();
        assert_eq!(frames, vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7]]);
    }

    #[test]
    fn reader_drops_frames_when_the_queue_is_full() {
        let data = vec![7u8; 40];
        let (tx, rx) = mpsc::sync_channel(1);
        read_frames(&data[..], 4, tx, "test");
        assert_eq!(rx.try_iter().count(), 1);
    }
}
