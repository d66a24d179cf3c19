use std::ffi::OsString;
use std::io::{Read as _, Write as _};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use crate::encode::sink::{FrameSink, SinkConfig, ensure_parent_dir};
use crate::foundation::core::{Fps, Rgba8, TickIndex, Viewport};
use crate::foundation::error::{RainError, RainResult};
use crate::foundation::math::flatten_premul_over_bg_to_opaque_rgba8;
use crate::render::surface::FrameRGBA;

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output MP4 path.
    pub out_path: PathBuf,
    /// Replace an existing file at `out_path`.
    pub overwrite: bool,
    /// Colour behind translucent trail pixels and around letterboxed frames.
    pub bg: Rgba8,
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            bg: Rgba8::black(),
        }
    }
}

/// MP4 sink piping opaque RGBA frames into the system `ffmpeg` (libx264, yuv420p).
///
/// The video keeps the size passed to `begin`. After a `resize`, every frame is centred on a
/// canvas of the video size filled with the background colour; frames larger than the video
/// are cropped around their centre.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    stream: Option<Stream>,
}

struct Stream {
    encoder: Encoder,
    canvas: VideoCanvas,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self { opts, stream: None }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> RainResult<()> {
        if self.stream.is_some() {
            return Err(RainError::encode("mp4 sink is already recording"));
        }
        let video = cfg.viewport();
        check_video(video, cfg.fps)?;

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(RainError::validation(format!(
                "'{}' already exists (pass overwrite to replace it)",
                self.opts.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(RainError::encode(
                "MP4 output needs `ffmpeg` on PATH; use PNG output instead",
            ));
        }

        let encoder = Encoder::spawn(encoder_args(&self.opts, video, cfg.fps))?;
        tracing::info!(
            out = %self.opts.out_path.display(),
            width = video.width,
            height = video.height,
            fps = cfg.fps.as_f64(),
            "mp4 encoder started"
        );
        self.stream = Some(Stream {
            encoder,
            canvas: VideoCanvas::new(video, self.opts.bg),
        });
        Ok(())
    }

    fn push_frame(&mut self, idx: TickIndex, frame: &FrameRGBA) -> RainResult<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| RainError::encode("mp4 sink: frame pushed before begin"))?;
        let bytes = stream.canvas.compose(idx, frame)?;
        stream.encoder.write(bytes)
    }

    fn resize(&mut self, viewport: Viewport) -> RainResult<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| RainError::encode("mp4 sink: resize before begin"))?;
        stream.canvas.set_source(viewport)?;
        if viewport != stream.canvas.video {
            tracing::info!(
                width = viewport.width,
                height = viewport.height,
                video_width = stream.canvas.video.width,
                video_height = stream.canvas.video.height,
                "letterboxing resized rain into the mp4 frame"
            );
        }
        Ok(())
    }

    fn end(&mut self) -> RainResult<()> {
        let stream = self
            .stream
            .take()
            .ok_or_else(|| RainError::encode("mp4 sink: end before begin"))?;
        let frames = stream.canvas.frames;
        stream.encoder.finish()?;
        tracing::info!(out = %self.opts.out_path.display(), frames, "mp4 written");
        Ok(())
    }
}

fn check_video(video: Viewport, fps: Fps) -> RainResult<()> {
    if fps.num == 0 || fps.den == 0 {
        return Err(RainError::validation("mp4 frame rate must be non-zero"));
    }
    if video.width == 0 || video.height == 0 {
        return Err(RainError::validation("mp4 size must be non-zero"));
    }
    // yuv420p subsamples chroma 2x2.
    if !video.width.is_multiple_of(2) || !video.height.is_multiple_of(2) {
        return Err(RainError::validation(format!(
            "mp4 size must be even in both axes, got {}x{}",
            video.width, video.height
        )));
    }
    Ok(())
}

fn encoder_args(opts: &FfmpegSinkOpts, video: Viewport, fps: Fps) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![if opts.overwrite { "-y" } else { "-n" }.into()];
    let input = [
        "-loglevel".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        "rgba".to_string(),
        "-video_size".to_string(),
        format!("{}x{}", video.width, video.height),
        "-framerate".to_string(),
        format!("{}/{}", fps.num, fps.den),
        "-i".to_string(),
        "pipe:0".to_string(),
    ];
    args.extend(input.into_iter().map(OsString::from));
    args.extend(
        [
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ]
        .into_iter()
        .map(OsString::from),
    );
    args.push(opts.out_path.clone().into_os_string());
    args
}

/// A running `ffmpeg` child with its stdin pipe and a thread collecting its stderr.
struct Encoder {
    child: Child,
    stdin: Option<ChildStdin>,
    log: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
}

impl Encoder {
    fn spawn(args: Vec<OsString>) -> RainResult<Self> {
        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RainError::encode(format!("spawn ffmpeg: {e}")))?;

        let log = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                pipe.read_to_end(&mut buf)?;
                Ok(buf)
            })
        });
        let stdin = child.stdin.take();
        if stdin.is_none() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(RainError::encode("ffmpeg started without a stdin pipe"));
        }
        Ok(Self { child, stdin, log })
    }

    fn write(&mut self, bytes: &[u8]) -> RainResult<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| RainError::encode("ffmpeg stdin is closed"))?;
        stdin
            .write_all(bytes)
            .map_err(|e| RainError::encode(format!("pipe frame into ffmpeg: {e}")))
    }

    /// Close stdin, wait for ffmpeg and turn a failed exit into an error carrying its log.
    fn finish(mut self) -> RainResult<()> {
        drop(self.stdin.take());
        let status = self
            .child
            .wait()
            .map_err(|e| RainError::encode(format!("wait for ffmpeg: {e}")))?;
        let log = match self.log.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| RainError::encode("ffmpeg log reader panicked"))?
                .map_err(|e| RainError::encode(format!("read ffmpeg log: {e}")))?,
            None => Vec::new(),
        };
        if !status.success() {
            return Err(RainError::encode(format!(
                "ffmpeg failed ({status}): {}",
                String::from_utf8_lossy(&log).trim()
            )));
        }
        Ok(())
    }
}

impl Drop for Encoder {
    fn drop(&mut self) {
        // Not finished: close stdin so ffmpeg exits, then reap it.
        if let Some(stdin) = self.stdin.take() {
            drop(stdin);
            if let Err(e) = self.child.wait() {
                tracing::warn!(error = %e, "could not reap abandoned ffmpeg process");
            }
        }
    }
}

/// Turns rain frames of the current source size into opaque frames of the fixed video size.
struct VideoCanvas {
    video: Viewport,
    source: Viewport,
    bg: [u8; 4],
    flat: Vec<u8>,
    out: Vec<u8>,
    last_idx: Option<TickIndex>,
    frames: u64,
}

impl VideoCanvas {
    fn new(video: Viewport, bg: Rgba8) -> Self {
        Self {
            video,
            source: video,
            bg: [bg.r, bg.g, bg.b, 255],
            flat: Vec::new(),
            out: vec![0; video.byte_len()],
            last_idx: None,
            frames: 0,
        }
    }

    fn set_source(&mut self, source: Viewport) -> RainResult<()> {
        if source.width == 0 || source.height == 0 {
            return Err(RainError::validation("mp4 sink: resized frames must be non-empty"));
        }
        self.source = source;
        Ok(())
    }

    /// Validate `frame` and lay it out on the video canvas. The tick cursor only advances for
    /// accepted frames.
    fn compose(&mut self, idx: TickIndex, frame: &FrameRGBA) -> RainResult<&[u8]> {
        if let Some(last) = self.last_idx
            && idx <= last
        {
            return Err(RainError::encode(format!(
                "mp4 sink: tick {} arrived after tick {}",
                idx.0, last.0
            )));
        }
        let size = Viewport::new(frame.width, frame.height);
        if size != self.source || frame.data.len() != size.byte_len() {
            return Err(RainError::validation(format!(
                "mp4 sink: expected a {}x{} frame, got {}x{} ({} bytes)",
                self.source.width,
                self.source.height,
                frame.width,
                frame.height,
                frame.data.len()
            )));
        }

        if size == self.video {
            to_opaque(&mut self.out, frame, self.bg)?;
        } else {
            self.flat.resize(size.byte_len(), 0);
            to_opaque(&mut self.flat, frame, self.bg)?;
            letterbox_rgba8(&mut self.out, self.video, &self.flat, size, self.bg);
        }
        self.last_idx = Some(idx);
        self.frames += 1;
        Ok(&self.out)
    }
}

fn to_opaque(dst: &mut [u8], frame: &FrameRGBA, bg: [u8; 4]) -> RainResult<()> {
    if frame.premultiplied {
        flatten_premul_over_bg_to_opaque_rgba8(dst, &frame.data, bg)
    } else {
        dst.copy_from_slice(&frame.data);
        Ok(())
    }
}

/// Centre `src` on `dst` filled with `bg`, cropping whatever does not fit.
///
/// Buffer lengths must match their sizes.
fn letterbox_rgba8(
    dst: &mut [u8],
    dst_size: Viewport,
    src: &[u8],
    src_size: Viewport,
    bg: [u8; 4],
) {
    for px in dst.chunks_exact_mut(4) {
        px.copy_from_slice(&bg);
    }
    let (dx, sx, w) = centred_span(dst_size.width, src_size.width);
    let (dy, sy, h) = centred_span(dst_size.height, src_size.height);
    let dst_stride = dst_size.width as usize * 4;
    let src_stride = src_size.width as usize * 4;
    let run = w as usize * 4;
    for row in 0..h as usize {
        let d = (dy as usize + row) * dst_stride + dx as usize * 4;
        let s = (sy as usize + row) * src_stride + sx as usize * 4;
        dst[d..d + run].copy_from_slice(&src[s..s + run]);
    }
}

/// `(offset in dst, offset in src, length)` of a span of `src_len` centred in `dst_len`.
fn centred_span(dst_len: u32, src_len: u32) -> (u32, u32, u32) {
    if src_len <= dst_len {
        ((dst_len - src_len) / 2, 0, src_len)
    } else {
        (0, (src_len - dst_len) / 2, dst_len)
    }
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
