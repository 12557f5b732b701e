use std::{
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    core::Fps,
    error::{FlipcutError, FlipcutResult},
    surface::{Rgba8, Surface},
};

/// Encoder selection. VP9/WebM is the preferred artifact; H264/MP4 is the
/// fallback default when the preferred encoder is unavailable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    Vp9,
    H264,
}

impl VideoCodec {
    fn encoder_name(self) -> &'static str {
        match self {
            VideoCodec::Vp9 => "libvpx-vp9",
            VideoCodec::H264 => "libx264",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            VideoCodec::Vp9 => "webm",
            VideoCodec::H264 => "mp4",
        }
    }
}

#[derive(Clone, Debug)]
pub struct EncodeConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    pub out_path: PathBuf,
    pub overwrite: bool,
    pub codec: VideoCodec,
}

impl EncodeConfig {
    pub fn validate(&self) -> FlipcutResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FlipcutError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            // Both codecs target yuv420p output for maximum compatibility.
            return Err(FlipcutError::validation(
                "encode width/height must be even (required for yuv420p output)",
            ));
        }
        Ok(())
    }

    /// The output path with the extension matching `codec`.
    fn resolved_out_path(&self) -> PathBuf {
        self.out_path.with_extension(self.codec.extension())
    }

    fn with_codec(mut self, codec: VideoCodec) -> Self {
        self.codec = codec;
        self
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn ensure_parent_dir(path: &Path) -> FlipcutResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Streams raw RGBA frames to the system `ffmpeg` binary over stdin.
///
/// Straight-alpha frames are flattened over `bg_rgba` before encoding. We
/// use the system binary rather than linked FFmpeg libraries to avoid
/// native dev header/lib requirements.
pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    out_path: PathBuf,
    bg_rgba: Rgba8,
    child: Child,
    stdin: Option<ChildStdin>,
    scratch: Vec<u8>,
}

impl FfmpegEncoder {
    pub fn new(cfg: EncodeConfig, bg_rgba: Rgba8) -> FlipcutResult<Self> {
        cfg.validate()?;
        let out_path = cfg.resolved_out_path();
        ensure_parent_dir(&out_path)?;

        if !cfg.overwrite && out_path.exists() {
            return Err(FlipcutError::validation(format!(
                "output file '{}' already exists",
                out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(FlipcutError::encode(
                "ffmpeg is required for video export, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if cfg.overwrite {
            cmd.arg("-y");
        } else {
            cmd.arg("-n");
        }

        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.0.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            cfg.codec.encoder_name(),
            "-pix_fmt",
            "yuv420p",
        ])
        .arg(&out_path);

        let mut child = cmd.spawn().map_err(|e| {
            FlipcutError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| FlipcutError::encode("failed to open ffmpeg stdin (unexpected)"))?;

        Ok(Self {
            scratch: vec![0u8; (cfg.width * cfg.height * 4) as usize],
            cfg,
            out_path,
            bg_rgba,
            child,
            stdin: Some(stdin),
        })
    }

    /// Try the configured codec; if its encoder cannot be spawned, fall
    /// back to the H264 default. Both failing propagates the H264 error.
    pub fn with_fallback(cfg: EncodeConfig, bg_rgba: Rgba8) -> FlipcutResult<Self> {
        let preferred = cfg.codec;
        match Self::new(cfg.clone(), bg_rgba) {
            Ok(enc) => Ok(enc),
            Err(_) if preferred != VideoCodec::H264 => {
                tracing::warn!(
                    preferred = preferred.encoder_name(),
                    "preferred encoder unavailable, falling back to libx264"
                );
                Self::new(cfg.with_codec(VideoCodec::H264), bg_rgba)
            }
            Err(e) => Err(e),
        }
    }

    pub fn encode_frame(&mut self, frame: &Surface) -> FlipcutResult<()> {
        if frame.width != self.cfg.width || frame.height != self.cfg.height {
            return Err(FlipcutError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.cfg.width, self.cfg.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(FlipcutError::validation(
                "frame data size mismatch with width*height*4",
            ));
        }

        flatten_to_opaque_rgba8(&mut self.scratch, &frame.data, self.bg_rgba)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(FlipcutError::encode("ffmpeg encoder is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            FlipcutError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;

        Ok(())
    }

    /// Finalize the artifact and return its path.
    pub fn finish(mut self) -> FlipcutResult<PathBuf> {
        drop(self.stdin.take());

        let output = self
            .child
            .wait_with_output()
            .map_err(|e| FlipcutError::encode(format!("failed to wait for ffmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FlipcutError::encode(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(self.out_path)
    }
}

/// Flatten straight-alpha RGBA over an opaque background color.
fn flatten_to_opaque_rgba8(dst: &mut [u8], src: &[u8], bg_rgba: Rgba8) -> FlipcutResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(FlipcutError::validation(
            "flatten_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = u16::from(bg_rgba[0]);
    let bg_g = u16::from(bg_rgba[1]);
    let bg_b = u16::from(bg_rgba[2]);

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255 - a;
        d[0] = (mul_div255(u16::from(s[0]), a) + mul_div255(bg_r, inv)).min(255) as u8;
        d[1] = (mul_div255(u16::from(s[1]), a) + mul_div255(bg_g, inv)).min(255) as u8;
        d[2] = (mul_div255(u16::from(s[2]), a) + mul_div255(bg_b, inv)).min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}
