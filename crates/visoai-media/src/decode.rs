// crates/visoai-media/src/decode.rs
//
// LiveDecoder: sequential decoder for the video preview pipeline.
// Opened once per playback session at the video trim start, then pulled
// frame by frame by the preview decode thread in worker.rs.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context as _, Result};

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::{input, Pixel};
use ffmpeg::media::Type;
use ffmpeg::software::scaling::{context::Context as SwsContext, flag::Flags};
use ffmpeg::util::frame::video::Video as VideoFrame;

use crate::helpers::seek::seek_to_secs;

pub struct LiveDecoder {
    pub path:      PathBuf,
    ictx:          ffmpeg::format::context::Input,
    decoder:       ffmpeg::decoder::video::Video,
    video_idx:     usize,
    pub last_pts:  i64,
    tb_num:        i32,
    tb_den:        i32,
    pub out_w:     u32,
    pub out_h:     u32,
    scaler:        SwsContext,
    /// Frame decoded by burn_to_pts() that reached the target; emitted first.
    held:          Option<VideoFrame>,
}

impl LiveDecoder {
    /// Open `path` positioned at the keyframe before `timestamp`. Frames are
    /// scaled down to at most `max_width` points wide, keeping the aspect ratio.
    pub fn open(path: &Path, timestamp: f64, max_width: u32) -> Result<Self> {
        let mut ictx = input(path).with_context(|| format!("open {}", path.display()))?;
        let video_idx = ictx.streams().best(Type::Video)
            .ok_or_else(|| anyhow!("no video stream"))?
            .index();

        let (tb_num, tb_den, decoder) = {
            let stream  = ictx.stream(video_idx).ok_or_else(|| anyhow!("stream gone"))?;
            let tb      = stream.time_base();
            let dec_ctx = ffmpeg::codec::context::Context::from_parameters(stream.parameters())?;
            (tb.numerator(), tb.denominator(), dec_ctx.decoder().video()?)
        };
        if tb_num == 0 || tb_den == 0 {
            return Err(anyhow!("invalid stream time base"));
        }

        seek_to_secs(&mut ictx, timestamp, "preview");

        let (raw_w, raw_h) = (decoder.width().max(2), decoder.height().max(2));
        let (out_w, out_h) = fit_width(raw_w, raw_h, max_width);

        let scaler = SwsContext::get(
            decoder.format(), decoder.width(), decoder.height(),
            Pixel::RGBA, out_w, out_h, Flags::BILINEAR,
        )?;

        let mut d = Self {
            path: path.to_path_buf(), ictx, decoder, video_idx,
            last_pts: 0, tb_num, tb_den, out_w, out_h, scaler, held: None,
        };
        d.last_pts = d.ts_to_pts(timestamp);
        Ok(d)
    }

    pub fn ts_to_pts(&self, t: f64) -> i64 {
        (t * self.tb_den as f64 / self.tb_num as f64) as i64
    }

    pub fn pts_to_secs(&self, pts: i64) -> f64 {
        pts as f64 * self.tb_num as f64 / self.tb_den as f64
    }

    /// Decode (without scaling) until the first frame at or past `target_pts`.
    /// That frame is held and returned by the next `next_frame()` call.
    pub fn burn_to_pts(&mut self, target_pts: i64) {
        while let Some(frame) = self.decode_next() {
            let pts = frame.pts().unwrap_or(self.last_pts + 1);
            self.last_pts = pts;
            if pts + 2 >= target_pts {
                self.held = Some(frame);
                return;
            }
        }
    }

    /// Next frame in presentation order as `(rgba, w, h, ts_secs)`, or None at EOF.
    pub fn next_frame(&mut self) -> Option<(Vec<u8>, u32, u32, f64)> {
        let frame = match self.held.take() {
            Some(f) => f,
            None    => {
                let f = self.decode_next()?;
                self.last_pts = f.pts().unwrap_or(self.last_pts + 1);
                f
            }
        };
        let ts_secs = self.pts_to_secs(frame.pts().unwrap_or(self.last_pts));

        let mut out = VideoFrame::empty();
        if let Err(e) = self.scaler.run(&frame, &mut out) {
            log::warn!("[preview] scale failed: {e}");
            return None;
        }
        // Copy only visible pixels, not stride padding.
        let stride    = out.stride(0);
        let raw       = out.data(0);
        let row_bytes = self.out_w as usize * 4;
        let data: Vec<u8> = (0..self.out_h as usize)
            .flat_map(|row| &raw[row * stride..row * stride + row_bytes])
            .copied()
            .collect();
        Some((data, self.out_w, self.out_h, ts_secs))
    }

    fn decode_next(&mut self) -> Option<VideoFrame> {
        let mut decoded = VideoFrame::empty();
        if self.decoder.receive_frame(&mut decoded).is_ok() {
            return Some(decoded);
        }
        for (stream, packet) in self.ictx.packets().flatten() {
            if stream.index() != self.video_idx { continue; }
            if self.decoder.send_packet(&packet).is_err() { continue; }
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                return Some(decoded);
            }
        }
        // Drain frames still buffered in the decoder.
        let _ = self.decoder.send_eof();
        self.decoder.receive_frame(&mut decoded).ok().map(|_| decoded)
    }
}

/// Output size for a `w`×`h` source capped at `max_width`, both even.
pub fn fit_width(w: u32, h: u32, max_width: u32) -> (u32, u32) {
    let w = w.max(2);
    let h = h.max(2);
    if max_width == 0 || w <= max_width {
        return (w & !1, h & !1);
    }
    let out_h = ((max_width as f64 * h as f64 / w as f64) as u32).max(2) & !1;
    (max_width & !1, out_h)
}

#[cfg(test)]
mod tests {
    use super::fit_width;

    #[test]
    fn small_sources_keep_native_size() {
        assert_eq!(fit_width(640, 360, 960), (640, 360));
        assert_eq!(fit_width(641, 361, 0), (640, 360));
    }

    #[test]
    fn large_sources_scale_to_width() {
        assert_eq!(fit_width(1920, 1080, 960), (960, 540));
        assert_eq!(fit_width(1080, 1920, 540), (540, 960));
    }
}
