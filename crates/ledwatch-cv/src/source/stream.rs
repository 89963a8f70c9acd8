//! Live MJPEG stream from the camera board

use super::{FrameRead, StreamConfig};
use crate::traits::FrameSource;
use crate::utils::FrameUtils;
use crate::Result;
use anyhow::Context;
use opencv::{core::Mat, prelude::*, videoio};
use std::path::Path;
use std::thread::sleep;
use tracing::{info, warn};

pub struct StreamCapture {
    config: StreamConfig,
    capture: Option<videoio::VideoCapture>,
}

impl StreamCapture {
    /// Open the stream, retrying per the config. Fails if no attempt succeeds.
    pub fn open(config: StreamConfig) -> Result<Self> {
        let mut stream = Self {
            config,
            capture: None,
        };
        if !stream.connect()? {
            anyhow::bail!(
                "failed to connect to {} after {} attempts",
                stream.config.url,
                stream.config.connect_attempts
            );
        }
        Ok(stream)
    }

    fn connect(&mut self) -> Result<bool> {
        info!(url = %self.config.url, "connecting to stream");
        let attempts = self.config.connect_attempts.max(1);

        for attempt in 1..=attempts {
            info!("attempt {attempt}/{attempts}");
            let mut capture = videoio::VideoCapture::from_file(&self.config.url, videoio::CAP_ANY)
                .with_context(|| format!("Failed to open stream: {}", self.config.url))?;
            sleep(self.config.settle_delay());

            if capture.is_opened()? && Self::probe(&mut capture, &self.config)? {
                capture.set(videoio::CAP_PROP_FRAME_WIDTH, self.config.frame_width as f64)?;
                capture.set(videoio::CAP_PROP_FRAME_HEIGHT, self.config.frame_height as f64)?;
                capture.set(videoio::CAP_PROP_BUFFERSIZE, 1.0)?;
                info!("stream connected");
                self.capture = Some(capture);
                return Ok(true);
            }
            capture.release()?;

            if attempt < attempts {
                info!("retrying in {:?}", self.config.retry_delay());
                sleep(self.config.retry_delay());
            }
        }

        warn!("failed to connect after {attempts} attempts");
        Ok(false)
    }

    fn probe(capture: &mut videoio::VideoCapture, config: &StreamConfig) -> Result<bool> {
        let mut frame = Mat::default();
        for _ in 0..config.probe_reads {
            if capture.read(&mut frame)? && !frame.empty() {
                return Ok(true);
            }
            sleep(config.probe_delay());
        }
        Ok(false)
    }

    fn release(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            if let Err(err) = capture.release() {
                warn!(error = %err, "failed to release capture");
            }
        }
    }
}

impl FrameSource for StreamCapture {
    type Frame = Mat;

    fn read_frame(&mut self) -> Result<FrameRead<Mat>> {
        let Some(capture) = self.capture.as_mut() else {
            return Ok(FrameRead::Lost);
        };

        let mut frame = Mat::default();
        if !capture.read(&mut frame)? || frame.empty() {
            return Ok(FrameRead::Lost);
        }

        let frame = FrameUtils::fit(frame, self.config.frame_width, self.config.frame_height)?;
        Ok(FrameRead::Frame(frame))
    }

    fn reconnect(&mut self) -> Result<bool> {
        self.release();
        sleep(self.config.lost_pause());
        self.connect()
    }

    fn snapshot(&self, frame: &Mat, path: &Path) -> Result<bool> {
        FrameUtils::save(frame, path)?;
        Ok(true)
    }
}

impl Drop for StreamCapture {
    fn drop(&mut self) {
        self.release();
        info!("camera released");
    }
}
