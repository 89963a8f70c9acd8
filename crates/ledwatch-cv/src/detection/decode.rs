//! Raw YOLO output tensors to boxes
//!
//! Two head layouts are in circulation. Darknet and YOLOv5 emit one row per
//! candidate with an objectness column. YOLOv8 and later emit
//! `[1, 4 + classes, candidates]`: one column per candidate, no objectness.

use super::config::DetectionConfig;
use crate::bbox::{BBox, BBoxCollection};

/// How candidates are laid out in an output tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    /// One row per candidate: `[cx, cy, w, h, objectness, class scores...]`.
    Objectness,
    /// One column per candidate: `[cx, cy, w, h, class scores...]` down the rows.
    ChannelsFirst,
}

impl OutputLayout {
    /// Channel count is always far below the candidate count, so the shorter
    /// axis holds the channels.
    pub fn infer(rows: usize, cols: usize) -> Self {
        if rows < cols {
            OutputLayout::ChannelsFirst
        } else {
            OutputLayout::Objectness
        }
    }

    fn first_class(self) -> usize {
        match self {
            OutputLayout::Objectness => 5,
            OutputLayout::ChannelsFirst => 4,
        }
    }
}

/// An output tensor viewed as a `rows x cols` matrix.
#[derive(Debug, Clone, Copy)]
pub struct RawOutput<'a> {
    data: &'a [f32],
    rows: usize,
    cols: usize,
    layout: OutputLayout,
}

impl<'a> RawOutput<'a> {
    /// `None` when the shape does not match the data.
    pub fn new(data: &'a [f32], rows: usize, cols: usize) -> Option<Self> {
        if rows.checked_mul(cols)? != data.len() {
            return None;
        }
        Some(Self {
            data,
            rows,
            cols,
            layout: OutputLayout::infer(rows, cols),
        })
    }

    pub fn with_layout(mut self, layout: OutputLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn layout(&self) -> OutputLayout {
        self.layout
    }

    fn candidates(&self) -> usize {
        match self.layout {
            OutputLayout::Objectness => self.rows,
            OutputLayout::ChannelsFirst => self.cols,
        }
    }

    fn channels(&self) -> usize {
        match self.layout {
            OutputLayout::Objectness => self.cols,
            OutputLayout::ChannelsFirst => self.rows,
        }
    }

    fn value(&self, candidate: usize, channel: usize) -> f32 {
        match self.layout {
            OutputLayout::Objectness => self.data[candidate * self.cols + channel],
            OutputLayout::ChannelsFirst => self.data[channel * self.cols + candidate],
        }
    }

    /// Boxes scoring at or above `confidence`, before NMS.
    ///
    /// `scale` maps tensor coordinates to frame pixels. Objectness rows
    /// are scored as objectness times the best class score.
    pub fn decode(
        &self,
        scale: (f32, f32),
        confidence: f64,
        config: &DetectionConfig,
    ) -> BBoxCollection {
        let first_class = self.layout.first_class();
        let channels = self.channels();
        let mut boxes = BBoxCollection::new();
        if channels <= first_class {
            return boxes;
        }

        for candidate in 0..self.candidates() {
            let objectness = match self.layout {
                OutputLayout::Objectness => self.value(candidate, 4) as f64,
                OutputLayout::ChannelsFirst => 1.0,
            };
            if objectness < confidence {
                continue;
            }

            let (class, class_score) = (first_class..channels)
                .map(|channel| (channel - first_class, self.value(candidate, channel)))
                .fold((0, f32::MIN), |best, item| if item.1 > best.1 { item } else { best });
            let score = objectness * class_score as f64;
            if score < confidence {
                continue;
            }

            let w = self.value(candidate, 2) * scale.0;
            let h = self.value(candidate, 3) * scale.1;
            let x = self.value(candidate, 0) * scale.0 - w / 2.0;
            let y = self.value(candidate, 1) * scale.1 - h / 2.0;
            let class_id = class as u32;
            boxes.push(
                BBox::new(x as i32, y as i32, w as i32, h as i32, score)
                    .with_class(class_id, config.class_name(class_id)),
            );
        }

        boxes
    }
}
