//! Bounding box operations and non-maximum suppression
//!
//! Detector output is reduced to these boxes before anything downstream
//! looks at it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single detection: box, class and score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub confidence: f64,
    pub class_id: u32,
    #[serde(default)]
    pub label: String,
}

impl BBox {
    /// Create a new bounding box
    pub fn new(x: i32, y: i32, width: i32, height: i32, confidence: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            confidence,
            class_id: 0,
            label: String::new(),
        }
    }

    /// Set class information
    pub fn with_class(mut self, class_id: u32, label: impl Into<String>) -> Self {
        self.class_id = class_id;
        self.label = label.into();
        self
    }

    pub fn area(&self) -> f64 {
        (self.width.max(0) as f64) * (self.height.max(0) as f64)
    }

    /// Calculate intersection over union (IoU) with another box
    pub fn iou(&self, other: &BBox) -> f64 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }

        let intersection = ((x2 - x1) as f64) * ((y2 - y1) as f64);
        let union = self.area() + other.area() - intersection;

        intersection / union
    }

    pub fn overlaps(&self, other: &BBox, threshold: f64) -> bool {
        self.iou(other) > threshold
    }
}

/// Collection of bounding boxes with batch operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BBoxCollection {
    boxes: Vec<BBox>,
}

impl BBoxCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(boxes: Vec<BBox>) -> Self {
        Self { boxes }
    }

    pub fn push(&mut self, bbox: BBox) {
        self.boxes.push(bbox);
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Sort by confidence (descending)
    pub fn sort_by_confidence(&mut self) {
        self.boxes
            .sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    }

    /// Keep boxes scoring at or above `threshold`
    pub fn filter_by_confidence(mut self, threshold: f64) -> Self {
        self.boxes.retain(|bbox| bbox.confidence >= threshold);
        self
    }

    /// Number of `class_id` boxes scoring at or above `threshold`
    pub fn count_confident(&self, class_id: u32, threshold: f64) -> usize {
        self.boxes
            .iter()
            .filter(|bbox| bbox.class_id == class_id && bbox.confidence >= threshold)
            .count()
    }

    /// Apply non-maximum suppression
    pub fn apply_nms(mut self, threshold: f64) -> Self {
        if self.boxes.is_empty() {
            return self;
        }

        self.sort_by_confidence();

        let mut keep = Vec::new();
        let mut suppressed = vec![false; self.boxes.len()];

        for i in 0..self.boxes.len() {
            if suppressed[i] {
                continue;
            }

            keep.push(self.boxes[i].clone());

            for j in (i + 1)..self.boxes.len() {
                if !suppressed[j] && self.boxes[i].overlaps(&self.boxes[j], threshold) {
                    suppressed[j] = true;
                }
            }
        }

        Self::from_vec(keep)
    }

    /// Apply class-aware NMS (NMS within each class)
    pub fn apply_class_nms(self, threshold: f64) -> Self {
        let mut class_groups: HashMap<u32, Vec<BBox>> = HashMap::new();

        for bbox in self.boxes {
            class_groups.entry(bbox.class_id).or_default().push(bbox);
        }

        let mut result = Vec::new();
        for (_, boxes) in class_groups {
            result.extend(BBoxCollection::from_vec(boxes).apply_nms(threshold).boxes);
        }

        let mut collection = Self::from_vec(result);
        collection.sort_by_confidence();
        collection
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BBox> {
        self.boxes.iter()
    }
}

impl IntoIterator for BBoxCollection {
    type Item = BBox;
    type IntoIter = std::vec::IntoIter<BBox>;

    fn into_iter(self) -> Self::IntoIter {
        self.boxes.into_iter()
    }
}

impl FromIterator<BBox> for BBoxCollection {
    fn from_iter<T: IntoIterator<Item = BBox>>(iter: T) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}
