//! YOLO inference through OpenCV's DNN module

use super::config::DetectionConfig;
use super::decode::RawOutput;
use crate::bbox::BBoxCollection;
use crate::traits::Detector;
use crate::Result;
use anyhow::Context;
use opencv::{
    core::{self, Mat, Scalar, Size, Vector},
    dnn::{self, Net},
    prelude::*,
};
use tracing::info;

pub struct YoloDetector {
    net: Net,
    out_names: Vector<String>,
    config: DetectionConfig,
}

impl YoloDetector {
    /// Load the network described by `config`
    pub fn new(config: DetectionConfig) -> Result<Self> {
        let model = config.model_path.to_string_lossy().to_string();
        let mut net = match &config.model_config {
            Some(cfg) => dnn::read_net_from_darknet(&cfg.to_string_lossy(), &model),
            None => dnn::read_net(&model, "", ""),
        }
        .with_context(|| format!("Failed to load model: {model}"))?;

        net.set_preferable_backend(dnn::DNN_BACKEND_OPENCV)?;
        net.set_preferable_target(dnn::DNN_TARGET_CPU)?;

        let out_layers = net.get_unconnected_out_layers()?;
        let layer_names = net.get_layer_names()?;
        let mut out_names = Vector::<String>::new();
        for i in out_layers.iter() {
            let name = layer_names.get(i as usize - 1)?;
            out_names.push(name.as_str());
        }

        info!(model = %model, class = config.target_name(), "model loaded");
        Ok(Self {
            net,
            out_names,
            config,
        })
    }

    /// Darknet reports coordinates normalized to the frame; ONNX exports
    /// report them in input-blob pixels.
    fn coordinate_scale(&self, frame: &Mat) -> (f32, f32) {
        let (frame_w, frame_h) = (frame.cols() as f32, frame.rows() as f32);
        if self.config.model_config.is_some() {
            (frame_w, frame_h)
        } else {
            let input = self.config.input_size as f32;
            (frame_w / input, frame_h / input)
        }
    }

    fn parse(&self, outputs: &Vector<Mat>, frame: &Mat, confidence: f64) -> Result<BBoxCollection> {
        let scale = self.coordinate_scale(frame);
        let mut boxes = BBoxCollection::new();

        for output in outputs.iter() {
            let Some(view) = tensor_view(&output)? else {
                continue;
            };
            for bbox in view.decode(scale, confidence, &self.config) {
                boxes.push(bbox);
            }
        }

        Ok(boxes
            .apply_class_nms(self.config.nms_threshold)
            .into_iter()
            .take(self.config.max_detections)
            .collect())
    }
}

/// View an output blob as a matrix over its last axis.
fn tensor_view(output: &Mat) -> Result<Option<RawOutput<'_>>> {
    let sizes = output.mat_size();
    let cols = match sizes.last() {
        Some(&cols) if cols > 0 => cols as usize,
        _ => return Ok(None),
    };
    let data = output.data_typed::<f32>()?;
    Ok(RawOutput::new(data, data.len() / cols, cols))
}

impl Detector<Mat> for YoloDetector {
    fn detect(&mut self, frame: &Mat, confidence: f64) -> Result<BBoxCollection> {
        let size = self.config.input_size;
        let blob = dnn::blob_from_image(
            frame,
            1.0 / 255.0,
            Size::new(size, size),
            Scalar::default(),
            true,
            false,
            core::CV_32F,
        )?;
        self.net.set_input(&blob, "", 1.0, Scalar::default())?;

        let mut outputs = Vector::<Mat>::new();
        self.net.forward(&mut outputs, &self.out_names)?;

        self.parse(&outputs, frame, confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::decode::OutputLayout;

    fn blob(shape: &[i32], values: &[f32]) -> Mat {
        let mut mat = Mat::new_nd_with_default(shape, core::CV_32F, Scalar::all(0.0)).unwrap();
        mat.data_typed_mut::<f32>().unwrap().copy_from_slice(values);
        mat
    }

    #[test]
    fn views_v8_head_as_columns() {
        // 4 box channels + 2 classes, 8 candidates
        let mut values = vec![0.0f32; 6 * 8];
        for (channel, value) in [320.0, 320.0, 64.0, 64.0, 0.9, 0.1].into_iter().enumerate() {
            values[channel * 8] = value;
        }
        let mat = blob(&[1, 6, 8], &values);

        let view = tensor_view(&mat).unwrap().unwrap();
        assert_eq!(view.layout(), OutputLayout::ChannelsFirst);
        let boxes: Vec<_> = view
            .decode((0.5, 0.5), 0.25, &DetectionConfig::lavender_disease())
            .into_iter()
            .collect();
        assert_eq!(boxes.len(), 1);
        assert_eq!((boxes[0].x, boxes[0].width, boxes[0].class_id), (144, 32, 0));
    }

    #[test]
    fn views_v5_head_as_rows() {
        // 8 candidates of [cx, cy, w, h, obj, 2 classes]
        let mut values = vec![0.0f32; 8 * 7];
        values[..7].copy_from_slice(&[160.0, 160.0, 32.0, 32.0, 0.8, 0.2, 0.9]);
        let mat = blob(&[1, 8, 7], &values);

        let view = tensor_view(&mat).unwrap().unwrap();
        assert_eq!(view.layout(), OutputLayout::Objectness);
        let boxes: Vec<_> = view
            .decode((1.0, 1.0), 0.25, &DetectionConfig::lavender_disease())
            .into_iter()
            .collect();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].class_id, 1);
        assert!((boxes[0].confidence - 0.8 * 0.9).abs() < 1e-6);
    }
}
