// This file is part of haarface, a pure Rust face detection and recognition library
// built on Haar feature cascades and Fisherfaces.
//
// You can redistribute haarface source codes and/or modify it under the terms
// of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

use std::str::FromStr;

use log::{debug, warn};
use quick_xml::events::Event;
use quick_xml::Reader;

use super::{CascadeModel, Feature, Stage, WeakClassifier, WeightedRect};
use crate::error::{Error, Result};

/// Minimal element tree; cascade files carry no attributes we care about.
#[derive(Debug, Default)]
struct XmlNode {
    name: String,
    text: String,
    children: Vec<XmlNode>,
}

impl XmlNode {
    fn named(name: String) -> Self {
        XmlNode {
            name,
            ..XmlNode::default()
        }
    }

    fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    fn require(&self, name: &str) -> Result<&XmlNode> {
        self.child(name)
            .ok_or_else(|| Error::Parse(format!("<{}> is missing <{}>", self.name, name)))
    }

    /// Anonymous list items, written as `<_>` by OpenCV.
    fn items(&self) -> impl Iterator<Item = &XmlNode> {
        self.children.iter().filter(|c| c.name == "_")
    }

    fn value(&self) -> &str {
        self.text.trim()
    }

    fn parse<T: FromStr>(&self) -> Result<T> {
        self.value().parse::<T>().map_err(|_| {
            Error::Parse(format!("<{}> has illegal value '{}'", self.name, self.value()))
        })
    }

    fn numbers(&self) -> Result<Vec<f64>> {
        self.value()
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|_| {
                    Error::Parse(format!("<{}> has illegal number '{}'", self.name, token))
                })
            })
            .collect()
    }
}

fn malformed(position: usize, error: quick_xml::Error) -> Error {
    Error::Parse(format!("malformed XML at byte {}: {}", position, error))
}

fn parse_tree(text: &str) -> Result<XmlNode> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| malformed(reader.buffer_position(), e))?;
        match event {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                stack.push(XmlNode::named(name));
            }
            Event::Empty(e) => {
                let node = XmlNode::named(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root = root.or(Some(node)),
                }
            }
            Event::Text(t) => {
                if let Some(node) = stack.last_mut() {
                    let text = t
                        .unescape()
                        .map_err(|e| malformed(reader.buffer_position(), e))?;
                    node.text.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| Error::Parse("unbalanced closing tag".to_string()))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root = root.or(Some(node)),
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(Error::Parse("unexpected end of document".to_string()));
    }
    root.ok_or_else(|| Error::Parse("empty document".to_string()))
}

/// Builds a [`CascadeModel`] from an OpenCV cascade description
/// (global feature table variant).
pub(super) struct CascadeReader<'a> {
    description: &'a str,
    deep_trees: usize,
}

impl<'a> CascadeReader<'a> {
    pub fn new(description: &'a str) -> Self {
        CascadeReader {
            description,
            deep_trees: 0,
        }
    }

    pub fn read(mut self) -> Result<CascadeModel> {
        let root = parse_tree(self.description)?;
        let cascade = root
            .children
            .first()
            .ok_or_else(|| Error::Parse(format!("<{}> holds no cascade", root.name)))?;

        if let Some(stage_type) = cascade.child("stageType") {
            if stage_type.value() != "BOOST" {
                return Err(Error::Parse(format!(
                    "unsupported stage type '{}'",
                    stage_type.value()
                )));
            }
        }
        if let Some(feature_type) = cascade.child("featureType") {
            if feature_type.value() != "HAAR" {
                return Err(Error::Parse(format!(
                    "unsupported feature type '{}'",
                    feature_type.value()
                )));
            }
        }

        let base_width: u32 = cascade.require("width")?.parse()?;
        let base_height: u32 = cascade.require("height")?.parse()?;

        let features = cascade
            .require("features")?
            .items()
            .map(Self::read_feature)
            .collect::<Result<Vec<_>>>()?;

        let mut stages = Vec::new();
        for stage in cascade.require("stages")?.items() {
            stages.push(self.read_stage(stage)?);
        }

        if self.deep_trees > 0 {
            warn!(
                "{} weak classifiers describe trees deeper than one split; only the root split is evaluated",
                self.deep_trees
            );
        }

        let model = CascadeModel::new(base_width, base_height, stages, features)?;
        debug!(
            "Loaded cascade with {}x{} base window, {} stages, {} features",
            model.base_width(),
            model.base_height(),
            model.stages().len(),
            model.features().len()
        );
        Ok(model)
    }

    fn read_stage(&mut self, node: &XmlNode) -> Result<Stage> {
        let threshold: f64 = node.require("stageThreshold")?.parse()?;
        let mut weak_classifiers = Vec::new();
        for wc in node.require("weakClassifiers")?.items() {
            weak_classifiers.push(self.read_weak_classifier(wc)?);
        }
        Ok(Stage::new(threshold, weak_classifiers))
    }

    fn read_weak_classifier(&mut self, node: &XmlNode) -> Result<WeakClassifier> {
        let internal_nodes = node.require("internalNodes")?.numbers()?;
        if internal_nodes.len() < 4 {
            return Err(Error::Parse(format!(
                "<internalNodes> needs 4 values, found {}",
                internal_nodes.len()
            )));
        }

        let (left_value, right_value) = match node.child("leafValues") {
            Some(leaves) => {
                let leaf_values = leaves.numbers()?;
                if leaf_values.len() < 2 {
                    return Err(Error::Parse(format!(
                        "<leafValues> needs 2 values, found {}",
                        leaf_values.len()
                    )));
                }
                if leaf_values.len() > 2 || internal_nodes.len() > 4 {
                    self.deep_trees += 1;
                }
                (leaf_values[0], leaf_values[1])
            }
            None => {
                if internal_nodes.len() > 4 {
                    self.deep_trees += 1;
                }
                (internal_nodes[0], internal_nodes[1])
            }
        };

        let raw_index = internal_nodes[2];
        if raw_index < 0.0 || raw_index.fract() != 0.0 {
            return Err(Error::Parse(format!("illegal feature index {}", raw_index)));
        }

        Ok(WeakClassifier::new(
            raw_index as usize,
            internal_nodes[3],
            left_value,
            right_value,
        ))
    }

    fn read_feature(node: &XmlNode) -> Result<Feature> {
        let mut rects = Vec::new();
        for rect in node.require("rects")?.items() {
            let values = rect.numbers()?;
            if values.len() != 5 {
                return Err(Error::Parse(format!(
                    "feature rectangle needs 5 values, found {}",
                    values.len()
                )));
            }
            for v in &values[..4] {
                if v.fract() != 0.0 {
                    return Err(Error::Parse(format!(
                        "feature rectangle has fractional coordinate {}",
                        v
                    )));
                }
            }
            rects.push(WeightedRect::new(
                values[0] as i32,
                values[1] as i32,
                values[2] as i32,
                values[3] as i32,
                values[4],
            ));
        }
        if rects.is_empty() {
            return Err(Error::Parse("feature without rectangles".to_string()));
        }

        let tilted = match node.child("tilted").map(XmlNode::value) {
            None | Some("0") => false,
            Some("1") => true,
            Some(other) => {
                return Err(Error::Parse(format!("illegal tilted flag '{}'", other)));
            }
        };

        Ok(Feature::new(rects, tilted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASCADE: &str = r#"<?xml version="1.0"?>
<opencv_storage>
<cascade type_id="opencv-cascade-classifier"><stageType>BOOST</stageType>
  <featureType>HAAR</featureType>
  <height>24</height>
  <width>20</width>
  <stageNum>2</stageNum>
  <stages>
    <_>
      <maxWeakCount>2</maxWeakCount>
      <stageThreshold>-1.2500000000000000e+00</stageThreshold>
      <weakClassifiers>
        <_>
          <internalNodes>
            0 -1 1 -3.1511999666690826e-02</internalNodes>
          <leafValues>
            2.0875380039215088e+00 -2.2172100543975830e+00</leafValues></_>
        <_>
          <internalNodes>
            0 -1 0 1.2396000325679779e-02</internalNodes>
          <leafValues>
            -1.8633940219879150e+00 1.3272049427032471e+00</leafValues></_></weakClassifiers></_>
    <_>
      <maxWeakCount>1</maxWeakCount>
      <stageThreshold>3.5</stageThreshold>
      <weakClassifiers>
        <_>
          <internalNodes>
            -1 1 0 5.</internalNodes></_></weakClassifiers></_></stages>
  <features>
    <_>
      <rects>
        <_>
          6 4 12 9 -1.</_>
        <_>
          6 7 12 3 3.</_></rects></_>
    <_>
      <rects>
        <_>
          6 4 12 7 -1.</_>
        <_>
          10 4 4 7 3.</_></rects>
      <tilted>1</tilted></_></features></cascade>
</opencv_storage>
"#;

    #[test]
    fn test_read_cascade() {
        let model = CascadeReader::new(CASCADE).read().unwrap();
        assert_eq!(20, model.base_width());
        assert_eq!(24, model.base_height());
        assert_eq!(2, model.stages().len());
        assert_eq!(2, model.features().len());

        let stage = &model.stages()[0];
        assert_eq!(-1.25, stage.threshold());
        assert_eq!(2, stage.weak_classifiers().len());

        let wc = stage.weak_classifiers()[0];
        assert_eq!(1, wc.feature_index());
        assert_eq!(-3.1511999666690826e-02, wc.threshold());
        assert_eq!(2.0875380039215088e+00, wc.left_value());
        assert_eq!(-2.2172100543975830e+00, wc.right_value());

        let feature = model.feature(0);
        assert!(!feature.is_tilted());
        assert_eq!(WeightedRect::new(6, 4, 12, 9, -1.0), feature.rects()[0]);
        assert_eq!(WeightedRect::new(6, 7, 12, 3, 3.0), feature.rects()[1]);
        assert!(model.feature(1).is_tilted());
        assert!(model.has_tilted_features());
    }

    #[test]
    fn test_leaf_values_from_internal_nodes() {
        let model = CascadeReader::new(CASCADE).read().unwrap();
        let wc = model.stages()[1].weak_classifiers()[0];
        assert_eq!(-1.0, wc.left_value());
        assert_eq!(1.0, wc.right_value());
        assert_eq!(0, wc.feature_index());
        assert_eq!(5.0, wc.threshold());
    }

    #[test]
    fn test_missing_stages() {
        let text = CASCADE.replace("<stages>", "<stagez>").replace("</stages>", "</stagez>");
        assert!(matches!(
            CascadeReader::new(&text).read(),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_short_rectangle() {
        let text = CASCADE.replace("6 7 12 3 3.", "6 7 12 3");
        assert!(matches!(
            CascadeReader::new(&text).read(),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_non_numeric_threshold() {
        let text = CASCADE.replace("<stageThreshold>3.5", "<stageThreshold>three");
        assert!(matches!(
            CascadeReader::new(&text).read(),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_dangling_feature_index() {
        let text = CASCADE.replace("0 -1 1 -3.15", "0 -1 7 -3.15");
        assert!(matches!(
            CascadeReader::new(&text).read(),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_short_internal_nodes() {
        let text = CASCADE.replace("-1 1 0 5.", "-1 1 0");
        assert!(matches!(
            CascadeReader::new(&text).read(),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_unbalanced_document() {
        let text = &CASCADE[..CASCADE.len() / 2];
        assert!(matches!(
            CascadeReader::new(text).read(),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_mismatched_closing_tag() {
        let text = "<opencv_storage><cascade><width>24</width></height></cascade></opencv_storage>";
        assert!(matches!(
            CascadeReader::new(text).read(),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_bad_entity() {
        let text = CASCADE.replace("<width>20</width>", "<width>2&bogus;0</width>");
        assert!(matches!(
            CascadeReader::new(&text).read(),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_unsupported_feature_type() {
        let text = CASCADE.replace("<featureType>HAAR", "<featureType>LBP");
        assert!(matches!(
            CascadeReader::new(&text).read(),
            Err(Error::Parse(_))
        ));
    }
}
