use itertools::Itertools;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::config::PlaybackConfig;
use crate::error::LoadError;
use crate::error::RecordError;
use crate::frame_source::FrameSource;
use crate::geometry::Point;
use crate::geometry::centroid;

/// Confidence above which an object is considered locked.
pub const LOCK_CONFIDENCE: f64 = 0.8;

const FIELDS_PER_RECORD: usize = 10;

/// One detection in a frame: a class id, a quadrilateral in normalized
/// space and a confidence score.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedObject {
    pub class_id: i32,
    /// Drawn in order, corner `i` connecting to corner `(i + 1) % 4`.
    pub corners: [Point; 4],
    pub confidence: f64,
}

impl DetectedObject {
    pub fn center(&self) -> Point {
        centroid(&self.corners)
    }

    pub fn corners(&self) -> &[Point; 4] {
        &self.corners
    }

    pub fn is_locked(&self) -> bool {
        self.confidence > LOCK_CONFIDENCE
    }

    /// Parse one whitespace-separated record:
    /// `class x1 y1 x2 y2 x3 y3 x4 y4 confidence`.
    pub fn parse_record(line: &str) -> Result<Self, RecordError> {
        let tokens = line.split_whitespace().collect_vec();
        if tokens.len() != FIELDS_PER_RECORD {
            return Err(RecordError::FieldCount(tokens.len()));
        }

        let mut values = [0.0f64; FIELDS_PER_RECORD];
        for (index, (slot, token)) in values.iter_mut().zip(&tokens).enumerate() {
            *slot = token
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| RecordError::NotNumeric { index, value: token.to_string() })?;
        }

        let class = values[0];
        if class.fract() != 0.0 || class < i32::MIN as f64 || class > i32::MAX as f64 {
            return Err(RecordError::InvalidClassId(class));
        }

        let corner = |i: usize| Point::new(values[1 + 2 * i], values[2 + 2 * i]);
        Ok(Self { class_id: class as i32, corners: [corner(0), corner(1), corner(2), corner(3)], confidence: values[9] })
    }
}

/// Parse a frame's record file. Blank lines are skipped, malformed lines are
/// logged and dropped, and an empty (or whitespace-only) file is an error.
pub fn parse_frame(frame_number: u32, text: &str) -> Result<Vec<DetectedObject>, LoadError> {
    if text.trim().is_empty() {
        return Err(LoadError::EmptyContent(frame_number));
    }

    let objects = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match DetectedObject::parse_record(line) {
            Ok(object) => Some(object),
            Err(e) => {
                warn!(frame_number, line, "Invalid data format: {e}");
                None
            }
        })
        .collect();

    Ok(objects)
}

/// The currently loaded frame and the hover selection.
///
/// A load replaces the object list wholesale. A failed load empties the
/// list but keeps the previous frame number.
#[derive(Debug)]
pub struct FrameStore {
    start_frame: u32,
    end_frame: u32,
    frame_number: u32,
    objects: Vec<DetectedObject>,
    hovered: Option<usize>,
}

impl FrameStore {
    pub fn new(playback: &PlaybackConfig) -> Self {
        Self {
            start_frame: playback.start_frame,
            end_frame: playback.end_frame,
            frame_number: playback.start_frame,
            objects: Vec::new(),
            hovered: None,
        }
    }

    pub fn frame_number(&self) -> u32 {
        self.frame_number
    }

    pub fn objects(&self) -> &[DetectedObject] {
        &self.objects
    }

    pub fn start_frame(&self) -> u32 {
        self.start_frame
    }

    pub fn end_frame(&self) -> u32 {
        self.end_frame
    }

    pub fn contains_frame(&self, frame_number: u32) -> bool {
        (self.start_frame..=self.end_frame).contains(&frame_number)
    }

    /// Fetch and apply a frame synchronously.
    pub fn load(&mut self, source: &dyn FrameSource, frame_number: u32) -> bool {
        debug!(frame_number, address = %source.address(frame_number), "Attempting to load frame");
        let fetched = if self.contains_frame(frame_number) {
            source.fetch(frame_number)
        } else {
            Err(self.out_of_range(frame_number))
        };
        self.apply(frame_number, fetched)
    }

    /// Apply the outcome of retrieving `frame_number`'s record text.
    pub fn apply(&mut self, frame_number: u32, fetched: Result<String, LoadError>) -> bool {
        let parsed = fetched.and_then(|text| {
            if self.contains_frame(frame_number) {
                parse_frame(frame_number, &text)
            } else {
                Err(self.out_of_range(frame_number))
            }
        });

        match parsed {
            Ok(objects) => {
                info!(frame_number, objects = objects.len(), "Loaded frame");
                self.objects = objects;
                self.frame_number = frame_number;
                true
            }
            Err(e) => {
                error!(frame_number, "Error loading frame: {e}");
                self.objects.clear();
                false
            }
        }
    }

    fn out_of_range(&self, frame: u32) -> LoadError {
        LoadError::OutOfRange { frame, start: self.start_frame, end: self.end_frame }
    }

    /// No bounds check here; readers go through [`FrameStore::hovered`].
    pub fn set_hovered(&mut self, index: Option<usize>) {
        self.hovered = index;
    }

    /// The raw stored selection, which may point past the current objects.
    pub fn hovered_raw(&self) -> Option<usize> {
        self.hovered
    }

    /// The selection, or `None` if it is out of range for the current frame.
    pub fn hovered(&self) -> Option<usize> {
        self.hovered.filter(|&i| i < self.objects.len())
    }

    pub fn hovered_object(&self) -> Option<&DetectedObject> {
        self.hovered().map(|i| &self.objects[i])
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::frame_source::FrameSource;

    struct MemorySource(HashMap<u32, String>);

    impl FrameSource for MemorySource {
        fn address(&self, frame_number: u32) -> String {
            format!("memory/{frame_number}")
        }

        fn fetch(&self, frame_number: u32) -> Result<String, LoadError> {
            self.0.get(&frame_number).cloned().ok_or(LoadError::EmptyContent(frame_number))
        }
    }

    fn store() -> FrameStore {
        FrameStore::new(&PlaybackConfig { start_frame: 1, end_frame: 5, frame_rate: 10.0 })
    }

    const TWO_OBJECTS: &str = "4 0.1 0.1 0.2 0.1 0.2 0.2 0.1 0.2 0.95\n0 0 0 1 0 1 1 0 1 0.5\n";

    #[test]
    fn parses_valid_record() {
        let obj = DetectedObject::parse_record("0 0 0 1 0 1 1 0 1 0.5").unwrap();
        assert_eq!(obj.class_id, 0);
        assert_eq!(obj.corners[2], Point::new(1.0, 1.0));
        assert_eq!(obj.confidence, 0.5);
        assert_eq!(obj.center(), Point::new(0.5, 0.5));
        assert!(!obj.is_locked());
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert_eq!(DetectedObject::parse_record("4 0.1 0.2"), Err(RecordError::FieldCount(3)));
        assert_eq!(DetectedObject::parse_record("4 0 0 1 0 1 1 0 1 0.5 9"), Err(RecordError::FieldCount(11)));
    }

    #[test]
    fn rejects_non_numeric_and_fractional_class() {
        assert!(matches!(
            DetectedObject::parse_record("4 0 0 x 0 1 1 0 1 0.5"),
            Err(RecordError::NotNumeric { index: 3, .. })
        ));
        assert!(matches!(DetectedObject::parse_record("4 0 0 1 0 1 1 0 1 NaN"), Err(RecordError::NotNumeric { .. })));
        assert_eq!(DetectedObject::parse_record("4.5 0 0 1 0 1 1 0 1 0.5"), Err(RecordError::InvalidClassId(4.5)));
        assert_eq!(DetectedObject::parse_record("4.0 0 0 1 0 1 1 0 1 0.5").unwrap().class_id, 4);
    }

    #[test]
    fn malformed_lines_are_dropped() {
        let text = "4 0 0 1 0 1 1 0 1 0.9\n\n   \n1 2 3\n0  0 0 1 0 1 1 0 1\t0.3\n";
        let objects = parse_frame(1, text).unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].class_id, 4);
        assert_eq!(objects[1].class_id, 0);
    }

    #[test]
    fn all_malformed_still_loads() {
        let mut store = store();
        let source = MemorySource(HashMap::from([(2, "1 2 3\nnot a record\n".to_string())]));
        assert!(store.load(&source, 2));
        assert_eq!(store.frame_number(), 2);
        assert!(store.objects().is_empty());
    }

    #[test]
    fn empty_file_fails_and_keeps_frame_number() {
        let mut store = store();
        let source = MemorySource(HashMap::from([(1, TWO_OBJECTS.to_string()), (2, "  \n\n".to_string())]));
        assert!(store.load(&source, 1));
        assert_eq!(store.objects().len(), 2);

        assert!(!store.load(&source, 2));
        assert_eq!(store.frame_number(), 1);
        assert!(store.objects().is_empty());
    }

    #[test]
    fn missing_frame_fails() {
        let mut store = store();
        let source = MemorySource(HashMap::new());
        assert!(!store.load(&source, 3));
        assert_eq!(store.frame_number(), 1);
    }

    #[test]
    fn out_of_range_frames_are_rejected() {
        let mut store = store();
        let source = MemorySource(HashMap::from([(6, TWO_OBJECTS.to_string())]));
        assert!(!store.load(&source, 6));
        assert_eq!(store.frame_number(), 1);
        assert!(!store.apply(0, Ok(TWO_OBJECTS.to_string())));
        assert_eq!(store.frame_number(), 1);
    }

    #[test]
    fn reloading_a_frame_is_idempotent() {
        let mut store = store();
        let source = MemorySource(HashMap::from([(3, TWO_OBJECTS.to_string())]));
        assert!(store.load(&source, 3));
        let first = store.objects().to_vec();
        assert!(store.load(&source, 3));
        assert_eq!(store.objects(), first.as_slice());
    }

    #[test]
    fn stale_hover_reads_as_none() {
        let mut store = store();
        store.apply(1, Ok(TWO_OBJECTS.to_string()));
        store.set_hovered(Some(1));
        assert_eq!(store.hovered(), Some(1));

        store.apply(2, Ok("4 0 0 1 0 1 1 0 1 0.9".to_string()));
        assert_eq!(store.hovered_raw(), Some(1));
        assert_eq!(store.hovered(), None);
        assert!(store.hovered_object().is_none());

        store.set_hovered(None);
        assert_eq!(store.hovered_raw(), None);
    }
}
