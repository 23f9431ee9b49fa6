use pvt_core::{Point, Target, Timestamp};

/// The trial currently being presented.
///
/// Re-armed in place after a false start; replaced by the next index after a hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    /// 1-based.
    pub index: u32,
    pub practice: bool,
    /// When the stimulus became visible.
    pub armed_at: Option<Timestamp>,
    pub target: Option<Target>,
}

impl Trial {
    pub fn new(index: u32, practice: bool) -> Self {
        Self {
            index,
            practice,
            armed_at: None,
            target: None,
        }
    }

    pub fn arm(&mut self, at: Timestamp, position: Point, radius: f32) {
        self.armed_at = Some(at);
        self.target = Some(Target { position, radius });
    }

    pub fn disarm(&mut self) {
        self.armed_at = None;
        self.target = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed_at.is_some()
    }
}
