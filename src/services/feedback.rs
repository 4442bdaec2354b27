//! Audio / animation triggers. Fire-and-forget: nothing reports back.

use crate::core::types::{EntityId, Vec2};

pub trait FeedbackSink {
    fn play_sound(&mut self, address: &str, at: Vec2);
    fn trigger_animation(&mut self, entity: EntityId, name: &str);
}

/// Writes triggers to the trace log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFeedback;

impl FeedbackSink for TracingFeedback {
    fn play_sound(&mut self, address: &str, at: Vec2) {
        tracing::trace!("sound {} at ({:.1}, {:.1})", address, at.x, at.y);
    }

    fn trigger_animation(&mut self, entity: EntityId, name: &str) {
        tracing::trace!("animation {} on {}", name, entity);
    }
}
