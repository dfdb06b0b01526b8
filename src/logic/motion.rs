//! Motion Density Window
//!
//! Keeps the last `window_size` motion flags and reports when too many of
//! them are set. This is a rule-based signal that runs alongside the
//! statistical model and overrides its verdict.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MOTION_THRESHOLD, DEFAULT_WINDOW_SIZE};

/// Motion window configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Number of recent flags kept
    pub window_size: usize,

    /// Flags set within the window that count as excessive
    pub threshold: u32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            threshold: DEFAULT_MOTION_THRESHOLD,
        }
    }
}

/// Sliding FIFO of motion flags
#[derive(Debug, Clone)]
pub struct MotionTracker {
    config: MotionConfig,
    history: VecDeque<u8>,
}

impl MotionTracker {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            history: VecDeque::with_capacity(config.window_size + 1),
        }
    }

    /// Push a flag, evicting the oldest one once the window is full.
    /// Any non-zero value counts as motion.
    pub fn update(&mut self, motion: u8) {
        self.history.push_back(u8::from(motion != 0));

        if self.history.len() > self.config.window_size {
            self.history.pop_front();
        }
    }

    /// Motion events currently in the window
    pub fn motion_count(&self) -> u32 {
        self.history.iter().map(|&m| u32::from(m)).sum()
    }

    pub fn is_excessive(&self) -> bool {
        self.motion_count() >= self.config.threshold
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn config(&self) -> MotionConfig {
        self.config
    }

    /// Window contents, oldest first
    pub fn history(&self) -> impl Iterator<Item = u8> + '_ {
        self.history.iter().copied()
    }
}

impl Default for MotionTracker {
    fn default() -> Self {
        Self::new(MotionConfig::default())
    }
}
