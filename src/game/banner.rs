//! Save status banners
//!
//! A banner is a line of text shown for a fixed number of frames. The world
//! draws the success banner sliding in from above and out to the right; the
//! error banner just sits in the corner until it expires.

#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub text: String,
    /// Frames left on screen
    remaining: u32,
    /// Frames the banner was shown for in total
    duration: u32,
}

impl Banner {
    pub fn new(text: String, duration: u32) -> Self {
        Self {
            text,
            remaining: duration,
            duration,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_visible(&self) -> bool {
        self.remaining > 0
    }

    /// Count one drawn frame
    pub fn advance(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    /// Placement factors for the current frame as `(x, y)`.
    ///
    /// `x` is the share of the banner's width pulled in from the right edge
    /// (1 = fully visible). `y` is the vertical offset in banner heights
    /// (0 = resting, negative = above the top edge). The first and last
    /// `fps / 2` frames animate quadratically.
    pub fn slide(&self, fps: u32) -> (f32, f32) {
        let slide_len = fps / 2;
        if slide_len == 0 {
            return (1.0, 0.0);
        }

        let shown = self.duration.saturating_sub(self.remaining);
        if shown < slide_len {
            let progress = shown as f32 / slide_len as f32;
            (1.0, -((progress - 1.0) * (progress - 1.0)))
        } else if self.remaining < slide_len {
            let progress = self.remaining as f32 / slide_len as f32;
            (progress * progress, 0.0)
        } else {
            (1.0, 0.0)
        }
    }
}
