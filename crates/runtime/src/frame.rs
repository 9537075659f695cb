use foundation::time::Time;

/// Glow cycles per second: the lit window crosses the arc every 4 s.
pub const GLOW_SPEED: f64 = 0.25;

/// Wraps elapsed seconds into the `[0, 1)` glow time parameter.
///
/// Negative or non-finite input is treated as zero elapsed time.
pub fn glow_time(elapsed_s: f64, speed: f64) -> f64 {
    let scaled = elapsed_s * speed;
    if !scaled.is_finite() || scaled <= 0.0 {
        return 0.0;
    }
    let wrapped = scaled % 1.0;
    // `%` keeps the result below 1.0 for finite input; guard the boundary anyway.
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

/// Per-tick frame metadata handed to the renderer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Seconds since the first tick.
    pub elapsed_s: f64,
    /// Wrapped glow time in `[0, 1)`.
    pub glow_time: f64,
}

/// Monotonic wall-clock driven animation time.
///
/// The first observed timestamp becomes the origin; host timestamps that go
/// backwards never move elapsed time backwards.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AnimationClock {
    speed: f64,
    origin: Option<Time>,
    elapsed_s: f64,
    next_index: u64,
}

impl AnimationClock {
    pub fn new(speed: f64) -> Self {
        Self {
            speed,
            origin: None,
            elapsed_s: 0.0,
            next_index: 0,
        }
    }

    pub fn elapsed_s(&self) -> f64 {
        self.elapsed_s
    }

    /// Advances to the host timestamp `now` and returns the frame to draw.
    pub fn tick(&mut self, now: Time) -> Frame {
        let origin = *self.origin.get_or_insert(now);
        self.elapsed_s = self.elapsed_s.max(now.since(origin));

        let frame = Frame {
            index: self.next_index,
            elapsed_s: self.elapsed_s,
            glow_time: glow_time(self.elapsed_s, self.speed),
        };
        self.next_index = self.next_index.wrapping_add(1);
        frame
    }

    /// Frame at a fixed elapsed time, without advancing the clock.
    pub fn frame_at(&self, elapsed_s: f64) -> Frame {
        let elapsed_s = elapsed_s.max(0.0);
        Frame {
            index: self.next_index,
            elapsed_s,
            glow_time: glow_time(elapsed_s, self.speed),
        }
    }
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::new(GLOW_SPEED)
    }
}

#[cfg(test)]
mod tests {
    use super::{AnimationClock, GLOW_SPEED, glow_time};
    use foundation::time::Time;

    #[test]
    fn glow_time_wraps_every_four_seconds() {
        assert_eq!(glow_time(0.0, GLOW_SPEED), 0.0);
        assert_eq!(glow_time(1.0, GLOW_SPEED), 0.25);
        assert_eq!(glow_time(4.0, GLOW_SPEED), 0.0);
        assert_eq!(glow_time(6.0, GLOW_SPEED), 0.5);
    }

    #[test]
    fn glow_time_stays_in_unit_interval() {
        let mut t = 0.0;
        while t < 500.0 {
            let g = glow_time(t, GLOW_SPEED);
            assert!((0.0..1.0).contains(&g), "t = {t} gave {g}");
            t += 0.037;
        }
        for t in [1e12, f64::MAX, f64::INFINITY, f64::NAN, -3.0] {
            let g = glow_time(t, GLOW_SPEED);
            assert!((0.0..1.0).contains(&g), "t = {t} gave {g}");
        }
    }

    #[test]
    fn first_tick_is_the_origin() {
        let mut clock = AnimationClock::default();
        let f0 = clock.tick(Time(12.0));
        assert_eq!(f0.index, 0);
        assert_eq!(f0.elapsed_s, 0.0);
        assert_eq!(f0.glow_time, 0.0);

        let f1 = clock.tick(Time(14.0));
        assert_eq!(f1.index, 1);
        assert_eq!(f1.elapsed_s, 2.0);
        assert_eq!(f1.glow_time, 0.5);
    }

    #[test]
    fn elapsed_time_never_goes_backwards() {
        let mut clock = AnimationClock::default();
        clock.tick(Time(10.0));
        clock.tick(Time(13.0));
        let f = clock.tick(Time(11.0));
        assert_eq!(f.elapsed_s, 3.0);
        assert_eq!(clock.elapsed_s(), 3.0);
    }

    #[test]
    fn frame_at_does_not_advance() {
        let mut clock = AnimationClock::default();
        clock.tick(Time(0.0));
        let f = clock.frame_at(5.0);
        assert_eq!(f.glow_time, 0.25);
        assert_eq!(f.index, 1);
        assert_eq!(clock.elapsed_s(), 0.0);
        assert_eq!(clock.frame_at(-1.0).elapsed_s, 0.0);
    }
}
