//! Per-frame subject motion: spin, scale pulse, tint easing and morph glow
//!
//! All rates are authored per frame at 60 Hz and rescaled by the real frame
//! time, so the feel does not depend on the display refresh rate.

use crate::rng::XorShift32;
use studio_core::{Color, Mat4, Transform, Vec3};

/// Rate the per-frame constants are authored at
pub const REFERENCE_FPS: f32 = 60.0;

/// Impulse added by one rotate click or arrow key (radians)
pub const IMPULSE_STEP: f32 = 0.1;
pub const IMPULSE_DAMPING: f32 = 0.8;
pub const IMPULSE_EPSILON: f32 = 0.001;

/// Idle spin in radians per reference frame
pub const IDLE_RATE: f32 = 0.002;
pub const IDLE_RATE_HOVERED: f32 = 0.007;

pub const MORPH_DECAY: f32 = 0.94;
pub const MORPH_CUTOFF: f32 = 0.01;

pub const HOVER_SCALE: f32 = 1.05;
pub const MORPH_SCALE_AMPLITUDE: f32 = 0.05;
pub const SCALE_EASE: f32 = 0.1;
pub const COLOR_EASE: f32 = 0.06;

/// Jitter only runs while the morph is above this level
pub const JITTER_THRESHOLD: f32 = 0.1;
pub const JITTER_AMPLITUDE: f32 = 0.005;

/// Morph glow color (`#D4AF37`)
pub const MORPH_GLOW: u32 = 0xD4AF37;

/// Reference-frame count covered by `dt` seconds
fn frames(dt: f32) -> f32 {
    (dt * REFERENCE_FPS).max(0.0)
}

/// Per-frame multiplier `factor` compounded over `dt` seconds
pub fn decay_factor(factor: f32, dt: f32) -> f32 {
    factor.powf(frames(dt))
}

/// Multiply by `factor` per reference frame, snapping to zero below `epsilon`
pub fn damp(value: f32, factor: f32, epsilon: f32, dt: f32) -> f32 {
    let next = value * decay_factor(factor, dt);
    if next.abs() < epsilon {
        0.0
    } else {
        next
    }
}

/// Fraction of the remaining distance covered in `dt` when each reference
/// frame covers `rate` of it
pub fn ease_fraction(rate: f32, dt: f32) -> f32 {
    1.0 - (1.0 - rate).powf(frames(dt))
}

/// Linear interpolation toward `target`, `rate` per reference frame
pub fn ease_toward(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    current + (target - current) * ease_fraction(rate, dt)
}

pub fn ease_color(current: Color, target: Color, rate: f32, dt: f32) -> Color {
    current.lerp(&target, ease_fraction(rate, dt))
}

/// Scale the subject eases toward
pub fn target_scale(hovered: bool, morph: f32) -> f32 {
    let base = if hovered { HOVER_SCALE } else { 1.0 };
    base * (1.0 + (morph * std::f32::consts::PI).sin() * MORPH_SCALE_AMPLITUDE)
}

/// Animated state of the subject
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubjectMotion {
    /// Spin about +Y, radians
    pub rotation: f32,
    /// Pending manual spin, radians per reference frame
    pub impulse: f32,
    /// Morph pulse, 1 right after an appearance change, decays to 0
    pub morph: f32,
    pub scale: f32,
    /// Current subject color (sRGB)
    pub color: Color,
    /// Color the subject eases toward
    pub target_color: Color,
    /// x/z offset while the morph is strong
    pub jitter: [f32; 2],
}

impl SubjectMotion {
    /// At rest, showing `color`
    pub fn new(color: Color) -> Self {
        Self {
            rotation: 0.0,
            impulse: 0.0,
            morph: 0.0,
            scale: 1.0,
            color,
            target_color: color,
            jitter: [0.0, 0.0],
        }
    }

    pub fn push_impulse(&mut self, amount: f32) {
        self.impulse += amount;
    }

    /// Restart the morph pulse at full strength
    pub fn pulse(&mut self) {
        self.morph = 1.0;
    }

    /// Glow added on top of the subject color
    pub fn emissive(&self) -> Color {
        Color::from_hex(MORPH_GLOW).scaled(self.morph * 2.0)
    }

    /// Spin, pulse scale and jitter as a model matrix
    pub fn model_matrix(&self) -> Mat4 {
        Transform::from_position(Vec3::new(self.jitter[0], 0.0, self.jitter[1]))
            .with_rotation(Vec3::new(0.0, self.rotation.to_degrees(), 0.0))
            .with_uniform_scale(self.scale)
            .to_matrix()
    }
}

impl Default for SubjectMotion {
    fn default() -> Self {
        Self::new(Color::WHITE)
    }
}

/// Step the motion by `dt` seconds
pub fn advance(state: SubjectMotion, dt: f32, hovered: bool, rng: &mut XorShift32) -> SubjectMotion {
    let mut next = state;

    // Total spin from an impulse is impulse / (1 - damping) regardless of dt
    let impulse_share = (1.0 - decay_factor(IMPULSE_DAMPING, dt)) / (1.0 - IMPULSE_DAMPING);
    next.rotation += state.impulse * impulse_share;
    next.impulse = damp(state.impulse, IMPULSE_DAMPING, IMPULSE_EPSILON, dt);

    let idle = if hovered { IDLE_RATE_HOVERED } else { IDLE_RATE };
    next.rotation += idle * frames(dt);

    next.morph = if state.morph > MORPH_CUTOFF {
        state.morph * decay_factor(MORPH_DECAY, dt)
    } else {
        0.0
    };

    next.scale = ease_toward(state.scale, target_scale(hovered, next.morph), SCALE_EASE, dt);
    next.color = ease_color(state.color, state.target_color, COLOR_EASE, dt);

    next.jitter = if next.morph > JITTER_THRESHOLD {
        let amp = JITTER_AMPLITUDE * next.morph;
        [rng.next_signed() * amp, rng.next_signed() * amp]
    } else {
        [0.0, 0.0]
    };

    next
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn impulse_decays_by_damping_per_frame() {
        let mut rng = XorShift32::default();
        let mut m = SubjectMotion::default();
        m.push_impulse(IMPULSE_STEP);
        let next = advance(m, FRAME, false, &mut rng);
        assert!(approx(next.impulse, 0.08));
        // One frame applies the whole impulse plus idle spin
        assert!(approx(next.rotation, 0.1 + IDLE_RATE));
    }

    #[test]
    fn impulse_settles_to_zero() {
        let mut rng = XorShift32::default();
        let mut m = SubjectMotion::default();
        m.push_impulse(-IMPULSE_STEP);
        for _ in 0..60 {
            m = advance(m, FRAME, false, &mut rng);
        }
        assert_eq!(m.impulse, 0.0);
        // Flick travels impulse / (1 - damping)
        let idle = IDLE_RATE * 60.0;
        assert!((m.rotation - (-0.5 + idle)).abs() < 0.01);
    }

    #[test]
    fn flick_distance_independent_of_frame_rate() {
        let run = |dt: f32, steps: usize| {
            let mut rng = XorShift32::default();
            let mut m = SubjectMotion::default();
            m.push_impulse(IMPULSE_STEP);
            for _ in 0..steps {
                m = advance(m, dt, false, &mut rng);
            }
            m.rotation
        };
        let at_60 = run(1.0 / 60.0, 120);
        let at_144 = run(1.0 / 144.0, 288);
        assert!((at_60 - at_144).abs() < 0.01);
    }

    #[test]
    fn hover_spins_faster() {
        let mut rng = XorShift32::default();
        let idle = advance(SubjectMotion::default(), FRAME, false, &mut rng);
        let hovered = advance(SubjectMotion::default(), FRAME, true, &mut rng);
        assert!(approx(idle.rotation, IDLE_RATE));
        assert!(approx(hovered.rotation, IDLE_RATE_HOVERED));
    }

    #[test]
    fn morph_decays_then_snaps_off() {
        let mut rng = XorShift32::default();
        let mut m = SubjectMotion::default();
        m.pulse();
        m = advance(m, FRAME, false, &mut rng);
        assert!(approx(m.morph, 0.94));

        m.morph = 0.009;
        m = advance(m, FRAME, false, &mut rng);
        assert_eq!(m.morph, 0.0);
    }

    #[test]
    fn scale_eases_rather_than_snaps() {
        let mut rng = XorShift32::default();
        let m = advance(SubjectMotion::default(), FRAME, true, &mut rng);
        assert!(m.scale > 1.0 && m.scale < HOVER_SCALE);
        assert!(approx(m.scale, 1.0 + 0.05 * 0.1));
    }

    #[test]
    fn target_scale_peaks_mid_morph() {
        assert!(approx(target_scale(false, 0.0), 1.0));
        assert!(approx(target_scale(false, 0.5), 1.05));
        assert!(approx(target_scale(true, 0.0), 1.05));
    }

    #[test]
    fn color_eases_toward_target() {
        let mut rng = XorShift32::default();
        let mut m = SubjectMotion::new(Color::WHITE);
        m.target_color = Color::BLACK;
        m = advance(m, FRAME, false, &mut rng);
        assert!(approx(m.color.r, 0.94));
        for _ in 0..600 {
            m = advance(m, FRAME, false, &mut rng);
        }
        assert!(m.color.r < 0.001);
    }

    #[test]
    fn emissive_follows_morph() {
        let mut m = SubjectMotion::default();
        assert_eq!(m.emissive().to_hex(), 0x000000);
        m.morph = 0.25;
        let glow = m.emissive();
        let gold = Color::from_hex(MORPH_GLOW);
        assert!(approx(glow.r, gold.r * 0.5));
    }

    #[test]
    fn jitter_only_while_morph_is_strong() {
        let mut rng = XorShift32::default();
        let mut m = SubjectMotion::default();
        m.pulse();
        m = advance(m, FRAME, false, &mut rng);
        assert!(m.jitter[0].abs() <= JITTER_AMPLITUDE);
        assert!(m.jitter[1].abs() <= JITTER_AMPLITUDE);

        m.morph = 0.05;
        m = advance(m, FRAME, false, &mut rng);
        assert_eq!(m.jitter, [0.0, 0.0]);
    }

    #[test]
    fn zero_dt_is_a_no_op_for_easing() {
        let mut rng = XorShift32::default();
        let mut m = SubjectMotion::new(Color::WHITE);
        m.target_color = Color::BLACK;
        let next = advance(m, 0.0, false, &mut rng);
        assert_eq!(next.color, m.color);
        assert_eq!(next.rotation, m.rotation);
    }

    #[test]
    fn model_matrix_carries_scale_and_jitter() {
        let mut m = SubjectMotion::default();
        m.scale = 2.0;
        m.jitter = [0.003, -0.002];
        let mat = m.model_matrix();
        assert!(approx(mat[0][0], 2.0));
        assert!(approx(mat[3][0], 0.003));
        assert!(approx(mat[3][2], -0.002));
    }
}
