//! Orbit camera with inertial damping

use studio_core::{mat4_inverse, mat4_mul, Mat4, Vec3};

/// Frame rate the damping factor is specified against
const REFERENCE_FPS: f32 = 60.0;

/// A perspective camera orbiting a target point. Drag and scroll input feed
/// angular and radial velocities which bleed off over subsequent frames.
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Width / height
    pub aspect: f32,

    /// Distance from target
    pub distance: f32,
    /// Horizontal angle in radians
    pub yaw: f32,
    /// Vertical angle in radians
    pub pitch: f32,

    /// Fraction of the remaining velocity consumed per 60 Hz frame
    pub damping: f32,
    yaw_velocity: f32,
    pitch_velocity: f32,
    zoom_velocity: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::looking_from(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO)
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place the camera at `position` orbiting `target`
    pub fn looking_from(position: Vec3, target: Vec3) -> Self {
        let offset = position - target;
        let distance = offset.length().max(1.0);
        let pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();
        let yaw = offset.x.atan2(offset.z);

        let mut camera = Self {
            position,
            target,
            up: Vec3::UP,
            fov: 45.0,
            near: 0.1,
            far: 1000.0,
            aspect: 16.0 / 9.0,
            distance,
            yaw,
            pitch,
            damping: 0.05,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
            zoom_velocity: 0.0,
        };
        camera.update_orbit();
        camera
    }

    /// Recompute position from orbit parameters
    pub fn update_orbit(&mut self) {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.position = Vec3::new(self.target.x + x, self.target.y + y, self.target.z + z);
    }

    /// Queue a drag rotation in radians
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw_velocity += delta_yaw;
        self.pitch_velocity += delta_pitch;
    }

    /// Queue a dolly; positive moves toward the target
    pub fn zoom(&mut self, delta: f32) {
        self.zoom_velocity += delta;
    }

    /// Apply a share of the queued motion and decay the rest
    pub fn update(&mut self, dt: f32) {
        let keep = (1.0 - self.damping).powf(dt.max(0.0) * REFERENCE_FPS);
        let apply = 1.0 - keep;

        self.yaw += self.yaw_velocity * apply;
        // 1.56 rad keeps clear of the poles
        self.pitch = (self.pitch + self.pitch_velocity * apply).clamp(-1.56, 1.56);
        self.distance = (self.distance - self.zoom_velocity * apply).clamp(1.0, 100.0);

        self.yaw_velocity *= keep;
        self.pitch_velocity *= keep;
        self.zoom_velocity *= keep;
        self.update_orbit();
    }

    /// Set aspect from a surface size. Zero-sized surfaces keep the previous
    /// aspect.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.position.distance(&point)
    }

    /// View matrix (column-major)
    pub fn view_matrix(&self) -> Mat4 {
        let f = (self.target - self.position).normalized();
        let s = f.cross(&self.up).normalized();
        let u = s.cross(&f);

        [
            [s.x, u.x, -f.x, 0.0],
            [s.y, u.y, -f.y, 0.0],
            [s.z, u.z, -f.z, 0.0],
            [
                -s.dot(&self.position),
                -u.dot(&self.position),
                f.dot(&self.position),
                1.0,
            ],
        ]
    }

    /// Right-handed perspective mapping depth to wgpu's 0..1 range
    pub fn projection_matrix(&self) -> Mat4 {
        let f = 1.0 / (self.fov.to_radians() / 2.0).tan();
        let range = self.near - self.far;

        [
            [f / self.aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, self.far / range, -1.0],
            [0.0, 0.0, self.near * self.far / range, 0.0],
        ]
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        mat4_mul(&self.projection_matrix(), &self.view_matrix())
    }

    /// Inverse view-projection with the translation removed, for backdrop rays
    pub fn inverse_rotation_projection(&self) -> Mat4 {
        let mut view = self.view_matrix();
        view[3] = [0.0, 0.0, 0.0, 1.0];
        mat4_inverse(&mat4_mul(&self.projection_matrix(), &view))
    }

    pub fn position_array(&self) -> [f32; 4] {
        [self.position.x, self.position.y, self.position.z, 1.0]
    }
}
