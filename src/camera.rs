//! Free-fly camera.
//!
//! [`Camera`] holds an Euler-angle orientation and derives its basis vectors
//! from it. [`CameraController`] turns winit input into camera updates once
//! per frame, and [`CameraUniform`] packs the resulting view/projection for
//! shaders.

use cgmath::*;
use instant::Duration;
use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, KeyEvent, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Pitch is kept strictly below the poles, where the basis would flip.
pub const PITCH_LIMIT: Deg<f32> = Deg(89.0);
pub const ZOOM_MIN: Deg<f32> = Deg(1.0);
pub const ZOOM_MAX: Deg<f32> = Deg(45.0);

/// Direction of a keyboard move, independent of the windowing system's keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
}

/// Start values of a [`Camera`].
#[derive(Clone, Debug, PartialEq)]
pub struct CameraConfig {
    pub position: Point3<f32>,
    pub world_up: Vector3<f32>,
    pub yaw: Deg<f32>,
    pub pitch: Deg<f32>,
    /// Units per second.
    pub movement_speed: f32,
    /// Degrees per pixel of mouse motion.
    pub mouse_sensitivity: f32,
    /// Vertical field of view.
    pub zoom: Deg<f32>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            world_up: Vector3::unit_y(),
            yaw: Deg(-90.0),
            pitch: Deg(0.0),
            movement_speed: 2.5,
            mouse_sensitivity: 0.1,
            zoom: ZOOM_MAX,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
    front: Vector3<f32>,
    right: Vector3<f32>,
    up: Vector3<f32>,
    world_up: Vector3<f32>,
    yaw: Deg<f32>,
    pitch: Deg<f32>,
    zoom: Deg<f32>,
}

impl Camera {
    /// Camera at `position` looking along `yaw`/`pitch`, with default speed,
    /// sensitivity and zoom.
    pub fn new<V: Into<Point3<f32>>, Y: Into<Deg<f32>>, P: Into<Deg<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Self::from_config(&CameraConfig {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
            ..Default::default()
        })
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        let mut camera = Self {
            position: config.position,
            movement_speed: config.movement_speed,
            mouse_sensitivity: config.mouse_sensitivity,
            front: -Vector3::unit_z(),
            right: Vector3::unit_x(),
            up: Vector3::unit_y(),
            world_up: config.world_up,
            yaw: config.yaw,
            pitch: clamp_pitch(config.pitch),
            zoom: clamp_zoom(config.zoom),
        };
        camera.update_camera_vectors();
        camera
    }

    /// Right-handed look-at matrix from the current position and basis.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// Move along the front or right vector by `movement_speed * dt`.
    pub fn process_keyboard(&mut self, direction: CameraMovement, dt: Duration) {
        let velocity = self.movement_speed * dt.as_secs_f32();
        match direction {
            CameraMovement::Forward => self.position += self.front * velocity,
            CameraMovement::Backward => self.position -= self.front * velocity,
            CameraMovement::Left => self.position -= self.right * velocity,
            CameraMovement::Right => self.position += self.right * velocity,
        }
    }

    /// Turn by a mouse offset in pixels. Positive `yoffset` looks up.
    ///
    /// Yaw accumulates freely; pitch stays within ±[`PITCH_LIMIT`].
    pub fn process_mouse_movement(&mut self, xoffset: f32, yoffset: f32) {
        let yaw = self.yaw + Deg(xoffset * self.mouse_sensitivity);
        let pitch = self.pitch + Deg(yoffset * self.mouse_sensitivity);
        self.set_orientation(yaw, pitch);
    }

    /// Narrow the field of view by `yoffset` degrees, within [`ZOOM_MIN`, `ZOOM_MAX`].
    pub fn process_mouse_scroll(&mut self, yoffset: f32) {
        self.zoom = clamp_zoom(self.zoom - Deg(yoffset));
    }

    pub fn set_orientation<Y: Into<Deg<f32>>, P: Into<Deg<f32>>>(&mut self, yaw: Y, pitch: P) {
        self.yaw = yaw.into();
        self.pitch = clamp_pitch(pitch.into());
        self.update_camera_vectors();
    }

    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn world_up(&self) -> Vector3<f32> {
        self.world_up
    }

    pub fn yaw(&self) -> Deg<f32> {
        self.yaw
    }

    pub fn pitch(&self) -> Deg<f32> {
        self.pitch
    }

    pub fn zoom(&self) -> Deg<f32> {
        self.zoom
    }

    // Right is derived from front and world-up, and up from right and front,
    // which keeps the basis orthonormal as long as front is not parallel to
    // world-up.
    fn update_camera_vectors(&mut self) {
        let (sin_yaw, cos_yaw) = Rad::from(self.yaw).0.sin_cos();
        let (sin_pitch, cos_pitch) = Rad::from(self.pitch).0.sin_cos();
        self.front = Vector3::new(cos_yaw * cos_pitch, sin_pitch, sin_yaw * cos_pitch).normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

fn clamp_pitch(pitch: Deg<f32>) -> Deg<f32> {
    Deg(pitch.0.clamp(-PITCH_LIMIT.0, PITCH_LIMIT.0))
}

fn clamp_zoom(zoom: Deg<f32>) -> Deg<f32> {
    Deg(zoom.0.clamp(ZOOM_MIN.0, ZOOM_MAX.0))
}

/// Perspective projection whose field of view is supplied per frame by the camera zoom.
#[derive(Clone, Debug)]
pub struct Projection {
    aspect: f32,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix<F: Into<Rad<f32>>>(&self, fovy: F) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(fovy.into(), self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    /// Homogeneous eye position; the fourth component pads to 16 bytes.
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix(camera.zoom()) * camera.view_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects winit input between frames and applies it to a [`Camera`].
///
/// WASD and the arrow keys move, raw mouse motion turns and the wheel zooms.
#[derive(Debug, Default)]
pub struct CameraController {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    mouse_dx: f64,
    mouse_dy: f64,
    scroll: f32,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the key is one the controller reacts to.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) -> bool {
        let pressed = state == ElementState::Pressed;
        match key {
            KeyCode::KeyW | KeyCode::ArrowUp => self.forward = pressed,
            KeyCode::KeyS | KeyCode::ArrowDown => self.backward = pressed,
            KeyCode::KeyA | KeyCode::ArrowLeft => self.left = pressed,
            KeyCode::KeyD | KeyCode::ArrowRight => self.right = pressed,
            _ => return false,
        }
        true
    }

    pub fn process_mouse(&mut self, dx: f64, dy: f64) {
        self.mouse_dx += dx;
        self.mouse_dy += dy;
    }

    pub fn process_scroll(&mut self, delta: &MouseScrollDelta) {
        self.scroll += match delta {
            MouseScrollDelta::LineDelta(_, scroll) => *scroll,
            MouseScrollDelta::PixelDelta(PhysicalPosition { y: scroll, .. }) => *scroll as f32,
        };
    }

    pub fn process_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => self.process_keyboard(*key, *state),
            WindowEvent::MouseWheel { delta, .. } => {
                self.process_scroll(delta);
                true
            }
            _ => false,
        }
    }

    pub fn process_device_event(&mut self, event: &DeviceEvent) -> bool {
        match event {
            DeviceEvent::MouseMotion { delta } => {
                self.process_mouse(delta.0, delta.1);
                true
            }
            _ => false,
        }
    }

    /// Apply everything collected since the last call. Screen y grows
    /// downwards, so mouse motion is inverted before it reaches the pitch.
    pub fn update_camera(&mut self, camera: &mut Camera, dt: Duration) {
        let held = [
            (self.forward, CameraMovement::Forward),
            (self.backward, CameraMovement::Backward),
            (self.left, CameraMovement::Left),
            (self.right, CameraMovement::Right),
        ];
        for (_, direction) in held.into_iter().filter(|(pressed, _)| *pressed) {
            camera.process_keyboard(direction, dt);
        }

        if self.mouse_dx != 0.0 || self.mouse_dy != 0.0 {
            camera.process_mouse_movement(self.mouse_dx as f32, -self.mouse_dy as f32);
            self.mouse_dx = 0.0;
            self.mouse_dy = 0.0;
        }

        if self.scroll != 0.0 {
            camera.process_mouse_scroll(self.scroll);
            self.scroll = 0.0;
        }
    }
}
