//! First-person fly camera and projection.
//!
//! [`Camera`] accumulates yaw/pitch from cursor offsets and moves along a
//! basis derived fresh from its current front and up vectors on every call.
//! [`Projection`] owns the perspective parameters, including the scroll zoom.
//! Both produce matrices in the GL clip convention; the depth remap for wgpu
//! happens only when the [`CameraUniform`] is filled.

use cgmath::{Deg, InnerSpace, Matrix3, Matrix4, Point3, Vector3, perspective};

/// Remaps GL clip space (z in [-1, 1]) to wgpu clip space (z in [0, 1]).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Pitch never leaves this range, in degrees.
pub const PITCH_LIMIT: f32 = 89.0;

pub const DEFAULT_SPEED: f32 = 2.5;
pub const DEFAULT_SENSITIVITY: f32 = 0.01;

/// A fly camera.
///
/// Yaw and pitch are kept in degrees. `front` is always unit length and
/// `pitch` always lies within [`-PITCH_LIMIT`, `PITCH_LIMIT`].
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    front: Vector3<f32>,
    pub up: Vector3<f32>,
    yaw: f32,
    pitch: f32,
    speed: f32,
    sensitivity: f32,
}

impl Camera {
    /// Creates a camera looking along `front`.
    ///
    /// Yaw starts at -90° and pitch at 0°, which matches a front of (0, 0, -1).
    /// The first call to [`rotate`](Self::rotate) re-derives front from the angles.
    pub fn new<P: Into<Point3<f32>>, V: Into<Vector3<f32>>>(position: P, front: V, up: V) -> Self {
        Self {
            position: position.into(),
            front: front.into().normalize(),
            up: up.into(),
            yaw: -90.0,
            pitch: 0.0,
            speed: DEFAULT_SPEED,
            sensitivity: DEFAULT_SENSITIVITY,
        }
    }

    pub fn with_sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn yaw(&self) -> Deg<f32> {
        Deg(self.yaw)
    }

    pub fn pitch(&self) -> Deg<f32> {
        Deg(self.pitch)
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch = (self.pitch + dy * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);

        let (sin_pitch, cos_pitch) = self.pitch.to_radians().sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.to_radians().sin_cos();
        self.front = Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw).normalize();
    }

    /// Sets the distance covered by one move call.
    ///
    /// The camera does not own frame timing: callers pass `base_speed * dt`.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// Strafe direction, `normalize(cross(up, -front))`.
    pub fn right(&self) -> Vector3<f32> {
        self.up.cross(-self.front).normalize()
    }

    /// Camera-relative up, `normalize(cross(-front, right))`.
    pub fn vertical(&self) -> Vector3<f32> {
        (-self.front).cross(self.right()).normalize()
    }

    pub fn move_forward(&mut self) {
        self.position += self.front * self.speed;
    }

    pub fn move_backward(&mut self) {
        self.position -= self.front * self.speed;
    }

    pub fn move_right(&mut self) {
        self.position += self.right() * self.speed;
    }

    pub fn move_left(&mut self) {
        self.position -= self.right() * self.speed;
    }

    pub fn move_up(&mut self) {
        self.position += self.vertical() * self.speed;
    }

    pub fn move_down(&mut self) {
        self.position -= self.vertical() * self.speed;
    }

    /// The right-handed view matrix `lookAt(position, position + front, up)`.
    pub fn look_at(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.position + self.front, self.up)
    }
}

/// Keeps only the rotational 3x3 part of a view matrix.
///
/// The skybox is drawn with this so that it never moves relative to the viewer.
pub fn strip_translation(view: Matrix4<f32>) -> Matrix4<f32> {
    Matrix4::from(Matrix3::from_cols(
        view.x.truncate(),
        view.y.truncate(),
        view.z.truncate(),
    ))
}

pub const MIN_FOV: f32 = 1.0;
pub const MAX_FOV: f32 = 45.0;

#[derive(Debug, Clone)]
pub struct Projection {
    /// Vertical field of view in degrees.
    fovy: f32,
    aspect: f32,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, fovy: Deg<f32>, znear: f32, zfar: f32) -> Self {
        Self {
            fovy: fovy.0.clamp(MIN_FOV, MAX_FOV),
            aspect: width as f32 / height.max(1) as f32,
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Scroll zoom: narrows the field of view by `dy` degrees within [1°, 45°].
    pub fn zoom(&mut self, dy: f32) {
        self.fovy = (self.fovy - dy).clamp(MIN_FOV, MAX_FOV);
    }

    pub fn fovy(&self) -> Deg<f32> {
        Deg(self.fovy)
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Perspective matrix in the GL convention (near plane at z/w = -1).
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        perspective(Deg(self.fovy), self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    // w is unused, vec3 would be padded to 16 bytes anyway
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    skybox_view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
            skybox_view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        let view = camera.look_at();
        let proj = OPENGL_TO_WGPU_MATRIX * projection.calc_matrix();
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (proj * view).into();
        self.skybox_view_proj = (proj * strip_translation(view)).into();
    }

    pub fn view_position(&self) -> [f32; 4] {
        self.view_position
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use cgmath::{EuclideanSpace, Vector4};

    use super::*;

    fn demo_camera() -> Camera {
        Camera::new((0.0, 0.0, 3.0), (0.0, 0.0, -1.0), (0.0, 1.0, 0.0))
    }

    #[test]
    fn pitch_stays_within_limit() {
        let mut camera = demo_camera();
        for _ in 0..50 {
            camera.rotate(13.0, 4000.0);
            assert!(camera.pitch().0 <= PITCH_LIMIT);
        }
        assert_relative_eq!(camera.pitch().0, PITCH_LIMIT);
        for _ in 0..50 {
            camera.rotate(-7.0, -4000.0);
            assert!(camera.pitch().0 >= -PITCH_LIMIT);
        }
        assert_relative_eq!(camera.pitch().0, -PITCH_LIMIT);
    }

    #[test]
    fn single_large_rotation_clamps_at_89() {
        let mut camera = demo_camera();
        camera.rotate(0.0, 9000.0);
        assert_relative_eq!(camera.pitch().0, 89.0);
    }

    #[test]
    fn front_is_unit_length_after_rotations() {
        let mut camera = demo_camera();
        let offsets = [(10.0, 3.0), (-250.0, 900.0), (1e4, -1e4), (0.5, 0.25), (-3e3, 77.0)];
        for (dx, dy) in offsets {
            camera.rotate(dx, dy);
            assert_relative_eq!(camera.front().magnitude(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn look_at_moves_eye_to_origin() {
        let mut camera = demo_camera();
        camera.rotate(1234.0, -321.0);
        camera.position = Point3::new(4.0, -2.0, 7.5);
        let view = camera.look_at();

        let eye = view * camera.position.to_homogeneous();
        assert_relative_eq!(eye.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(eye.y, 0.0, epsilon = 1e-4);
        assert_relative_eq!(eye.z, 0.0, epsilon = 1e-4);

        let ahead = view * (camera.position + camera.front()).to_homogeneous();
        assert_relative_eq!(ahead.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(ahead.y, 0.0, epsilon = 1e-4);
        assert!(ahead.z < 0.0);
    }

    #[test]
    fn forward_changes_only_z() {
        let mut camera = demo_camera();
        camera.set_speed(0.75);
        camera.move_forward();
        assert_relative_eq!(camera.position.x, 0.0);
        assert_relative_eq!(camera.position.y, 0.0);
        assert_relative_eq!(camera.position.z, 2.25);

        camera.move_backward();
        assert_relative_eq!(camera.position.z, 3.0);
    }

    #[test]
    fn strafe_is_perpendicular_to_front_and_up() {
        let mut camera = demo_camera();
        for (dx, dy) in [(0.0, 0.0), (300.0, 120.0), (-4500.0, -2000.0), (77.0, 8800.0)] {
            camera.rotate(dx, dy);
            let right = camera.right();
            assert_relative_eq!(right.dot(camera.front()), 0.0, epsilon = 1e-5);
            assert_relative_eq!(right.dot(camera.up), 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn strafe_and_vertical_follow_default_basis() {
        let mut camera = demo_camera();
        camera.set_speed(1.0);
        camera.move_right();
        assert_relative_eq!(camera.position.x, 1.0);
        camera.move_left();
        camera.move_left();
        assert_relative_eq!(camera.position.x, -1.0);
        camera.move_up();
        assert_relative_eq!(camera.position.y, 1.0);
        camera.move_down();
        camera.move_down();
        assert_relative_eq!(camera.position.y, -1.0);
        assert_relative_eq!(camera.position.z, 3.0);
    }

    #[test]
    fn basis_follows_rotation_immediately() {
        let mut camera = demo_camera();
        camera.set_speed(1.0);
        // yaw -90 -> 0 turns the camera to face +x
        camera.rotate(9000.0, 0.0);
        assert_relative_eq!(camera.front().x, 1.0, epsilon = 1e-5);
        camera.move_forward();
        assert_relative_eq!(camera.position.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(camera.position.z, 3.0, epsilon = 1e-5);
    }

    #[test]
    fn speed_one_forward_from_three_lands_on_two() {
        let mut camera = demo_camera();
        camera.set_speed(1.0);
        camera.move_forward();
        assert_relative_eq!(camera.position.x, 0.0);
        assert_relative_eq!(camera.position.y, 0.0);
        assert_relative_eq!(camera.position.z, 2.0);
    }

    #[test]
    fn near_plane_maps_to_minus_one() {
        let projection = Projection::new(800, 600, Deg(45.0), 0.1, 100.0);
        let clip = projection.calc_matrix() * Vector4::new(0.0, 0.0, -0.1, 1.0);
        assert_relative_eq!(clip.z / clip.w, -1.0, epsilon = 1e-4);

        let far = projection.calc_matrix() * Vector4::new(0.0, 0.0, -100.0, 1.0);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn wgpu_remap_moves_near_plane_to_zero() {
        let projection = Projection::new(800, 600, Deg(45.0), 0.1, 100.0);
        let clip = OPENGL_TO_WGPU_MATRIX * projection.calc_matrix() * Vector4::new(0.0, 0.0, -0.1, 1.0);
        assert_relative_eq!(clip.z / clip.w, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut projection = Projection::new(800, 600, Deg(45.0), 0.1, 100.0);
        projection.zoom(-10.0);
        assert_relative_eq!(projection.fovy().0, 45.0);
        projection.zoom(30.0);
        assert_relative_eq!(projection.fovy().0, 15.0);
        projection.zoom(100.0);
        assert_relative_eq!(projection.fovy().0, 1.0);
    }

    #[test]
    fn resize_ignores_zero_extent() {
        let mut projection = Projection::new(800, 600, Deg(45.0), 0.1, 100.0);
        projection.resize(0, 300);
        assert_relative_eq!(projection.aspect(), 800.0 / 600.0);
        projection.resize(1000, 500);
        assert_relative_eq!(projection.aspect(), 2.0);
    }

    #[test]
    fn stripped_view_has_no_translation() {
        let mut camera = demo_camera();
        camera.rotate(450.0, 120.0);
        camera.position = Point3::new(12.0, -3.0, 40.0);
        let view = camera.look_at();
        let sky = strip_translation(view);

        assert_relative_eq!(sky.w.x, 0.0);
        assert_relative_eq!(sky.w.y, 0.0);
        assert_relative_eq!(sky.w.z, 0.0);
        assert_relative_eq!(sky.w.w, 1.0);
        for (col_sky, col_view) in [(sky.x, view.x), (sky.y, view.y), (sky.z, view.z)] {
            assert_relative_eq!(col_sky.x, col_view.x);
            assert_relative_eq!(col_sky.y, col_view.y);
            assert_relative_eq!(col_sky.z, col_view.z);
            assert_relative_eq!(col_sky.w, 0.0);
        }
        // the origin stays at the origin no matter where the camera is
        let origin = sky * Point3::origin().to_homogeneous();
        assert_relative_eq!(origin.x, 0.0);
        assert_relative_eq!(origin.z, 0.0);
    }

    #[test]
    fn uniform_carries_camera_position() {
        let camera = demo_camera();
        let projection = Projection::new(800, 600, Deg(45.0), 0.1, 100.0);
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, &projection);
        assert_eq!(uniform.view_position(), [0.0, 0.0, 3.0, 1.0]);
        assert_eq!(std::mem::size_of::<CameraUniform>() % 16, 0);
    }
}
