//! Column-major 4x4 matrix helpers shared by the camera and the stage renderer

/// Column-major 4x4 matrix: `m[column][row]`
pub type Mat4 = [[f32; 4]; 4];

pub fn mat4_identity() -> Mat4 {
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

pub fn mat4_translation(x: f32, y: f32, z: f32) -> Mat4 {
    let mut m = mat4_identity();
    m[3] = [x, y, z, 1.0];
    m
}

pub fn mat4_scale(x: f32, y: f32, z: f32) -> Mat4 {
    let mut m = mat4_identity();
    m[0][0] = x;
    m[1][1] = y;
    m[2][2] = z;
    m
}

/// `a * b`, so `b` is applied first
pub fn mat4_mul(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut result = [[0.0; 4]; 4];
    for (col, out) in result.iter_mut().enumerate() {
        for (row, value) in out.iter_mut().enumerate() {
            *value = (0..4).map(|k| a[k][row] * b[col][k]).sum();
        }
    }
    result
}

/// General inverse via 2x2 sub-determinants. Singular input yields identity.
pub fn mat4_inverse(a: &Mat4) -> Mat4 {
    let s0 = a[0][0] * a[1][1] - a[1][0] * a[0][1];
    let s1 = a[0][0] * a[1][2] - a[1][0] * a[0][2];
    let s2 = a[0][0] * a[1][3] - a[1][0] * a[0][3];
    let s3 = a[0][1] * a[1][2] - a[1][1] * a[0][2];
    let s4 = a[0][1] * a[1][3] - a[1][1] * a[0][3];
    let s5 = a[0][2] * a[1][3] - a[1][2] * a[0][3];

    let c5 = a[2][2] * a[3][3] - a[3][2] * a[2][3];
    let c4 = a[2][1] * a[3][3] - a[3][1] * a[2][3];
    let c3 = a[2][1] * a[3][2] - a[3][1] * a[2][2];
    let c2 = a[2][0] * a[3][3] - a[3][0] * a[2][3];
    let c1 = a[2][0] * a[3][2] - a[3][0] * a[2][2];
    let c0 = a[2][0] * a[3][1] - a[3][0] * a[2][1];

    let det = s0 * c5 - s1 * c4 + s2 * c3 + s3 * c2 - s4 * c1 + s5 * c0;
    if det.abs() < 1e-10 {
        return mat4_identity();
    }
    let d = 1.0 / det;

    [
        [
            (a[1][1] * c5 - a[1][2] * c4 + a[1][3] * c3) * d,
            (-a[0][1] * c5 + a[0][2] * c4 - a[0][3] * c3) * d,
            (a[3][1] * s5 - a[3][2] * s4 + a[3][3] * s3) * d,
            (-a[2][1] * s5 + a[2][2] * s4 - a[2][3] * s3) * d,
        ],
        [
            (-a[1][0] * c5 + a[1][2] * c2 - a[1][3] * c1) * d,
            (a[0][0] * c5 - a[0][2] * c2 + a[0][3] * c1) * d,
            (-a[3][0] * s5 + a[3][2] * s2 - a[3][3] * s1) * d,
            (a[2][0] * s5 - a[2][2] * s2 + a[2][3] * s1) * d,
        ],
        [
            (a[1][0] * c4 - a[1][1] * c2 + a[1][3] * c0) * d,
            (-a[0][0] * c4 + a[0][1] * c2 - a[0][3] * c0) * d,
            (a[3][0] * s4 - a[3][1] * s2 + a[3][3] * s0) * d,
            (-a[2][0] * s4 + a[2][1] * s2 - a[2][3] * s0) * d,
        ],
        [
            (-a[1][0] * c3 + a[1][1] * c1 - a[1][2] * c0) * d,
            (a[0][0] * c3 - a[0][1] * c1 + a[0][2] * c0) * d,
            (-a[3][0] * s3 + a[3][1] * s1 - a[3][2] * s0) * d,
            (a[2][0] * s3 - a[2][1] * s1 + a[2][2] * s0) * d,
        ],
    ]
}

/// Normal matrix: inverse-transpose of the upper 3x3, translation dropped
pub fn mat4_inv_transpose(m: &Mat4) -> Mat4 {
    let mut linear = *m;
    linear[3] = [0.0, 0.0, 0.0, 1.0];
    let inv = mat4_inverse(&linear);
    let mut out = mat4_identity();
    for (col, column) in out.iter_mut().enumerate().take(3) {
        for (row, value) in column.iter_mut().enumerate().take(3) {
            *value = inv[row][col];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &Mat4, b: &Mat4) {
        for c in 0..4 {
            for r in 0..4 {
                assert!(
                    (a[c][r] - b[c][r]).abs() < 1e-4,
                    "mismatch at [{c}][{r}]: {} vs {}",
                    a[c][r],
                    b[c][r]
                );
            }
        }
    }

    #[test]
    fn mul_applies_right_operand_first() {
        let t = mat4_translation(1.0, 0.0, 0.0);
        let s = mat4_scale(2.0, 2.0, 2.0);
        // Scale then translate: translation column stays untouched
        let m = mat4_mul(&t, &s);
        assert_eq!(m[3], [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(m[0][0], 2.0);
        // Translate then scale: translation doubles
        let m = mat4_mul(&s, &t);
        assert_eq!(m[3], [2.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn inverse_round_trips() {
        let m = mat4_mul(
            &mat4_translation(3.0, -2.0, 0.5),
            &mat4_scale(2.0, -1.0, 4.0),
        );
        let product = mat4_mul(&m, &mat4_inverse(&m));
        assert_close(&product, &mat4_identity());
    }

    #[test]
    fn singular_inverse_is_identity() {
        let zero = [[0.0; 4]; 4];
        assert_eq!(mat4_inverse(&zero), mat4_identity());
    }

    #[test]
    fn inv_transpose_of_uniform_scale() {
        let m = mat4_mul(&mat4_translation(5.0, 5.0, 5.0), &mat4_scale(2.0, 2.0, 2.0));
        let n = mat4_inv_transpose(&m);
        assert!((n[0][0] - 0.5).abs() < 1e-6);
        assert_eq!(n[3], [0.0, 0.0, 0.0, 1.0]);
    }
}
