use serde::{Deserialize, Serialize};

///Represents a vector in 2D space.
///
/// All operations return a new vector; values are never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vector2D {
    ///Value along the x-axis.
    /// Positive direction is to the right.
    pub x: f64,
    ///Value along the y-axis.
    /// Positive direction is up.
    pub y: f64,
}

impl Vector2D {
    pub const ZERO: Vector2D = Vector2D { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Vector2D {
        Vector2D { x, y }
    }

    ///Returns the sum of two vectors.
    pub fn add(&self, other: &Vector2D) -> Vector2D {
        Vector2D {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    ///Returns the difference of two vectors.
    pub fn subtract(&self, other: &Vector2D) -> Vector2D {
        Vector2D {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    ///Returns the scaled vector.
    pub fn scale(&self, scalar: f64) -> Vector2D {
        Vector2D {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }

    ///Returns the dot product of two vectors.
    pub fn dot(&self, other: &Vector2D) -> f64 {
        self.x * other.x + self.y * other.y
    }

    ///Returns the magnitude of the vector.
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    ///Returns the normalized vector.
    /// The zero vector normalizes to the zero vector.
    pub fn normalize(&self) -> Vector2D {
        let len = self.length();
        if len == 0.0 {
            Vector2D::ZERO
        } else {
            Vector2D {
                x: self.x / len,
                y: self.y / len,
            }
        }
    }

    ///Returns the vector rotated by the given angle in radians.
    /// Positive angles rotate counterclockwise.
    pub fn rotate(&self, radians: f64) -> Vector2D {
        let (sin, cos) = radians.sin_cos();
        Vector2D {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    ///Returns the distance between two points.
    pub fn distance(&self, other: &Vector2D) -> f64 {
        self.subtract(other).length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_add_subtract() {
        let a = Vector2D::new(1.0, 2.0);
        let b = Vector2D::new(3.0, -4.0);

        let sum = a.add(&b);
        assert_eq!(sum, Vector2D::new(4.0, -2.0));

        let diff = a.subtract(&b);
        assert_eq!(diff, Vector2D::new(-2.0, 6.0));
    }

    #[test]
    fn test_scale_and_dot() {
        let v = Vector2D::new(2.0, -3.0);

        assert_eq!(v.scale(2.5), Vector2D::new(5.0, -7.5));
        assert_eq!(v.dot(&Vector2D::new(4.0, 2.0)), 2.0);
    }

    #[test]
    fn test_length() {
        assert_approx_eq!(Vector2D::new(3.0, 4.0).length(), 5.0);
        assert_eq!(Vector2D::ZERO.length(), 0.0);
    }

    #[test]
    fn test_normalize() {
        let n = Vector2D::new(10.0, 0.0).normalize();
        assert_approx_eq!(n.x, 1.0);
        assert_approx_eq!(n.y, 0.0);

        let n = Vector2D::new(-3.0, 4.0).normalize();
        assert_approx_eq!(n.length(), 1.0);
    }

    #[test]
    fn test_normalize_zero_vector() {
        assert_eq!(Vector2D::ZERO.normalize(), Vector2D::ZERO);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let v = Vector2D::new(1.0, 0.0).rotate(FRAC_PI_2);
        assert_approx_eq!(v.x, 0.0);
        assert_approx_eq!(v.y, 1.0);
    }

    #[test]
    fn test_rotate_half_turn() {
        let v = Vector2D::new(1.0, 2.0).rotate(PI);
        assert_approx_eq!(v.x, -1.0);
        assert_approx_eq!(v.y, -2.0);
    }

    #[test]
    fn test_rotate_preserves_length() {
        let v = Vector2D::new(3.0, -7.0);
        assert_approx_eq!(v.rotate(1.234).length(), v.length());
    }

    #[test]
    fn test_distance() {
        let a = Vector2D::new(1.0, 1.0);
        let b = Vector2D::new(4.0, 5.0);
        assert_approx_eq!(a.distance(&b), 5.0);
    }
}
