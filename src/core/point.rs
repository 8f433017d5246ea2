//! Cartesian point and vector types for the mission-local tangent plane.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// Point or vector in the mission-local frame (metres).
///
/// x = east, y = north, z = up relative to the reference elevation.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct LocalVector3 {
    /// East (m)
    pub x: f64,
    /// North (m)
    pub y: f64,
    /// Up, relative to the reference elevation (m)
    pub z: f64,
}

impl LocalVector3 {
    /// Origin / zero vector
    pub const ZERO: LocalVector3 = LocalVector3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Vertical unit vector
    pub const UNIT_Z: LocalVector3 = LocalVector3 {
        x: 0.0,
        y: 0.0,
        z: 1.0,
    };

    /// Create a new vector
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Copy with a different z
    #[inline]
    pub fn with_z(&self, z: f64) -> Self {
        Self::new(self.x, self.y, z)
    }

    /// Horizontal part as a 2D point
    #[inline]
    pub fn xy(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }

    /// Dot product
    #[inline]
    pub fn dot(&self, other: &LocalVector3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    #[inline]
    pub fn cross(&self, other: &LocalVector3) -> LocalVector3 {
        LocalVector3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Squared length (avoids sqrt)
    #[inline]
    pub fn length_squared(&self) -> f64 {
        self.dot(self)
    }

    /// Euclidean length
    #[inline]
    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Length of the horizontal component
    #[inline]
    pub fn horizontal_length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Distance to another point
    #[inline]
    pub fn distance(&self, other: &LocalVector3) -> f64 {
        (*self - *other).length()
    }

    /// Squared distance to another point
    #[inline]
    pub fn distance_squared(&self, other: &LocalVector3) -> f64 {
        (*self - *other).length_squared()
    }

    /// Horizontal distance to another point
    #[inline]
    pub fn horizontal_distance(&self, other: &LocalVector3) -> f64 {
        (*self - *other).horizontal_length()
    }

    /// Unit vector in the same direction, or self if zero length
    #[inline]
    pub fn normalize(&self) -> LocalVector3 {
        let len = self.length();
        if len > 0.0 { *self * (1.0 / len) } else { *self }
    }

    /// Rotate around the vertical axis (radians, counter-clockwise seen from above)
    #[inline]
    pub fn rotate_z(&self, angle: f64) -> LocalVector3 {
        let (sin_a, cos_a) = angle.sin_cos();
        LocalVector3::new(
            self.x * cos_a - self.y * sin_a,
            self.x * sin_a + self.y * cos_a,
            self.z,
        )
    }

    /// Rodrigues rotation of this vector around a unit `axis` by `angle` radians
    pub fn rotate_around(&self, axis: &LocalVector3, angle: f64) -> LocalVector3 {
        let (sin_a, cos_a) = angle.sin_cos();
        let k = axis.normalize();
        *self * cos_a + k.cross(self) * sin_a + k * (k.dot(self) * (1.0 - cos_a))
    }

    /// Linear interpolation towards `other` (t in [0, 1])
    #[inline]
    pub fn lerp(&self, other: &LocalVector3, t: f64) -> LocalVector3 {
        *self + (*other - *self) * t
    }

    /// True if all components are finite
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for LocalVector3 {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        LocalVector3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for LocalVector3 {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        LocalVector3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for LocalVector3 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self {
        LocalVector3::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Neg for LocalVector3 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        LocalVector3::new(-self.x, -self.y, -self.z)
    }
}

/// Planar point (metres) used by polygon geometry
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    /// East (m)
    pub x: f64,
    /// North (m)
    pub y: f64,
}

impl Point2 {
    /// Create a new point
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Lift into 3D at the given z
    #[inline]
    pub fn with_z(&self, z: f64) -> LocalVector3 {
        LocalVector3::new(self.x, self.y, z)
    }

    /// Euclidean distance
    #[inline]
    pub fn distance(&self, other: &Point2) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Dot product (as vectors)
    #[inline]
    pub fn dot(&self, other: &Point2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z-component of the 3D cross product
    #[inline]
    pub fn cross(&self, other: &Point2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Vector length
    #[inline]
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Normalize to unit length
    #[inline]
    pub fn normalize(&self) -> Point2 {
        let len = self.length();
        if len > 0.0 {
            Point2::new(self.x / len, self.y / len)
        } else {
            *self
        }
    }

    /// Left-hand perpendicular (rotated +90°)
    #[inline]
    pub fn perpendicular(&self) -> Point2 {
        Point2::new(-self.y, self.x)
    }
}

impl Add for Point2 {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Point2::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point2 {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Point2::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Point2 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self {
        Point2::new(self.x * scalar, self.y * scalar)
    }
}
