use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2d {
    pub x: f64,
    pub y: f64,
}

impl Point2d {
    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// One point of a closed polar trace. `theta` is in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PolarSample {
    pub theta: f64,
    pub radius: f64,
}

impl PolarSample {
    pub fn to_cartesian(self) -> Point2d {
        let (s, c) = self.theta.sin_cos();
        Point2d {
            x: self.radius * c,
            y: self.radius * s,
        }
    }
}
