use std::ops::{Div, Index, IndexMut, Sub};

use serde::Serialize;
use shared_definitions::navboard::ImuAxis;

/// Six inertial values, one per [`ImuAxis`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct ImuVector {
    pub ax: f64,
    pub ay: f64,
    pub az: f64,
    pub gx: f64,
    pub gy: f64,
    pub gz: f64,
}

impl ImuVector {
    pub const fn from_array(values: [f64; 6]) -> Self {
        ImuVector {
            ax: values[0],
            ay: values[1],
            az: values[2],
            gx: values[3],
            gy: values[4],
            gz: values[5],
        }
    }

    pub fn from_raw(values: [i16; 6]) -> Self {
        Self::from_array(values.map(f64::from))
    }

    pub fn to_array(self) -> [f64; 6] {
        [self.ax, self.ay, self.az, self.gx, self.gy, self.gz]
    }

    pub fn splat(value: f64) -> Self {
        Self::from_array([value; 6])
    }

    pub fn acceleration(&self) -> AccelerationVector3D {
        AccelerationVector3D {
            x: self.ax,
            y: self.ay,
            z: self.az,
        }
    }
}

impl Index<ImuAxis> for ImuVector {
    type Output = f64;

    fn index(&self, axis: ImuAxis) -> &Self::Output {
        match axis {
            ImuAxis::Ax => &self.ax,
            ImuAxis::Ay => &self.ay,
            ImuAxis::Az => &self.az,
            ImuAxis::Gx => &self.gx,
            ImuAxis::Gy => &self.gy,
            ImuAxis::Gz => &self.gz,
        }
    }
}

impl IndexMut<ImuAxis> for ImuVector {
    fn index_mut(&mut self, axis: ImuAxis) -> &mut Self::Output {
        match axis {
            ImuAxis::Ax => &mut self.ax,
            ImuAxis::Ay => &mut self.ay,
            ImuAxis::Az => &mut self.az,
            ImuAxis::Gx => &mut self.gx,
            ImuAxis::Gy => &mut self.gy,
            ImuAxis::Gz => &mut self.gz,
        }
    }
}

impl Sub<ImuVector> for ImuVector {
    type Output = ImuVector;

    fn sub(self, rhs: ImuVector) -> Self::Output {
        let mut out = self;
        for axis in ImuAxis::ALL {
            out[axis] -= rhs[axis];
        }
        out
    }
}

/// Elementwise division.
impl Div<ImuVector> for ImuVector {
    type Output = ImuVector;

    fn div(self, rhs: ImuVector) -> Self::Output {
        let mut out = self;
        for axis in ImuAxis::ALL {
            out[axis] /= rhs[axis];
        }
        out
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct AccelerationVector3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl AccelerationVector3D {
    /// Roll and pitch, in radians, of a body at rest measuring only gravity.
    pub fn calculate_orientation_angles(&self) -> RotationVector2D {
        let roll = self.y.atan2(self.z);
        let pitch = (-self.x).atan2((self.y.powi(2) + self.z.powi(2)).sqrt());

        RotationVector2D { roll, pitch }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RotationVector2D {
    pub roll: f64,
    pub pitch: f64,
}
