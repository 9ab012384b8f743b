use {
    crate::error::ArmatureError,
    nalgebra as na,
    std::{convert::TryFrom, str::FromStr},
};

/// Kind of geometry used to display every bone of an armature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub enum RepresentationStyle {
    /// Bones are not displayed.
    None,

    /// Segment between head and tail with handles on both ends.
    Line,

    /// Tube around the segment.
    Cylinder,

    /// Two cones joined at a waist near the head.
    DoubleCone,
}

impl Default for RepresentationStyle {
    fn default() -> Self {
        RepresentationStyle::None
    }
}

impl TryFrom<i32> for RepresentationStyle {
    type Error = ArmatureError;

    fn try_from(value: i32) -> Result<Self, ArmatureError> {
        match value {
            0 => Ok(RepresentationStyle::None),
            1 => Ok(RepresentationStyle::Line),
            2 => Ok(RepresentationStyle::Cylinder),
            3 => Ok(RepresentationStyle::DoubleCone),
            _ => {
                tracing::error!("Unknown representation type: {}", value);
                Err(ArmatureError::UnknownRepresentation {
                    value: value.to_string(),
                })
            }
        }
    }
}

impl FromStr for RepresentationStyle {
    type Err = ArmatureError;

    fn from_str(s: &str) -> Result<Self, ArmatureError> {
        match &*s.to_ascii_lowercase() {
            "none" => Ok(RepresentationStyle::None),
            "line" | "bone" => Ok(RepresentationStyle::Line),
            "cylinder" => Ok(RepresentationStyle::Cylinder),
            "double-cone" | "doublecone" => Ok(RepresentationStyle::DoubleCone),
            _ => {
                tracing::error!("Unknown representation type: {}", s);
                Err(ArmatureError::UnknownRepresentation {
                    value: s.to_owned(),
                })
            }
        }
    }
}

/// Which transform the debug axes of a bone display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub enum AxesVisibility {
    Hidden,
    ShowRestTransform,
    ShowPoseTransform,
}

impl Default for AxesVisibility {
    fn default() -> Self {
        AxesVisibility::Hidden
    }
}

impl TryFrom<i32> for AxesVisibility {
    type Error = ArmatureError;

    fn try_from(value: i32) -> Result<Self, ArmatureError> {
        match value {
            0 => Ok(AxesVisibility::Hidden),
            1 => Ok(AxesVisibility::ShowRestTransform),
            2 => Ok(AxesVisibility::ShowPoseTransform),
            _ => {
                tracing::error!("Unknown axes visibility: {}", value);
                Err(ArmatureError::UnknownAxesVisibility {
                    value: value.to_string(),
                })
            }
        }
    }
}

/// Axis aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: na::Point3<f64>,
    pub max: na::Point3<f64>,
}

impl Aabb {
    pub fn from_points(a: &na::Point3<f64>, b: &na::Point3<f64>) -> Self {
        Aabb {
            min: a.coords.inf(&b.coords).into(),
            max: a.coords.sup(&b.coords).into(),
        }
    }

    /// Grows box by `margin` in every direction.
    pub fn expanded(&self, margin: f64) -> Self {
        let margin = na::Vector3::repeat(margin);
        Aabb {
            min: self.min - margin,
            max: self.max + margin,
        }
    }

    pub fn union(&self, other: &Aabb) -> Self {
        Aabb {
            min: self.min.coords.inf(&other.min.coords).into(),
            max: self.max.coords.sup(&other.max.coords).into(),
        }
    }

    pub fn contains(&self, point: &na::Point3<f64>) -> bool {
        (0..3).all(|i| self.min[i] <= point[i] && point[i] <= self.max[i])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CylinderRepresentation {
    pub sides: u32,
    pub capping: bool,
}

impl Default for CylinderRepresentation {
    fn default() -> Self {
        CylinderRepresentation {
            sides: 5,
            capping: true,
        }
    }
}

impl CylinderRepresentation {
    /// Tube radius for bone of given length.
    pub fn radius(&self, length: f64) -> f64 {
        length / 10.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DoubleConeRepresentation {
    /// Position of the widest section as fraction of bone length from head.
    pub waist: f64,
}

impl Default for DoubleConeRepresentation {
    fn default() -> Self {
        DoubleConeRepresentation { waist: 0.1 }
    }
}

impl DoubleConeRepresentation {
    /// Radius of the widest section for bone of given length.
    pub fn radius(&self, length: f64) -> f64 {
        length / 10.0
    }

    /// World-space center of the widest section.
    pub fn waist_center(
        &self,
        head: &na::Point3<f64>,
        tail: &na::Point3<f64>,
    ) -> na::Point3<f64> {
        head + (tail - head) * self.waist
    }
}

/// Geometry attached to a single bone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Representation {
    Line,
    Cylinder(CylinderRepresentation),
    DoubleCone(DoubleConeRepresentation),
}

impl Representation {
    /// Default representation for the style.
    /// `RepresentationStyle::None` has no representation.
    pub fn for_style(style: RepresentationStyle) -> Option<Self> {
        match style {
            RepresentationStyle::None => None,
            RepresentationStyle::Line => Some(Representation::Line),
            RepresentationStyle::Cylinder => {
                Some(Representation::Cylinder(Default::default()))
            }
            RepresentationStyle::DoubleCone => {
                Some(Representation::DoubleCone(Default::default()))
            }
        }
    }

    pub fn style(&self) -> RepresentationStyle {
        match self {
            Representation::Line => RepresentationStyle::Line,
            Representation::Cylinder(_) => RepresentationStyle::Cylinder,
            Representation::DoubleCone(_) => RepresentationStyle::DoubleCone,
        }
    }

    /// Distance the geometry extends away from the bone axis.
    pub fn radius(&self, length: f64) -> f64 {
        match self {
            Representation::Line => 0.0,
            Representation::Cylinder(cylinder) => cylinder.radius(length),
            Representation::DoubleCone(cone) => cone.radius(length),
        }
    }

    /// Conservative world bounds of geometry for bone segment.
    pub fn bounds(
        &self,
        head: &na::Point3<f64>,
        tail: &na::Point3<f64>,
    ) -> Aabb {
        let length = (tail - head).norm();
        Aabb::from_points(head, tail).expanded(self.radius(length))
    }
}
