//! Typed schema handles over prim specs.
//!
//! A handle borrows a [`PrimSpec`] and exposes the schema's attributes with
//! their fallback values. Handles that share behaviour are reached through
//! trait objects: [`xformable`] returns a `Box<dyn Xformable>` for any prim
//! type that carries transform ops, and [`Xformable::as_boundable`] narrows
//! it further for prims with an extent.

use usdview_math::{Bounds3, DVec3};

use super::types::{AttrValue, PrimSpec};
use crate::tokens::Tokens;

/// Common interface of every schema handle.
pub trait Schema {
    fn prim(&self) -> &PrimSpec;

    /// Schema type name as authored in the layer
    fn schema_type(&self) -> &'static str;

    fn path(&self) -> &str {
        &self.prim().path
    }
}

/// Schemas that can carry transform ops.
pub trait Xformable: Schema {
    /// Authored `xformOp:translate`, or zero
    fn translate(&self) -> DVec3 {
        self.prim()
            .attribute("xformOp:translate")
            .and_then(AttrValue::as_vec3)
            .unwrap_or(DVec3::ZERO)
    }

    /// Sum of every `xformOp:translate` op (including suffixed ones such
    /// as `xformOp:translate:bounce`) evaluated at `time`
    fn translate_at(&self, time: f64) -> DVec3 {
        self.prim()
            .attributes
            .iter()
            .filter(|(name, _)| {
                name.as_str() == "xformOp:translate" || name.starts_with("xformOp:translate:")
            })
            .filter_map(|(_, value)| value.vec3_at(time))
            .sum()
    }

    fn as_boundable(&self) -> Option<&dyn Boundable> {
        None
    }
}

/// Schemas with a local-space extent.
pub trait Boundable: Xformable {
    fn local_extent(&self) -> Bounds3;
}

macro_rules! schema_handle {
    ($(#[$meta:meta])* $name:ident, $type_name:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name<'a> {
            prim: &'a PrimSpec,
        }

        impl<'a> $name<'a> {
            pub const TYPE_NAME: &'static str = $type_name;

            /// Wrap `prim` when its type name matches this schema
            pub fn get(prim: &'a PrimSpec) -> Option<Self> {
                (prim.type_name == *$type_name).then_some(Self { prim })
            }
        }

        impl Schema for $name<'_> {
            fn prim(&self) -> &PrimSpec {
                self.prim
            }

            fn schema_type(&self) -> &'static str {
                $type_name
            }
        }
    };
}

schema_handle!(
    /// Transform-only grouping prim.
    Xform,
    "Xform"
);
schema_handle!(
    /// Non-transformable grouping prim.
    Scope,
    "Scope"
);
schema_handle!(Mesh, "Mesh");
schema_handle!(Cube, "Cube");
schema_handle!(Sphere, "Sphere");
schema_handle!(Camera, "Camera");
schema_handle!(DomeLight, "DomeLight");
schema_handle!(DistantLight, "DistantLight");

impl Xformable for Xform<'_> {}
impl Xformable for Camera<'_> {}
impl Xformable for DomeLight<'_> {}
impl Xformable for DistantLight<'_> {}

impl Xformable for Mesh<'_> {
    fn as_boundable(&self) -> Option<&dyn Boundable> {
        Some(self)
    }
}

impl Xformable for Cube<'_> {
    fn as_boundable(&self) -> Option<&dyn Boundable> {
        Some(self)
    }
}

impl Xformable for Sphere<'_> {
    fn as_boundable(&self) -> Option<&dyn Boundable> {
        Some(self)
    }
}

/// Authored `extent` as a box, if present and well formed.
fn authored_extent(prim: &PrimSpec) -> Option<Bounds3> {
    match prim.attribute("extent").and_then(AttrValue::as_vec3_array) {
        Some([min, max]) => Some(Bounds3::from_corners(*min, *max)),
        _ => None,
    }
}

impl Mesh<'_> {
    pub fn points(&self) -> &[DVec3] {
        self.prim
            .attribute("points")
            .and_then(AttrValue::as_vec3_array)
            .unwrap_or_default()
    }
}

impl Boundable for Mesh<'_> {
    fn local_extent(&self) -> Bounds3 {
        authored_extent(self.prim).unwrap_or_else(|| Bounds3::from_points(self.points()))
    }
}

impl Cube<'_> {
    /// Edge length, 2 when unauthored
    pub fn size(&self) -> f64 {
        self.prim
            .attribute("size")
            .and_then(AttrValue::as_scalar)
            .unwrap_or(2.0)
    }
}

impl Boundable for Cube<'_> {
    fn local_extent(&self) -> Bounds3 {
        authored_extent(self.prim).unwrap_or_else(|| {
            let half = DVec3::splat(self.size() * 0.5);
            Bounds3::from_corners(-half, half)
        })
    }
}

impl Sphere<'_> {
    /// Radius, 1 when unauthored
    pub fn radius(&self) -> f64 {
        self.prim
            .attribute("radius")
            .and_then(AttrValue::as_scalar)
            .unwrap_or(1.0)
    }
}

impl Boundable for Sphere<'_> {
    fn local_extent(&self) -> Bounds3 {
        authored_extent(self.prim).unwrap_or_else(|| {
            let r = DVec3::splat(self.radius());
            Bounds3::from_corners(-r, r)
        })
    }
}

/// Any other typed prim: transformable, bounded only by an authored extent.
#[derive(Clone, Copy, Debug)]
pub struct Gprim<'a> {
    prim: &'a PrimSpec,
}

impl Schema for Gprim<'_> {
    fn prim(&self) -> &PrimSpec {
        self.prim
    }

    fn schema_type(&self) -> &'static str {
        "Gprim"
    }
}

impl Xformable for Gprim<'_> {
    fn as_boundable(&self) -> Option<&dyn Boundable> {
        Some(self)
    }
}

impl Boundable for Gprim<'_> {
    fn local_extent(&self) -> Bounds3 {
        authored_extent(self.prim).unwrap_or(Bounds3::EMPTY)
    }
}

/// Dispatch a prim to its transformable schema handle.
///
/// Typeless prims and scopes are not transformable and return `None`.
pub fn xformable<'a>(prim: &'a PrimSpec, tokens: &Tokens) -> Option<Box<dyn Xformable + 'a>> {
    let t = &prim.type_name;

    if t.is_empty() || *t == tokens.scope {
        None
    } else if *t == tokens.xform {
        Some(Box::new(Xform { prim }))
    } else if *t == tokens.mesh {
        Some(Box::new(Mesh { prim }))
    } else if *t == tokens.cube {
        Some(Box::new(Cube { prim }))
    } else if *t == tokens.sphere {
        Some(Box::new(Sphere { prim }))
    } else if *t == tokens.camera {
        Some(Box::new(Camera { prim }))
    } else if *t == tokens.dome_light {
        Some(Box::new(DomeLight { prim }))
    } else if *t == tokens.distant_light {
        Some(Box::new(DistantLight { prim }))
    } else {
        Some(Box::new(Gprim { prim }))
    }
}
