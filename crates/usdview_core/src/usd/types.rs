//! Layer and prim types produced by the USDA reader.
//!
//! These describe authored opinions only. No composition is performed:
//! references, payloads and variants are left to the native libraries.

use std::collections::BTreeMap;

use usdview_math::{DVec3, UpAxis};

use crate::tokens::Token;

/// Layer-level metadata from the header block of a `.usda` file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerMetadata {
    pub start_time_code: Option<f64>,
    pub end_time_code: Option<f64>,
    pub frames_per_second: Option<f64>,
    pub time_codes_per_second: Option<f64>,
    pub up_axis: Option<UpAxis>,
    pub meters_per_unit: Option<f64>,
    pub default_prim: Option<String>,
    pub doc: Option<String>,
}

/// A parsed `.usda` layer: header metadata plus root prims.
#[derive(Clone, Debug, Default)]
pub struct Layer {
    pub metadata: LayerMetadata,
    pub root_prims: Vec<PrimSpec>,
}

/// How a prim is introduced in its layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Specifier {
    Def,
    Over,
    Class,
}

impl Specifier {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "def" => Some(Specifier::Def),
            "over" => Some(Specifier::Over),
            "class" => Some(Specifier::Class),
            _ => None,
        }
    }
}

/// An authored attribute value.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Scalar(f64),
    Vec3(DVec3),
    Vec3Array(Vec<DVec3>),
    Token(String),
    /// `name.timeSamples = { time: value, ... }`
    TimeSamples(Vec<(f64, AttrValue)>),
    /// Anything the reader keeps verbatim
    Other(String),
}

impl AttrValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            AttrValue::Scalar(v) => Some(*v),
            AttrValue::TimeSamples(samples) => samples.first().and_then(|(_, v)| v.as_scalar()),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<DVec3> {
        match self {
            AttrValue::Vec3(v) => Some(*v),
            AttrValue::TimeSamples(samples) => samples.first().and_then(|(_, v)| v.as_vec3()),
            _ => None,
        }
    }

    pub fn as_vec3_array(&self) -> Option<&[DVec3]> {
        match self {
            AttrValue::Vec3Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_time_sampled(&self) -> bool {
        matches!(self, AttrValue::TimeSamples(_))
    }

    /// Vector value at `time`. Time samples are linearly interpolated and
    /// held constant outside their range; other values ignore `time`.
    pub fn vec3_at(&self, time: f64) -> Option<DVec3> {
        let AttrValue::TimeSamples(samples) = self else {
            return self.as_vec3();
        };

        let after = samples.iter().position(|(t, _)| *t > time);
        match after {
            Some(0) => samples[0].1.as_vec3(),
            Some(i) => {
                let (t0, v0) = (&samples[i - 1].0, samples[i - 1].1.as_vec3()?);
                let (t1, v1) = (&samples[i].0, samples[i].1.as_vec3()?);
                let s = (time - t0) / (t1 - t0);
                Some(v0.lerp(v1, s))
            }
            None => samples.last().and_then(|(_, v)| v.as_vec3()),
        }
    }
}

/// A prim spec with its authored attributes and children.
#[derive(Clone, Debug)]
pub struct PrimSpec {
    /// Prim path (e.g., "/World/Geometry")
    pub path: String,

    /// Prim name (last component of path)
    pub name: String,

    pub specifier: Specifier,

    /// Schema type name; empty for typeless prims
    pub type_name: Token,

    /// Single-line prim metadata such as `kind = "component"`
    pub metadata: BTreeMap<String, String>,

    pub attributes: BTreeMap<String, AttrValue>,

    pub children: Vec<PrimSpec>,
}

impl PrimSpec {
    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    /// True when any attribute carries time samples
    pub fn is_animated(&self) -> bool {
        self.attributes.values().any(AttrValue::is_time_sampled)
    }

    /// Depth-first pre-order walk of this prim and its descendants
    pub fn descendants(&self) -> Vec<&PrimSpec> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(prim) = stack.pop() {
            out.push(prim);
            stack.extend(prim.children.iter().rev());
        }
        out
    }
}
