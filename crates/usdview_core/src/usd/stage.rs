//! Stage: an opened layer with time, axis and bounds queries.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use usdview_math::{Bounds3, DVec3, UpAxis};

use super::builtin::DEFAULT_SCENE;
use super::parser::{parse_usda, ParseError};
use super::schema::xformable;
use super::types::{Layer, LayerMetadata, PrimSpec};
use crate::tokens::Tokens;

/// Frame rate assumed when a layer does not author one.
pub const DEFAULT_FRAMES_PER_SECOND: f64 = 24.0;

/// Half extent of the box used when a stage has no usable bounds.
pub const FALLBACK_HALF_EXTENT: f64 = 10.0;

const USDC_MAGIC: &[u8] = b"PXR-USDC";

/// Errors that can occur while opening a stage.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Binary crate files are not supported: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("Layer is not valid UTF-8: {0}")]
    InvalidUtf8(PathBuf),
}

/// Result type for stage operations.
pub type StageResult<T> = Result<T, StageError>;

/// A single opened layer.
///
/// Composition arcs are not followed; the stage reflects exactly what the
/// root layer authors.
pub struct Stage {
    path: Option<PathBuf>,
    layer: Layer,
    tokens: Arc<Tokens>,
}

impl Stage {
    /// Open a text layer (`.usda`, or `.usd` holding ASCII content).
    pub fn open<P: AsRef<Path>>(path: P, tokens: Arc<Tokens>) -> StageResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| StageError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if bytes.starts_with(USDC_MAGIC) {
            return Err(StageError::UnsupportedFormat(path.to_path_buf()));
        }

        let content =
            String::from_utf8(bytes).map_err(|_| StageError::InvalidUtf8(path.to_path_buf()))?;

        log::info!("Opening stage {}", path.display());
        let layer = parse_usda(&content, &tokens)?;

        Ok(Self {
            path: Some(path.to_path_buf()),
            layer,
            tokens,
        })
    }

    /// Build an anonymous stage from USDA text.
    pub fn from_usda_str(content: &str, tokens: Arc<Tokens>) -> StageResult<Self> {
        let layer = parse_usda(content, &tokens)?;
        Ok(Self {
            path: None,
            layer,
            tokens,
        })
    }

    /// The animated two-cube scene shown when no file is given.
    pub fn default_scene(tokens: Arc<Tokens>) -> StageResult<Self> {
        Self::from_usda_str(DEFAULT_SCENE, tokens)
    }

    /// File the stage was opened from; `None` for in-memory stages
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn metadata(&self) -> &LayerMetadata {
        &self.layer.metadata
    }

    pub fn root_prims(&self) -> &[PrimSpec] {
        &self.layer.root_prims
    }

    pub fn tokens(&self) -> &Arc<Tokens> {
        &self.tokens
    }

    /// True when both start and end time codes are authored.
    pub fn has_authored_time_code_range(&self) -> bool {
        let m = &self.layer.metadata;
        m.start_time_code.is_some() && m.end_time_code.is_some()
    }

    pub fn start_time_code(&self) -> f64 {
        self.layer.metadata.start_time_code.unwrap_or(0.0)
    }

    pub fn end_time_code(&self) -> f64 {
        self.layer.metadata.end_time_code.unwrap_or(0.0)
    }

    /// Authored frames per second, or 24
    pub fn frames_per_second(&self) -> f64 {
        self.layer
            .metadata
            .frames_per_second
            .unwrap_or(DEFAULT_FRAMES_PER_SECOND)
    }

    /// Authored time codes per second, falling back to the frame rate
    pub fn time_codes_per_second(&self) -> f64 {
        self.layer
            .metadata
            .time_codes_per_second
            .unwrap_or_else(|| self.frames_per_second())
    }

    pub fn up_axis(&self) -> UpAxis {
        self.layer.metadata.up_axis.unwrap_or_default()
    }

    pub fn default_prim(&self) -> Option<&PrimSpec> {
        let name = self.layer.metadata.default_prim.as_deref()?;
        self.layer.root_prims.iter().find(|p| p.name == name)
    }

    /// Every prim in depth-first pre-order.
    pub fn traverse(&self) -> Vec<&PrimSpec> {
        self.layer
            .root_prims
            .iter()
            .flat_map(PrimSpec::descendants)
            .collect()
    }

    pub fn prim_at_path(&self, path: &str) -> Option<&PrimSpec> {
        self.traverse().into_iter().find(|p| p.path == path)
    }

    /// Union of every boundable prim's extent at the start time code, offset
    /// by accumulated translate ops. Empty when nothing is boundable.
    pub fn world_bounds(&self) -> Bounds3 {
        self.prim_boxes_at(self.start_time_code())
            .iter()
            .fold(Bounds3::EMPTY, |acc, (_, bounds)| acc.union(bounds))
    }

    /// [`world_bounds`](Self::world_bounds), or `[-10, 10]` on every axis
    /// when that is empty or not finite.
    pub fn world_bounds_or_default(&self) -> Bounds3 {
        let bounds = self.world_bounds();
        if bounds.is_empty() || !bounds.is_finite() {
            log::debug!("Stage bounds unusable, using fallback box");
            return Bounds3::from_corners(
                DVec3::splat(-FALLBACK_HALF_EXTENT),
                DVec3::splat(FALLBACK_HALF_EXTENT),
            );
        }
        bounds
    }

    /// World-space box of every boundable prim at `time`, with translate
    /// ops (time samples included) evaluated at that time.
    pub fn prim_boxes_at(&self, time: f64) -> Vec<(&PrimSpec, Bounds3)> {
        let mut boxes = Vec::new();
        for prim in &self.layer.root_prims {
            self.collect_boxes(prim, DVec3::ZERO, time, &mut boxes);
        }
        boxes
    }

    fn collect_boxes<'s>(
        &'s self,
        prim: &'s PrimSpec,
        parent_offset: DVec3,
        time: f64,
        out: &mut Vec<(&'s PrimSpec, Bounds3)>,
    ) {
        let mut offset = parent_offset;

        if let Some(handle) = xformable(prim, &self.tokens) {
            offset += handle.translate_at(time);
            if let Some(boundable) = handle.as_boundable() {
                let local = boundable.local_extent();
                if !local.is_empty() {
                    out.push((prim, local.translated(offset)));
                }
            }
        }

        for child in &prim.children {
            self.collect_boxes(child, offset, time, out);
        }
    }

    /// One line per prim, `name(Type) -> /path`; the type is omitted for
    /// typeless prims.
    pub fn outline(&self) -> Vec<String> {
        self.traverse()
            .into_iter()
            .map(|prim| {
                if prim.type_name.is_empty() {
                    format!("{} -> {}", prim.name, prim.path)
                } else {
                    format!("{}({}) -> {}", prim.name, prim.type_name, prim.path)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_stage() -> Stage {
        Stage::default_scene(Arc::new(Tokens::new())).unwrap()
    }

    #[test]
    fn test_default_scene_time_range() {
        let stage = default_stage();
        assert!(stage.has_authored_time_code_range());
        assert_eq!(stage.start_time_code(), 0.0);
        assert_eq!(stage.end_time_code(), 120.0);
        assert_eq!(stage.frames_per_second(), 24.0);
        assert_eq!(stage.up_axis(), UpAxis::Y);
        assert_eq!(stage.default_prim().map(|p| p.path.as_str()), Some("/Geometry"));
    }

    #[test]
    fn test_default_scene_outline() {
        let stage = default_stage();
        assert_eq!(
            stage.outline(),
            vec![
                "World -> /World",
                "DefaultDomeLight(DomeLight) -> /World/DefaultDomeLight",
                "DistantLight(DistantLight) -> /World/DistantLight",
                "Geometry(Xform) -> /Geometry",
                "SubdividedCube(Mesh) -> /Geometry/SubdividedCube",
                "Cube(Cube) -> /Geometry/Cube",
            ]
        );
    }

    #[test]
    fn test_default_scene_world_bounds() {
        let stage = default_stage();
        let bounds = stage.world_bounds();

        // Mesh: unit cube at x = -1.5; Cube: size 2 at x = 1.5
        assert_eq!(bounds.min, DVec3::new(-2.0, -1.0, -1.0));
        assert_eq!(bounds.max, DVec3::new(2.5, 1.0, 1.0));
        assert!(stage.prim_at_path("/Geometry/Cube").unwrap().is_animated());
    }

    #[test]
    fn test_prim_boxes_follow_animation() {
        let stage = default_stage();

        let at_start = stage.prim_boxes_at(0.0);
        let at_peak = stage.prim_boxes_at(30.0);
        assert_eq!(at_start.len(), 2);

        let cube_start = at_start.iter().find(|(p, _)| p.name == "Cube").unwrap().1;
        let cube_peak = at_peak.iter().find(|(p, _)| p.name == "Cube").unwrap().1;
        assert_eq!(cube_peak.center() - cube_start.center(), DVec3::new(0.0, 0.5, 0.0));
    }

    #[test]
    fn test_unauthored_metadata_defaults() {
        let stage = Stage::from_usda_str("#usda 1.0\n", Arc::new(Tokens::new())).unwrap();
        assert!(!stage.has_authored_time_code_range());
        assert_eq!(stage.frames_per_second(), DEFAULT_FRAMES_PER_SECOND);
        assert_eq!(stage.time_codes_per_second(), DEFAULT_FRAMES_PER_SECOND);
        assert!(stage.path().is_none());
    }

    #[test]
    fn test_empty_stage_bounds_fall_back() {
        let stage = Stage::from_usda_str(
            "#usda 1.0\ndef Xform \"Empty\" {\n}\n",
            Arc::new(Tokens::new()),
        )
        .unwrap();

        assert!(stage.world_bounds().is_empty());
        let bounds = stage.world_bounds_or_default();
        assert_eq!(bounds.min, DVec3::splat(-10.0));
        assert_eq!(bounds.max, DVec3::splat(10.0));
    }

    #[test]
    fn test_nested_translates_accumulate() {
        let stage = Stage::from_usda_str(
            r#"#usda 1.0
def Xform "A"
{
    double3 xformOp:translate = (10, 0, 0)
    def Scope "Group"
    {
        def Sphere "Ball"
        {
            double3 xformOp:translate = (0, 5, 0)
        }
    }
}
"#,
            Arc::new(Tokens::new()),
        )
        .unwrap();

        let bounds = stage.world_bounds();
        assert_eq!(bounds.center(), DVec3::new(10.0, 5.0, 0.0));
    }

    #[test]
    fn test_world_bounds_include_suffixed_translates() {
        let stage = Stage::from_usda_str(
            r#"#usda 1.0
(
    startTimeCode = 10
)
def Cube "Box"
{
    double size = 2
    double3 xformOp:translate:pivot = (100, 0, 0)
    double3 xformOp:translate:lift.timeSamples = {
        0: (0, 0, 0),
        10: (0, 4, 0),
    }
}
"#,
            Arc::new(Tokens::new()),
        )
        .unwrap();

        let bounds = stage.world_bounds();
        assert_eq!(bounds.center(), DVec3::new(100.0, 4.0, 0.0));

        for (_, prim_box) in stage.prim_boxes_at(stage.start_time_code()) {
            assert_eq!(bounds.union(&prim_box), bounds);
        }
    }

    #[test]
    fn test_open_rejects_binary_crate() {
        let path = std::env::temp_dir().join("usdview_stage_binary.usdc");
        fs::write(&path, b"PXR-USDC\0\0\0\0").unwrap();

        let result = Stage::open(&path, Arc::new(Tokens::new()));
        assert!(matches!(result, Err(StageError::UnsupportedFormat(_))));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_open_missing_file() {
        let result = Stage::open("/nonexistent/stage.usda", Arc::new(Tokens::new()));
        assert!(matches!(result, Err(StageError::Io { .. })));
    }
}
