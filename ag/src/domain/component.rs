//! Component descriptors and render artifacts

use serde::{Deserialize, Serialize};

use super::id::ComponentId;

/// Which renderer implementation handles a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    Vector,
    Raster,
}

impl RendererKind {
    /// Classify a component by its file extension
    pub fn from_extension(extension: &str) -> Self {
        if extension.trim_start_matches('.').eq_ignore_ascii_case("svg") {
            Self::Vector
        } else {
            Self::Raster
        }
    }
}

impl std::fmt::Display for RendererKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vector => write!(f, "vector"),
            Self::Raster => write!(f, "raster"),
        }
    }
}

impl std::str::FromStr for RendererKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vector" => Ok(Self::Vector),
            "raster" | "pixmap" => Ok(Self::Raster),
            _ => Err(format!("Unknown renderer kind: {}", s)),
        }
    }
}

/// A single exportable asset belonging to a layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Registry key for render jobs
    pub id: ComponentId,

    /// Output extension (png, jpg, webp, svg, ...)
    pub extension: String,

    /// Output file name, if the source assigned one
    #[serde(default)]
    pub file: Option<String>,

    /// Output scale factor (1.0 when absent)
    #[serde(default)]
    pub scale: Option<f32>,
}

impl Component {
    pub fn new(id: impl Into<ComponentId>, extension: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            extension: extension.into(),
            file: None,
            scale: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Renderer kind derived from the extension
    pub fn kind(&self) -> RendererKind {
        RendererKind::from_extension(&self.extension)
    }

    pub fn is_vector(&self) -> bool {
        self.kind() == RendererKind::Vector
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale.unwrap_or(1.0)
    }
}

/// Pixel bounds of a layer, edges inclusive of top/left and exclusive of bottom/right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
}

impl Bounds {
    pub fn new(top: i32, left: i32, bottom: i32, right: i32) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    pub fn width(&self) -> u32 {
        span(self.left, self.right)
    }

    pub fn height(&self) -> u32 {
        span(self.top, self.bottom)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Any two i32 edges differ by at most u32::MAX
fn span(from: i32, to: i32) -> u32 {
    (i64::from(to) - i64::from(from)).max(0) as u32
}

/// Options for an exact-bounds query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundsQuery {
    /// Ask only for geometry, not pixels
    pub bounds_only: bool,
}

impl BoundsQuery {
    pub fn bounds_only() -> Self {
        Self { bounds_only: true }
    }
}

/// Output of a successful render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderArtifact {
    pub component_id: ComponentId,
    pub width: u32,
    pub height: u32,
    /// Encoded or raw output bytes, as produced by the renderer
    pub data: Vec<u8>,
}
