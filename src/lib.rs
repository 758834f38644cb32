pub mod config;
pub mod error;
pub mod geometry;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod navigation;
pub mod surface;
pub mod text_metrics;

pub use config::{LayoutConfig, load_config};
pub use error::{DocumentError, LayoutWarning};
pub use geometry::{Point, Rect, Size};
pub use ir::{Entity, ForestEntry, ForestId, LabelId, NodeId, ProofDocument, TreeId};
pub use layout::{Borders, LayoutEngine, LayoutUpdate, NodeLayout};
pub use surface::{RecordingSurface, RenderSurface};
