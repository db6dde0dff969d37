/// UI layer
///
/// - `zoom`: zoom/pan geometry for the hi-res viewer
/// - `canvas`: canvas program drawing the zoomable photo
/// - `sidebar`: filter groups, count and similarity controls
/// - `grid`: thumbnail grid and status text

pub mod canvas;
pub mod grid;
pub mod sidebar;
pub mod zoom;
