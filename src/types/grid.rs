/// A rectangle in meters, used both for map-fetch windows and dirty-rect reporting.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }
}

/// Options controlling full-map synthesis and preview-grid construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMapGenerationOptions {
    pub resolution_m: f32,
    pub canvas_w_m: f32,
    pub canvas_h_m: f32,
    pub active_map_only: bool,
    pub height_range_specified: bool,
    pub min_height_m: f32,
    pub max_height_m: f32,
}

impl Default for GridMapGenerationOptions {
    fn default() -> Self {
        GridMapGenerationOptions {
            resolution_m: 0.05,
            canvas_w_m: 50.0,
            canvas_h_m: 50.0,
            active_map_only: true,
            height_range_specified: false,
            min_height_m: 0.0,
            max_height_m: 0.0,
        }
    }
}

/// The dimension (in meters) and resolution of a [`GridMap2D`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GridMapDimension {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

/// Actual dimensions returned by a [`crate::components::LidarMapBuilder::read_cell_data`] fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridCellFetchInfo {
    pub real_x: i32,
    pub real_y: i32,
    pub cell_w: u32,
    pub cell_h: u32,
}

/// A 2D occupancy grid snapshot: dimension, resolution, and a cell buffer.
///
/// `cells.len() == cell_w * cell_h` always (invariant 4). Each byte is either
/// raw log-odds or, if fetched with `l2p_mapping = true`, a linear mapping
/// where `255 = occupied`, `127 = free`, `0 = unknown`.
#[derive(Debug, Clone)]
pub struct GridMap2D {
    pub dimension: GridMapDimension,
    pub resolution_m: f32,
    pub fetch_info: GridCellFetchInfo,
    pub cells: Vec<u8>,
}

impl GridMap2D {
    pub fn cell_count(&self) -> usize {
        self.fetch_info.cell_w as usize * self.fetch_info.cell_h as usize
    }
}

/// Raw log-odds cell classification thresholds, used when `l2p_mapping = false`.
pub fn classify_log_odds(byte: u8) -> CellState {
    if byte > 180 {
        CellState::Occupied
    } else if byte < 75 {
        CellState::Free
    } else {
        CellState::Unknown
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Occupied,
    Free,
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_odds_thresholds() {
        assert_eq!(classify_log_odds(200), CellState::Occupied);
        assert_eq!(classify_log_odds(181), CellState::Occupied);
        assert_eq!(classify_log_odds(74), CellState::Free);
        assert_eq!(classify_log_odds(0), CellState::Free);
        assert_eq!(classify_log_odds(128), CellState::Unknown);
    }

    #[test]
    fn zero_area_rect_is_empty() {
        assert!(Rect::default().is_empty());
        assert!(!Rect { x: 0.0, y: 0.0, w: 1.0, h: 1.0 }.is_empty());
    }
}
