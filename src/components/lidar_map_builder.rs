//! 2D occupancy-grid preview (continuous) plus on-demand full-map synthesis.

use byteorder::{LittleEndian as LE, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::protocol::CommandId;
use crate::session::Session;
use crate::types::{GridCellFetchInfo, GridMap2D, GridMapDimension, GridMapGenerationOptions, Rect};

/// Device-firmware-fixed limits; not negotiated over the wire.
const MIN_GRID_RESOLUTION_M: f32 = 0.01;
const MAX_GRID_RESOLUTION_M: f32 = 1.0;
const MAX_GRID_CELL_COUNT: u64 = 50_000_000;

const DATA_SYNC_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Non-owning handle onto a [`Session`]'s LiDAR-derived 2D grid map.
pub struct LidarMapBuilder<'a> {
    session: &'a Session,
}

impl<'a> LidarMapBuilder<'a> {
    pub fn new(session: &'a Session) -> LidarMapBuilder<'a> {
        LidarMapBuilder { session }
    }

    /// Begins rasterizing LiDAR scans into a single Session-owned preview grid.
    pub fn start_preview_background_update(&self, options: GridMapGenerationOptions) -> Result<()> {
        let payload = encode_grid_options(&options);
        self.session
            .with_transport(|t| t.request(CommandId::StartPreviewBackgroundUpdate, &payload, None))?;
        *self.session.preview.options.lock() = options;
        self.session.preview.active.store(true, Ordering::Release);
        Ok(())
    }

    pub fn is_preview_background_updating(&self) -> bool {
        self.session.preview.active.load(Ordering::Acquire)
    }

    pub fn stop_preview_background_update(&self) -> Result<()> {
        self.session
            .with_transport(|t| t.request(CommandId::StopPreviewBackgroundUpdate, &[], None))?;
        self.session.preview.active.store(false, Ordering::Release);
        Ok(())
    }

    /// Hints the backend to redraw fully on next cycle.
    pub fn require_preview_redraw(&self) -> Result<()> {
        self.session
            .with_transport(|t| t.request(CommandId::RequirePreviewRedraw, &[], None))?;
        Ok(())
    }

    /// Atomic snapshot and reset of accumulated dirty area since last call.
    pub fn get_and_reset_preview_dirty_rect(&self) -> Result<(Rect, bool)> {
        let resp = self
            .session
            .with_transport(|t| t.request(CommandId::GetAndResetPreviewDirtyRect, &[], None))?;
        let mut r = Cursor::new(&resp.payload);
        let rect = Rect {
            x: r.read_f32::<LE>()?,
            y: r.read_f32::<LE>()?,
            w: r.read_f32::<LE>()?,
            h: r.read_f32::<LE>()?,
        };
        let map_big_change = r.read_u8()? != 0;
        *self.session.preview.dirty_rect.lock() = rect;
        self.session.preview.map_changed.store(map_big_change, Ordering::Release);
        Ok((rect, map_big_change))
    }

    pub fn set_preview_auto_floor_detection(&self, on: bool) -> Result<()> {
        self.session.with_transport(|t| {
            t.request(CommandId::SetPreviewAutoFloorDetection, &[on as u8], None)
        })?;
        self.session.preview.auto_floor_detection.store(on, Ordering::Release);
        Ok(())
    }

    pub fn is_preview_auto_floor_detection(&self) -> bool {
        self.session.preview.auto_floor_detection.load(Ordering::Acquire)
    }

    /// Non-owning view: fetches the full canvas at the preview's active
    /// resolution and caches it on the Session, returning a snapshot clone.
    pub fn get_preview_map(&self) -> Result<GridMap2D> {
        let options = *self.session.preview.options.lock();
        let half_w = options.canvas_w_m / 2.0;
        let half_h = options.canvas_h_m / 2.0;
        let rect = Rect { x: -half_w, y: -half_h, w: options.canvas_w_m, h: options.canvas_h_m };
        let (cells, fetch_info) = self.read_cell_data(rect, options.resolution_m, true)?;
        let grid = GridMap2D {
            dimension: GridMapDimension {
                min_x: rect.x,
                min_y: rect.y,
                max_x: rect.x + rect.w,
                max_y: rect.y + rect.h,
            },
            resolution_m: options.resolution_m,
            fetch_info,
            cells,
        };
        *self.session.preview.grid.write() = Some(grid.clone());
        Ok(grid)
    }

    /// Requires `Controller::enable_map_data_syncing(true)` beforehand.
    /// `wait_for_data_sync=true` blocks until `global_mapping_info().sync_ratio() == 1.0`
    /// or `timeout_ms` elapses.
    pub fn generate_fullmap_on_demand(
        &self,
        options: GridMapGenerationOptions,
        wait_for_data_sync: bool,
        timeout_ms: u64,
    ) -> Result<GridMap2D> {
        if !self.session.is_map_data_syncing() {
            return Err(Error::InvalidArgument(-2));
        }
        if wait_for_data_sync {
            self.wait_for_map_data_sync(timeout_ms)?;
        }

        let payload = encode_grid_options(&options);
        let resp = self.session.with_transport(|t| {
            t.request(
                CommandId::GenerateFullmapOnDemand,
                &payload,
                Some(Duration::from_millis(timeout_ms)),
            )
        })?;
        let mut r = Cursor::new(&resp.payload);
        let dimension = GridMapDimension {
            min_x: r.read_f32::<LE>()?,
            min_y: r.read_f32::<LE>()?,
            max_x: r.read_f32::<LE>()?,
            max_y: r.read_f32::<LE>()?,
        };
        let fetch_info = read_fetch_info(&mut r)?;
        let mut cells = vec![0u8; fetch_info.cell_w as usize * fetch_info.cell_h as usize];
        std::io::Read::read_exact(&mut r, &mut cells)?;
        Ok(GridMap2D {
            dimension,
            resolution_m: options.resolution_m,
            fetch_info,
            cells,
        })
    }

    fn wait_for_map_data_sync(&self, timeout_ms: u64) -> Result<()> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let resp = self
                .session
                .with_transport(|t| t.request(CommandId::FetchGlobalMappingInfo, &[], None))?;
            let wire = crate::protocol::codec::read_global_map_desc_wire(&resp.payload)?;
            let desc = crate::protocol::codec::global_map_desc_from_wire(&wire);
            if desc.sync_ratio() >= 1.0 {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::TimeoutError(-5));
            }
            std::thread::sleep(DATA_SYNC_POLL_INTERVAL);
        }
    }

    /// Buffer sizing rule: `(floor(|w|/res)+1) × (floor(|h|/res)+1)`, the
    /// product doubled once, capped at [`MAX_GRID_CELL_COUNT`].
    pub fn read_cell_data(
        &self,
        fetch_rect: Rect,
        resolution_m: f32,
        l2p_mapping: bool,
    ) -> Result<(Vec<u8>, GridCellFetchInfo)> {
        if fetch_rect.is_empty() {
            return Ok((Vec::new(), GridCellFetchInfo::default()));
        }

        let cell_w = (fetch_rect.w.abs() / resolution_m).floor() as u64 + 1;
        let cell_h = (fetch_rect.h.abs() / resolution_m).floor() as u64 + 1;
        let requested_cells = cell_w.saturating_mul(cell_h).saturating_mul(2).min(MAX_GRID_CELL_COUNT);

        let mut payload = Vec::with_capacity(21);
        payload.write_f32::<LE>(fetch_rect.x)?;
        payload.write_f32::<LE>(fetch_rect.y)?;
        payload.write_f32::<LE>(fetch_rect.w)?;
        payload.write_f32::<LE>(fetch_rect.h)?;
        payload.write_f32::<LE>(resolution_m)?;
        payload.write_u8(l2p_mapping as u8)?;
        payload.write_u64::<LE>(requested_cells)?;

        let resp = self
            .session
            .with_transport(|t| t.request(CommandId::ReadGridCellData, &payload, None))?;
        let mut r = Cursor::new(&resp.payload);
        let fetch_info = read_fetch_info(&mut r)?;
        let mut cells = vec![0u8; fetch_info.cell_w as usize * fetch_info.cell_h as usize];
        std::io::Read::read_exact(&mut r, &mut cells)?;
        Ok((cells, fetch_info))
    }

    pub fn get_supported_grid_resolution_range(&self) -> (f32, f32) {
        (MIN_GRID_RESOLUTION_M, MAX_GRID_RESOLUTION_M)
    }

    pub fn get_supported_max_grid_cell_count(&self) -> u64 {
        MAX_GRID_CELL_COUNT
    }
}

fn read_fetch_info<R: std::io::Read>(r: &mut R) -> Result<GridCellFetchInfo> {
    Ok(GridCellFetchInfo {
        real_x: r.read_i32::<LE>()?,
        real_y: r.read_i32::<LE>()?,
        cell_w: r.read_u32::<LE>()?,
        cell_h: r.read_u32::<LE>()?,
    })
}

fn encode_grid_options(options: &GridMapGenerationOptions) -> Vec<u8> {
    let mut payload = Vec::with_capacity(24);
    payload.write_f32::<LE>(options.resolution_m).unwrap();
    payload.write_f32::<LE>(options.canvas_w_m).unwrap();
    payload.write_f32::<LE>(options.canvas_h_m).unwrap();
    payload.write_u8(options.active_map_only as u8).unwrap();
    payload.write_u8(options.height_range_specified as u8).unwrap();
    payload.write_f32::<LE>(options.min_height_m).unwrap();
    payload.write_f32::<LE>(options.max_height_m).unwrap();
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_rect_returns_empty_cells_without_request() {
        let session = Session::new();
        let builder = LidarMapBuilder::new(&session);
        let (cells, info) = builder.read_cell_data(Rect::default(), 0.05, true).unwrap();
        assert!(cells.is_empty());
        assert_eq!(info.cell_w, 0);
        assert_eq!(info.cell_h, 0);
    }

    #[test]
    fn generate_fullmap_requires_map_data_syncing_enabled() {
        let session = Session::new();
        let builder = LidarMapBuilder::new(&session);
        let result = builder.generate_fullmap_on_demand(GridMapGenerationOptions::default(), false, 1000);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn supported_resolution_range_is_fixed() {
        let session = Session::new();
        let builder = LidarMapBuilder::new(&session);
        let (min, max) = builder.get_supported_grid_resolution_range();
        assert!(min < max);
    }
}
