//! # Renderer
//!
//! Frame loop glue: owns the texture cache, the command ring and the frame
//! counter, and is the only path through which draw calls reach either.
//!
//! ```text
//!   draw_sprite ──▶ ensure_resident ──▶ TextureCache ──▶ VramUpload
//!        │
//!        └────────▶ append ───────────▶ CommandRing ──▶ GpuPort
//!
//!   present ──▶ flush_frame ──▶ FrameTracker::advance
//! ```

use tessera_gpucmd::{CommandRing, PrimLocation, Primitive};
use tessera_hal::{
    ClutId, Error, GpuPort, Result, Rgb, ScreenPoint, TextureId, TextureSource, VramUpload,
};
use tessera_texcache::{FrameNumber, FrameTracker, LockedPages, PageIndex, Residency, TextureCache};

use crate::config::RendererConfig;

/// Outline colour of entries referenced this frame
const LIVE_OUTLINE: Rgb = Rgb::new(0, 255, 0);
/// Outline colour of entries eligible for eviction
const STALE_OUTLINE: Rgb = Rgb::new(255, 0, 0);

/// Texture residency plus primitive submission for one rasterizer
#[derive(Debug)]
pub struct Renderer<S, D> {
    cache: TextureCache,
    ring: CommandRing,
    frames: FrameTracker,
    source: S,
    device: D,
}

impl<S, D> Renderer<S, D>
where
    S: TextureSource,
    D: GpuPort + VramUpload,
{
    /// Create a renderer starting at frame 0
    pub fn new(config: RendererConfig, source: S, device: D) -> Result<Self> {
        Self::starting_at(config, source, device, FrameNumber::new(0))
    }

    /// Create a renderer whose frame counter continues from `frame`
    pub fn starting_at(
        config: RendererConfig,
        source: S,
        device: D,
        frame: FrameNumber,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            cache: TextureCache::new(config.layout)?,
            ring: CommandRing::new(config.ring)?,
            frames: FrameTracker::starting_at(frame),
            source,
            device,
        })
    }

    /// Frame currently being built
    #[inline]
    pub fn frame(&self) -> FrameNumber {
        self.frames.current()
    }

    /// Texture cache
    #[inline]
    pub fn cache(&self) -> &TextureCache {
        &self.cache
    }

    /// Command ring
    #[inline]
    pub fn ring(&self) -> &CommandRing {
        &self.ring
    }

    /// Rasterizer device
    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Rasterizer device, mutably
    #[inline]
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Texture source, mutably
    #[inline]
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Give back the source and device
    pub fn into_parts(self) -> (S, D) {
        (self.source, self.device)
    }

    // -------------------------------------------------------------------------
    // Residency
    // -------------------------------------------------------------------------

    /// Make `texture` resident for the current frame
    pub fn ensure_resident(&mut self, texture: TextureId, width: u16, height: u16) -> Result<Residency> {
        let frame = self.frames.current();
        self.cache
            .ensure_resident(texture, width, height, frame, &mut self.source, &mut self.device)
    }

    /// Evict everything on unlocked pages
    pub fn reset_cache(&mut self) {
        self.cache.reset();
    }

    /// Change the locked pages; resets the cache
    pub fn set_locked_pages(&mut self, locked: LockedPages) {
        self.cache.set_locked_pages(locked);
    }

    // -------------------------------------------------------------------------
    // Submission
    // -------------------------------------------------------------------------

    /// Queue a primitive
    pub fn append(&mut self, prim: &Primitive) -> Result<PrimLocation> {
        self.ring.append(prim, &mut self.device)
    }

    /// Rewrite a data word of a queued primitive
    pub fn patch(&mut self, location: PrimLocation, word: usize, value: u32) -> Result<()> {
        self.ring.patch(location, word, value)
    }

    /// Hand queued primitives to the device while it is idle
    pub fn drain(&mut self) -> Result<usize> {
        self.ring.drain(&mut self.device)
    }

    /// End the frame: submit everything queued, then advance the frame
    ///
    /// Returns the number of the new frame.
    pub fn present(&mut self) -> Result<FrameNumber> {
        let submitted = self.ring.flush_frame(&mut self.device)?;
        let finished = self.frames.current();
        let next = self.frames.advance();
        log::debug!(
            "renderer: frame {} presented, {} primitives",
            finished.raw(),
            submitted
        );
        Ok(next)
    }

    // -------------------------------------------------------------------------
    // Draw helpers
    // -------------------------------------------------------------------------

    /// Draw `texture` as an unscaled sprite at `pos`
    pub fn draw_sprite(
        &mut self,
        texture: TextureId,
        width: u16,
        height: u16,
        pos: ScreenPoint,
        clut: ClutId,
        color: Rgb,
    ) -> Result<Residency> {
        let residency = self.ensure_resident(texture, width, height)?;
        let uv = sprite_uv(residency.u, residency.v)?;

        self.append(&Primitive::draw_mode(residency.tpage))?;
        self.append(&Primitive::sprite(pos, width, height, uv, clut, color))?;
        Ok(residency)
    }

    /// Draw a flat rectangle
    pub fn draw_rect(&mut self, pos: ScreenPoint, width: u16, height: u16, color: Rgb) -> Result<PrimLocation> {
        self.append(&Primitive::tile(pos, width, height, color))
    }

    /// Draw a flat line
    pub fn draw_line(&mut self, from: ScreenPoint, to: ScreenPoint, color: Rgb) -> Result<PrimLocation> {
        self.append(&Primitive::line(from, to, color))
    }

    /// Draw cache page `page` at `origin`, outlining every resident entry
    ///
    /// Entries referenced this frame are outlined in green, the rest in red.
    pub fn draw_vram_viewer(&mut self, page: PageIndex, origin: ScreenPoint, clut: ClutId) -> Result<()> {
        let view = self.cache.page_view(page)?;
        let layout = self.cache.layout();
        let tpage = layout.tpage(page)?;
        let width = layout.cells_x * layout.cell_size;
        let height = layout.cells_y * layout.cell_size;

        self.append(&Primitive::draw_mode(tpage))?;
        self.append(&Primitive::sprite(origin, width, height, (0, 0), clut, Rgb::NEUTRAL))?;

        let frame = self.frames.current();
        for entry in &view.entries {
            let (u, v) = self.cache.layout().cell_texel(entry.cell);
            let x0 = offset(origin.x, u)?;
            let y0 = offset(origin.y, v)?;
            let x1 = offset(x0, entry.width)?;
            let y1 = offset(y0, entry.height)?;
            let color = if entry.is_live(frame) {
                LIVE_OUTLINE
            } else {
                STALE_OUTLINE
            };

            let corners = [
                ScreenPoint::new(x0, y0),
                ScreenPoint::new(x1, y0),
                ScreenPoint::new(x1, y1),
                ScreenPoint::new(x0, y1),
            ];
            for i in 0..corners.len() {
                self.draw_line(corners[i], corners[(i + 1) % corners.len()], color)?;
            }
        }
        Ok(())
    }
}

/// Page-relative texel coordinates as sprite UV bytes
fn sprite_uv(u: u16, v: u16) -> Result<(u8, u8)> {
    let u = u8::try_from(u).map_err(|_| Error::InvalidParameter)?;
    let v = u8::try_from(v).map_err(|_| Error::InvalidParameter)?;
    Ok((u, v))
}

fn offset(base: i16, by: u16) -> Result<i16> {
    i16::try_from(by)
        .ok()
        .and_then(|by| base.checked_add(by))
        .ok_or(Error::InvalidParameter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_hal::soft::SoftGpu;
    use tessera_hal::MemorySource;

    fn renderer() -> Renderer<MemorySource, SoftGpu> {
        let mut source = MemorySource::new();
        source.insert_solid(TextureId::new(1), 64, 32, 0x22);
        source.insert_solid(TextureId::new(2), 16, 16, 0x33);
        Renderer::new(RendererConfig::psx(), source, SoftGpu::new()).unwrap()
    }

    #[test]
    fn test_draw_sprite_queues_mode_and_sprite() {
        let mut r = renderer();
        r.draw_sprite(
            TextureId::new(1),
            64,
            32,
            ScreenPoint::new(8, 8),
            ClutId::default(),
            Rgb::NEUTRAL,
        )
        .unwrap();
        let res = r
            .draw_sprite(
                TextureId::new(2),
                16,
                16,
                ScreenPoint::new(100, 8),
                ClutId::default(),
                Rgb::NEUTRAL,
            )
            .unwrap();
        assert_eq!((res.u, res.v), (64, 0));

        r.present().unwrap();
        let gpu = r.device();
        assert_eq!(gpu.packet_count(), 4);
        assert_eq!(gpu.packet(0).unwrap()[0], 0xE100_0088);
        assert_eq!(gpu.packet(1).unwrap()[0] >> 24, 0x64);
        assert_eq!(gpu.packet(3).unwrap()[2] & 0xFFFF, 64);
    }

    #[test]
    fn test_present_advances_frame() {
        let mut r = renderer();
        assert_eq!(r.frame().raw(), 0);
        assert_eq!(r.present().unwrap().raw(), 1);
        assert_eq!(r.frame().raw(), 1);
        assert_eq!(r.ring().stats().flushes, 1);
    }

    #[test]
    fn test_rect_and_line() {
        let mut r = renderer();
        r.draw_rect(ScreenPoint::new(0, 0), 320, 240, Rgb::new(0, 0, 0))
            .unwrap();
        r.draw_line(ScreenPoint::new(0, 0), ScreenPoint::new(10, 10), Rgb::NEUTRAL)
            .unwrap();
        r.present().unwrap();

        let commands: alloc::vec::Vec<u32> = r.device().packets().map(|p| p[0] >> 24).collect();
        assert_eq!(commands, [0x60, 0x40]);
    }

    #[test]
    fn test_vram_viewer_outlines_entries() {
        let mut r = renderer();
        r.ensure_resident(TextureId::new(1), 64, 32).unwrap();
        r.present().unwrap();
        r.ensure_resident(TextureId::new(2), 16, 16).unwrap();

        r.draw_vram_viewer(PageIndex(0), ScreenPoint::new(0, 0), ClutId::default())
            .unwrap();
        r.present().unwrap();

        let gpu = r.device();
        // draw mode, page sprite, then 4 lines per entry
        assert_eq!(gpu.packet_count(), 2 + 8);
        let sprite = gpu.packet(1).unwrap();
        assert_eq!(sprite[3], (256 << 16) | 256);

        let stale = gpu.packet(2).unwrap();
        assert_eq!(stale[0], 0x4000_0000 | STALE_OUTLINE.packed());
        assert_eq!(stale[2], ScreenPoint::new(64, 0).packed());
        let live = gpu.packet(6).unwrap();
        assert_eq!(live[0], 0x4000_0000 | LIVE_OUTLINE.packed());
    }

    #[test]
    fn test_bad_page_for_viewer() {
        let mut r = renderer();
        assert_eq!(
            r.draw_vram_viewer(PageIndex(11), ScreenPoint::new(0, 0), ClutId::default()),
            Err(Error::InvalidPage(11))
        );
    }
}
