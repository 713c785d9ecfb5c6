//! End-to-end scenarios over a renderer driving a software GPU.

use alloc::vec;
use alloc::vec::Vec;

use tessera_gpucmd::{Primitive, RingConfig};
use tessera_hal::soft::SoftGpu;
use tessera_hal::{Error, MemorySource, TexDepth, TextureId, VramPoint};
use tessera_texcache::{CellPos, PageIndex, VramLayout};

use crate::{Renderer, RendererConfig};

static TWO_PAGES: [VramPoint; 2] = [VramPoint::new(512, 0), VramPoint::new(640, 0)];

const WALL1: TextureId = TextureId::new(1);
const WALL2: TextureId = TextureId::new(2);
const FILLER: TextureId = TextureId::new(3);

/// Two 64x128-texel pages
fn small_config(ring_words: usize) -> RendererConfig {
    RendererConfig {
        layout: VramLayout {
            page_origins: &TWO_PAGES,
            cells_x: 4,
            cells_y: 8,
            ..VramLayout::psx()
        },
        ring: RingConfig {
            capacity_words: ring_words,
            ..RingConfig::psx()
        },
    }
}

fn source_with(textures: &[(TextureId, u16, u16)]) -> MemorySource {
    let mut source = MemorySource::new();
    for &(id, w, h) in textures {
        source.insert_solid(id, w, h, id.raw() as u8);
    }
    source
}

fn assert_no_overlap(r: &Renderer<MemorySource, SoftGpu>) {
    let entries: Vec<_> = r.cache().entries().collect();
    for (i, a) in entries.iter().enumerate() {
        for b in &entries[i + 1..] {
            assert!(!a.overlaps(b), "{} overlaps {}", a.texture, b.texture);
        }
    }
}

#[test]
fn round_trip_wall_textures() {
    let source = source_with(&[(WALL1, 64, 128), (WALL2, 64, 128), (FILLER, 64, 128)]);
    let mut r = Renderer::new(small_config(256), source, SoftGpu::new()).unwrap();
    r.reset_cache();

    let first = r.ensure_resident(WALL1, 64, 128).unwrap();
    assert_eq!(first.page, PageIndex(0));
    assert_eq!(first.cell, CellPos::new(0, 0));
    let entry = r.cache().entry(WALL1).unwrap();
    assert_eq!((entry.width_cells, entry.height_cells), (4, 8));

    let again = r.ensure_resident(WALL1, 64, 128).unwrap();
    assert_eq!(again, first);
    assert_eq!(again.last_used, r.frame());

    r.ensure_resident(FILLER, 64, 128).unwrap();
    r.present().unwrap();

    let second = r.ensure_resident(WALL2, 64, 128).unwrap();
    assert_eq!(second.page, PageIndex(0));
    assert_eq!(second.cell, CellPos::new(0, 0));
    assert!(!r.cache().is_resident(WALL1));
    for y in 0..8 {
        for x in 0..4 {
            let owner = r.cache().owner_of(PageIndex(0), CellPos::new(x, y)).unwrap();
            assert_eq!(owner.texture, WALL2);
        }
    }
    // VRAM now holds WALL2's texels
    assert_eq!(r.device().vram().word(512, 0), Some(0x0202));
}

#[test]
fn overflow_when_one_frame_needs_more_than_exists() {
    let ids: Vec<(TextureId, u16, u16)> = (10..15).map(|i| (TextureId::new(i), 64, 64)).collect();
    let mut r = Renderer::new(small_config(256), source_with(&ids), SoftGpu::new()).unwrap();

    for &(id, w, h) in &ids[..4] {
        r.ensure_resident(id, w, h).unwrap();
    }
    let err = r.ensure_resident(ids[4].0, 64, 64).unwrap_err();
    assert!(matches!(err, Error::CacheOverflow { .. }));
    assert!(err.is_fatal());
    assert_eq!(r.cache().resident_count(), 4);
}

#[test]
fn stamps_never_decrease() {
    let mut r = Renderer::new(small_config(256), source_with(&[(WALL1, 16, 16)]), SoftGpu::new())
        .unwrap();

    let mut last = r.ensure_resident(WALL1, 16, 16).unwrap().last_used;
    for _ in 0..5 {
        let same = r.ensure_resident(WALL1, 16, 16).unwrap().last_used;
        assert_eq!(same, last);
        r.present().unwrap();
        let next = r.ensure_resident(WALL1, 16, 16).unwrap().last_used;
        assert!(next > last);
        last = next;
    }
}

#[test]
fn live_entries_are_never_evicted() {
    let textures = [
        (TextureId::new(1), 64, 64),
        (TextureId::new(2), 64, 64),
        (TextureId::new(3), 64, 128),
        (TextureId::new(4), 64, 64),
    ];
    let mut r = Renderer::new(small_config(256), source_with(&textures), SoftGpu::new()).unwrap();

    // Frame 0: page 0 holds 1 (top) and 2 (bottom), page 1 holds 3
    for &(id, w, h) in &textures[..3] {
        r.ensure_resident(id, w, h).unwrap();
    }
    r.present().unwrap();

    // Frame 1: 3 and 1 are live, so 4 may only take 2's place
    r.ensure_resident(TextureId::new(3), 64, 128).unwrap();
    r.ensure_resident(TextureId::new(1), 64, 64).unwrap();
    let placed = r.ensure_resident(TextureId::new(4), 64, 64).unwrap();

    assert_eq!(placed.page, PageIndex(0));
    assert_eq!(placed.cell, CellPos::new(0, 4));
    assert!(r.cache().is_resident(TextureId::new(1)));
    assert!(r.cache().is_resident(TextureId::new(3)));
    assert!(!r.cache().is_resident(TextureId::new(2)));
    assert_no_overlap(&r);
}

#[test]
fn evicted_footprint_fully_cleared() {
    let big = TextureId::new(1);
    let small = TextureId::new(2);
    let filler = TextureId::new(3);
    let source = source_with(&[(big, 64, 128), (small, 16, 16), (filler, 64, 128)]);
    let mut r = Renderer::new(small_config(256), source, SoftGpu::new()).unwrap();

    r.ensure_resident(big, 64, 128).unwrap();
    r.ensure_resident(filler, 64, 128).unwrap();
    r.present().unwrap();

    r.ensure_resident(filler, 64, 128).unwrap();
    let placed = r.ensure_resident(small, 16, 16).unwrap();
    assert_eq!((placed.page, placed.cell), (PageIndex(0), CellPos::new(0, 0)));

    // Only the new 1x1 footprint is occupied; nothing of the old 4x8 remains
    let view = r.cache().page_view(PageIndex(0)).unwrap();
    assert_eq!(view.occupied_cells, 1);
    assert_eq!(view.entries.len(), 1);
    assert_eq!(view.entries[0].texture, small);
    assert!(r.cache().owner_of(PageIndex(0), CellPos::new(3, 7)).is_none());
}

#[test]
fn residency_churn_keeps_footprints_disjoint() {
    let sizes = [(16, 16), (32, 48), (64, 16), (16, 64), (48, 32), (32, 32)];
    let textures: Vec<(TextureId, u16, u16)> = (0..24u32)
        .map(|i| {
            let (w, h) = sizes[i as usize % sizes.len()];
            (TextureId::new(i), w, h)
        })
        .collect();
    let mut r = Renderer::new(small_config(256), source_with(&textures), SoftGpu::new()).unwrap();

    for frame in 1..=12u32 {
        for k in 0..3u32 {
            let (id, w, h) = textures[((frame * 5 + k * 7) % 24) as usize];
            r.ensure_resident(id, w, h).unwrap();
            assert_no_overlap(&r);
        }
        r.present().unwrap();
    }
    assert!(r.cache().stats().evictions > 0);
}

#[test]
fn ring_is_fifo_without_duplicates() {
    let mut r = Renderer::new(small_config(24), MemorySource::new(), SoftGpu::new().with_latency(2))
        .unwrap();

    for i in 0..50u32 {
        let len = 1 + (i as usize % 4);
        let words: Vec<u32> = core::iter::repeat(i).take(len).collect();
        r.append(&Primitive::from_words(&words).unwrap()).unwrap();
    }
    r.present().unwrap();

    let observed: Vec<u32> = r.device().packets().map(|p| p[0]).collect();
    let expected: Vec<u32> = (0..50).collect();
    assert_eq!(observed, expected);
}

#[test]
fn append_never_overwrites_unconsumed_primitives() {
    let mut r = Renderer::new(small_config(20), MemorySource::new(), SoftGpu::new().with_latency(1))
        .unwrap();

    let mut appended: Vec<Vec<u32>> = Vec::new();
    for i in 0..60u32 {
        let len = 1 + (i as usize % 6);
        let words: Vec<u32> = (0..len as u32).map(|w| (i << 8) | w).collect();
        r.append(&Primitive::from_words(&words).unwrap()).unwrap();
        appended.push(words);

        // Whatever the consumer has not seen yet is still intact, in order
        let consumed = r.device().packet_count();
        let pending: Vec<&[u32]> = r.ring().pending().collect();
        let expected: Vec<&[u32]> = appended[consumed..].iter().map(Vec::as_slice).collect();
        assert_eq!(pending, expected);
    }
}

#[test]
fn hung_consumer_reports_stall() {
    let mut config = small_config(8);
    config.ring.stall_limit = Some(16);
    let mut r = Renderer::new(config, MemorySource::new(), SoftGpu::new()).unwrap();

    let prim = Primitive::from_words(&[1, 2, 3]).unwrap();
    r.append(&prim).unwrap();
    r.device_mut().set_hung(true);

    assert_eq!(r.append(&prim).unwrap_err(), Error::RingStall { polls: 16 });
    assert_eq!(r.present().unwrap_err(), Error::RingStall { polls: 16 });
}

#[test]
fn malformed_texture_is_not_substituted() {
    let mut source = MemorySource::new();
    source.insert_solid(WALL1, 32, 32, 1);
    let mut r = Renderer::new(small_config(256), source, SoftGpu::new()).unwrap();

    let err = r.ensure_resident(WALL1, 64, 64).unwrap_err();
    assert!(matches!(err, Error::MalformedTexture { texture, .. } if texture == WALL1));
    assert!(!r.cache().is_resident(WALL1));
}

#[test]
fn direct15_pages_keep_their_texels() {
    let mut config = RendererConfig::psx();
    config.layout.depth = TexDepth::Direct15;
    assert!(matches!(
        Renderer::new(config.clone(), MemorySource::new(), SoftGpu::new()),
        Err(Error::InvalidParameter)
    ));

    // One row of 16 cells per page, pages a full 256 words apart
    static SPACED: [VramPoint; 2] = [VramPoint::new(0, 256), VramPoint::new(256, 256)];
    config.layout = VramLayout {
        page_origins: &SPACED,
        cells_y: 1,
        depth: TexDepth::Direct15,
        ..VramLayout::psx()
    };
    let mut source = MemorySource::new();
    source.insert_raw(WALL1, 256, 16, vec![0x11; 256 * 2 * 16]);
    source.insert_raw(WALL2, 256, 16, vec![0x22; 256 * 2 * 16]);
    let mut r = Renderer::new(config, source, SoftGpu::new()).unwrap();

    let a = r.ensure_resident(WALL1, 256, 16).unwrap();
    let b = r.ensure_resident(WALL2, 256, 16).unwrap();
    assert_eq!((a.page, b.page), (PageIndex(0), PageIndex(1)));
    assert!(r.cache().is_resident(WALL1));
    assert!(!a.vram.intersects(&b.vram));

    let words = r.device().vram().read_rect(a.vram).unwrap();
    assert!(words.iter().all(|&w| w == 0x1111));
    let words = r.device().vram().read_rect(b.vram).unwrap();
    assert!(words.iter().all(|&w| w == 0x2222));
}
