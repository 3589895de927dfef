//! Shadow Atlas Layout
//!
//! Both shadow atlases are square textures cut into `split × split` equal
//! tiles, with `split ∈ {1, 2, 4}` chosen from the number of tiles needed.
//! Tiles are numbered row-major starting at the atlas origin.
//!
//! | Tiles | Split | Tile size (2048 atlas) |
//! |-------|-------|------------------------|
//! | 1     | 1     | 2048                   |
//! | 2–4   | 2     | 1024                   |
//! | 5–16  | 4     | 512                    |

use glam::{Mat4, Vec2};

use crate::renderer::host::Viewport;

/// Number of tiles per atlas row for a tile count.
#[inline]
#[must_use]
pub const fn split_for_tiles(tiles: u32) -> u32 {
    if tiles <= 1 {
        1
    } else if tiles <= 4 {
        2
    } else {
        4
    }
}

/// Grid position of a tile, in tile units.
#[inline]
#[must_use]
pub fn tile_offset(index: u32, split: u32) -> Vec2 {
    Vec2::new((index % split) as f32, (index / split) as f32)
}

/// One tile of an atlas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasTile {
    pub index: u32,
    /// Grid position in tile units.
    pub offset: Vec2,
    /// Pixel rectangle inside the atlas.
    pub viewport: Viewport,
}

impl AtlasTile {
    #[must_use]
    pub fn new(index: u32, split: u32, tile_size: u32) -> Self {
        let offset = tile_offset(index, split);
        let size = tile_size as f32;
        Self {
            index,
            offset,
            viewport: Viewport::new(offset.x * size, offset.y * size, size, size),
        }
    }
}

/// Atlas layout for a given atlas size and tile count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasLayout {
    pub atlas_size: u32,
    pub split: u32,
    pub tile_size: u32,
}

impl AtlasLayout {
    #[must_use]
    pub const fn new(atlas_size: u32, tiles: u32) -> Self {
        let split = split_for_tiles(tiles);
        Self {
            atlas_size,
            split,
            tile_size: atlas_size / split,
        }
    }

    /// Fraction of the atlas covered by one tile along each axis.
    #[inline]
    #[must_use]
    pub fn tile_scale(&self) -> f32 {
        1.0 / self.split as f32
    }

    #[inline]
    #[must_use]
    pub fn tile(&self, index: u32) -> AtlasTile {
        AtlasTile::new(index, self.split, self.tile_size)
    }
}

/// Remaps a clip-space view-projection matrix into the UV-depth space of one
/// atlas tile.
///
/// Rows 0 and 1 map `[-1, 1]` onto the tile's `[offset, offset + 1] · scale`
/// range, row 2 maps depth onto `[0, 1]` (flipped first on reversed-Z
/// backends).
#[must_use]
pub fn convert_to_atlas_matrix(m: Mat4, offset: Vec2, scale: f32, reversed_z: bool) -> Mat4 {
    // Work on rows: the transpose's columns are the rows of `m`.
    let rows = m.transpose();
    let r3 = rows.w_axis;
    let r2 = if reversed_z { -rows.z_axis } else { rows.z_axis };

    let r0 = (0.5 * (rows.x_axis + r3) + offset.x * r3) * scale;
    let r1 = (0.5 * (rows.y_axis + r3) + offset.y * r3) * scale;
    let r2 = 0.5 * (r2 + r3);

    Mat4::from_cols(r0, r1, r2, r3).transpose()
}
