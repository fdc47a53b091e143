//! Conversion between row-major ("linear") pixel buffers and the device's
//! block-tiled texture layout.
//!
//! The device stores textures in 8×8 tiles whose texels are bit-interleaved
//! (Morton order) for cache locality. Linear buffers are top-down while the
//! device's rows run bottom-up, so converting a linear source also flips row
//! order; tiled-to-tiled copies do not. Several formats additionally store
//! their channels reversed relative to the linear convention, which is
//! applied once while staging a linear source.
//!
//! Surface dimensions used with tiled addressing must be powers of two; this
//! is an unchecked precondition of the hardware layout, not validated here.

use std::borrow::Cow;

use tracing::debug;

/// Texel formats understood by the converter.
///
/// The two compressed formats are recognized so callers can pass any surface
/// through unchanged-path code, but conversion rejects them: the call returns
/// without touching the destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TexelFormat {
    /// Four 8-bit channels; stored fully byte-reversed.
    Rgba8,
    /// Three 8-bit channels; outer two bytes swapped.
    Rgb8,
    /// Luminance + alpha, 8 bits each; byte pair swapped.
    La8,
    /// 5-6-5 packed; byte pair swapped.
    Rgb565,
    /// 5-5-5-1 packed; byte pair swapped.
    Rgba5551,
    /// 4-4-4-4 packed; byte pair swapped.
    Rgba4,
    /// 8-bit luminance.
    L8,
    /// 8-bit alpha.
    A8,
    /// Luminance + alpha, one nibble each.
    La4,
    /// 4-bit luminance, two texels per byte.
    L4,
    /// 4-bit alpha, two texels per byte.
    A4,
    /// Block-compressed color; not convertible.
    Compressed,
    /// Block-compressed color + alpha; not convertible.
    CompressedAlpha,
}

/// Channel reordering applied when moving between the linear convention and
/// device byte order. Every reordering is its own inverse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Reorder {
    None,
    Reverse4,
    SwapOuter3,
    SwapPair,
}

#[derive(Clone, Copy, Debug)]
enum Packing {
    Bytes(usize),
    Nibbles,
}

struct TexelInfo {
    packing: Packing,
    reorder: Reorder,
}

fn texel_info(format: TexelFormat) -> Option<TexelInfo> {
    let info = match format {
        TexelFormat::Rgba8 => TexelInfo {
            packing: Packing::Bytes(4),
            reorder: Reorder::Reverse4,
        },
        TexelFormat::Rgb8 => TexelInfo {
            packing: Packing::Bytes(3),
            reorder: Reorder::SwapOuter3,
        },
        TexelFormat::La8 | TexelFormat::Rgb565 | TexelFormat::Rgba5551 | TexelFormat::Rgba4 => {
            TexelInfo {
                packing: Packing::Bytes(2),
                reorder: Reorder::SwapPair,
            }
        }
        TexelFormat::L8 | TexelFormat::A8 | TexelFormat::La4 => TexelInfo {
            packing: Packing::Bytes(1),
            reorder: Reorder::None,
        },
        TexelFormat::L4 | TexelFormat::A4 => TexelInfo {
            packing: Packing::Nibbles,
            reorder: Reorder::None,
        },
        TexelFormat::Compressed | TexelFormat::CompressedAlpha => return None,
    };
    Some(info)
}

/// Byte size of a `width`×`height` surface in `format`, or `None` for the
/// compressed formats (whose size depends on the block encoding).
pub fn surface_byte_len(format: TexelFormat, width: u32, height: u32) -> Option<usize> {
    let texels = width as usize * height as usize;
    match texel_info(format)?.packing {
        Packing::Bytes(size) => Some(texels * size),
        Packing::Nibbles => Some(texels / 2),
    }
}

const TILE_DIM: u32 = 8;

// Bit-interleave lookup tables for one 8×8 tile: x bits land in even
// positions, y bits in odd positions.
const MORTON_X: [u32; 8] = [0, 1, 4, 5, 16, 17, 20, 21];
const MORTON_Y: [u32; 8] = [0, 2, 8, 10, 32, 34, 40, 42];

/// Texel index of `(x, y)` in a tiled surface `surface_width` texels wide.
fn tiled_index(x: u32, y: u32, surface_width: u32) -> usize {
    let tiles_per_row = surface_width / TILE_DIM;
    let tile = (y / TILE_DIM) * tiles_per_row + x / TILE_DIM;
    (tile * 64 + MORTON_X[(x % TILE_DIM) as usize] + MORTON_Y[(y % TILE_DIM) as usize]) as usize
}

/// Texel index of `(x, y)` in a linear surface, flipped vertically: linear
/// buffers are top-down, device rows are bottom-up.
fn linear_index(x: u32, y: u32, surface_width: u32, surface_height: u32) -> usize {
    ((surface_height - 1 - y) * surface_width + x) as usize
}

fn reorder_texel(texel: &mut [u8], reorder: Reorder) {
    match reorder {
        Reorder::None => {}
        Reorder::Reverse4 => texel.reverse(),
        Reorder::SwapOuter3 => texel.swap(0, 2),
        Reorder::SwapPair => texel.swap(0, 1),
    }
}

fn read_nibble(buf: &[u8], index: usize) -> u8 {
    let byte = buf[index / 2];
    if index % 2 == 0 {
        byte & 0x0F
    } else {
        byte >> 4
    }
}

fn write_nibble(buf: &mut [u8], index: usize, value: u8) {
    let byte = &mut buf[index / 2];
    if index % 2 == 0 {
        *byte = (*byte & 0xF0) | (value & 0x0F);
    } else {
        *byte = (*byte & 0x0F) | (value << 4);
    }
}

/// A region copy between two surfaces.
///
/// `width`/`height` are the destination extent in texels. The source texel
/// for destination-local `(i, j)` is found by ratio-scaling with the two
/// surfaces' dimensions, so copies between equal-sized surfaces are 1:1 and
/// differently-sized surfaces stretch (capture into atlas slots relies on
/// this).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CopyRegion {
    pub width: u32,
    pub height: u32,
    pub src_x: u32,
    pub src_y: u32,
    pub src_width: u32,
    pub src_height: u32,
    pub dst_x: u32,
    pub dst_y: u32,
    pub dst_width: u32,
    pub dst_height: u32,
}

impl CopyRegion {
    /// Whole-surface 1:1 copy between two `width`×`height` surfaces.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            src_x: 0,
            src_y: 0,
            src_width: width,
            src_height: height,
            dst_x: 0,
            dst_y: 0,
            dst_width: width,
            dst_height: height,
        }
    }
}

/// Stage a source for the tiled copy. Linear sources with channel reordering
/// are rewritten once into a scratch buffer; everything else passes through.
fn stage_source<'a>(
    src: &'a [u8],
    src_is_tiled: bool,
    reorder: Reorder,
    texel_size: usize,
) -> Cow<'a, [u8]> {
    if src_is_tiled || reorder == Reorder::None {
        return Cow::Borrowed(src);
    }
    let mut staged = src.to_vec();
    for texel in staged.chunks_exact_mut(texel_size) {
        reorder_texel(texel, reorder);
    }
    Cow::Owned(staged)
}

/// Convert a region of `src` into the block-tiled surface `dst`.
///
/// `src` is linear (top-down; flipped and channel-reordered on the way in)
/// or, with `src_is_tiled`, another tiled surface (copied as-is). Compressed
/// formats are rejected without touching `dst`.
pub fn convert_region(
    src: &[u8],
    dst: &mut [u8],
    region: &CopyRegion,
    format: TexelFormat,
    src_is_tiled: bool,
) {
    let Some(info) = texel_info(format) else {
        debug!(?format, "unsupported format for tiled conversion; skipping");
        return;
    };
    if region.width == 0 || region.height == 0 {
        return;
    }

    match info.packing {
        Packing::Bytes(size) => {
            let staged = stage_source(src, src_is_tiled, info.reorder, size);
            for j in 0..region.height {
                let sy = region.src_y + j * region.src_height / region.dst_height;
                let dy = region.dst_y + j;
                for i in 0..region.width {
                    let sx = region.src_x + i * region.src_width / region.dst_width;
                    let dx = region.dst_x + i;
                    let s = if src_is_tiled {
                        tiled_index(sx, sy, region.src_width)
                    } else {
                        linear_index(sx, sy, region.src_width, region.src_height)
                    } * size;
                    let d = tiled_index(dx, dy, region.dst_width) * size;
                    dst[d..d + size].copy_from_slice(&staged[s..s + size]);
                }
            }
        }
        Packing::Nibbles => {
            for j in 0..region.height {
                let sy = region.src_y + j * region.src_height / region.dst_height;
                let dy = region.dst_y + j;
                for i in 0..region.width {
                    let sx = region.src_x + i * region.src_width / region.dst_width;
                    let dx = region.dst_x + i;
                    let s = if src_is_tiled {
                        tiled_index(sx, sy, region.src_width)
                    } else {
                        linear_index(sx, sy, region.src_width, region.src_height)
                    };
                    let d = tiled_index(dx, dy, region.dst_width);
                    write_nibble(dst, d, read_nibble(src, s));
                }
            }
        }
    }
}

/// Convert a region of the block-tiled surface `src` back into the linear
/// surface `dst`: the inverse of [`convert_region`] from a linear source, so
/// a linear→tiled→linear trip reproduces the original bytes.
pub fn linearize_region(src: &[u8], dst: &mut [u8], region: &CopyRegion, format: TexelFormat) {
    let Some(info) = texel_info(format) else {
        debug!(?format, "unsupported format for linearization; skipping");
        return;
    };
    if region.width == 0 || region.height == 0 {
        return;
    }

    match info.packing {
        Packing::Bytes(size) => {
            let mut texel = [0u8; 4];
            for j in 0..region.height {
                let sy = region.src_y + j * region.src_height / region.dst_height;
                let dy = region.dst_y + j;
                for i in 0..region.width {
                    let sx = region.src_x + i * region.src_width / region.dst_width;
                    let dx = region.dst_x + i;
                    let s = tiled_index(sx, sy, region.src_width) * size;
                    let d = linear_index(dx, dy, region.dst_width, region.dst_height) * size;
                    texel[..size].copy_from_slice(&src[s..s + size]);
                    reorder_texel(&mut texel[..size], info.reorder);
                    dst[d..d + size].copy_from_slice(&texel[..size]);
                }
            }
        }
        Packing::Nibbles => {
            for j in 0..region.height {
                let sy = region.src_y + j * region.src_height / region.dst_height;
                let dy = region.dst_y + j;
                for i in 0..region.width {
                    let sx = region.src_x + i * region.src_width / region.dst_width;
                    let dx = region.dst_x + i;
                    let s = tiled_index(sx, sy, region.src_width);
                    let d = linear_index(dx, dy, region.dst_width, region.dst_height);
                    write_nibble(dst, d, read_nibble(src, s));
                }
            }
        }
    }
}
