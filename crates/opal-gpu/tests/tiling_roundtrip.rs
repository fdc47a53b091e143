use opal_gpu::tiling::{
    convert_region, linearize_region, surface_byte_len, CopyRegion, TexelFormat,
};
use pretty_assertions::assert_eq;

const CONVERTIBLE: &[TexelFormat] = &[
    TexelFormat::Rgba8,
    TexelFormat::Rgb8,
    TexelFormat::La8,
    TexelFormat::Rgb565,
    TexelFormat::Rgba5551,
    TexelFormat::Rgba4,
    TexelFormat::L8,
    TexelFormat::A8,
    TexelFormat::La4,
    TexelFormat::L4,
    TexelFormat::A4,
];

/// Deterministic filler so failures are reproducible.
fn pattern(len: usize, mut seed: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        out.push((seed >> 8) as u8);
    }
    out
}

#[test]
fn linear_tiled_linear_round_trips_every_format() {
    for (fi, &format) in CONVERTIBLE.iter().enumerate() {
        for dim in [8u32, 32, 256] {
            let len = surface_byte_len(format, dim, dim).unwrap();
            let original = pattern(len, 0x9E37_79B9 ^ ((fi as u32) << 8) ^ dim);
            let mut tiled = vec![0u8; len];
            let mut back = vec![0u8; len];

            let region = CopyRegion::full(dim, dim);
            convert_region(&original, &mut tiled, &region, format, false);
            linearize_region(&tiled, &mut back, &region, format);

            assert_eq!(back, original, "format {format:?}, {dim}x{dim}");
        }
    }
}

#[test]
fn tiled_to_tiled_copy_does_not_flip() {
    let format = TexelFormat::Rgba8;
    let len = surface_byte_len(format, 32, 32).unwrap();
    let original = pattern(len, 0xDEAD_4001);

    let mut first = vec![0u8; len];
    let region = CopyRegion::full(32, 32);
    convert_region(&original, &mut first, &region, format, false);

    // Re-tiling an already tiled surface must be an identity copy.
    let mut second = vec![0u8; len];
    convert_region(&first, &mut second, &region, format, true);
    assert_eq!(second, first);

    let mut back = vec![0u8; len];
    linearize_region(&second, &mut back, &region, format);
    assert_eq!(back, original);
}

#[test]
fn partial_rect_copy_touches_only_the_target_rect() {
    let format = TexelFormat::Rgba8;
    let len = surface_byte_len(format, 32, 32).unwrap();

    // Keep source bytes below 0x80 so none can collide with the 0xCD fill.
    let mut src = pattern(len, 0x1234_5678);
    for b in &mut src {
        *b &= 0x7F;
    }

    let mut dst = vec![0xCDu8; len];
    let copy_in = CopyRegion {
        width: 8,
        height: 8,
        src_x: 4,
        src_y: 4,
        src_width: 32,
        src_height: 32,
        dst_x: 12,
        dst_y: 12,
        dst_width: 32,
        dst_height: 32,
    };
    convert_region(&src, &mut dst, &copy_in, format, false);

    // Exactly the 64 copied texels may differ from the fill.
    let changed = dst.iter().filter(|&&b| b != 0xCD).count();
    assert_eq!(changed, 8 * 8 * 4);

    // Reading the rect back out reproduces the source sub-rectangle.
    let copy_out = CopyRegion {
        width: 8,
        height: 8,
        src_x: 12,
        src_y: 12,
        src_width: 32,
        src_height: 32,
        dst_x: 4,
        dst_y: 4,
        dst_width: 32,
        dst_height: 32,
    };
    let mut extracted = vec![0u8; len];
    linearize_region(&dst, &mut extracted, &copy_out, format);

    for j in 0..8u32 {
        for i in 0..8u32 {
            // Top-down linear index of the sub-rectangle texel.
            let texel = ((31 - (4 + j)) * 32 + 4 + i) as usize * 4;
            assert_eq!(
                extracted[texel..texel + 4],
                src[texel..texel + 4],
                "texel ({i}, {j})"
            );
        }
    }
}

#[test]
fn scaled_copy_stretches_by_surface_ratio() {
    let format = TexelFormat::L8;
    let src_len = surface_byte_len(format, 8, 8).unwrap();
    let dst_len = surface_byte_len(format, 16, 16).unwrap();
    let src = pattern(src_len, 0xC0FF_EE00);

    let mut dst = vec![0u8; dst_len];
    let region = CopyRegion {
        width: 16,
        height: 16,
        src_x: 0,
        src_y: 0,
        src_width: 8,
        src_height: 8,
        dst_x: 0,
        dst_y: 0,
        dst_width: 16,
        dst_height: 16,
    };
    convert_region(&src, &mut dst, &region, format, false);

    let mut back = vec![0u8; dst_len];
    linearize_region(&dst, &mut back, &CopyRegion::full(16, 16), format);

    // Every 2x2 destination block samples one source texel.
    for y in 0..16u32 {
        for x in 0..16u32 {
            let got = back[((15 - y) * 16 + x) as usize];
            let want = src[((7 - y / 2) * 8 + x / 2) as usize];
            assert_eq!(got, want, "texel ({x}, {y})");
        }
    }
}
