//! The texture upload route: linear pixels are re-tiled into a
//! device-heap-backed texture allocation.

use opal_gpu::dmem::{DeviceHeap, HeapDescriptor};
use opal_gpu::tiling::{convert_region, linearize_region, surface_byte_len, CopyRegion, TexelFormat};
use pretty_assertions::assert_eq;

#[test]
fn linear_pixels_land_tiled_in_device_memory() {
    let mut heap = DeviceHeap::new(HeapDescriptor::default());

    let format = TexelFormat::Rgb565;
    let (w, h) = (32u32, 32u32);
    let len = surface_byte_len(format, w, h).unwrap();

    let mut pixels = vec![0u8; len];
    for (i, b) in pixels.iter_mut().enumerate() {
        *b = (i * 7 % 251) as u8;
    }

    let texture = heap.alloc(len as u32, 0x80).unwrap();
    let region = CopyRegion::full(w, h);
    convert_region(&pixels, heap.bytes_mut(texture).unwrap(), &region, format, false);

    // The descriptor-facing address is aligned for the DMA engine.
    assert_eq!(heap.phys_addr(texture).unwrap().0 % 0x80, 0);

    let mut back = vec![0u8; len];
    linearize_region(heap.bytes(texture).unwrap(), &mut back, &region, format);
    assert_eq!(back, pixels);

    heap.free(texture).unwrap();
    assert_eq!(heap.block_count(), 0);
}
