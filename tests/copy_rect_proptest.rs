//! Property-based tests for rectangle moves and bounds checking.
//! Verifies invariants hold for arbitrary geometry, not just fixed examples.

use proptest::prelude::*;
use rfb_compositor::{Compositor, PixelFormat, Rect, UpdateSink};

fn seeded(width: u16, height: u16, bits_per_pixel: u8, seed: u8) -> Compositor {
    let format = PixelFormat {
        bits_per_pixel,
        ..PixelFormat::default()
    };
    let mut compositor = Compositor::default();
    compositor.allocate(width, height, format).unwrap();

    let len = width as usize * height as usize * bits_per_pixel as usize / 8;
    let payload: Vec<u8> = (0..len)
        .map(|i| (i as u32).wrapping_mul(37).wrapping_add(seed as u32) as u8)
        .collect();
    compositor
        .copy_external(&payload, &Rect::new(0, 0, width as i32, height as i32))
        .unwrap();
    compositor
}

/// Picks a span of `1..=extent` and two origins that keep it inside `extent`.
fn span(extent: u16, len: u16, a: u16, b: u16) -> (i32, i32, i32) {
    let len = 1 + len % extent;
    let room = extent - len + 1;
    (len as i32, (a % room) as i32, (b % room) as i32)
}

proptest! {
    /// An in-place move equals copying the source block out first and then writing it.
    #[test]
    fn move_matches_copy_through_scratch(
        width in 1u16..=12,
        height in 1u16..=12,
        bpp in prop::sample::select(vec![8u8, 16, 32]),
        seed in any::<u8>(),
        (lw, ax, bx) in (any::<u16>(), any::<u16>(), any::<u16>()),
        (lh, ay, by) in (any::<u16>(), any::<u16>(), any::<u16>()),
    ) {
        let (w, src_x, dst_x) = span(width, lw, ax, bx);
        let (h, src_y, dst_y) = span(height, lh, ay, by);
        let src = Rect::new(src_x, src_y, w, h);

        let mut compositor = seeded(width, height, bpp, seed);
        let before: Vec<Vec<u32>> = (0..height)
            .map(|y| (0..width).map(|x| compositor.framebuffer().pixel(x, y).unwrap()).collect())
            .collect();

        compositor.copy_in_place(&src, dst_x, dst_y).unwrap();

        let fb = compositor.framebuffer();
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let in_dst = (dst_x..dst_x + w).contains(&x) && (dst_y..dst_y + h).contains(&y);
                let want = if in_dst {
                    before[(y - dst_y + src_y) as usize][(x - dst_x + src_x) as usize]
                } else {
                    before[y as usize][x as usize]
                };
                prop_assert_eq!(fb.pixel(x as u16, y as u16), Some(want), "pixel ({}, {})", x, y);
            }
        }
    }

    /// Rectangles poking past the buffer edge never mutate it.
    #[test]
    fn out_of_bounds_never_mutates(
        width in 1u16..=12,
        height in 1u16..=12,
        bpp in prop::sample::select(vec![8u8, 16, 32]),
        x in -4i32..16,
        y in -4i32..16,
        w in 0i32..16,
        h in 0i32..16,
    ) {
        let rect = Rect::new(x, y, w, h);
        prop_assume!(!rfb_compositor::check_rect(width, height, &rect));

        let mut compositor = seeded(width, height, bpp, 7);
        let before = compositor.framebuffer().as_bytes().unwrap().to_vec();
        let payload = vec![0xA5u8; rect.area() as usize * bpp as usize / 8];

        prop_assert!(compositor.fill_rect(&rect, 0xFFFF_FFFF).is_err());
        prop_assert!(compositor.copy_external(&payload, &rect).is_err());
        prop_assert!(compositor.copy_in_place(&rect, 0, 0).is_err());
        prop_assert!(compositor.copy_in_place(&Rect::new(0, 0, w, h), x, y).is_err());
        prop_assert_eq!(compositor.framebuffer().as_bytes().unwrap(), &before[..]);
    }
}
