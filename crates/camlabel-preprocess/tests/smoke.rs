use camlabel_preprocess::{resize_exact, PreprocessError, Preprocessor};
use image::{DynamicImage, Rgb, RgbImage};

#[test]
fn resize_hits_requested_dimensions() {
    let src = RgbImage::from_pixel(640, 480, Rgb([128, 128, 128]));
    let out = resize_exact(&src, 224, 224).unwrap();
    assert_eq!((out.width(), out.height()), (224, 224));

    // no aspect-ratio preservation: a skewed target is honoured as-is
    let out = resize_exact(&src, 100, 7).unwrap();
    assert_eq!((out.width(), out.height()), (100, 7));
}

#[test]
fn zero_target_is_a_skip_condition() {
    let src = RgbImage::from_pixel(16, 16, Rgb([0, 0, 0]));
    assert!(matches!(
        resize_exact(&src, 0, 224),
        Err(PreprocessError::InvalidDimensions { .. })
    ));
    assert!(matches!(
        resize_exact(&src, 224, 0),
        Err(PreprocessError::InvalidDimensions { .. })
    ));
}

#[test]
fn all_red_source_fills_buffer_bgra() {
    let src = DynamicImage::ImageRgb8(RgbImage::from_pixel(224, 224, Rgb([255, 0, 0])));
    let buf = Preprocessor::new(224, 224).run(&src).unwrap();

    assert_eq!((buf.width(), buf.height()), (224, 224));
    for y in 0..224 {
        for px in buf.row(y).chunks_exact(4) {
            assert_eq!(px, &[0, 0, 255, 255], "row {y}");
        }
    }
}

#[test]
fn buffer_is_vertically_flipped() {
    // top half green, bottom half blue; identity-size resize keeps the split
    let mut img = RgbImage::new(4, 2);
    for x in 0..4 {
        img.put_pixel(x, 0, Rgb([0, 255, 0]));
        img.put_pixel(x, 1, Rgb([0, 0, 255]));
    }
    let buf = Preprocessor::new(4, 2)
        .run(&DynamicImage::ImageRgb8(img))
        .unwrap();

    // buffer row 0 == last bitmap row (blue), BGRA order
    assert_eq!(&buf.row(0)[..4], &[255, 0, 0, 255]);
    assert_eq!(&buf.row(1)[..4], &[0, 255, 0, 255]);
}

#[test]
fn conversion_is_idempotent() {
    let mut img = RgbImage::new(64, 48);
    for (x, y, px) in img.enumerate_pixels_mut() {
        *px = Rgb([(x * 3) as u8, (y * 5) as u8, (x ^ y) as u8]);
    }
    let src = DynamicImage::ImageRgb8(img);
    let pp = Preprocessor::new(32, 32);

    let a = pp.run(&src).unwrap();
    let b = pp.run(&src).unwrap();
    assert_eq!(a.bytes_per_row(), b.bytes_per_row());
    assert_eq!(a.as_bytes(), b.as_bytes());
}
