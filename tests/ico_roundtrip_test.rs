// ICO round-trip properties: encode frames, re-parse the directory, check every span
use favicon_generator::favicon::ico::encode_ico;
use favicon_generator::favicon::{Frame, FrameEncoding, IcoDirectory, PayloadKind};
use image::{ImageBuffer, Rgba};
use proptest::prelude::*;

fn solid_frame(size: u32) -> Frame {
    let shade = (size % 251) as u8;
    let pixels = ImageBuffer::from_fn(size, size, |x, _| {
        if x == 0 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([shade, 255 - shade, 90, 255])
        }
    });
    Frame::new(size, pixels).expect("valid frame")
}

fn encoding_strategy() -> impl Strategy<Value = FrameEncoding> {
    prop_oneof![
        Just(FrameEncoding::Auto),
        Just(FrameEncoding::Png),
        Just(FrameEncoding::Bmp),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn directory_matches_frames(
        sizes in prop::collection::btree_set(1u32..=256, 1..6),
        encoding in encoding_strategy(),
    ) {
        let frames: Vec<Frame> = sizes.iter().copied().map(solid_frame).collect();
        let bytes = encode_ico(&frames, encoding).expect("encode should succeed");
        let directory = IcoDirectory::parse(&bytes).expect("parse should succeed");

        prop_assert_eq!(directory.entries.len(), frames.len());

        let mut expected_offset = 6 + 16 * frames.len() as u32;
        for (entry, frame) in directory.entries.iter().zip(&frames) {
            prop_assert_eq!(entry.width, frame.size());
            prop_assert_eq!(entry.height, frame.size());
            prop_assert_eq!(entry.bit_count, 32);
            prop_assert_eq!(entry.planes, 1);
            prop_assert_eq!(entry.color_count, 0);
            prop_assert_eq!(entry.image_offset, expected_offset);
            expected_offset += entry.bytes_in_resource;
        }
        prop_assert_eq!(expected_offset as usize, bytes.len());
    }

    #[test]
    fn embedded_payload_dimensions_match_directory(
        sizes in prop::collection::btree_set(1u32..=64, 1..4),
        encoding in encoding_strategy(),
    ) {
        let frames: Vec<Frame> = sizes.iter().copied().map(solid_frame).collect();
        let bytes = encode_ico(&frames, encoding).expect("encode should succeed");
        let directory = IcoDirectory::parse(&bytes).expect("parse should succeed");

        for (index, frame) in frames.iter().enumerate() {
            let decoded = directory.decode_frame(&bytes, index).expect("decode frame");
            prop_assert_eq!(decoded.dimensions(), (frame.size(), frame.size()));
            prop_assert_eq!(&decoded, frame.pixels());
        }
    }
}

#[test]
fn auto_encoding_uses_png_only_for_256() {
    let frames: Vec<Frame> = [16, 128, 256].into_iter().map(solid_frame).collect();
    let bytes = encode_ico(&frames, FrameEncoding::Auto).expect("encode should succeed");
    let directory = IcoDirectory::parse(&bytes).expect("parse should succeed");

    let kinds: Vec<PayloadKind> = directory.entries.iter().map(|e| e.payload).collect();
    assert_eq!(
        kinds,
        vec![PayloadKind::Bmp, PayloadKind::Bmp, PayloadKind::Png]
    );
}

#[test]
fn frame_order_is_preserved() {
    let frames: Vec<Frame> = [48, 16, 32].into_iter().map(solid_frame).collect();
    let bytes = encode_ico(&frames, FrameEncoding::Png).expect("encode should succeed");
    let directory = IcoDirectory::parse(&bytes).expect("parse should succeed");

    let widths: Vec<u32> = directory.entries.iter().map(|e| e.width).collect();
    assert_eq!(widths, vec![48, 16, 32]);
}
