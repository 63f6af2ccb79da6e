//! Pipeline properties over arbitrary frames

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use camera_capture::{PixelFormat, VideoFrame};
use governor::clock::FakeRelativeClock;
use proptest::prelude::*;
use shutter_decoder::{
    binarize, center_column, condense, decode, estimate, sample, validate, Condenser,
    DecodeOutcome, DecoderConfig, DecoderError, FrameLuminanceDecoder, ResultPublisher, Symbol,
    SCANNING,
};

fn column_frame(column: &[u8]) -> VideoFrame {
    // 1-pixel-wide frame: the sampled column is the whole image
    VideoFrame::from_luma(1, column.len() as u32, 1, column)
}

fn non_luma_format() -> impl Strategy<Value = PixelFormat> {
    prop_oneof![
        Just(PixelFormat::Rgb24),
        Just(PixelFormat::Yuyv),
        Just(PixelFormat::Mjpeg),
        Just(PixelFormat::H264),
    ]
}

fn symbols() -> impl Strategy<Value = Vec<Symbol>> {
    prop::collection::vec(prop_oneof![Just(Symbol::Light), Just(Symbol::Dark)], 0..400)
}

proptest! {
    #[test]
    fn format_gate_rejects_and_publishes_nothing(
        format in non_luma_format(),
        data in prop::collection::vec(any::<u8>(), 0..256),
        width in 0u32..32,
        height in 0u32..32,
    ) {
        let owned = VideoFrame::with_format(data, width, height, width, format);
        let is_unsupported = matches!(
            validate(&owned.as_frame()),
            Err(DecoderError::UnsupportedFormat(_))
        );
        prop_assert!(is_unsupported);

        let mut decoder = FrameLuminanceDecoder::new(DecoderConfig::default()).unwrap();
        let publisher = decoder.publisher();
        let outcome = decoder.process_frame(&owned.as_frame());
        prop_assert!(matches!(outcome, DecodeOutcome::Skipped(_)));
        prop_assert_eq!(&*publisher.read(), SCANNING);
        prop_assert_eq!(publisher.version(), 0);
    }

    #[test]
    fn column_never_longer_than_height(
        width in 1u32..64,
        height in 0u32..64,
        stride_extra in 0u32..16,
        len in 0usize..5000,
    ) {
        let stride = width + stride_extra;
        let owned = VideoFrame::with_format(vec![0; len], width, height, stride, PixelFormat::Yuv);
        let valid = validate(&owned.as_frame()).unwrap();
        let column_index = center_column(width);
        let column = sample(&valid, column_index);

        prop_assert!(column.len() <= height as usize);
        prop_assert_eq!(column.len() + column.skipped_rows(), height as usize);
        if height > 0 && (stride as usize) * (height as usize - 1) + column_index < len {
            prop_assert_eq!(column.len(), height as usize);
        }
    }

    #[test]
    fn threshold_is_exact_mean(samples in prop::collection::vec(any::<u8>(), 1..2000)) {
        let expected = samples.iter().map(|&s| s as f64).sum::<f64>() / samples.len() as f64;
        let threshold = estimate(&samples).unwrap();
        prop_assert!((threshold.value() - expected).abs() < 1e-9);
    }

    #[test]
    fn binarize_is_strictly_greater(samples in prop::collection::vec(any::<u8>(), 1..500)) {
        let threshold = estimate(&samples).unwrap();
        let symbols = binarize(&samples, threshold);
        prop_assert_eq!(symbols.len(), samples.len());
        for (&s, &symbol) in samples.iter().zip(symbols.symbols()) {
            let expected = if (s as f64) > threshold.value() { Symbol::Light } else { Symbol::Dark };
            prop_assert_eq!(symbol, expected);
        }
    }

    #[test]
    fn condense_keeps_every_step_th(
        input in symbols(),
        step in 1usize..40,
        max_length in 0usize..80,
    ) {
        let out = condense(&input, NonZeroUsize::new(step).unwrap(), max_length);
        let expected_len = max_length.min(input.len().div_ceil(step));
        prop_assert_eq!(out.len(), expected_len);
        for (i, &symbol) in out.symbols().iter().enumerate() {
            prop_assert_eq!(symbol, input[i * step]);
        }
    }

    #[test]
    fn reads_between_publishes_are_identical(
        column in prop::collection::vec(any::<u8>(), 1..300),
        reads in 2usize..10,
    ) {
        let config = DecoderConfig { target_fps: 1000, ..Default::default() };
        let mut decoder = FrameLuminanceDecoder::new(config).unwrap();
        let publisher = decoder.publisher();
        decoder.process_frame(&column_frame(&column).as_frame());

        let first = publisher.read();
        for _ in 0..reads {
            prop_assert_eq!(&*publisher.read(), &*first);
        }
    }

    #[test]
    fn display_string_only_glyphs(column in prop::collection::vec(any::<u8>(), 1..600)) {
        let condenser = Condenser::new(10, 50).unwrap();
        let rendered = decode(&column_frame(&column).as_frame(), &condenser).unwrap().render();
        prop_assert!(rendered.len() <= 50);
        prop_assert!(rendered.chars().all(|c| c == '|' || c == '.'));
    }
}

#[test]
fn constant_column_is_all_dark() {
    // height 100, stride 100, column 50, every sample 128
    let owned = VideoFrame::from_luma(100, 100, 100, &vec![128u8; 100 * 100]);
    let condenser = DecoderConfig::default().condenser().unwrap();
    let symbols = decode(&owned.as_frame(), &condenser).unwrap();
    assert_eq!(symbols.render(), "..........");
}

#[test]
fn half_dark_half_light_condenses_to_two_symbols() {
    let column: Vec<u8> = [0u8; 10].iter().chain([255u8; 10].iter()).copied().collect();
    assert!((estimate(&column).unwrap().value() - 127.5).abs() < 1e-9);

    let condenser = DecoderConfig::default().condenser().unwrap();
    let symbols = decode(&column_frame(&column).as_frame(), &condenser).unwrap();
    assert_eq!(symbols.symbols(), &[Symbol::Dark, Symbol::Light]);
    assert_eq!(symbols.render(), ".|");
}

#[test]
fn unsupported_frame_keeps_previous_result() {
    let config = DecoderConfig { target_fps: 1000, ..Default::default() };
    let clock = FakeRelativeClock::default();
    let publisher = Arc::new(ResultPublisher::new());
    let mut decoder =
        FrameLuminanceDecoder::with_clock(config, Arc::clone(&publisher), clock.clone()).unwrap();

    let column: Vec<u8> = [0u8; 10].iter().chain([255u8; 10].iter()).copied().collect();
    decoder.process_frame(&column_frame(&column).as_frame());
    assert_eq!(&*publisher.read(), ".|");

    let mjpeg = VideoFrame::with_format(vec![0xFF, 0xD8, 0xFF], 640, 480, 640, PixelFormat::Mjpeg);
    clock.advance(Duration::from_secs(1));
    decoder.process_frame(&mjpeg.as_frame());
    assert_eq!(&*publisher.read(), ".|");
}

#[test]
fn undersized_stride_decodes_shorter_column() {
    // 100 rows declared, stride 10, buffer of 505 bytes: rows 0..=49 fit at column 5
    let mut data = vec![0u8; 505];
    for (y, row) in data.chunks_mut(10).enumerate() {
        if row.len() > 5 {
            row[5] = if y < 25 { 10 } else { 200 };
        }
    }
    let owned = VideoFrame::with_format(data, 10, 100, 10, PixelFormat::Yuv);
    let valid = validate(&owned.as_frame()).unwrap();
    let column = sample(&valid, center_column(10));
    assert_eq!(column.len(), 50);
    assert_eq!(column.skipped_rows(), 50);

    let condenser = DecoderConfig::default().condenser().unwrap();
    let symbols = decode(&owned.as_frame(), &condenser).unwrap();
    assert_eq!(symbols.render(), "..|||");
}
