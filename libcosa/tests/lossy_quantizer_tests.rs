use libcosa::lossy::quantizer::{
    apply_orthonormal_scaling, dequantize, dequantize_block, quantize, quantize_block,
    scale_factor, SILENCE_EPSILON,
};
use libcosa::{BlockRecord, CodecParams, Dct, Encoder, Transform};
use proptest::prelude::*;

#[test]
fn test_levels_cover_full_range() {
    for bits in 4..=16u32 {
        let max_level = (1u32 << bits) - 1;
        assert_eq!(quantize(-1.0, 1.0, max_level), 0);
        assert_eq!(quantize(1.0, 1.0, max_level), max_level as u16);
        assert_eq!(dequantize(0, 3.0, max_level), -3.0);
        assert_eq!(dequantize(max_level as u16, 3.0, max_level), 3.0);
    }
}

#[test]
fn test_dequantize_zeroes_discarded_tail() {
    let record = BlockRecord {
        scale_factor: 2.0,
        levels: vec![255, 0, 128],
    };
    let mut coeffs = vec![9.0; 8];
    dequantize_block(&record, 255, &mut coeffs);
    assert_eq!(coeffs[0], 2.0);
    assert_eq!(coeffs[1], -2.0);
    assert!(coeffs[3..].iter().all(|&c| c == 0.0));
}

#[test]
fn test_encoder_matches_direct_quantization() {
    let params = CodecParams::new(256, 40, 9).unwrap();
    let samples: Vec<i16> = (0..256)
        .map(|i| ((i * 7919) % 20011) as i16 - 10000)
        .collect();

    let mut coeffs: Vec<f64> = samples.iter().map(|&s| s as f64 / 32768.0).collect();
    let dct = Dct::new(256);
    dct.forward(&mut coeffs);
    apply_orthonormal_scaling(&mut coeffs, 256);

    let mut expected = BlockRecord::new(40);
    quantize_block(&coeffs[..40], params.max_level(), &mut expected);

    let mut encoder = Encoder::new(params);
    let record = encoder.encode_block(&samples).unwrap();
    assert_eq!(record, &expected);
}

proptest! {
    #[test]
    fn prop_dequantized_within_one_step(
        coeffs in prop::collection::vec(-50.0f64..50.0, 1..300),
        bits in 4u8..=16,
    ) {
        let max_level = (1u32 << bits) - 1;
        let mut record = BlockRecord::new(coeffs.len());
        quantize_block(&coeffs, max_level, &mut record);

        let sf = record.scale_factor as f64;
        prop_assert_eq!(record.levels.len(), coeffs.len());
        for (&c, &level) in coeffs.iter().zip(record.levels.iter()) {
            prop_assert!(level as u32 <= max_level);
            let error = (dequantize(level, sf, max_level) - c).abs();
            prop_assert!(error <= sf / max_level as f64 + sf * 1e-6, "error {} sf {}", error, sf);
        }
    }

    #[test]
    fn prop_scale_factor_is_peak_magnitude(coeffs in prop::collection::vec(-1e3f64..1e3, 1..100)) {
        let peak = coeffs.iter().fold(0.0f64, |m, &c| m.max(c.abs()));
        let sf = scale_factor(&coeffs) as f64;
        if peak < SILENCE_EPSILON {
            prop_assert_eq!(sf, 1.0);
        } else {
            prop_assert!((sf - peak).abs() <= peak * 1e-7);
        }
    }
}
