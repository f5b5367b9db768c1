//! Encode/decode behavior of the block DCT pipelines
use std::f64::consts::PI;
use std::sync::Arc;

use libcosa::writer::{write_block, write_header};
use libcosa::{
    compare, decode, encode, encode_with_stats, info, BitWriter, BlockRecord, CodecParams,
    CosaError, CosaResult, DctPlanner, Decoder, Encoder, PcmSource, StreamHeader, Transform,
};

fn sine(frames: usize, freq: f64, sample_rate: u32, amplitude: f64) -> Vec<i16> {
    (0..frames)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            (amplitude * 32767.0 * (2.0 * PI * freq * t).sin()).round() as i16
        })
        .collect()
}

/// worst-case per-sample deviation when every retained coefficient is off by
/// one quantization step at unit scale factor
fn silence_bound(block_size: usize, num_coeffs: usize, quant_bits: u8) -> f64 {
    let n = block_size as f64;
    let step = 1.0 / ((1u32 << quant_bits) - 1) as f64;
    let dc = step / n.sqrt();
    let ac = (num_coeffs - 1) as f64 * step * (2.0 / n).sqrt();
    32768.0 * (dc + ac) / 2.0 + 0.5
}

// ============================================================================
// Framing
// ============================================================================

#[test]
fn test_partial_last_block_is_trimmed() {
    let params = CodecParams::new(1024, 205, 8).unwrap();
    let samples = sine(2500, 440.0, 44100, 0.3);

    let data = encode(&samples, 44100, params).unwrap();
    // 136 header bits, 3 blocks of 32 + 205 * 8 bits
    assert_eq!(data.len(), (136 + 3 * (32 + 205 * 8)) / 8);
    assert_eq!(info(&data).unwrap().block_count, 3);

    let decoded = decode(&data).unwrap();
    assert_eq!(decoded.sample_rate, 44100);
    assert_eq!(decoded.samples.len(), 2500);
}

#[test]
fn test_exact_multiple_of_block_size() {
    let params = CodecParams::new(256, 64, 8).unwrap();
    let samples = sine(256 * 7, 1000.0, 16000, 0.5);

    let (data, stats) = encode_with_stats(&samples, 16000, params).unwrap();
    assert_eq!(stats.blocks, 7);
    assert_eq!(stats.frames, 256 * 7);
    assert_eq!(stats.coefficients, 64 * 7);

    let decoded = decode(&data).unwrap();
    assert_eq!(decoded.samples.len(), samples.len());
}

#[test]
fn test_single_sample_stream() {
    let params = CodecParams::new(64, 64, 16).unwrap();
    let decoded = decode(&encode(&[12345], 8000, params).unwrap()).unwrap();
    assert_eq!(decoded.samples.len(), 1);
    // one full block of coefficients at 16 bits stays within a few lsb
    assert!((decoded.samples[0] as i32 - 12345).abs() <= 4);
}

// ============================================================================
// Silence
// ============================================================================

#[test]
fn test_silence_stays_within_one_step() {
    let params = CodecParams::new(1024, 205, 8).unwrap();
    let data = encode(&vec![0i16; 2048], 44100, params).unwrap();
    let decoded = decode(&data).unwrap();

    let bound = silence_bound(1024, 205, 8);
    let worst = decoded
        .samples
        .iter()
        .map(|&s| (s as f64).abs())
        .fold(0.0, f64::max);
    assert!(worst <= bound, "worst {} > bound {}", worst, bound);
}

#[test]
fn test_silence_at_fine_quantization_is_exact() {
    let params = CodecParams::new(1024, 8, 16).unwrap();
    assert!(silence_bound(1024, 8, 16) < 1.0);

    let decoded = decode(&encode(&vec![0i16; 3000], 8000, params).unwrap()).unwrap();
    assert!(decoded.samples.iter().all(|&s| s == 0));
}

#[test]
fn test_silent_block_uses_unit_scale() {
    let mut encoder = Encoder::new(CodecParams::new(128, 16, 8).unwrap());
    let record = encoder.encode_block(&[0i16; 128]).unwrap();
    assert_eq!(record.scale_factor, 1.0);
    // zero maps to the upper of the two middle levels
    assert!(record.levels.iter().all(|&l| l == 128));
}

// ============================================================================
// Clamping and truncation
// ============================================================================

fn single_block_stream(scale_factor: f32, level: u16) -> Vec<u8> {
    let header = StreamHeader {
        sample_rate: 8000,
        total_frames: 64,
        block_size: 64,
        num_coeffs: 1,
        quant_bits: 8,
    };
    let record = BlockRecord {
        scale_factor,
        levels: vec![level],
    };

    let mut bits = BitWriter::new(Vec::new());
    write_header(&mut bits, &header).unwrap();
    write_block(&mut bits, &record, 8).unwrap();
    bits.finish().unwrap()
}

#[test]
fn test_reconstruction_clamps_to_pcm16() {
    let loud = decode(&single_block_stream(100.0, 255)).unwrap();
    assert_eq!(loud.samples.len(), 64);
    assert!(loud.samples.iter().all(|&s| s == i16::MAX));

    let quiet = decode(&single_block_stream(100.0, 0)).unwrap();
    assert!(quiet.samples.iter().all(|&s| s == i16::MIN));
}

#[test]
fn test_truncated_blocks() {
    let params = CodecParams::new(512, 100, 8).unwrap();
    let samples = sine(2000, 300.0, 22050, 0.4);
    let data = encode(&samples, 22050, params).unwrap();

    // two bytes always reach past any padding into level data
    let cut = &data[..data.len() - 2];
    assert!(matches!(decode(cut), Err(CosaError::Truncated { .. })));
    assert!(!info(cut).unwrap().complete);

    // a stream cut right after its header
    assert!(matches!(
        decode(&data[..17]),
        Err(CosaError::Truncated { bits_read }) if bits_read >= 136
    ));
}

#[test]
fn test_trailing_bytes_are_ignored() {
    let params = CodecParams::new(256, 32, 8).unwrap();
    let samples = sine(1000, 200.0, 8000, 0.5);
    let mut data = encode(&samples, 8000, params).unwrap();
    let clean = decode(&data).unwrap();

    data.extend_from_slice(&[0xFF; 32]);
    assert_eq!(decode(&data).unwrap(), clean);
}

// ============================================================================
// Quality
// ============================================================================

#[test]
fn test_sine_round_trip_quality() {
    let params = CodecParams::new(1024, 205, 8).unwrap();
    let samples = sine(44100, 440.0, 44100, 0.5);

    let data = encode(&samples, 44100, params).unwrap();
    let decoded = decode(&data).unwrap();
    assert_eq!(decoded.samples.len(), 44100);

    let metrics = compare(&samples, &decoded.samples).unwrap();

    // one quantization step per retained coefficient, spread over the block
    let step = 2.0f64.sqrt() * 1024f64.sqrt() * 0.5 / 255.0;
    let bound = 205.0 * step * step / (4.0 * 1024.0) * 32768.0 * 32768.0;
    assert!(metrics.mse <= 1.5 * bound + 1.0, "mse {} bound {}", metrics.mse, bound);
    assert!(metrics.snr_db > 20.0, "snr {}", metrics.snr_db);

    let ratio = (samples.len() * 2) as f64 / data.len() as f64;
    assert!(ratio > 9.0, "ratio {}", ratio);
}

fn round_trip_mse(samples: &[i16], sample_rate: u32, params: CodecParams) -> f64 {
    let decoded = decode(&encode(samples, sample_rate, params).unwrap()).unwrap();
    compare(samples, &decoded.samples).unwrap().mse
}

#[test]
fn test_more_bits_lower_error() {
    let samples = sine(8192, 523.25, 32000, 0.6);
    let coarse = round_trip_mse(&samples, 32000, CodecParams::new(512, 128, 6).unwrap());
    let fine = round_trip_mse(&samples, 32000, CodecParams::new(512, 128, 12).unwrap());
    assert!(fine < coarse, "{} vs {}", fine, coarse);
}

#[test]
fn test_more_coefficients_lower_error() {
    // a bright tone sits above a narrow cutoff
    let samples = sine(8192, 6000.0, 32000, 0.5);
    let narrow = round_trip_mse(&samples, 32000, CodecParams::new(512, 64, 10).unwrap());
    let wide = round_trip_mse(&samples, 32000, CodecParams::new(512, 256, 10).unwrap());
    assert!(wide < narrow, "{} vs {}", wide, narrow);
}

// ============================================================================
// Sources and transforms
// ============================================================================

/// declares more frames than it can produce
struct ShortSource {
    remaining: usize,
}

impl PcmSource for ShortSource {
    fn sample_rate(&self) -> u32 {
        8000
    }

    fn total_frames(&self) -> u64 {
        1000
    }

    fn read_frames(&mut self, buf: &mut [i16]) -> CosaResult<usize> {
        // dribble out a few frames at a time
        let n = buf.len().min(self.remaining).min(7);
        buf[..n].fill(100);
        self.remaining -= n;
        Ok(n)
    }
}

#[test]
fn test_source_exhausted() {
    let mut encoder = Encoder::new(CodecParams::new(256, 32, 8).unwrap());
    let mut source = ShortSource { remaining: 600 };

    match encoder.encode(&mut source, Vec::new()) {
        Err(CosaError::SourceExhausted { expected, actual }) => {
            assert_eq!(expected, 1000);
            assert_eq!(actual, 600);
        }
        other => panic!("expected exhaustion, got {:?}", other.map(|(_, s)| s)),
    }
}

#[test]
fn test_dribbling_source_fills_blocks() {
    let mut encoder = Encoder::new(CodecParams::new(256, 32, 8).unwrap());
    let mut source = ShortSource { remaining: 1000 };
    let (data, stats) = encoder.encode(&mut source, Vec::new()).unwrap();

    assert_eq!(stats.frames, 1000);
    assert_eq!(stats.blocks, 4);
    assert_eq!(decode(&data).unwrap().samples.len(), 1000);
}

/// direct O(N^2) DCT-II / DCT-III pair with the same scaling as the fft plan
struct NaiveDct {
    n: usize,
}

impl Transform for NaiveDct {
    fn len(&self) -> usize {
        self.n
    }

    fn forward(&self, data: &mut [f64]) {
        let n = self.n as f64;
        let input = data.to_vec();
        for (k, out) in data.iter_mut().enumerate() {
            *out = 2.0
                * input
                    .iter()
                    .enumerate()
                    .map(|(i, &x)| x * (PI * k as f64 * (2 * i + 1) as f64 / (2.0 * n)).cos())
                    .sum::<f64>();
        }
    }

    fn inverse(&self, data: &mut [f64]) {
        let n = self.n as f64;
        let input = data.to_vec();
        for (i, out) in data.iter_mut().enumerate() {
            let ac: f64 = input
                .iter()
                .enumerate()
                .skip(1)
                .map(|(k, &x)| x * (PI * k as f64 * (2 * i + 1) as f64 / (2.0 * n)).cos())
                .sum();
            *out = input[0] + 2.0 * ac;
        }
    }
}

#[test]
fn test_injected_transform_interoperates() {
    let params = CodecParams::new(128, 40, 10).unwrap();
    let samples = sine(1000, 440.0, 8000, 0.5);

    let mut encoder = Encoder::with_transform(params, Arc::new(NaiveDct { n: 128 })).unwrap();
    let data = encoder.encode_to_vec(&samples, 8000).unwrap();

    let reference = decode(&encode(&samples, 8000, params).unwrap()).unwrap();
    let decoded = decode(&data).unwrap();
    assert_eq!(decoded.samples.len(), reference.samples.len());

    // levels may land on the other side of a rounding edge, nothing more
    let drift = compare(&reference.samples, &decoded.samples).unwrap();
    assert!(drift.max_abs_error <= 128.0, "drift {}", drift.max_abs_error);
    assert!(compare(&samples, &decoded.samples).unwrap().snr_db > 20.0);
}

#[test]
fn test_shared_plan_between_pipelines() {
    let mut planner = DctPlanner::new();
    let params = CodecParams::new(512, 128, 8).unwrap();
    let plan = planner.plan(512);
    assert_eq!(planner.cached_plans(), 1);

    let samples = sine(3000, 250.0, 11025, 0.5);
    let mut encoder = Encoder::with_transform(params, plan.clone()).unwrap();
    let data = encoder.encode_to_vec(&samples, 11025).unwrap();

    let header = StreamHeader::new(11025, 3000, &params).unwrap();
    let mut decoder = Decoder::with_transform(header, planner.plan(512)).unwrap();
    assert_eq!(planner.cached_plans(), 1);

    let mut bits = libcosa::BitReader::new(data.as_slice());
    let read = libcosa::reader::read_header(&mut bits).unwrap();
    assert_eq!(read, header);

    let mut out = Vec::new();
    let stats = decoder.decode_blocks(&mut bits, &mut out).unwrap();
    assert_eq!(stats.blocks, 6);
    assert_eq!(out, decode(&data).unwrap().samples);
}
