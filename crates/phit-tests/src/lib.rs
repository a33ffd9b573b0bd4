//! Statistical battery for phit output.
//!
//! Byte-oriented tests for raw sample streams and PRNG output, plus two
//! count-oriented tests: [`bucket_uniformity`] for router distributions and
//! [`hamming_profile`] for hash avalanche behaviour. Every test returns a
//! [`TestResult`] with a p-value (where applicable), a pass/fail
//! determination and a letter grade (A through F).
//!
//! The crate knows nothing about how the bytes were produced.

use flate2::Compression;
use flate2::write::ZlibEncoder;
use rustfft::{FftPlanner, num_complex::Complex};
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};
use statrs::function::erf::erfc;
use std::io::Write;

// ═══════════════════════════════════════════════════════════════════════════════
// Core types
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of a single randomness test.
#[derive(Debug, Clone)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub p_value: Option<f64>,
    pub statistic: f64,
    pub details: String,
    pub grade: char,
}

impl TestResult {
    /// Assign a letter grade based on p-value.
    ///
    /// - A: p >= 0.1
    /// - B: p >= 0.01
    /// - C: p >= 0.001
    /// - D: p >= 0.0001
    /// - F: otherwise or None
    pub fn grade_from_p(p: Option<f64>) -> char {
        match p {
            Some(p) if p >= 0.1 => 'A',
            Some(p) if p >= 0.01 => 'B',
            Some(p) if p >= 0.001 => 'C',
            Some(p) if p >= 0.0001 => 'D',
            _ => 'F',
        }
    }

    /// Determine pass/fail from p-value against a threshold (default 0.01).
    pub fn pass_from_p(p: Option<f64>, threshold: f64) -> bool {
        match p {
            Some(p) => p >= threshold,
            None => false,
        }
    }

    fn from_p(name: &str, p: Option<f64>, statistic: f64, details: String) -> Self {
        TestResult {
            name: name.to_string(),
            passed: Self::pass_from_p(p, 0.01),
            p_value: p,
            statistic,
            details,
            grade: Self::grade_from_p(p),
        }
    }

    fn failed(name: &str, details: impl Into<String>) -> Self {
        TestResult {
            name: name.to_string(),
            passed: false,
            p_value: Some(0.0),
            statistic: 0.0,
            details: details.into(),
            grade: 'F',
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════════════

/// Unpack a byte slice into individual bits (MSB first per byte).
fn to_bits(data: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(data.len() * 8);
    for &byte in data {
        for shift in (0..8).rev() {
            bits.push((byte >> shift) & 1);
        }
    }
    bits
}

/// Return a failing `TestResult` when data is too short.
fn insufficient(name: &str, needed: usize, got: usize) -> TestResult {
    TestResult {
        name: name.to_string(),
        passed: false,
        p_value: None,
        statistic: 0.0,
        details: format!("Insufficient data: need {needed}, got {got}"),
        grade: 'F',
    }
}

/// Upper-tail chi-squared probability; `None` for a degenerate `df`.
fn chi2_sf(chi2: f64, df: f64) -> Option<f64> {
    ChiSquared::new(df).ok().map(|d| d.sf(chi2))
}

/// Two-sided normal p-value for a z statistic.
fn two_sided_p(z: f64) -> f64 {
    let norm = Normal::standard();
    2.0 * (1.0 - norm.cdf(z.abs()))
}

/// Grade for ratio-style statistics where 1.0 is ideal.
fn grade_from_ratio(ratio: f64) -> char {
    if ratio > 0.95 {
        'A'
    } else if ratio > 0.85 {
        'B'
    } else if ratio > 0.7 {
        'C'
    } else if ratio > 0.5 {
        'D'
    } else {
        'F'
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 1. FREQUENCY TESTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Monobit frequency -- proportion of 1s vs 0s should be ~50%.
pub fn monobit_frequency(data: &[u8]) -> TestResult {
    let name = "Monobit Frequency";
    let n = data.len() * 8;
    if n < 100 {
        return insufficient(name, 100, n);
    }
    let ones: i64 = data.iter().map(|b| i64::from(b.count_ones())).sum();
    let s = 2 * ones - n as i64;
    let s_obs = (s as f64).abs() / (n as f64).sqrt();
    let p = erfc(s_obs / 2.0_f64.sqrt());
    TestResult::from_p(
        name,
        Some(p),
        s_obs,
        format!("S={s}, n={n}, ones={:.4}", ones as f64 / n as f64),
    )
}

/// Block frequency -- frequency within 128-bit blocks. Chi-squared test.
pub fn block_frequency(data: &[u8]) -> TestResult {
    let name = "Block Frequency";
    let block_bytes: usize = 16;
    let block_size = block_bytes * 8;
    let num_blocks = data.len() / block_bytes;
    if num_blocks < 10 {
        return insufficient(name, block_size * 10, data.len() * 8);
    }
    let chi2 = 4.0
        * block_size as f64
        * data
            .chunks_exact(block_bytes)
            .map(|block| {
                let ones: u32 = block.iter().map(|b| b.count_ones()).sum();
                let proportion = f64::from(ones) / block_size as f64;
                (proportion - 0.5) * (proportion - 0.5)
            })
            .sum::<f64>();
    let p = chi2_sf(chi2, num_blocks as f64);
    TestResult::from_p(
        name,
        p,
        chi2,
        format!("blocks={num_blocks}, M={block_size}"),
    )
}

/// Byte frequency -- chi-squared on byte value distribution (256 bins, 255 df).
pub fn byte_frequency(data: &[u8]) -> TestResult {
    let name = "Byte Frequency";
    let n = data.len();
    if n < 256 {
        return insufficient(name, 256, n);
    }
    let mut hist = [0u64; 256];
    for &b in data {
        hist[b as usize] += 1;
    }
    let expected = n as f64 / 256.0;
    let chi2: f64 = hist
        .iter()
        .map(|&c| {
            let diff = c as f64 - expected;
            diff * diff / expected
        })
        .sum();
    let p = chi2_sf(chi2, 255.0);
    TestResult::from_p(
        name,
        p,
        chi2,
        format!("n={n}, expected_per_bin={expected:.1}"),
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// 2. RUNS
// ═══════════════════════════════════════════════════════════════════════════════

/// Runs test -- number of uninterrupted runs of 0s or 1s.
pub fn runs_test(data: &[u8]) -> TestResult {
    let name = "Runs Test";
    let bits = to_bits(data);
    let n = bits.len();
    if n < 100 {
        return insufficient(name, 100, n);
    }
    let ones: usize = bits.iter().map(|&b| b as usize).sum();
    let prop = ones as f64 / n as f64;
    if (prop - 0.5).abs() >= 2.0 / (n as f64).sqrt() {
        return TestResult::failed(name, format!("Pre-test failed: proportion={prop:.4}"));
    }
    let runs = 1 + bits.windows(2).filter(|w| w[0] != w[1]).count();
    let expected = 2.0 * n as f64 * prop * (1.0 - prop) + 1.0;
    let std = 2.0 * (2.0 * n as f64).sqrt() * prop * (1.0 - prop);
    if std < 1e-10 {
        return TestResult::failed(name, "Zero variance");
    }
    let z = (runs as f64 - expected).abs() / std;
    let p = erfc(z / 2.0_f64.sqrt());
    TestResult::from_p(
        name,
        Some(p),
        z,
        format!("runs={runs}, expected={expected:.0}"),
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// 3. ENTROPY
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-bit entropy -- data read as little-endian 64-bit words; each bit
/// position's Shannon entropy summed over all 64 positions (max 64.0).
pub fn bit_entropy(data: &[u8]) -> TestResult {
    let name = "Per-Bit Entropy";
    let words = data.len() / 8;
    if words < 128 {
        return insufficient(name, 128 * 8, data.len());
    }
    let mut ones = [0u64; 64];
    for chunk in data.chunks_exact(8) {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        let v = u64::from_le_bytes(word);
        for (b, count) in ones.iter_mut().enumerate() {
            *count += (v >> b) & 1;
        }
    }

    let mut total_h = 0.0;
    let mut min_h = 1.0;
    let mut min_bit = 0;
    for (b, &count) in ones.iter().enumerate() {
        let p1 = count as f64 / words as f64;
        let p0 = 1.0 - p1;
        let h = if p0 > 1e-10 && p1 > 1e-10 {
            -(p0 * p0.log2() + p1 * p1.log2())
        } else {
            0.0
        };
        total_h += h;
        if h < min_h {
            min_h = h;
            min_bit = b;
        }
    }

    let grade = if total_h > 63.0 {
        'A'
    } else if total_h > 60.0 {
        'B'
    } else if total_h > 50.0 {
        'C'
    } else if total_h > 32.0 {
        'D'
    } else {
        'F'
    };
    TestResult {
        name: name.to_string(),
        passed: total_h > 60.0,
        p_value: None,
        statistic: total_h,
        details: format!("{total_h:.2} / 64.0 bits, weakest bit [{min_bit}] = {min_h:.6}"),
        grade,
    }
}

/// Compression ratio -- zlib compression ratio (random ~ 1.0+).
pub fn compression_ratio(data: &[u8]) -> TestResult {
    let name = "Compression Ratio";
    let n = data.len();
    if n < 32 {
        return insufficient(name, 32, n);
    }
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    if let Err(e) = encoder.write_all(data) {
        return TestResult::failed(name, format!("zlib: {e}"));
    }
    let compressed = match encoder.finish() {
        Ok(c) => c,
        Err(e) => return TestResult::failed(name, format!("zlib: {e}")),
    };
    let ratio = compressed.len() as f64 / n as f64;
    TestResult {
        name: name.to_string(),
        passed: ratio > 0.85,
        p_value: None,
        statistic: ratio,
        details: format!("{}/{n} = {ratio:.4}", compressed.len()),
        grade: grade_from_ratio(ratio),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 4. SPECTRAL
// ═══════════════════════════════════════════════════════════════════════════════

/// DFT spectral -- periodic features show up as too many spectral peaks.
pub fn dft_spectral(data: &[u8]) -> TestResult {
    let name = "DFT Spectral";
    let bits = to_bits(data);
    let n = bits.len();
    if n < 64 {
        return insufficient(name, 64, n);
    }

    let mut buffer: Vec<Complex<f64>> = bits
        .iter()
        .map(|&b| Complex {
            re: if b == 1 { 1.0 } else { -1.0 },
            im: 0.0,
        })
        .collect();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let half = n / 2;
    // 95% of peaks should fall below sqrt(ln(1/0.05) * n).
    let threshold = (2.995732274 * n as f64).sqrt();
    let n0 = 0.95 * half as f64;
    let n1 = buffer[..half]
        .iter()
        .filter(|c| c.norm() < threshold)
        .count() as f64;
    let d = (n1 - n0) / (n as f64 * 0.95 * 0.05 / 4.0).sqrt();
    let p = erfc(d.abs() / 2.0_f64.sqrt());
    TestResult::from_p(
        name,
        Some(p),
        d,
        format!("peaks_below_threshold={}/{half}", n1 as u64),
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// 5. AVALANCHE
// ═══════════════════════════════════════════════════════════════════════════════

/// Bit avalanche -- adjacent bytes should differ by ~4 bits (50%).
pub fn bit_avalanche(data: &[u8]) -> TestResult {
    let name = "Bit Avalanche";
    let n = data.len();
    if n < 100 {
        return insufficient(name, 100, n);
    }
    let pairs = n - 1;
    let total_diffs: u64 = data
        .windows(2)
        .map(|w| u64::from((w[0] ^ w[1]).count_ones()))
        .sum();
    let mean_diff = total_diffs as f64 / pairs as f64;
    let std = 2.0_f64.sqrt(); // binomial std for n=8, p=0.5
    let z = (mean_diff - 4.0) / (std / (pairs as f64).sqrt());
    let p = two_sided_p(z);
    TestResult::from_p(
        name,
        Some(p),
        mean_diff,
        format!("mean_diff={mean_diff:.3}/8 bits, expected=4.0"),
    )
}

/// Hamming profile -- output Hamming distances for single-bit input flips
/// should average `width / 2`.
///
/// `distances` holds one `popcount(h(x) ^ h(x ^ bit))` per observation and
/// `width` is the output width in bits. The statistic is the mean distance.
pub fn hamming_profile(distances: &[u32], width: u32) -> TestResult {
    let name = "Hamming Profile";
    let n = distances.len();
    if n < 100 {
        return insufficient(name, 100, n);
    }
    if width == 0 {
        return TestResult::failed(name, "Zero output width");
    }
    let mean = distances.iter().map(|&d| f64::from(d)).sum::<f64>() / n as f64;
    let expected = f64::from(width) / 2.0;
    let std = f64::from(width).sqrt() / 2.0;
    let z = (mean - expected) / (std / (n as f64).sqrt());
    let p = two_sided_p(z);
    TestResult::from_p(
        name,
        Some(p),
        mean,
        format!("mean={mean:.3}/{width} bits, expected={expected:.1}, n={n}"),
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// 6. DISTRIBUTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Bucket uniformity -- chi-squared of observed bucket counts against a
/// uniform split, with K-1 degrees of freedom.
pub fn bucket_uniformity(counts: &[u64]) -> TestResult {
    let name = "Bucket Uniformity";
    let k = counts.len();
    if k < 2 {
        return insufficient(name, 2, k);
    }
    let total: u64 = counts.iter().sum();
    // At least five expected hits per bucket for the approximation to hold.
    if total < 5 * k as u64 {
        return insufficient(name, 5 * k, total as usize);
    }
    let expected = total as f64 / k as f64;
    let chi2: f64 = counts
        .iter()
        .map(|&c| {
            let diff = c as f64 - expected;
            diff * diff / expected
        })
        .sum();
    let df = (k - 1) as f64;
    let p = chi2_sf(chi2, df);
    TestResult::from_p(
        name,
        p,
        chi2,
        format!("buckets={k}, total={total}, df={df:.0}"),
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// Test battery
// ═══════════════════════════════════════════════════════════════════════════════

/// Run every byte-oriented test on a slice.
pub fn run_all_tests(data: &[u8]) -> Vec<TestResult> {
    let tests: [(&str, fn(&[u8]) -> TestResult); 8] = [
        ("Monobit Frequency", monobit_frequency),
        ("Block Frequency", block_frequency),
        ("Byte Frequency", byte_frequency),
        ("Runs Test", runs_test),
        ("Per-Bit Entropy", bit_entropy),
        ("Compression Ratio", compression_ratio),
        ("DFT Spectral", dft_spectral),
        ("Bit Avalanche", bit_avalanche),
    ];

    tests
        .iter()
        .map(|(name, test_fn)| {
            match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| test_fn(data))) {
                Ok(result) => result,
                Err(_) => TestResult {
                    name: (*name).to_string(),
                    passed: false,
                    p_value: None,
                    statistic: 0.0,
                    details: "Test panicked".to_string(),
                    grade: 'F',
                },
            }
        })
        .collect()
}

/// Calculate overall quality score (0-100) from test results.
///
/// Each grade maps to a score: A=100, B=75, C=50, D=25, F=0.
/// Returns the average across all tests.
pub fn calculate_quality_score(results: &[TestResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let total: f64 = results
        .iter()
        .map(|r| match r.grade {
            'A' => 100.0,
            'B' => 75.0,
            'C' => 50.0,
            'D' => 25.0,
            _ => 0.0,
        })
        .sum();
    total / results.len() as f64
}
