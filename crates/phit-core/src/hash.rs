//! Integer mixing primitives.
//!
//! Both functions are pure and bit-exact across implementations: fixed
//! constants, fixed widths, wrapping (mod 2^n) arithmetic.

/// Golden-ratio increment (2^64 / φ), used to spread counters and seeds.
pub const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// 32-bit avalanche hash.
///
/// Multiply by the Knuth constant, xor-shift 16, multiply by the murmur3
/// `c1` constant, xor-shift 13. Zero maps to zero.
#[inline]
pub const fn avalanche32(x: u32) -> u32 {
    let mut k = x.wrapping_mul(2_654_435_761);
    k ^= k >> 16;
    k = k.wrapping_mul(0x85EB_CA6B);
    k ^= k >> 13;
    k
}

/// SplitMix64 finalizer.
#[inline]
pub const fn mix64(x: u64) -> u64 {
    let mut z = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Known-answer vectors
    // -----------------------------------------------------------------------

    #[test]
    fn test_avalanche32_vectors() {
        assert_eq!(avalanche32(0), 0);
        assert_eq!(avalanche32(1), 0x640C_A17E);
        assert_eq!(avalanche32(42), 0xF380_47CF);
        assert_eq!(avalanche32(43), 0xFAD9_3039);
        assert_eq!(avalanche32(0xFFFF_FFFF), 0x1196_C7DF);
        assert_eq!(avalanche32(0xDEAD_BEEF), 0x42E4_775E);
    }

    #[test]
    fn test_mix64_vectors() {
        assert_eq!(mix64(0), 0);
        assert_eq!(mix64(1), 0x5692_161D_100B_05E5);
        assert_eq!(mix64(42), 0xA759_EA27_D472_7622);
        assert_eq!(mix64(u64::MAX), 0xB4D0_55FC_F2CB_BD7B);
    }

    #[test]
    fn test_mix64_reproduces_splitmix64_first_output() {
        // SplitMix64 seeded with 0 emits mix64(GOLDEN_GAMMA) first.
        assert_eq!(mix64(GOLDEN_GAMMA), 0xE220_A839_7B1D_CDAF);
    }

    #[test]
    fn test_const_evaluable() {
        const H: u32 = avalanche32(42);
        const M: u64 = mix64(42);
        assert_eq!(H, avalanche32(42));
        assert_eq!(M, mix64(42));
    }

    // -----------------------------------------------------------------------
    // Avalanche behaviour
    // -----------------------------------------------------------------------

    #[test]
    fn test_avalanche32_single_bit_flips_change_many_bits() {
        let mut total = 0u32;
        let mut trials = 0u32;
        for x in (0u32..4096).map(|i| i.wrapping_mul(0x9E37_79B9)) {
            for bit in 0..32 {
                total += (avalanche32(x) ^ avalanche32(x ^ (1 << bit))).count_ones();
                trials += 1;
            }
        }
        let mean = f64::from(total) / f64::from(trials);
        assert!(
            (10.0..=22.0).contains(&mean),
            "mean flipped bits {mean:.2} out of 32"
        );
    }

    #[test]
    fn test_mix64_single_bit_flips_change_about_half() {
        let mut total = 0u64;
        let mut trials = 0u64;
        for i in 0u64..2048 {
            let x = i.wrapping_mul(GOLDEN_GAMMA);
            for bit in 0..64 {
                total += u64::from((mix64(x) ^ mix64(x ^ (1 << bit))).count_ones());
                trials += 1;
            }
        }
        let mean = total as f64 / trials as f64;
        assert!((30.0..=34.0).contains(&mean), "mean flipped bits {mean:.2}");
    }

    #[test]
    fn test_mix64_no_collisions_on_counter_inputs() {
        let mut seen = std::collections::HashSet::new();
        for i in 0u64..100_000 {
            assert!(seen.insert(mix64(i)));
        }
    }
}
