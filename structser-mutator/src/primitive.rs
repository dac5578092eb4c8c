use crate::context::MutationContext;
use crate::mutator::Mutatable;
use crate::random::RandomSource;

/// The largest value added or subtracted by an arithmetic mutation.
pub const ARITH_MAX: usize = 35;

/// Interesting 8-bit values from AFL
pub const INTERESTING_8: [i8; 9] = [-128, -1, 0, 1, 16, 32, 64, 100, 127];
/// Additional interesting 16-bit values from AFL
pub const INTERESTING_16: [i16; 10] = [-32768, -129, 128, 255, 256, 512, 1000, 1024, 4096, 32767];
/// Additional interesting 32-bit values from AFL
pub const INTERESTING_32: [i32; 8] = [
    -2147483648,
    -100663046,
    -32769,
    32768,
    65535,
    65536,
    100663045,
    2147483647,
];

pub const INTERESTING_CHARS: [char; 14] = [
    '\0', '\t', '\n', '\r', ' ', '"', '\'', '\\', '\u{7F}', '\u{80}', '\u{7FF}', '\u{800}',
    '\u{FFFD}', '\u{10FFFF}',
];

const INTERESTING_F64: [f64; 12] = [
    0.0,
    -0.0,
    1.0,
    -1.0,
    f64::INFINITY,
    f64::NEG_INFINITY,
    f64::NAN,
    f64::MIN_POSITIVE,
    f64::EPSILON,
    f64::MIN,
    f64::MAX,
    0.5,
];

enum Interesting {
    Min,
    Max,
    Value(i32),
}

/// Picks from the AFL tables that fit a `bits`-wide integer, plus the type's extremes.
fn pick_interesting(rand: &mut RandomSource, bits: u32) -> Interesting {
    let mut count = 2 + INTERESTING_8.len();
    if bits >= 16 {
        count += INTERESTING_16.len();
    }
    if bits >= 32 {
        count += INTERESTING_32.len();
    }

    let index = rand.uniform(count);
    match index {
        0 => Interesting::Min,
        1 => Interesting::Max,
        i if i - 2 < INTERESTING_8.len() => Interesting::Value(INTERESTING_8[i - 2] as i32),
        i if i - 2 - INTERESTING_8.len() < INTERESTING_16.len() => {
            Interesting::Value(INTERESTING_16[i - 2 - INTERESTING_8.len()] as i32)
        }
        i => Interesting::Value(INTERESTING_32[i - 2 - INTERESTING_8.len() - INTERESTING_16.len()]),
    }
}

/// A random character, biased towards printable ASCII and encoding boundaries.
pub fn random_char(rand: &mut RandomSource) -> char {
    match rand.uniform(4) {
        0 | 1 => (b' ' + rand.uniform(95) as u8) as char,
        2 => rand.sample(&INTERESTING_CHARS).copied().unwrap_or('\0'),
        _ => char::from_u32(rand.uniform(0x11_0000) as u32).unwrap_or('\u{FFFD}'),
    }
}

macro_rules! impl_integer {
    ($($ty:ty),*) => {
        $(
            impl Mutatable for $ty {
                fn mutate(&mut self, ctx: &mut MutationContext) -> bool {
                    let original = *self;
                    *self = match ctx.rand().uniform(3) {
                        0 => original ^ ((1 as $ty) << ctx.rand().uniform(<$ty>::BITS as usize)),
                        1 => {
                            let delta = 1 + ctx.rand().uniform(ARITH_MAX) as $ty;
                            if ctx.rand().chance(0.5) {
                                original.wrapping_add(delta)
                            } else {
                                original.wrapping_sub(delta)
                            }
                        }
                        _ => match pick_interesting(ctx.rand(), <$ty>::BITS) {
                            Interesting::Min => <$ty>::MIN,
                            Interesting::Max => <$ty>::MAX,
                            Interesting::Value(value) => value as $ty,
                        },
                    };

                    if *self == original && ctx.enforce_changes() {
                        *self = original ^ ((1 as $ty) << ctx.rand().uniform(<$ty>::BITS as usize));
                    }
                    *self != original
                }
            }
        )*
    };
}

impl_integer!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

macro_rules! impl_float {
    ($($ty:ty => $bits:ty),*) => {
        $(
            impl Mutatable for $ty {
                fn mutate(&mut self, ctx: &mut MutationContext) -> bool {
                    let original = *self;
                    let width = <$bits>::BITS as usize;
                    *self = match ctx.rand().uniform(3) {
                        0 => <$ty>::from_bits(
                            original.to_bits() ^ ((1 as $bits) << ctx.rand().uniform(width)),
                        ),
                        1 => {
                            let delta = (1 + ctx.rand().uniform(ARITH_MAX)) as $ty;
                            if ctx.rand().chance(0.5) {
                                original + delta
                            } else {
                                original - delta
                            }
                        }
                        _ => ctx
                            .rand()
                            .sample(&INTERESTING_F64)
                            .map_or(original, |value| *value as $ty),
                    };

                    if self.to_bits() == original.to_bits() && ctx.enforce_changes() {
                        *self = <$ty>::from_bits(
                            original.to_bits() ^ ((1 as $bits) << ctx.rand().uniform(width)),
                        );
                    }
                    self.to_bits() != original.to_bits()
                }
            }
        )*
    };
}

impl_float!(f32 => u32, f64 => u64);

impl Mutatable for bool {
    fn mutate(&mut self, _ctx: &mut MutationContext) -> bool {
        *self = !*self;
        true
    }
}

impl Mutatable for char {
    fn mutate(&mut self, ctx: &mut MutationContext) -> bool {
        let original = *self;
        let scalar = original as u32;
        let candidate = match ctx.rand().uniform(4) {
            0 => char::from_u32(scalar ^ (1u32 << ctx.rand().uniform(21))),
            1 => {
                let delta = 1 + ctx.rand().uniform(ARITH_MAX) as u32;
                if ctx.rand().chance(0.5) {
                    char::from_u32(scalar.wrapping_add(delta))
                } else {
                    char::from_u32(scalar.wrapping_sub(delta))
                }
            }
            2 => ctx.rand().sample(&INTERESTING_CHARS).copied(),
            _ => Some(random_char(ctx.rand())),
        };
        *self = candidate.unwrap_or(original);

        if *self == original && ctx.enforce_changes() {
            // Flipping the lowest bit never crosses into the surrogate range
            *self = char::from_u32(scalar ^ 1).unwrap_or('\0');
        }
        *self != original
    }
}

impl Mutatable for () {
    fn mutate(&mut self, _ctx: &mut MutationContext) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use structser::Equatable;

    #[test]
    fn test_integers_always_change_when_enforced() {
        let mut ctx = MutationContext::new(1, 0, 0);
        for _ in 0..1000 {
            let mut byte = 0u8;
            assert!(byte.mutate(&mut ctx));
            assert_ne!(byte, 0);

            let mut wide = i128::MAX;
            assert!(wide.mutate(&mut ctx));
            assert_ne!(wide, i128::MAX);
        }
    }

    #[test]
    fn test_interesting_values_are_reached() {
        let mut ctx = MutationContext::new(2, 0, 0);
        let mut seen_max = false;
        let mut seen_afl = false;
        for _ in 0..2000 {
            let mut value = 12345u32;
            value.mutate(&mut ctx);
            seen_max |= value == u32::MAX;
            seen_afl |= value == 65536;
        }
        assert!(seen_max && seen_afl);
    }

    #[test]
    fn test_interesting_table_respects_width() {
        let mut rand = RandomSource::new(3);
        for _ in 0..1000 {
            if let Interesting::Value(value) = pick_interesting(&mut rand, 8) {
                assert!(INTERESTING_8.contains(&(value as i8)));
                assert!((i8::MIN as i32..=i8::MAX as i32).contains(&value));
            }
        }
    }

    #[test]
    fn test_floats_change_by_bits() {
        let mut ctx = MutationContext::new(4, 0, 0);
        for _ in 0..1000 {
            let mut value = f64::NAN;
            assert!(value.mutate(&mut ctx));
            assert!(!value.equals(&f64::NAN));

            let mut single = 1.5f32;
            assert!(single.mutate(&mut ctx));
            assert!(!single.equals(&1.5));
        }
    }

    #[test]
    fn test_char_stays_valid_and_changes() {
        let mut ctx = MutationContext::new(5, 0, 0);
        for start in ['\0', 'a', '\u{D7FF}', '\u{E000}', '\u{10FFFF}'] {
            for _ in 0..200 {
                let mut value = start;
                assert!(value.mutate(&mut ctx));
                assert_ne!(value, start);
            }
        }
    }

    #[test]
    fn test_relaxed_integer_may_stay_put() {
        // Replacing 0 with an interesting 0 is a legal no-op without enforcement
        let mut ctx = MutationContext::new(6, 0, 0);
        let mut unchanged = 0;
        ctx.relaxed(|ctx| {
            for _ in 0..2000 {
                let mut value = 0u8;
                if !value.mutate(ctx) {
                    assert_eq!(value, 0);
                    unchanged += 1;
                }
            }
        });
        assert!(unchanged > 0);
    }
}
