/// The minimal valid value of a type.
///
/// For every generic category this is the value an exhausted buffer decodes to.
pub trait DefaultValue {
    fn default_value() -> Self;
}

macro_rules! impl_default_via_std {
    ($($ty:ty),*) => {
        $(
            impl DefaultValue for $ty {
                fn default_value() -> Self {
                    <$ty>::default()
                }
            }
        )*
    };
}

impl_default_via_std!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, bool, char, (),
    String
);

impl<T> DefaultValue for Vec<T> {
    fn default_value() -> Self {
        Vec::new()
    }
}

impl<T: DefaultValue, const N: usize> DefaultValue for [T; N] {
    fn default_value() -> Self {
        std::array::from_fn(|_| T::default_value())
    }
}

impl<T> DefaultValue for Option<T> {
    fn default_value() -> Self {
        None
    }
}

macro_rules! impl_tuple {
    ($($name:ident),+) => {
        impl<$($name: DefaultValue),+> DefaultValue for ($($name,)+) {
            fn default_value() -> Self {
                ($($name::default_value(),)+)
            }
        }
    };
}

impl_tuple!(A);
impl_tuple!(A, B);
impl_tuple!(A, B, C);
impl_tuple!(A, B, C, D);
impl_tuple!(A, B, C, D, E);
impl_tuple!(A, B, C, D, E, F);
impl_tuple!(A, B, C, D, E, F, G);
impl_tuple!(A, B, C, D, E, F, G, H);
impl_tuple!(A, B, C, D, E, F, G, H, I);
impl_tuple!(A, B, C, D, E, F, G, H, I, J);
impl_tuple!(A, B, C, D, E, F, G, H, I, J, K);
impl_tuple!(A, B, C, D, E, F, G, H, I, J, K, L);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::{decode, Serializable};

    fn assert_empty_decodes_to_default<T>()
    where
        T: Serializable + DefaultValue + PartialEq + std::fmt::Debug,
    {
        assert_eq!(decode::<T>(&[]), T::default_value());
    }

    #[test]
    fn test_defaults_match_empty_decode() {
        assert_empty_decodes_to_default::<u32>();
        assert_empty_decodes_to_default::<i128>();
        assert_empty_decodes_to_default::<char>();
        assert_empty_decodes_to_default::<String>();
        assert_empty_decodes_to_default::<Vec<String>>();
        assert_empty_decodes_to_default::<[Option<u8>; 4]>();
        assert_empty_decodes_to_default::<(u8, bool, Vec<u64>)>();
    }

    #[test]
    fn test_array_default_is_zero_filled() {
        assert_eq!(<[u16; 3]>::default_value(), [0, 0, 0]);
    }
}
