/// Structural equality used for change detection.
///
/// Floating point values compare by bit pattern so that a NaN that survives a round trip is
/// still equal to itself.
pub trait Equatable {
    fn equals(&self, other: &Self) -> bool;
}

macro_rules! impl_equatable_via_eq {
    ($($ty:ty),*) => {
        $(
            impl Equatable for $ty {
                fn equals(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

impl_equatable_via_eq!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, bool, char, (), String
);

impl Equatable for f32 {
    fn equals(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}

impl Equatable for f64 {
    fn equals(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}

impl<T: Equatable + ?Sized> Equatable for &T {
    fn equals(&self, other: &Self) -> bool {
        (**self).equals(*other)
    }
}

impl<T: Equatable> Equatable for [T] {
    fn equals(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.equals(b))
    }
}

impl<T: Equatable> Equatable for Vec<T> {
    fn equals(&self, other: &Self) -> bool {
        self.as_slice().equals(other.as_slice())
    }
}

impl<T: Equatable, const N: usize> Equatable for [T; N] {
    fn equals(&self, other: &Self) -> bool {
        self.as_slice().equals(other.as_slice())
    }
}

impl<T: Equatable> Equatable for Option<T> {
    fn equals(&self, other: &Self) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(a), Some(b)) => a.equals(b),
            _ => false,
        }
    }
}

macro_rules! impl_tuple {
    ($($name:ident $idx:tt),+) => {
        impl<$($name: Equatable),+> Equatable for ($($name,)+) {
            fn equals(&self, other: &Self) -> bool {
                true $(&& self.$idx.equals(&other.$idx))+
            }
        }
    };
}

impl_tuple!(A 0);
impl_tuple!(A 0, B 1);
impl_tuple!(A 0, B 1, C 2);
impl_tuple!(A 0, B 1, C 2, D 3);
impl_tuple!(A 0, B 1, C 2, D 3, E 4);
impl_tuple!(A 0, B 1, C 2, D 3, E 4, F 5);
impl_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);
impl_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8);
impl_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9);
impl_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9, K 10);
impl_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9, K 10, L 11);
