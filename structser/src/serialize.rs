use crate::reader::Reader;

/// Upper bound on the number of elements a decoded sequence may hold.
///
/// Elements that encode to zero bytes would otherwise let a single length prefix allocate
/// without bound.
pub const MAX_SEQUENCE_LEN: usize = 1 << 20;

/// Conversion between a structured value and its positional byte encoding.
///
/// `decode` never fails: a short buffer yields zero-filled fields, which is the encoding of
/// each category's default value. `encoded_size` must always equal the number of bytes
/// `encode` appends.
pub trait Serializable: Sized {
    /// Depth of the type tree rooted at this type. Primitives are 1.
    ///
    /// A type that contains itself cannot compute this constant, which turns a cyclic type
    /// graph into a compile error wherever the constant is evaluated.
    const NESTING_DEPTH: usize;

    fn decode(reader: &mut Reader<'_>) -> Self;

    fn encode(&self, out: &mut Vec<u8>);

    fn encoded_size(&self) -> usize;
}

/// Largest of the given depths, 0 for none.
pub const fn deepest(depths: &[usize]) -> usize {
    let mut max = 0;
    let mut i = 0;
    while i < depths.len() {
        if depths[i] > max {
            max = depths[i];
        }
        i += 1;
    }
    max
}

/// Decodes a complete buffer into a `T`, ignoring trailing bytes.
pub fn decode<T: Serializable>(data: &[u8]) -> T {
    let mut reader = Reader::new(data);
    T::decode(&mut reader)
}

/// Encodes `value` into a freshly allocated buffer.
pub fn encode<T: Serializable>(value: &T) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.encoded_size());
    value.encode(&mut out);
    out
}

macro_rules! impl_fixed_width {
    ($($ty:ty),*) => {
        $(
            impl Serializable for $ty {
                const NESTING_DEPTH: usize = 1;

                fn decode(reader: &mut Reader<'_>) -> Self {
                    <$ty>::from_le_bytes(reader.read_array())
                }

                fn encode(&self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn encoded_size(&self) -> usize {
                    std::mem::size_of::<$ty>()
                }
            }
        )*
    };
}

impl_fixed_width!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, f32, f64);

// Pointer-sized integers are always 8 bytes on the wire.
impl Serializable for usize {
    const NESTING_DEPTH: usize = 1;

    fn decode(reader: &mut Reader<'_>) -> Self {
        u64::from_le_bytes(reader.read_array()) as usize
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(*self as u64).to_le_bytes());
    }

    fn encoded_size(&self) -> usize {
        8
    }
}

impl Serializable for isize {
    const NESTING_DEPTH: usize = 1;

    fn decode(reader: &mut Reader<'_>) -> Self {
        i64::from_le_bytes(reader.read_array()) as isize
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(*self as i64).to_le_bytes());
    }

    fn encoded_size(&self) -> usize {
        8
    }
}

impl Serializable for bool {
    const NESTING_DEPTH: usize = 1;

    fn decode(reader: &mut Reader<'_>) -> Self {
        reader.read_u8() != 0
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.push(*self as u8);
    }

    fn encoded_size(&self) -> usize {
        1
    }
}

impl Serializable for char {
    const NESTING_DEPTH: usize = 1;

    fn decode(reader: &mut Reader<'_>) -> Self {
        char::from_u32(reader.read_u32()).unwrap_or('\0')
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(*self as u32).to_le_bytes());
    }

    fn encoded_size(&self) -> usize {
        4
    }
}

impl Serializable for () {
    const NESTING_DEPTH: usize = 1;

    fn decode(_reader: &mut Reader<'_>) -> Self {}

    fn encode(&self, _out: &mut Vec<u8>) {}

    fn encoded_size(&self) -> usize {
        0
    }
}

impl Serializable for String {
    const NESTING_DEPTH: usize = 1;

    fn decode(reader: &mut Reader<'_>) -> Self {
        let declared = reader.read_u32() as usize;
        let bytes = reader.read_bytes(declared);
        match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(err) => {
                // Keep the longest valid prefix, dropping any partial trailing character
                String::from_utf8_lossy(&bytes[..err.valid_up_to()]).into_owned()
            }
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.len() as u32).to_le_bytes());
        out.extend_from_slice(self.as_bytes());
    }

    fn encoded_size(&self) -> usize {
        4 + self.len()
    }
}

impl<T: Serializable> Serializable for Vec<T> {
    const NESTING_DEPTH: usize = T::NESTING_DEPTH + 1;

    fn decode(reader: &mut Reader<'_>) -> Self {
        let declared = reader.read_u32() as usize;
        let mut elements = Vec::new();
        if reader.is_short() {
            return elements;
        }

        for _ in 0..std::cmp::min(declared, MAX_SEQUENCE_LEN) {
            let element = T::decode(reader);
            if reader.is_short() {
                // Partial trailing element, drop it
                break;
            }
            elements.push(element);
        }
        elements
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.len() as u32).to_le_bytes());
        for element in self {
            element.encode(out);
        }
    }

    fn encoded_size(&self) -> usize {
        4 + self.iter().map(Serializable::encoded_size).sum::<usize>()
    }
}

impl<T: Serializable, const N: usize> Serializable for [T; N] {
    const NESTING_DEPTH: usize = T::NESTING_DEPTH + 1;

    fn decode(reader: &mut Reader<'_>) -> Self {
        std::array::from_fn(|_| T::decode(reader))
    }

    fn encode(&self, out: &mut Vec<u8>) {
        for element in self {
            element.encode(out);
        }
    }

    fn encoded_size(&self) -> usize {
        self.iter().map(Serializable::encoded_size).sum()
    }
}

impl<T: Serializable> Serializable for Option<T> {
    const NESTING_DEPTH: usize = T::NESTING_DEPTH + 1;

    fn decode(reader: &mut Reader<'_>) -> Self {
        match reader.read_u8() % 2 {
            0 => None,
            _ => Some(T::decode(reader)),
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            None => out.push(0),
            Some(value) => {
                out.push(1);
                value.encode(out);
            }
        }
    }

    fn encoded_size(&self) -> usize {
        1 + self.as_ref().map_or(0, Serializable::encoded_size)
    }
}

macro_rules! impl_tuple {
    ($($name:ident $idx:tt),+) => {
        impl<$($name: Serializable),+> Serializable for ($($name,)+) {
            const NESTING_DEPTH: usize = 1 + deepest(&[$($name::NESTING_DEPTH),+]);

            fn decode(reader: &mut Reader<'_>) -> Self {
                ($($name::decode(reader),)+)
            }

            fn encode(&self, out: &mut Vec<u8>) {
                $(self.$idx.encode(out);)+
            }

            fn encoded_size(&self) -> usize {
                0 $(+ self.$idx.encoded_size())+
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

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_partial_fill_rule() {
        // { a: i32, b: bool } from two bytes: both land in the low bytes of `a`
        let value: (i32, bool) = decode(&[0xFF, 0x00]);
        assert_eq!(value, (255, false));
    }

    #[test]
    fn test_product_layout_is_positional() {
        let value: (i32, bool) = (-2, true);
        assert_eq!(encode(&value), vec![0xFE, 0xFF, 0xFF, 0xFF, 0x01]);
        assert_eq!(value.encoded_size(), 5);
    }

    #[test]
    fn test_empty_buffer_decodes_to_zero_values() {
        assert_eq!(decode::<u64>(&[]), 0);
        assert!(!decode::<bool>(&[]));
        assert_eq!(decode::<char>(&[]), '\0');
        assert_eq!(decode::<String>(&[]), "");
        assert_eq!(decode::<Vec<u16>>(&[]), Vec::<u16>::new());
        assert_eq!(decode::<[u8; 3]>(&[]), [0, 0, 0]);
        assert_eq!(decode::<Option<u8>>(&[]), None);
    }

    #[test]
    fn test_bool_nonzero_is_true() {
        assert!(decode::<bool>(&[0x02]));
        assert_eq!(encode(&true), vec![0x01]);
    }

    #[test]
    fn test_invalid_char_decodes_to_nul() {
        // Surrogate code point
        assert_eq!(decode::<char>(&[0x00, 0xD8, 0x00, 0x00]), '\0');
        assert_eq!(decode::<char>(&[0x41, 0x00, 0x00, 0x00]), 'A');
    }

    #[test]
    fn test_vec_truncated_to_full_elements() {
        let data = [
            0x03, 0x00, 0x00, 0x00, // declares 3 elements
            0x34, 0x12, // first u16
            0x78, 0x56, // second u16
            0xAA, // half of the third
        ];
        let value: Vec<u16> = decode(&data);
        assert_eq!(value, vec![0x1234, 0x5678]);
    }

    #[test]
    fn test_vec_of_zero_sized_elements_is_capped() {
        let value: Vec<()> = decode(&[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(value.len(), MAX_SEQUENCE_LEN);
    }

    #[test]
    fn test_nested_vec_partial_inner() {
        let data = [
            0x02, 0x00, 0x00, 0x00, // two inner vectors
            0x01, 0x00, 0x00, 0x00, 0x07, // [7]
            0x05, 0x00, 0x00, 0x00, 0x01, // declares 5, only 1 byte remains
        ];
        let value: Vec<Vec<u8>> = decode(&data);
        // The second inner vector runs out of bytes mid-element and is dropped as a whole
        assert_eq!(value, vec![vec![7]]);
    }

    #[test]
    fn test_text_keeps_valid_prefix() {
        let mut data = vec![0x05, 0x00, 0x00, 0x00];
        data.extend_from_slice("hé".as_bytes()); // 3 bytes
        data.push(0xE2); // start of a 3-byte character, cut short
        let value: String = decode(&data);
        assert_eq!(value, "hé");
    }

    #[test]
    fn test_array_default_fills_missing_elements() {
        let value: [u16; 3] = decode(&[0x01, 0x00, 0x02]);
        assert_eq!(value, [1, 2, 0]);
    }

    #[test]
    fn test_option_tag_reduced_modulo() {
        let value: Option<u8> = decode(&[0x03, 0x2A]);
        assert_eq!(value, Some(42));
        let value: Option<u8> = decode(&[0x04, 0x2A]);
        assert_eq!(value, None);
    }

    #[test]
    fn test_nesting_depth() {
        assert_eq!(<u8 as Serializable>::NESTING_DEPTH, 1);
        assert_eq!(<Vec<Vec<u8>> as Serializable>::NESTING_DEPTH, 3);
        assert_eq!(<(u8, Vec<u8>) as Serializable>::NESTING_DEPTH, 3);
        assert_eq!(deepest(&[]), 0);
    }

    proptest! {
        #[test]
        fn prop_roundtrip_and_size(value in any::<(u32, i64, bool, String, Vec<u16>, Option<[u8; 4]>)>()) {
            let bytes = encode(&value);
            prop_assert_eq!(bytes.len(), value.encoded_size());
            let decoded: (u32, i64, bool, String, Vec<u16>, Option<[u8; 4]>) = decode(&bytes);
            prop_assert_eq!(decoded, value);
        }

        #[test]
        fn prop_decode_arbitrary_bytes_is_total(data in proptest::collection::vec(any::<u8>(), 0..64)) {
            let value: (Vec<String>, char, Option<u64>) = decode(&data);
            // Whatever came out re-encodes consistently
            prop_assert_eq!(encode(&value).len(), value.encoded_size());
        }
    }
}
