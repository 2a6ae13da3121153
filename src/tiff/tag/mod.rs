// refs
// https://web.archive.org/web/20220119170528/http://www.exif.org/Exif2-2.PDF
// https://docs.ogc.org/is/19-008r4/19-008r4.html

use super::Endian;
use num_enum::{FromPrimitive, IntoPrimitive};
use num_traits::NumCast;

mod data;
mod id;

pub use data::TagData;
pub use id::TagId;

#[derive(Clone, Debug)]
pub struct Tag {
    pub code: u16,
    pub datatype: TagType,
    pub count: usize,
    pub data: Vec<u8>,
    pub endian: Endian,
}

impl Tag {
    pub fn id(&self) -> Option<TagId> {
        TagId::try_from(self.code).ok()
    }

    /// Decodes every element of the tag, casting into `T`.
    ///
    /// Rationals are reduced to their quotient. Returns `None` if any element
    /// does not fit `T` or the tag holds text.
    pub fn values<T: NumCast>(&self) -> Option<Vec<T>> {
        let endian = self.endian;
        let bytes = self.data.as_slice();
        match self.datatype {
            TagType::Byte | TagType::Undefined => bytes.iter().map(|v| T::from(*v)).collect(),
            TagType::SByte => bytes.iter().map(|v| T::from(*v as i8)).collect(),
            TagType::Short => endian.decode_all_to_primative::<2, u16, T>(bytes),
            TagType::SShort => endian.decode_all_to_primative::<2, i16, T>(bytes),
            TagType::Long | TagType::Ifd => endian.decode_all_to_primative::<4, u32, T>(bytes),
            TagType::SLong => endian.decode_all_to_primative::<4, i32, T>(bytes),
            TagType::Float => endian.decode_all_to_primative::<4, f32, T>(bytes),
            TagType::Double => endian.decode_all_to_primative::<8, f64, T>(bytes),
            TagType::Long8 | TagType::Ifd8 => endian.decode_all_to_primative::<8, u64, T>(bytes),
            TagType::SLong8 => endian.decode_all_to_primative::<8, i64, T>(bytes),
            TagType::Rational => endian
                .decode_all::<4, u32>(bytes)?
                .chunks_exact(2)
                .map(|pair| T::from(pair[0] as f64 / pair[1] as f64))
                .collect(),
            TagType::SRational => endian
                .decode_all::<4, i32>(bytes)?
                .chunks_exact(2)
                .map(|pair| T::from(pair[0] as f64 / pair[1] as f64))
                .collect(),
            TagType::Ascii | TagType::Unknown => None,
        }
    }

    pub fn value<T: NumCast + Copy>(&self) -> Option<T> {
        match self.values()?.as_slice() {
            [v] => Some(*v),
            _ => None,
        }
    }

    pub fn try_to_string(&self) -> Option<String> {
        match self.datatype {
            TagType::Ascii => String::from_utf8(self.data.clone()).ok(),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy, IntoPrimitive, FromPrimitive)]
#[repr(u16)]
pub enum TagType {
    Byte = 1,
    Ascii = 2,
    Short = 3,
    Long = 4,
    Rational = 5,
    SByte = 6,
    Undefined = 7,
    SShort = 8,
    SLong = 9,
    SRational = 10,
    Float = 11,
    Double = 12,
    Ifd = 13,
    Long8 = 16,
    SLong8 = 17,
    Ifd8 = 18,

    #[num_enum(default)]
    Unknown = 0xFFFF,
}

impl TagType {
    pub fn size_in_bytes(&self) -> usize {
        match self {
            TagType::Byte => 1,
            TagType::Ascii => 1,
            TagType::Short => 2,
            TagType::Long => 4,
            TagType::Rational => 8,
            TagType::SByte => 1,
            TagType::Undefined => 1,
            TagType::SShort => 2,
            TagType::SLong => 4,
            TagType::SRational => 8,
            TagType::Float => 4,
            TagType::Double => 8,
            TagType::Ifd => 4,
            TagType::Long8 => 8,
            TagType::SLong8 => 8,
            TagType::Ifd8 => 8,

            TagType::Unknown => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rational_values_are_quotients() {
        let endian = Endian::Big;
        let tag = Tag {
            code: TagId::XResolution.into(),
            datatype: TagType::Rational,
            count: 1,
            data: [endian.encode(300_u32), endian.encode(4_u32)].concat(),
            endian,
        };
        assert_eq!(tag.value::<f64>(), Some(75.0));
    }

    #[test]
    fn ascii_is_not_numeric() {
        let tag = Tag {
            code: TagId::GDALNoData.into(),
            datatype: TagType::Ascii,
            count: 6,
            data: b"-9999\0".to_vec(),
            endian: Endian::Little,
        };
        assert_eq!(tag.values::<f64>(), None);
        assert_eq!(tag.try_to_string().as_deref(), Some("-9999\0"));
    }
}
