use std::io::{self, Read, Seek};

mod endian;
mod error;
mod ifd;
mod tag;

pub use endian::Endian;
pub use error::TiffError;
pub use ifd::Ifd;
pub use tag::{Tag, TagData, TagId, TagType};

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum TiffVariant {
    Normal,
    Big,
}

impl TiffVariant {
    pub fn read_offset<R: Read>(&self, endian: Endian, stream: &mut R) -> io::Result<u64> {
        match self {
            TiffVariant::Normal => endian.read::<4, u32>(stream).map(|v| v as u64),
            TiffVariant::Big => endian.read(stream),
        }
    }

    pub const fn offset_bytesize(&self) -> usize {
        match self {
            TiffVariant::Normal => 4,
            TiffVariant::Big => 8,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Tiff {
    pub endian: Endian,
    pub variant: TiffVariant,
    pub ifds: Vec<Ifd>,
}

impl Tiff {
    pub fn new(endian: Endian, variant: TiffVariant) -> Self {
        Self {
            endian,
            variant,
            ifds: vec![Ifd::new()],
        }
    }

    pub fn open<R: Read + Seek>(stream: &mut R) -> Result<Self, TiffError> {
        // TIFF Header
        let mut buf = [0; 4];
        stream.read_exact(&mut buf)?;

        let endian = match &buf[..2] {
            b"II" => Endian::Little,
            b"MM" => Endian::Big,
            _ => return Err(TiffError::BadMagicBytes),
        };

        let variant = match &buf[2..4] {
            b"\0*" | b"*\0" => TiffVariant::Normal,
            b"\0+" | b"+\0" => TiffVariant::Big,
            _ => return Err(TiffError::BadMagicBytes),
        };

        if TiffVariant::Big == variant {
            // BigTIFFs have 4 extra bytes in the header
            let _offset_bytesize: u16 = endian.read(stream)?; // 0x0008
            let _: u16 = endian.read(stream)?; // 0x0000
        }

        // IFDs
        let mut ifds = vec![];
        let mut ifd_offset = variant.read_offset(endian, stream)?;
        while ifd_offset != 0 {
            let (ifd, next_offset) = Ifd::parse(stream, ifd_offset, endian, variant)?;
            ifd_offset = next_offset;
            ifds.push(ifd);
        }

        Ok(Self {
            endian,
            variant,
            ifds,
        })
    }

    pub fn ifd0(&self) -> Result<&Ifd, TiffError> {
        self.ifds.first().ok_or(TiffError::NoIfd0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn rejects_bad_magic() {
        let mut stream = Cursor::new(b"PK\x03\x04".to_vec());
        assert!(matches!(
            Tiff::open(&mut stream),
            Err(TiffError::BadMagicBytes)
        ));
    }

    #[test]
    fn parses_inline_and_offset_tags() {
        // Little endian classic TIFF, one IFD at offset 8 with two tags
        let mut bytes = b"II*\0".to_vec();
        bytes.extend(8_u32.to_le_bytes());
        bytes.extend(2_u16.to_le_bytes());
        // ImageWidth, SHORT, 1, inline 304
        bytes.extend(0x0100_u16.to_le_bytes());
        bytes.extend(3_u16.to_le_bytes());
        bytes.extend(1_u32.to_le_bytes());
        bytes.extend(304_u16.to_le_bytes());
        bytes.extend([0, 0]);
        // ModelPixelScale, DOUBLE, 3, at offset 38
        bytes.extend(0x830E_u16.to_le_bytes());
        bytes.extend(12_u16.to_le_bytes());
        bytes.extend(3_u32.to_le_bytes());
        bytes.extend(38_u32.to_le_bytes());
        // next IFD
        bytes.extend(0_u32.to_le_bytes());
        for v in [25000.0_f64, 25000.0, 0.0] {
            bytes.extend(v.to_le_bytes());
        }

        let tiff = Tiff::open(&mut Cursor::new(bytes)).unwrap();
        let ifd = tiff.ifd0().unwrap();
        assert_eq!(ifd.get_tag_value::<u32>(TagId::ImageWidth).unwrap(), 304);
        assert_eq!(
            ifd.get_tag_values::<f64>(TagId::ModelPixelScale).unwrap(),
            vec![25000.0, 25000.0, 0.0]
        );
        assert!(matches!(
            ifd.get_tag(TagId::ImageHeight),
            Err(TiffError::MissingTag(TagId::ImageHeight))
        ));
    }
}
