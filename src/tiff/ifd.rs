use num_traits::NumCast;

use super::{Endian, Tag, TagData, TagId, TagType, TiffError, TiffVariant};
use std::io::{self, Read, Seek, SeekFrom};

#[derive(Clone, Debug, Default)]
pub struct Ifd(pub Vec<Tag>);

impl Ifd {
    pub fn new() -> Self {
        Self(vec![])
    }

    pub fn parse<R: Read + Seek>(
        stream: &mut R,
        offset: u64,
        endian: Endian,
        variant: TiffVariant,
    ) -> io::Result<(Ifd, u64)> {
        // IFD starts at offset
        stream.seek(SeekFrom::Start(offset))?;

        // IFD header is just the number of tags
        let tag_count = match variant {
            TiffVariant::Normal => endian.read::<2, u16>(stream)? as u64,
            TiffVariant::Big => endian.read(stream)?,
        };

        // Parse each tag in the IFD
        let mut tags = Vec::with_capacity(tag_count as usize);
        for _ in 0..tag_count {
            let code = endian.read(stream)?;
            let datatype: TagType = endian.read::<2, u16>(stream)?.into();
            let count = variant.read_offset(endian, stream)? as usize;

            let data_size = count * datatype.size_in_bytes();
            let offset_size = variant.offset_bytesize();
            let mut data: Vec<u8> = vec![0; data_size.max(offset_size)];

            if data_size > offset_size {
                let data_offset = variant.read_offset(endian, stream)?;
                let pos = stream.stream_position()?;
                stream.seek(SeekFrom::Start(data_offset))?;
                stream.read_exact(&mut data)?;
                stream.seek(SeekFrom::Start(pos))?;
            } else {
                stream.read_exact(&mut data)?;
                data.truncate(data_size);
            }

            tags.push(Tag {
                code,
                datatype,
                endian,
                count,
                data,
            });
        }

        let ifd = Ifd(tags);
        let next_ifd_offset = variant.read_offset(endian, stream)?;

        Ok((ifd, next_ifd_offset))
    }

    pub fn get_tag_by_code(&self, code: u16) -> Option<&Tag> {
        let Self(tags) = &self;
        tags.iter().find(|tag| tag.code == code)
    }

    pub fn get_tag(&self, id: TagId) -> Result<&Tag, TiffError> {
        self.get_tag_by_code(id.into())
            .ok_or(TiffError::MissingTag(id))
    }

    pub fn get_tag_values<T: NumCast>(&self, id: TagId) -> Result<Vec<T>, TiffError> {
        self.get_tag(id)?.values().ok_or(TiffError::BadTag(id))
    }

    pub fn get_tag_value<T: NumCast + Copy>(&self, id: TagId) -> Result<T, TiffError> {
        self.get_tag(id)?.value().ok_or(TiffError::BadTag(id))
    }

    /// Insert or replace a tag, keeping entries sorted by code as TIFF requires.
    pub fn set_tag(&mut self, id: TagId, data: TagData, endian: Endian) {
        let code: u16 = id.into();
        let tag = Tag {
            code,
            datatype: data.tag_type(),
            count: data.len(),
            data: data.bytes(endian),
            endian,
        };
        let Self(tags) = self;
        match tags.binary_search_by_key(&code, |t| t.code) {
            Ok(index) => tags[index] = tag,
            Err(index) => tags.insert(index, tag),
        }
    }

    pub fn tags(&self) -> &[Tag] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_tag_keeps_codes_sorted() {
        let mut ifd = Ifd::new();
        let endian = Endian::Little;
        ifd.set_tag(TagId::GeoKeyDirectory, TagData::Short(vec![1, 1, 0, 0]), endian);
        ifd.set_tag(TagId::ImageWidth, TagData::from_long(10), endian);
        ifd.set_tag(TagId::Compression, TagData::from_short(1), endian);
        ifd.set_tag(TagId::ImageWidth, TagData::from_long(20), endian);

        let codes: Vec<u16> = ifd.tags().iter().map(|t| t.code).collect();
        assert_eq!(codes, vec![0x0100, 0x0103, 0x87AF]);
        assert_eq!(ifd.get_tag_value::<u32>(TagId::ImageWidth).unwrap(), 20);
    }
}
