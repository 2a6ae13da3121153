// https://docs.ogc.org/is/19-008r4/19-008r4.html#_requirements_class_geokeydirectorytag

use std::fmt::Display;

use super::{GeoKeyId, GeoKeyValue, GeoTiffError};
use crate::tiff::{Endian, Ifd, TagData, TagId, TagType};

#[derive(Clone, Debug, PartialEq)]
pub struct GeoKeyDirectory {
    pub version: u16,
    pub revision: (u16, u16),
    pub keys: Vec<GeoKey>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeoKey {
    pub code: u16,
    pub value: GeoKeyValue,
}

impl GeoKey {
    pub fn id(&self) -> Option<GeoKeyId> {
        GeoKeyId::try_from(self.code).ok()
    }
}

impl Default for GeoKeyDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl GeoKeyDirectory {
    pub fn new() -> Self {
        Self {
            version: 1,
            revision: (1, 0),
            keys: vec![],
        }
    }

    pub fn parse(ifd: &Ifd) -> Result<Self, GeoTiffError> {
        // Directory is a tiff tag of shorts
        let directory_values: Vec<u16> = ifd
            .get_tag(TagId::GeoKeyDirectory)
            .map_err(|_| GeoTiffError::MissingTag(TagId::GeoKeyDirectory))?
            .values()
            .ok_or(GeoTiffError::BadTag(TagId::GeoKeyDirectory))?;

        if directory_values.len() < 4 {
            return Err(GeoTiffError::BadTag(TagId::GeoKeyDirectory));
        }

        // Directory header
        let version = directory_values[0];
        let revision = directory_values[1];
        let minor_revision = directory_values[2];
        let key_count = directory_values[3] as usize;

        if directory_values.len() < 4 + key_count * 4 {
            return Err(GeoTiffError::BadTag(TagId::GeoKeyDirectory));
        }

        let keys = (0..key_count)
            .map(|i| {
                let entry = &directory_values[(i + 1) * 4..(i + 2) * 4];
                let (code, location, count, offset) = (entry[0], entry[1], entry[2], entry[3]);

                let value = if location == 0 {
                    GeoKeyValue::Short(vec![offset])
                } else {
                    let range = offset as usize..(offset as usize + count as usize);
                    ifd.get_tag_by_code(location)
                        .and_then(|tag| match tag.datatype {
                            TagType::Ascii => tag.try_to_string().and_then(|s| {
                                s.get(range).map(|s| {
                                    GeoKeyValue::Ascii(
                                        s.trim_end_matches(['|', '\0']).to_string(),
                                    )
                                })
                            }),
                            TagType::Short => tag
                                .values::<u16>()
                                .and_then(|v| v.get(range).map(|v| GeoKeyValue::Short(v.to_vec()))),
                            TagType::Double => tag
                                .values::<f64>()
                                .and_then(|v| v.get(range).map(|v| GeoKeyValue::Double(v.to_vec()))),
                            _ => None,
                        })
                        .unwrap_or(GeoKeyValue::Undefined)
                };

                GeoKey { code, value }
            })
            .collect();

        Ok(Self {
            version,
            revision: (revision, minor_revision),
            keys,
        })
    }

    pub fn get(&self, id: GeoKeyId) -> Option<&GeoKeyValue> {
        let code: u16 = id.into();
        self.keys
            .iter()
            .find(|key| key.code == code)
            .map(|key| &key.value)
    }

    pub fn set(&mut self, id: GeoKeyId, value: GeoKeyValue) {
        let code: u16 = id.into();
        let key = GeoKey { code, value };
        match self.keys.binary_search_by_key(&code, |key| key.code) {
            Ok(index) => self.keys[index] = key,
            Err(index) => self.keys.insert(index, key),
        }
    }

    pub fn add_to_ifd(&self, ifd: &mut Ifd, endian: Endian) {
        let (key_directory, ascii_params, double_params) = self.unparse();
        ifd.set_tag(TagId::GeoKeyDirectory, TagData::Short(key_directory), endian);
        if !ascii_params.is_empty() {
            ifd.set_tag(
                TagId::GeoAsciiParams,
                TagData::from_string(&ascii_params),
                endian,
            );
        }
        if !double_params.is_empty() {
            ifd.set_tag(TagId::GeoDoubleParams, TagData::Double(double_params), endian);
        }
    }

    pub fn unparse(&self) -> (Vec<u16>, String, Vec<f64>) {
        let mut directory = vec![];
        let mut shorts: Vec<u16> = vec![];
        let mut asciis = String::new();
        let mut doubles = vec![];
        let dir_size = 4 * (self.keys.len() + 1) as u16;

        // Directory header
        directory.push(self.version);
        directory.push(self.revision.0);
        directory.push(self.revision.1);
        directory.push(self.keys.len() as u16);

        for key in &self.keys {
            directory.push(key.code);

            match &key.value {
                GeoKeyValue::Short(vec) => match vec.len() {
                    0 => directory.extend([0, 0, 0]),
                    1 => directory.extend([0, 1, vec[0]]),
                    n => {
                        directory.extend([
                            u16::from(TagId::GeoKeyDirectory),
                            n as u16,
                            dir_size + shorts.len() as u16,
                        ]);
                        shorts.extend(vec);
                    }
                },
                GeoKeyValue::Ascii(s) => {
                    // Each string is terminated by a pipe within GeoAsciiParams
                    directory.extend([
                        u16::from(TagId::GeoAsciiParams),
                        s.len() as u16 + 1,
                        asciis.len() as u16,
                    ]);
                    asciis.push_str(s);
                    asciis.push('|');
                }
                GeoKeyValue::Double(vec) => {
                    directory.extend([
                        u16::from(TagId::GeoDoubleParams),
                        vec.len() as u16,
                        doubles.len() as u16,
                    ]);
                    doubles.extend(vec);
                }
                GeoKeyValue::Undefined => directory.extend([0, 0, 0]),
            }
        }

        ([directory, shorts].concat(), asciis, doubles)
    }
}

impl Display for GeoKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id_string = match self.id() {
            Some(id) => format!("{id:?}"),
            None => format!("0x{:04X}", self.code),
        };
        write!(f, "{}: {}", id_string, self.value)
    }
}
