//! Class file header reader
//!
//! Reads just enough of a class file (constant pool, `this_class`,
//! `super_class`) to name the class a compiled file holds.

use crate::bytes::CLASS_MAGIC;
use crate::class_name::{ClassName, ClassNameError};

/// Errors reading a class file header
#[derive(Debug, thiserror::Error)]
pub enum ClassFileError {
    #[error("unexpected end of class file")]
    UnexpectedEof,
    #[error("invalid class file magic header")]
    InvalidMagic,
    #[error("unsupported constant pool tag {tag}")]
    UnsupportedConstant { tag: u8 },
    #[error("invalid constant pool index {index}")]
    InvalidConstantIndex { index: u16 },
    #[error("invalid UTF-8 string in constant pool: {0}")]
    Utf8Decode(#[from] std::string::FromUtf8Error),
    #[error("invalid class name in constant pool: {0}")]
    ClassName(#[from] ClassNameError),
}

/// Identity of a compiled class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassHeader {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: u16,
    pub name: ClassName,
    /// `None` only for `java.lang.Object` and module-info
    pub super_name: Option<ClassName>,
}

/// Parse the class header from raw class file bytes
///
/// # Errors
/// Returns error if the bytes are truncated or not a class file
pub fn read_header(bytes: &[u8]) -> Result<ClassHeader, ClassFileError> {
    let mut reader = ClassReader::new(bytes);
    if reader.read_slice(4)? != CLASS_MAGIC {
        return Err(ClassFileError::InvalidMagic);
    }
    let minor_version = reader.read_u2()?;
    let major_version = reader.read_u2()?;
    let pool = ConstantPool::parse(&mut reader)?;

    let access_flags = reader.read_u2()?;
    let this_class = reader.read_u2()?;
    let super_class = reader.read_u2()?;

    let name = ClassName::from_path(pool.class_name(this_class)?)?;
    let super_name = if super_class == 0 {
        None
    } else {
        Some(ClassName::from_path(pool.class_name(super_class)?)?)
    };

    Ok(ClassHeader {
        minor_version,
        major_version,
        access_flags,
        name,
        super_name,
    })
}

#[derive(Debug, Clone)]
enum Constant {
    Utf8(String),
    Class { name_index: u16 },
    Other,
    Unusable,
}

struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    fn parse(reader: &mut ClassReader<'_>) -> Result<Self, ClassFileError> {
        let count = reader.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count);
        entries.push(Constant::Unusable); // index 0 unused

        let mut index = 1;
        while index < count {
            let tag = reader.read_u1()?;
            let entry = match tag {
                1 => {
                    let length = reader.read_u2()? as usize;
                    let bytes = reader.read_slice(length)?;
                    Constant::Utf8(String::from_utf8(bytes.to_vec())?)
                }
                7 => Constant::Class {
                    name_index: reader.read_u2()?,
                },
                // Long and Double take two slots
                5 | 6 => {
                    reader.skip(8)?;
                    entries.push(Constant::Other);
                    index += 1;
                    Constant::Unusable
                }
                3 | 4 | 9 | 10 | 11 | 12 | 17 | 18 => {
                    reader.skip(4)?;
                    Constant::Other
                }
                8 | 16 | 19 | 20 => {
                    reader.skip(2)?;
                    Constant::Other
                }
                15 => {
                    reader.skip(3)?;
                    Constant::Other
                }
                other => return Err(ClassFileError::UnsupportedConstant { tag: other }),
            };
            entries.push(entry);
            index += 1;
        }

        Ok(Self { entries })
    }

    fn utf8(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.entries.get(index as usize) {
            Some(Constant::Utf8(value)) => Ok(value),
            _ => Err(ClassFileError::InvalidConstantIndex { index }),
        }
    }

    fn class_name(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.entries.get(index as usize) {
            Some(Constant::Class { name_index }) => self.utf8(*name_index),
            _ => Err(ClassFileError::InvalidConstantIndex { index }),
        }
    }
}

struct ClassReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ClassReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], ClassFileError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(ClassFileError::UnexpectedEof)?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn skip(&mut self, len: usize) -> Result<(), ClassFileError> {
        self.read_slice(len).map(|_| ())
    }

    fn read_u1(&mut self) -> Result<u8, ClassFileError> {
        Ok(self.read_slice(1)?[0])
    }

    fn read_u2(&mut self) -> Result<u16, ClassFileError> {
        let slice = self.read_slice(2)?;
        Ok(u16::from_be_bytes([slice[0], slice[1]]))
    }
}
