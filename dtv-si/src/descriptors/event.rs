//! Event description descriptors carried in EIT entries.

use crate::cursor::Cursor;
use crate::error::SiError;
use crate::text::{decode_text, DvbString};

/// Short event descriptor (0x4D).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShortEventDescriptor {
    /// Three-letter language code.
    pub language: String,
    pub name: DvbString,
    pub text: DvbString,
}

impl ShortEventDescriptor {
    pub fn parse(data: &[u8]) -> Result<Self, SiError> {
        let mut c = Cursor::new(data);
        let lang = c.read_fixed(3)?;
        let language = String::from_utf8_lossy(lang).into_owned();
        let name_len = c.read_u8()? as usize;
        let name = decode_text(c.read_fixed(name_len)?);
        let text_len = c.read_u8()? as usize;
        let text = decode_text(c.read_fixed(text_len)?);
        Ok(ShortEventDescriptor {
            language,
            name,
            text,
        })
    }
}

/// One item of an extended event descriptor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtendedEventItem {
    pub description: DvbString,
    pub item: DvbString,
}

/// Extended event descriptor (0x4E).
///
/// Long event texts span several of these; `descriptor_number` and
/// `last_descriptor_number` order the fragments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtendedEventDescriptor {
    pub descriptor_number: u8,
    pub last_descriptor_number: u8,
    /// Three-letter language code.
    pub language: String,
    pub items: Vec<ExtendedEventItem>,
    pub text: DvbString,
}

impl ExtendedEventDescriptor {
    pub fn parse(data: &[u8]) -> Result<Self, SiError> {
        let mut c = Cursor::new(data);
        let numbers = c.read_u8()?;
        let lang = c.read_fixed(3)?;
        let language = String::from_utf8_lossy(lang).into_owned();

        let items_len = c.read_u8()? as usize;
        let mut items_cursor = c.take_declared(items_len)?;
        let mut items = Vec::new();
        while !items_cursor.is_empty() {
            let desc_len = items_cursor.read_u8()? as usize;
            let description = decode_text(items_cursor.read_fixed(desc_len)?);
            let item_len = items_cursor.read_u8()? as usize;
            let item = decode_text(items_cursor.read_fixed(item_len)?);
            items.push(ExtendedEventItem { description, item });
        }

        let text_len = c.read_u8()? as usize;
        let text = decode_text(c.read_fixed(text_len)?);

        Ok(ExtendedEventDescriptor {
            descriptor_number: numbers >> 4,
            last_descriptor_number: numbers & 0x0F,
            language,
            items,
            text,
        })
    }
}
