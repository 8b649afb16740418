//! Minimal class-file decoder.
//!
//! Packaging only needs two facts about a compiled class: its internal name
//! and whether it declares `public static void main(String[])`. The decoder
//! reads the constant pool and method table for those and keeps the raw
//! bytes; hooks may swap the bytes wholesale, and whatever the class holds
//! after the hooks ran is what lands in the archive member.

use crate::error::ClassError;

const MAGIC: u32 = 0xCAFE_BABE;
const ACC_PUBLIC: u16 = 0x0001;
const ACC_STATIC: u16 = 0x0008;
const MAIN_DESCRIPTOR: &str = "([Ljava/lang/String;)V";

/// A decoded class file.
#[derive(Debug, Clone)]
pub struct ClassFile {
    name: String,
    has_main: bool,
    bytes: Vec<u8>,
}

impl ClassFile {
    /// Decode raw class-file bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self, ClassError> {
        let mut reader = Reader { buf: bytes, pos: 0 };

        let magic = reader.u32()?;
        if magic != MAGIC {
            return Err(ClassError::BadMagic(magic));
        }
        reader.skip(4)?; // minor, major

        let cp_count = reader.u16()?;
        let mut utf8: Vec<Option<String>> = vec![None; cp_count as usize];
        let mut classes: Vec<Option<u16>> = vec![None; cp_count as usize];

        let mut index = 1u16;
        while index < cp_count {
            let tag = reader.u8()?;
            match tag {
                1 => {
                    let len = reader.u16()? as usize;
                    let raw = reader.bytes(len)?;
                    utf8[index as usize] = Some(String::from_utf8_lossy(raw).into_owned());
                }
                7 => classes[index as usize] = Some(reader.u16()?),
                8 | 16 | 19 | 20 => reader.skip(2)?,
                15 => reader.skip(3)?,
                3 | 4 | 9 | 10 | 11 | 12 | 17 | 18 => reader.skip(4)?,
                // 8-byte constants occupy two constant pool slots
                5 | 6 => {
                    reader.skip(8)?;
                    index += 1;
                }
                other => return Err(ClassError::UnknownTag(other)),
            }
            index += 1;
        }

        reader.skip(2)?; // access flags
        let this_class = reader.u16()?;
        reader.skip(2)?; // super class

        let interfaces = reader.u16()?;
        reader.skip(interfaces as usize * 2)?;

        let fields = reader.u16()?;
        for _ in 0..fields {
            reader.skip(6)?;
            reader.skip_attributes()?;
        }

        let lookup_utf8 = |idx: u16| -> Result<&str, ClassError> {
            utf8.get(idx as usize)
                .and_then(|s| s.as_deref())
                .ok_or(ClassError::BadIndex(idx))
        };

        let mut has_main = false;
        let methods = reader.u16()?;
        for _ in 0..methods {
            let access = reader.u16()?;
            let name_index = reader.u16()?;
            let descriptor_index = reader.u16()?;
            reader.skip_attributes()?;

            if access & (ACC_PUBLIC | ACC_STATIC) == (ACC_PUBLIC | ACC_STATIC)
                && lookup_utf8(name_index)? == "main"
                && lookup_utf8(descriptor_index)? == MAIN_DESCRIPTOR
            {
                has_main = true;
            }
        }

        let name_index = classes
            .get(this_class as usize)
            .and_then(|c| *c)
            .ok_or(ClassError::BadIndex(this_class))?;
        let name = lookup_utf8(name_index)?.to_string();

        Ok(Self {
            name,
            has_main,
            bytes: bytes.to_vec(),
        })
    }

    /// Internal class name, e.g. `com/example/App`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when the class declares `public static void main(String[])`.
    pub fn has_main_method(&self) -> bool {
        self.has_main
    }

    /// Replace the class bytes. The next serialization returns these.
    pub fn set_bytes(&mut self, bytes: Vec<u8>) {
        self.bytes = bytes;
    }

    /// Serialize the (possibly mutated) class back to bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn bytes(&mut self, len: usize) -> Result<&'a [u8], ClassError> {
        let end = self.pos.checked_add(len).ok_or(ClassError::Truncated)?;
        if end > self.buf.len() {
            return Err(ClassError::Truncated);
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, len: usize) -> Result<(), ClassError> {
        self.bytes(len).map(|_| ())
    }

    fn u8(&mut self) -> Result<u8, ClassError> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, ClassError> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, ClassError> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn skip_attributes(&mut self) -> Result<(), ClassError> {
        let count = self.u16()?;
        for _ in 0..count {
            self.skip(2)?; // attribute name index
            let len = self.u32()? as usize;
            self.skip(len)?;
        }
        Ok(())
    }
}

/// Build the bytes of a minimal, decodable class file. Test fixture.
#[cfg(test)]
pub(crate) fn synthesize(name: &str, with_main: bool) -> Vec<u8> {
    fn utf8(s: &str) -> Vec<u8> {
        let mut v = vec![1u8];
        v.extend((s.len() as u16).to_be_bytes());
        v.extend(s.as_bytes());
        v
    }
    fn class(index: u16) -> Vec<u8> {
        let mut v = vec![7u8];
        v.extend(index.to_be_bytes());
        v
    }

    // Pool: 1 Utf8 name, 2 Class->1, 3 Utf8 super, 4 Class->3,
    //       5 Utf8 "main", 6 Utf8 descriptor
    let pool = [
        utf8(name),
        class(1),
        utf8("java/lang/Object"),
        class(3),
        utf8("main"),
        utf8(MAIN_DESCRIPTOR),
    ];

    let mut out = Vec::new();
    out.extend(MAGIC.to_be_bytes());
    out.extend(0u16.to_be_bytes()); // minor
    out.extend(52u16.to_be_bytes()); // major (Java 8)
    out.extend((pool.len() as u16 + 1).to_be_bytes());
    for entry in &pool {
        out.extend(entry);
    }
    out.extend(0x0021u16.to_be_bytes()); // ACC_PUBLIC | ACC_SUPER
    out.extend(2u16.to_be_bytes()); // this_class
    out.extend(4u16.to_be_bytes()); // super_class
    out.extend(0u16.to_be_bytes()); // interfaces
    out.extend(0u16.to_be_bytes()); // fields
    if with_main {
        out.extend(1u16.to_be_bytes());
        out.extend((ACC_PUBLIC | ACC_STATIC).to_be_bytes());
        out.extend(5u16.to_be_bytes()); // name: "main"
        out.extend(6u16.to_be_bytes()); // descriptor
        out.extend(0u16.to_be_bytes()); // attributes
    } else {
        out.extend(0u16.to_be_bytes());
    }
    out.extend(0u16.to_be_bytes()); // class attributes
    out
}
