//! Small binrw helper wrappers for variable-length fields.
//!
//! Grounded in `smb-dtyp/src/binrw_util` (`boolean.rs`, `multi_sz.rs`) —
//! PVFS framing is length-prefixed and sequential rather than
//! offset-indirected, so these wrappers are simpler than the teacher's
//! `PosMarker`-based ones.

use binrw::{BinRead, BinWrite};
use std::io::{Read, Seek, Write};

/// A `u32`-length-prefixed UTF-8 string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireString(pub String);

impl From<String> for WireString {
    fn from(s: String) -> Self {
        WireString(s)
    }
}
impl From<&str> for WireString {
    fn from(s: &str) -> Self {
        WireString(s.to_string())
    }
}
impl std::ops::Deref for WireString {
    type Target = String;
    fn deref(&self) -> &String {
        &self.0
    }
}

impl BinRead for WireString {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: binrw::Endian,
        _args: Self::Args<'_>,
    ) -> binrw::BinResult<Self> {
        let len = u32::read_options(reader, endian, ())?;
        let mut buf = vec![0u8; len as usize];
        reader.read_exact(&mut buf).map_err(|e| binrw::Error::Io(e))?;
        let s = String::from_utf8(buf).map_err(|e| binrw::Error::Custom {
            pos: 0,
            err: Box::new(e),
        })?;
        Ok(WireString(s))
    }
}

impl BinWrite for WireString {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        endian: binrw::Endian,
        _args: Self::Args<'_>,
    ) -> binrw::BinResult<()> {
        let bytes = self.0.as_bytes();
        (bytes.len() as u32).write_options(writer, endian, ())?;
        writer.write_all(bytes).map_err(binrw::Error::Io)?;
        Ok(())
    }
}

/// A `u32`-length-prefixed vector of fixed-size binrw elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireVec<T>(pub Vec<T>);

impl<T> From<Vec<T>> for WireVec<T> {
    fn from(v: Vec<T>) -> Self {
        WireVec(v)
    }
}
impl<T> std::ops::Deref for WireVec<T> {
    type Target = Vec<T>;
    fn deref(&self) -> &Vec<T> {
        &self.0
    }
}

impl<T> BinRead for WireVec<T>
where
    T: for<'a> BinRead<Args<'a> = ()>,
{
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: binrw::Endian,
        _args: Self::Args<'_>,
    ) -> binrw::BinResult<Self> {
        let count = u32::read_options(reader, endian, ())?;
        let mut items = Vec::with_capacity(count as usize);
        for _ in 0..count {
            items.push(T::read_options(reader, endian, ())?);
        }
        Ok(WireVec(items))
    }
}

impl<T> BinWrite for WireVec<T>
where
    T: for<'a> BinWrite<Args<'a> = ()>,
{
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        endian: binrw::Endian,
        _args: Self::Args<'_>,
    ) -> binrw::BinResult<()> {
        (self.0.len() as u32).write_options(writer, endian, ())?;
        for item in &self.0 {
            item.write_options(writer, endian, ())?;
        }
        Ok(())
    }
}

/// A `u32`-length-prefixed byte blob — used for raw payload bytes (e.g.
/// small-IO piggybacked data) where no further structure applies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireBytes(pub Vec<u8>);

impl BinRead for WireBytes {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: binrw::Endian,
        _args: Self::Args<'_>,
    ) -> binrw::BinResult<Self> {
        let len = u32::read_options(reader, endian, ())?;
        let mut buf = vec![0u8; len as usize];
        reader.read_exact(&mut buf).map_err(binrw::Error::Io)?;
        Ok(WireBytes(buf))
    }
}

impl BinWrite for WireBytes {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        endian: binrw::Endian,
        _args: Self::Args<'_>,
    ) -> binrw::BinResult<()> {
        (self.0.len() as u32).write_options(writer, endian, ())?;
        writer.write_all(&self.0).map_err(binrw::Error::Io)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binrw::io::Cursor;
    use binrw::{BinRead, BinWrite};

    #[test]
    fn wire_string_round_trips() {
        let s = WireString::from("hello/world");
        let mut buf = Cursor::new(Vec::new());
        s.write_le(&mut buf).unwrap();
        buf.set_position(0);
        let back = WireString::read_le(&mut buf).unwrap();
        assert_eq!(s, back);
    }

    #[test]
    fn wire_vec_round_trips_u64() {
        let v = WireVec::from(vec![1u64, 2, 3, 4]);
        let mut buf = Cursor::new(Vec::new());
        v.write_le(&mut buf).unwrap();
        buf.set_position(0);
        let back: WireVec<u64> = WireVec::read_le(&mut buf).unwrap();
        assert_eq!(v, back);
    }
}
