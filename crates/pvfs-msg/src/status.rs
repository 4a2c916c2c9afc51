//! Reply status codes and the error-class taxonomy that the RPC and state
//! machine layers use to decide whether to retry.
//!
//! Reference: spec.md §7 "Error Handling Design" — Transient / Permission /
//! Namespace / Structural / Resource / Partial.

use std::io::{Read, Seek, Write};

use binrw::{BinRead, BinWrite};

/// Wire status code. `Other` preserves an unrecognized negative errno-style
/// value from a server running a newer revision (or a filesystem-specific
/// kind, spec.md §6 "plus filesystem-specific kinds") rather than failing
/// the decode outright.
///
/// Not `#[binrw]`-derived: a `#[brw(repr = i32)]` enum has no catch-all
/// arm, so an unlisted code would abort decoding instead of round-tripping
/// through `Other`. [`BinRead`]/[`BinWrite`] are implemented by hand below,
/// the same way [`crate::wire_util::WireString`] wraps a primitive with
/// custom framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Success,
    ENOENT,
    EIO,
    ENOMEM,
    EACCES,
    EEXIST,
    ENOTDIR,
    EINVAL,
    ENAMETOOLONG,
    ENOSYS,
    ELOOP,
    EMSGSIZE,
    EOVERFLOW,
    EALREADY,
    ESECURITY,
    /// An errno-style code outside the set this crate names explicitly.
    Other(i32),
}

impl StatusCode {
    fn to_i32(self) -> i32 {
        use StatusCode::*;
        match self {
            Success => 0,
            ENOENT => -2,
            EIO => -5,
            ENOMEM => -12,
            EACCES => -13,
            EEXIST => -17,
            ENOTDIR => -20,
            EINVAL => -22,
            ENAMETOOLONG => -36,
            ENOSYS => -38,
            ELOOP => -40,
            EOVERFLOW => -75,
            EMSGSIZE => -90,
            EALREADY => -114,
            ESECURITY => -200,
            Other(v) => v,
        }
    }

    fn from_i32(v: i32) -> Self {
        use StatusCode::*;
        match v {
            0 => Success,
            -2 => ENOENT,
            -5 => EIO,
            -12 => ENOMEM,
            -13 => EACCES,
            -17 => EEXIST,
            -20 => ENOTDIR,
            -22 => EINVAL,
            -36 => ENAMETOOLONG,
            -38 => ENOSYS,
            -40 => ELOOP,
            -75 => EOVERFLOW,
            -90 => EMSGSIZE,
            -114 => EALREADY,
            -200 => ESECURITY,
            other => Other(other),
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, StatusCode::Success)
    }

    /// Classifies a status into the retry-relevant taxonomy of spec.md §7.
    /// `Success` classifies as `None` — callers should check
    /// [`StatusCode::is_success`] before calling this if they only care
    /// about the failure path. An unrecognized [`StatusCode::Other`] code
    /// is treated as `Structural` — its meaning is unknown, so retrying it
    /// verbatim is assumed unsafe rather than assumed transient.
    pub fn classify(self) -> TransientKind {
        use StatusCode::*;
        match self {
            Success => TransientKind::None,
            EIO | ENOMEM | EMSGSIZE => TransientKind::Transient,
            EACCES | ESECURITY => TransientKind::Permission,
            ENOENT | EEXIST | ENOTDIR | ELOOP | ENAMETOOLONG => TransientKind::Namespace,
            EINVAL | ENOSYS | Other(_) => TransientKind::Structural,
            EOVERFLOW => TransientKind::Resource,
            EALREADY => TransientKind::Partial,
        }
    }
}

impl BinRead for StatusCode {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: binrw::Endian,
        _args: Self::Args<'_>,
    ) -> binrw::BinResult<Self> {
        let v = i32::read_options(reader, endian, ())?;
        Ok(StatusCode::from_i32(v))
    }
}

impl BinWrite for StatusCode {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        endian: binrw::Endian,
        _args: Self::Args<'_>,
    ) -> binrw::BinResult<()> {
        self.to_i32().write_options(writer, endian, ())
    }
}

/// Error-class taxonomy a retry policy or a state machine error path
/// branches on, per spec.md §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransientKind {
    /// Not an error.
    None,
    /// Worth retrying with backoff (`EIO`, `ENOMEM`, `EMSGSIZE`).
    Transient,
    /// Retrying will not help; surface to the caller (`EACCES`, `ESECURITY`).
    Permission,
    /// The namespace state the operation assumed no longer holds
    /// (`ENOENT`, `EEXIST`, `ENOTDIR`, `ELOOP`, `ENAMETOOLONG`).
    Namespace,
    /// The request itself was malformed; retrying verbatim will fail the
    /// same way (`EINVAL`, `ENOSYS`).
    Structural,
    /// A capacity limit was hit (`EOVERFLOW`).
    Resource,
    /// The operation partially completed and must be reconciled rather than
    /// blindly retried (`EALREADY`, used by rename's insert-then-remove
    /// step — spec.md §4.5.4 "Rename").
    Partial,
}

/// Infallible: any code this crate doesn't name explicitly round-trips
/// through [`StatusCode::Other`] instead of failing.
impl From<i32> for StatusCode {
    fn from(v: i32) -> Self {
        StatusCode::from_i32(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_groups_match_spec_taxonomy() {
        assert_eq!(StatusCode::EIO.classify(), TransientKind::Transient);
        assert_eq!(StatusCode::EACCES.classify(), TransientKind::Permission);
        assert_eq!(StatusCode::ENOENT.classify(), TransientKind::Namespace);
        assert_eq!(StatusCode::EINVAL.classify(), TransientKind::Structural);
        assert_eq!(StatusCode::EOVERFLOW.classify(), TransientKind::Resource);
        assert_eq!(StatusCode::EALREADY.classify(), TransientKind::Partial);
        assert_eq!(StatusCode::Success.classify(), TransientKind::None);
    }

    #[test]
    fn from_i32_round_trips_known_codes() {
        assert_eq!(StatusCode::from(-2), StatusCode::ENOENT);
        assert_eq!(StatusCode::ENOENT.to_i32(), -2);
    }

    #[test]
    fn from_i32_preserves_unrecognized_codes_as_other() {
        assert_eq!(StatusCode::from(-1), StatusCode::Other(-1));
        assert_eq!(StatusCode::Other(-1).to_i32(), -1);
        assert!(!StatusCode::Other(-1).is_success());
        assert_eq!(StatusCode::Other(-1).classify(), TransientKind::Structural);
    }

    #[test]
    fn binrw_round_trips_other() {
        use binrw::io::Cursor;
        let mut buf = Cursor::new(Vec::new());
        StatusCode::Other(-4242).write_le(&mut buf).unwrap();
        buf.set_position(0);
        assert_eq!(StatusCode::read_le(&mut buf).unwrap(), StatusCode::Other(-4242));
    }
}
