//! Bounds-checked access to guest linear memory
//!
//! Guest memory is a plain byte span owned by the guest. Every helper here
//! takes the span by reference and validates `offset + len` before touching
//! it, so a bad pointer returned by the guest becomes an error instead of a
//! panic.

use crate::error::{Result, SpecError};

/// Resolve `offset..offset + len` against a span of `size` bytes
#[inline]
fn range(offset: u32, len: usize, size: usize) -> Result<std::ops::Range<usize>> {
    let start = offset as usize;
    match start.checked_add(len) {
        Some(end) if end <= size => Ok(start..end),
        _ => Err(SpecError::OutOfBounds {
            offset: start,
            len,
            size,
        }),
    }
}

/// Borrow `len` bytes at `offset`
pub fn slice(mem: &[u8], offset: u32, len: usize) -> Result<&[u8]> {
    let r = range(offset, len, mem.len())?;
    Ok(&mem[r])
}

/// Mutably borrow `len` bytes at `offset`
pub fn slice_mut(mem: &mut [u8], offset: u32, len: usize) -> Result<&mut [u8]> {
    let r = range(offset, len, mem.len())?;
    Ok(&mut mem[r])
}

/// Read a little-endian u32 at `offset`
pub fn read_u32(mem: &[u8], offset: u32) -> Result<u32> {
    let bytes = slice(mem, offset, 4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Write a little-endian u32 at `offset`
pub fn write_u32(mem: &mut [u8], offset: u32, value: u32) -> Result<()> {
    slice_mut(mem, offset, 4)?.copy_from_slice(&value.to_le_bytes());
    Ok(())
}

/// Read a NUL-terminated string starting at `offset`
///
/// Invalid UTF-8 is replaced lossily. A missing terminator is an error.
pub fn read_c_str(mem: &[u8], offset: u32) -> Result<String> {
    let start = offset as usize;
    let tail = mem.get(start..).ok_or(SpecError::OutOfBounds {
        offset: start,
        len: 1,
        size: mem.len(),
    })?;
    let end = tail
        .iter()
        .position(|&b| b == 0)
        .ok_or(SpecError::OutOfBounds {
            offset: start,
            len: tail.len() + 1,
            size: mem.len(),
        })?;
    Ok(String::from_utf8_lossy(&tail[..end]).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u32_roundtrip() {
        let mut mem = vec![0u8; 16];
        write_u32(&mut mem, 4, 0xDEAD_BEEF).unwrap();
        assert_eq!(&mem[4..8], &[0xEF, 0xBE, 0xAD, 0xDE]);
        assert_eq!(read_u32(&mem, 4).unwrap(), 0xDEAD_BEEF);
    }

    #[test]
    fn test_read_past_end() {
        let mem = vec![0u8; 8];
        assert!(read_u32(&mem, 4).is_ok());
        assert!(matches!(
            read_u32(&mem, 5),
            Err(SpecError::OutOfBounds { offset: 5, len: 4, size: 8 })
        ));
        assert!(slice(&mem, u32::MAX, 4).is_err());
    }

    #[test]
    fn test_write_past_end_leaves_memory_untouched() {
        let mut mem = vec![0u8; 6];
        assert!(write_u32(&mut mem, 3, 0xFFFF_FFFF).is_err());
        assert!(mem.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_read_c_str() {
        let mut mem = b"xxhello\0world".to_vec();
        assert_eq!(read_c_str(&mem, 2).unwrap(), "hello");
        assert_eq!(read_c_str(&mem, 7).unwrap(), "");

        // No terminator after "world"
        assert!(read_c_str(&mem, 8).is_err());
        assert!(read_c_str(&mem, 100).is_err());

        mem[2] = 0xFF;
        assert_eq!(read_c_str(&mem, 2).unwrap(), "\u{FFFD}ello");
    }
}
