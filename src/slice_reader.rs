use crate::error::{Error, ErrorDetails, Result};

/// Bounds-checked cursor over a byte slice.
///
/// Unlike the [`std::io::Read`] implementation for `&[u8]`, this keeps
/// track of the location within the packet for more informative errors.
#[derive(Debug)]
pub struct SliceReader<'a> {
    slice: &'a [u8],
    location: usize,
}

impl<'a> SliceReader<'a> {
    /// Initializes a reader from any byte slice.
    pub fn new(slice: &'a [u8]) -> Self {
        Self { slice, location: 0 }
    }

    /// Creates a fixed `length` sub-reader at the current position, then
    /// advances this reader to the sub-reader's end position.
    pub fn new_sub_reader(&mut self, length: usize) -> Result<Self> {
        let location = self.location;
        Ok(Self {
            slice: self.read(length)?,
            location,
        })
    }

    /// Creates an [`Error`] using the contained location.
    pub fn make_error(&self, details: ErrorDetails) -> Error {
        Error::new(self.location, details)
    }

    /// Number of bytes remaining in the slice reader.
    pub fn remaining_len(&self) -> usize {
        self.slice.len()
    }

    /// Advance reader without extracting any data from the slice.
    pub fn skip(&mut self, length: usize) -> Result<()> {
        if length > self.slice.len() {
            Err(self.make_error(ErrorDetails::PacketOverrun(length)))
        } else {
            self.location += length;
            self.slice = &self.slice[length..];
            Ok(())
        }
    }

    /// Extract a fixed `length` sub-slice from this reader and advance.
    pub fn read(&mut self, length: usize) -> Result<&'a [u8]> {
        if length > self.slice.len() {
            Err(self.make_error(ErrorDetails::PacketOverrun(length)))
        } else {
            self.location += length;
            let (left, right) = self.slice.split_at(length);
            self.slice = right;
            Ok(left)
        }
    }

    /// Extract a sub-slice of all data remaining to be read.
    pub fn read_to_end(&mut self) -> Result<&'a [u8]> {
        self.read(self.slice.len())
    }

    /// Same as [`SliceReader::read`] but also converts the slice to an
    /// owned array of length `N`.
    pub fn read_array_ref<const N: usize>(&mut self) -> Result<[u8; N]> {
        let slice = self.read(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array_ref::<1>()?[0])
    }

    /// Extract a fixed `length` sub-slice from this reader without
    /// advancing.
    pub fn peek(&mut self, length: usize) -> Result<&'a [u8]> {
        if length > self.slice.len() {
            Err(self.make_error(ErrorDetails::PacketOverrun(length)))
        } else {
            Ok(&self.slice[0..length])
        }
    }

    /// Same as [`SliceReader::peek`] but also converts the slice to an
    /// owned array of length `N`.
    pub fn peek_array_ref<const N: usize>(&mut self) -> Result<[u8; N]> {
        let slice = self.peek(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }
}

/// Convenience macro to read a modular bitfield from a [`SliceReader`].
///
/// Wraps [`SliceReader::read_array_ref`] to read the exact number of bytes
/// required by the bitfield type.
#[macro_export]
macro_rules! read_bitfield {
    ($reader:expr, $type:ty) => {
        <$type>::from_bytes($reader.read_array_ref::<{ std::mem::size_of::<$type>() }>()?)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_fixed_arrays_and_advances() {
        let data = [1u8, 2, 3, 4, 5];
        let mut r = SliceReader::new(&data);
        assert_eq!(r.read_array_ref::<2>().unwrap(), [1, 2]);
        assert_eq!(r.remaining_len(), 3);
        assert_eq!(r.read_to_end().unwrap(), &[3, 4, 5]);
    }

    #[test]
    fn overrun_is_reported_with_location() {
        let data = [1u8, 2];
        let mut r = SliceReader::new(&data);
        r.skip(1).unwrap();
        let err = r.read(5).unwrap_err();
        assert_eq!(err.location, 1);
        assert!(matches!(err.details, ErrorDetails::PacketOverrun(5)));
    }

    #[test]
    fn peek_does_not_advance() {
        let data = [9u8, 8, 7];
        let mut r = SliceReader::new(&data);
        assert_eq!(r.peek(2).unwrap(), &[9, 8]);
        assert_eq!(r.remaining_len(), 3);
    }
}
