use byteorder::{ByteOrder, LE};

/// A failed read: `needed` bytes at `offset` with only `available` left.
#[derive(Clone, Copy, Debug)]
pub struct Underrun {
	pub offset: usize,
	pub needed: usize,
	pub available: usize,
}

pub type ReadResult<T> = Result<T, Underrun>;

/// Forward-only cursor over the level file bytes.
/// All multi-byte reads are little-endian.
pub struct ByteCursor<'a> {
	buf: &'a [u8],
	pos: usize,
}

impl<'a> ByteCursor<'a> {
	pub fn new(buf: &'a [u8]) -> Self {
		Self {
			buf,
			pos: 0,
		}
	}

	pub fn pos(&self) -> usize {
		self.pos
	}

	pub fn remaining(&self) -> usize {
		self.buf.len() - self.pos
	}

	fn underrun(&self, needed: usize) -> Underrun {
		Underrun {
			offset: self.pos,
			needed,
			available: self.remaining(),
		}
	}

	pub fn slice(&mut self, len: usize) -> ReadResult<&'a [u8]> {
		if self.remaining() < len {
			return Err(self.underrun(len));
		}
		let start = self.pos;
		self.pos += len;
		Ok(&self.buf[start..self.pos])
	}

	pub fn skip(&mut self, len: usize) -> ReadResult<()> {
		self.slice(len).map(drop)
	}

	/// Set the absolute position. Used for sections whose declared size is
	/// authoritative regardless of how many bytes were actually parsed.
	pub fn seek_to(&mut self, pos: usize) -> ReadResult<()> {
		if pos > self.buf.len() {
			return Err(self.underrun(pos - self.pos));
		}
		self.pos = pos;
		Ok(())
	}

	pub fn u8(&mut self) -> ReadResult<u8> {
		Ok(self.slice(1)?[0])
	}

	pub fn u16(&mut self) -> ReadResult<u16> {
		Ok(LE::read_u16(self.slice(2)?))
	}

	pub fn i16(&mut self) -> ReadResult<i16> {
		Ok(LE::read_i16(self.slice(2)?))
	}

	pub fn u32(&mut self) -> ReadResult<u32> {
		Ok(LE::read_u32(self.slice(4)?))
	}

	pub fn i32(&mut self) -> ReadResult<i32> {
		Ok(LE::read_i32(self.slice(4)?))
	}
}
