//! Reader for Tomb Raider 1 level files (`.PHD`).
//!
//! [`read_level`] turns the raw file bytes into a [`tr1::Level`]: texture
//! atlases, room geometry and the colour palette. Sections the renderer has
//! no use for (meshes, animations, entities, pathfinding boxes and so on) are
//! decoded only far enough to step over them.

pub mod cursor;
pub mod tr1;

use cursor::{ByteCursor, Underrun};
use thiserror::Error;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
	#[error("unsupported version tag: {0}")]
	UnsupportedVersion(u32),
	#[error("truncated {record} record at offset {offset}: need {needed} bytes, {available} remain")]
	TruncatedRecord {
		record: &'static str,
		offset: usize,
		needed: usize,
		available: usize,
	},
	#[error("room {room} truncated in {section} at offset {offset}: need {needed} bytes, {available} remain")]
	TruncatedRoom {
		room: usize,
		section: &'static str,
		offset: usize,
		needed: usize,
		available: usize,
	},
	#[error("level truncated in {section} at offset {offset}: need {needed} bytes, {available} remain")]
	TruncatedLevel {
		section: &'static str,
		offset: usize,
		needed: usize,
		available: usize,
	},
	#[error("palette index {index} out of range, palette has {len} entries")]
	PaletteIndexOutOfRange {
		index: u8,
		len: usize,
	},
	#[error("read of {needed} bytes at offset {offset} out of bounds, {available} remain")]
	OutOfBounds {
		offset: usize,
		needed: usize,
		available: usize,
	},
}

impl From<Underrun> for Error {
	fn from(underrun: Underrun) -> Self {
		let Underrun { offset, needed, available } = underrun;
		Error::OutOfBounds { offset, needed, available }
	}
}

impl Error {
	pub(crate) fn room(room: usize, section: &'static str) -> impl FnOnce(Underrun) -> Error {
		move |Underrun { offset, needed, available }| Error::TruncatedRoom { room, section, offset, needed, available }
	}

	pub(crate) fn level(section: &'static str) -> impl FnOnce(Underrun) -> Error {
		move |Underrun { offset, needed, available }| Error::TruncatedLevel { section, offset, needed, available }
	}
}

/// Closed set of recognized format versions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Version {
	Tr1,
}

impl Version {
	pub fn from_tag(tag: u32) -> Option<Self> {
		match tag {
			tr1::VERSION_TAG => Some(Version::Tr1),
			_ => None,
		}
	}

	pub fn tag(self) -> u32 {
		match self {
			Version::Tr1 => tr1::VERSION_TAG,
		}
	}

	pub fn name(self) -> &'static str {
		match self {
			Version::Tr1 => "Tomb Raider 1",
		}
	}
}

/// A fixed-width record decoded from the byte stream.
pub(crate) trait Readable: Sized {
	const SIZE: usize;
	const NAME: &'static str;

	fn read(cursor: &mut ByteCursor) -> Result<Self, Underrun>;
}

pub(crate) fn read_record<T: Readable>(cursor: &mut ByteCursor) -> Result<T, Error> {
	T::read(cursor).map_err(|Underrun { offset, needed, available }| Error::TruncatedRecord {
		record: T::NAME,
		offset,
		needed,
		available,
	})
}

pub(crate) fn read_boxed_slice<T: Readable>(cursor: &mut ByteCursor, len: usize) -> Result<Box<[T]>, Error> {
	if cursor.remaining() < len * T::SIZE {
		return Err(Error::TruncatedRecord {
			record: T::NAME,
			offset: cursor.pos(),
			needed: len * T::SIZE,
			available: cursor.remaining(),
		});
	}
	let mut vec = Vec::with_capacity(len);
	for _ in 0..len {
		vec.push(read_record(cursor)?);
	}
	Ok(vec.into_boxed_slice())
}

/// Read a level from the full file bytes, dispatching on the version tag at
/// offset 0. Decoding never reads past the end of `buf` and never returns a
/// partially populated level.
pub fn read_level(buf: &[u8]) -> Result<tr1::Level, Error> {
	let tag = ByteCursor::new(buf).u32().map_err(Error::level("version tag"))?;
	match Version::from_tag(tag) {
		Some(version) => {
			log::debug!("version tag {}: {}", tag, version.name());
			match version {
				Version::Tr1 => tr1::read_level(buf),
			}
		},
		None => Err(Error::UnsupportedVersion(tag)),
	}
}
