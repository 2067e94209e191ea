use bitfield::bitfield;
use glam::I16Vec3;
use log::{debug, trace};
use nonmax::NonMaxU16;
use crate::{cursor::{ByteCursor, Underrun}, read_boxed_slice, Error, Readable};

pub const VERSION_TAG: u32 = 32;
pub const ATLAS_SIDE_LEN: usize = 256;
pub const ATLAS_PIXELS: usize = ATLAS_SIDE_LEN * ATLAS_SIDE_LEN;
pub const PALETTE_LEN: usize = 256;
pub const LIGHT_MAP_LEN: usize = 32;

//model

/// 6 bits per channel. Multiply by 3 to approximate 8-bit colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color3 {
	pub r: u8,
	pub g: u8,
	pub b: u8,
}

impl Color3 {
	pub fn to_rgb8(self) -> [u8; 3] {
		[self.r.saturating_mul(3), self.g.saturating_mul(3), self.b.saturating_mul(3)]
	}
}

/// World-space placement bounds of a room.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoomInfo {
	/// World coord.
	pub x: i32,
	/// World coord.
	pub z: i32,
	pub y_bottom: i32,
	pub y_top: i32,
}

impl Readable for RoomInfo {
	const SIZE: usize = 16;
	const NAME: &'static str = "room info";

	fn read(cursor: &mut ByteCursor) -> Result<Self, Underrun> {
		Ok(RoomInfo {
			x: cursor.i32()?,
			z: cursor.i32()?,
			y_bottom: cursor.i32()?,
			y_top: cursor.i32()?,
		})
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoomVertex {
	/// Relative to room.
	pub pos: I16Vec3,
	pub light: u16,
}

impl Readable for RoomVertex {
	const SIZE: usize = 8;
	const NAME: &'static str = "room vertex";

	fn read(cursor: &mut ByteCursor) -> Result<Self, Underrun> {
		Ok(RoomVertex {
			pos: I16Vec3::new(cursor.i16()?, cursor.i16()?, cursor.i16()?),
			light: cursor.u16()?,
		})
	}
}

macro_rules! decl_face_type {
	($name:ident, $num_indices:literal, $record_name:literal) => {
		#[derive(Clone, Copy, Debug, PartialEq, Eq)]
		pub struct $name {
			/// Indices into `Room.vertices`.
			pub vertex_indices: [u16; $num_indices],
			pub object_texture_index: u16,
		}

		impl Readable for $name {
			const SIZE: usize = $num_indices * 2 + 2;
			const NAME: &'static str = $record_name;

			fn read(cursor: &mut ByteCursor) -> Result<Self, Underrun> {
				let mut vertex_indices = [0; $num_indices];
				for index in &mut vertex_indices {
					*index = cursor.u16()?;
				}
				Ok($name {
					vertex_indices,
					object_texture_index: cursor.u16()?,
				})
			}
		}
	};
}

decl_face_type!(RoomQuad, 4, "room quad");
decl_face_type!(RoomTri, 3, "room tri");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sprite {
	/// Index into `Room.vertices`.
	pub vertex_index: u16,
	/// Index into the level's sprite textures.
	pub sprite_texture_index: u16,
}

impl Readable for Sprite {
	const SIZE: usize = 4;
	const NAME: &'static str = "room sprite";

	fn read(cursor: &mut ByteCursor) -> Result<Self, Underrun> {
		Ok(Sprite {
			vertex_index: cursor.u16()?,
			sprite_texture_index: cursor.u16()?,
		})
	}
}

bitfield! {
	#[derive(Clone, Copy, Debug, PartialEq, Eq)]
	pub struct RoomFlags(u16);
	pub water, _: 0;
}

/// Vertex indices held by faces and sprites are not validated against
/// `vertices.len()`; consumers must bounds-check or trust the file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Room {
	pub info: RoomInfo,
	pub vertices: Box<[RoomVertex]>,
	pub quads: Box<[RoomQuad]>,
	pub tris: Box<[RoomTri]>,
	pub sprites: Box<[Sprite]>,
	pub ambient_light: u16,
	/// Index into `Level.rooms`, `None` if the room has no alternate.
	pub alt_room_index: Option<NonMaxU16>,
	pub flags: RoomFlags,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
	pub version: u32,
	/// 8-bit palette indices, one 256x256 block per atlas.
	pub atlases: Box<[[u8; ATLAS_PIXELS]]>,
	pub rooms: Box<[Room]>,
	/// As stored: 6 bits per channel, no scaling applied.
	pub palette: Box<[Color3]>,
}

//parsing

fn check_remaining(cursor: &ByteCursor, needed: u64) -> Result<(), Underrun> {
	if needed > cursor.remaining() as u64 {
		return Err(Underrun {
			offset: cursor.pos(),
			needed: usize::try_from(needed).unwrap_or(usize::MAX),
			available: cursor.remaining(),
		});
	}
	Ok(())
}

/// Read a count field, then step over `count * element_size` bytes without
/// materializing the records.
fn skip_section(cursor: &mut ByteCursor, section: &'static str, element_size: u64) -> Result<u32, Error> {
	let count = cursor.u32().map_err(Error::level(section))?;
	let len = count as u64 * element_size;
	check_remaining(cursor, len).map_err(Error::level(section))?;
	cursor.skip(len as usize).map_err(Error::level(section))?;
	trace!("skipped {}: {} entries", section, count);
	Ok(count)
}

fn read_room(cursor: &mut ByteCursor, room: usize) -> Result<Room, Error> {
	trace!("room {} at offset {}", room, cursor.pos());
	let info = RoomInfo::read(cursor).map_err(Error::room(room, "info"))?;
	//size in 2-byte words of the geometry block that follows
	let num_data_words = cursor.u32().map_err(Error::room(room, "geometry size"))?;
	let data_start = cursor.pos();
	let num_vertices = cursor.u16().map_err(Error::room(room, "vertex count"))?;
	let vertices = read_boxed_slice::<RoomVertex>(cursor, num_vertices as usize)?;
	let num_quads = cursor.u16().map_err(Error::room(room, "quad count"))?;
	let quads = read_boxed_slice::<RoomQuad>(cursor, num_quads as usize)?;
	let num_tris = cursor.u16().map_err(Error::room(room, "tri count"))?;
	let tris = read_boxed_slice::<RoomTri>(cursor, num_tris as usize)?;
	let num_sprites = cursor.u16().map_err(Error::room(room, "sprite count"))?;
	let sprites = read_boxed_slice::<Sprite>(cursor, num_sprites as usize)?;
	//the declared word count is authoritative for cursor placement, even when
	//it disagrees with the records just parsed
	let data_end = data_start as u64 + 2 * num_data_words as u64;
	let data_end = usize::try_from(data_end).unwrap_or(usize::MAX);
	cursor.seek_to(data_end).map_err(Error::room(room, "geometry data"))?;
	let num_portals = cursor.u16().map_err(Error::room(room, "portals"))?;
	cursor.skip(num_portals as usize * 32).map_err(Error::room(room, "portals"))?;
	let num_z_sectors = cursor.u16().map_err(Error::room(room, "sectors"))?;
	let num_x_sectors = cursor.u16().map_err(Error::room(room, "sectors"))?;
	let sectors_len = num_z_sectors as u64 * num_x_sectors as u64 * 8;
	check_remaining(cursor, sectors_len).map_err(Error::room(room, "sectors"))?;
	cursor.skip(sectors_len as usize).map_err(Error::room(room, "sectors"))?;
	let ambient_light = cursor.u16().map_err(Error::room(room, "ambient light"))?;
	let num_lights = cursor.u16().map_err(Error::room(room, "lights"))?;
	cursor.skip(num_lights as usize * 18).map_err(Error::room(room, "lights"))?;
	let num_static_meshes = cursor.u16().map_err(Error::room(room, "static meshes"))?;
	cursor.skip(num_static_meshes as usize * 18).map_err(Error::room(room, "static meshes"))?;
	let alt_room_index = NonMaxU16::new(cursor.u16().map_err(Error::room(room, "alternate room"))?);
	let flags = RoomFlags(cursor.u16().map_err(Error::room(room, "flags"))?);
	Ok(Room {
		info,
		vertices,
		quads,
		tris,
		sprites,
		ambient_light,
		alt_room_index,
		flags,
	})
}

/// Read 3 unsigned bytes per entry, `len` entries, in stream order.
pub fn read_palette(cursor: &mut ByteCursor, len: usize) -> Result<Box<[Color3]>, Error> {
	let mut entries = Vec::with_capacity(len);
	for _ in 0..len {
		entries.push(Color3 {
			r: cursor.u8()?,
			g: cursor.u8()?,
			b: cursor.u8()?,
		});
	}
	Ok(entries.into_boxed_slice())
}

/// Expand one atlas block to RGBA by palette lookup. Palette index 0 is
/// transparent, everything else opaque. Channel values are copied as stored.
pub fn atlas_to_rgba(atlas: &[u8; ATLAS_PIXELS], palette: &[Color3]) -> Result<Box<[u8]>, Error> {
	let mut rgba = vec![0; ATLAS_PIXELS * 4];
	for (pixel, &index) in rgba.chunks_exact_mut(4).zip(atlas) {
		let color = palette.get(index as usize).ok_or(Error::PaletteIndexOutOfRange {
			index,
			len: palette.len(),
		})?;
		pixel[0] = color.r;
		pixel[1] = color.g;
		pixel[2] = color.b;
		pixel[3] = if index == 0 { 0 } else { 255 };
	}
	Ok(rgba.into_boxed_slice())
}

pub(crate) fn read_level(buf: &[u8]) -> Result<Level, Error> {
	let mut cursor = ByteCursor::new(buf);
	let version = cursor.u32().map_err(Error::level("version tag"))?;
	let num_atlases = cursor.u32().map_err(Error::level("atlas count"))?;
	debug!("atlases: {}", num_atlases);
	check_remaining(&cursor, num_atlases as u64 * ATLAS_PIXELS as u64).map_err(Error::level("atlases"))?;
	let mut atlases = Vec::with_capacity(num_atlases as usize);
	for _ in 0..num_atlases {
		let atlas = cursor.slice(ATLAS_PIXELS).map_err(Error::level("atlases"))?;
		atlases.push(atlas.try_into().ok().unwrap());//exactly ATLAS_PIXELS
	}
	cursor.skip(4).map_err(Error::level("unused"))?;
	let num_rooms = cursor.u16().map_err(Error::level("room count"))?;
	debug!("rooms: {}", num_rooms);
	let mut rooms = Vec::with_capacity(num_rooms as usize);
	for room in 0..num_rooms as usize {
		rooms.push(read_room(&mut cursor, room)?);
	}
	skip_section(&mut cursor, "floor data", 2)?;
	skip_section(&mut cursor, "mesh data", 2)?;
	skip_section(&mut cursor, "mesh pointers", 4)?;
	skip_section(&mut cursor, "animations", 32)?;
	skip_section(&mut cursor, "state changes", 6)?;
	skip_section(&mut cursor, "anim dispatches", 8)?;
	skip_section(&mut cursor, "anim commands", 2)?;
	skip_section(&mut cursor, "mesh trees", 4)?;
	skip_section(&mut cursor, "frames", 2)?;
	skip_section(&mut cursor, "models", 18)?;
	skip_section(&mut cursor, "static meshes", 32)?;
	skip_section(&mut cursor, "object textures", 20)?;
	skip_section(&mut cursor, "sprite textures", 16)?;
	skip_section(&mut cursor, "sprite sequences", 8)?;
	skip_section(&mut cursor, "cameras", 16)?;
	skip_section(&mut cursor, "sound sources", 16)?;
	//overlap and zone sizes are governed by the box count that precedes them
	let num_boxes = cursor.u32().map_err(Error::level("boxes"))?;
	let boxes_len = num_boxes as u64 * (20 + 2 + 12);
	check_remaining(&cursor, boxes_len).map_err(Error::level("boxes"))?;
	cursor.skip(boxes_len as usize).map_err(Error::level("boxes"))?;
	trace!("skipped boxes: {} entries", num_boxes);
	skip_section(&mut cursor, "animated textures", 2)?;
	skip_section(&mut cursor, "entities", 22)?;
	cursor.skip(PALETTE_LEN * LIGHT_MAP_LEN).map_err(Error::level("light map"))?;
	let palette = read_palette(&mut cursor, PALETTE_LEN)?;
	debug!("level read, final offset {}", cursor.pos());
	Ok(Level {
		version,
		atlases: atlases.into_boxed_slice(),
		rooms: rooms.into_boxed_slice(),
		palette,
	})
}
