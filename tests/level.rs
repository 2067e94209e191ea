use tr1_reader::{read_level, tr1::{self, ATLAS_PIXELS, PALETTE_LEN}, Error};

const NUM_SKIP_SECTIONS: usize = 19;

fn put_u16(buf: &mut Vec<u8>, val: u16) {
	buf.extend_from_slice(&val.to_le_bytes());
}

fn put_u32(buf: &mut Vec<u8>, val: u32) {
	buf.extend_from_slice(&val.to_le_bytes());
}

/// Level with the given atlases and rooms, every skippable section
/// zero-counted, and a palette of `PALETTE_LEN` grey entries.
fn level_bytes(atlases: &[[u8; ATLAS_PIXELS]], rooms: &[Vec<u8>]) -> Vec<u8> {
	let mut buf = vec![];
	put_u32(&mut buf, 32);
	put_u32(&mut buf, atlases.len() as u32);
	for atlas in atlases {
		buf.extend_from_slice(atlas);
	}
	put_u32(&mut buf, 0);//unused
	put_u16(&mut buf, rooms.len() as u16);
	for room in rooms {
		buf.extend_from_slice(room);
	}
	for _ in 0..NUM_SKIP_SECTIONS {
		put_u32(&mut buf, 0);
	}
	buf.extend(std::iter::repeat(0).take(8192));//light map
	for i in 0..PALETTE_LEN {
		buf.extend([i as u8; 3]);
	}
	buf
}

/// Empty room: no geometry, no portals, a 1x1 sector grid, no lights or
/// static meshes.
fn empty_room_bytes() -> Vec<u8> {
	let mut buf = vec![];
	buf.extend([0; 16]);//info
	put_u32(&mut buf, 4);//4 data words: the 4 zero counts
	for _ in 0..4 {
		put_u16(&mut buf, 0);
	}
	put_u16(&mut buf, 0);//portals
	put_u16(&mut buf, 1);//z sectors
	put_u16(&mut buf, 1);//x sectors
	buf.extend([0; 8]);
	put_u16(&mut buf, 0x1fff);//ambient light
	put_u16(&mut buf, 0);//lights
	put_u16(&mut buf, 0);//static meshes
	put_u16(&mut buf, u16::MAX);//no alternate room
	put_u16(&mut buf, 0);//flags
	buf
}

#[test]
fn minimal_level() {
	let mut buf = level_bytes(&[], &[]);
	//all-zero palette for the minimal scenario
	let palette_start = buf.len() - PALETTE_LEN * 3;
	buf[palette_start..].fill(0);
	let level = read_level(&buf).unwrap();
	assert_eq!(level.version, 32);
	assert!(level.atlases.is_empty());
	assert!(level.rooms.is_empty());
	assert_eq!(level.palette.len(), PALETTE_LEN);
	assert!(level.palette.iter().all(|&color| color == tr1::Color3 { r: 0, g: 0, b: 0 }));
}

#[test]
fn decoding_is_deterministic() {
	let buf = level_bytes(&[[5; ATLAS_PIXELS]], &[empty_room_bytes()]);
	assert_eq!(read_level(&buf).unwrap(), read_level(&buf).unwrap());
}

#[test]
fn counts_match_decoded_lengths() {
	let atlases = [[5; ATLAS_PIXELS], [0; ATLAS_PIXELS]];
	let rooms = [empty_room_bytes(), empty_room_bytes(), empty_room_bytes()];
	let level = read_level(&level_bytes(&atlases, &rooms)).unwrap();
	assert_eq!(level.atlases.len(), 2);
	assert_eq!(level.rooms.len(), 3);
	assert_eq!(level.rooms[0].ambient_light, 0x1fff);
	assert_eq!(level.rooms[0].alt_room_index, None);
}

#[test]
fn decoded_atlas_expands_against_decoded_palette() {
	let level = read_level(&level_bytes(&[[5; ATLAS_PIXELS]], &[])).unwrap();
	let rgba = tr1::atlas_to_rgba(&level.atlases[0], &level.palette).unwrap();
	//palette entry 5 is grey 5, fully opaque
	assert!(rgba.chunks_exact(4).all(|pixel| pixel == [5, 5, 5, 255].as_slice()));
}

#[test]
fn room_count_past_end_is_truncation() {
	let mut buf = vec![];
	put_u32(&mut buf, 32);
	put_u32(&mut buf, 0);//atlases
	put_u32(&mut buf, 0);//unused
	put_u16(&mut buf, 5);//rooms, but none present
	let err = read_level(&buf).unwrap_err();
	assert!(matches!(err, Error::TruncatedRoom { room: 0, .. }));
}

#[test]
fn skip_section_past_end_is_truncation() {
	let mut buf = level_bytes(&[], &[]);
	//corrupt the entity count (last of the skip sections) and drop the tail
	let entities_count_at = buf.len() - PALETTE_LEN * 3 - 8192 - 4;
	buf[entities_count_at..entities_count_at + 4].copy_from_slice(&u32::MAX.to_le_bytes());
	let err = read_level(&buf).unwrap_err();
	assert!(matches!(err, Error::TruncatedLevel { section: "entities", .. }));
}

#[test]
fn missing_palette_tail_fails() {
	let mut buf = level_bytes(&[], &[]);
	buf.pop();
	assert!(matches!(read_level(&buf), Err(Error::OutOfBounds { .. })));
}
