pub trait ByteSelect {
	fn select(&self, b: u8) -> bool;
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ByteRange(pub u8, pub u8);

impl ByteSelect for ByteRange {
	fn select(&self, b: u8) -> bool {
		self.0 <= b && b <= self.1
	}
}

impl ByteSelect for &'_ [ByteRange] {
	fn select(&self, b: u8) -> bool {
		self.iter().any(|r| r.select(b))
	}
}

/// Selects every byte which is not in the list.
#[derive(Debug, Clone, Copy)]
pub struct NoneOf(pub &'static [u8]);

impl ByteSelect for NoneOf {
	fn select(&self, b: u8) -> bool {
		!self.0.contains(&b)
	}
}

pub static CLASS_XML_NAMESTART_BYTE: &'static [ByteRange] = &[
	ByteRange(b':', b':'),
	ByteRange(b'A', b'Z'),
	ByteRange(b'_', b'_'),
	ByteRange(b'a', b'z'),
	// utf-8 start bytes; the sequence is validated when the name is complete
	ByteRange(b'\xc3', b'\xf7'),
];

pub static CLASS_XML_NAME_BYTE: &'static [ByteRange] = &[
	ByteRange(b':', b':'),
	ByteRange(b'-', b'-'),
	ByteRange(b'.', b'.'),
	ByteRange(b'A', b'Z'),
	ByteRange(b'_', b'_'),
	ByteRange(b'0', b'9'),
	ByteRange(b'a', b'z'),
	ByteRange(b'\x80', b'\xff'),
];

pub fn is_space(b: u8) -> bool {
	matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Endbyte {
	/// Input exhausted without hitting a delimiter.
	Eof,
	/// `into` reached the length limit.
	Limit,
	/// The first byte not selected; it has been consumed.
	Delimiter(u8),
}

/// Move bytes from the front of `r` to `into` for as long as they are
/// selected, without letting `into` grow beyond `limit` bytes.
pub fn read_selected<B: ByteSelect>(
	r: &mut &[u8],
	selector: &B,
	limit: usize,
	into: &mut Vec<u8>,
) -> Endbyte {
	let room = limit.saturating_sub(into.len());
	let end = r.iter().position(|b| !selector.select(*b)).unwrap_or(r.len());
	if end > room {
		into.extend_from_slice(&r[..room]);
		*r = &r[room..];
		return Endbyte::Limit;
	}
	into.extend_from_slice(&r[..end]);
	match r.get(end) {
		Some(b) => {
			let b = *b;
			*r = &r[end + 1..];
			Endbyte::Delimiter(b)
		}
		None => {
			*r = &[];
			Endbyte::Eof
		}
	}
}

/// Drop whitespace from the front of `r`. Returns true if a non-whitespace
/// byte is up next.
pub fn skip_space(r: &mut &[u8]) -> bool {
	let end = r.iter().position(|b| !is_space(*b)).unwrap_or(r.len());
	*r = &r[end..];
	r.len() > 0
}
