/*!
# Entity encoding and decoding

Text and attribute values are escaped with the five predefined XML entities
on output and unescaped on input.

```
use rxtree::{decode, encode};
let decoded = decode("a &lt;b&gt; &amp; c").unwrap();
assert_eq!(decoded, "a <b> & c");
assert_eq!(encode(&decoded), "a &lt;b&gt; &amp; c");
```

Decoding additionally understands numeric character references (`&#60;`,
`&#x3c;`). Other entity names are only accepted if an [`EntityResolver`] is
supplied; without one they are a [`DecodeError::UnknownEntity`].
*/
use std::borrow::Cow;

use crate::error::DecodeError;

/// Hook to expand entity names other than the five predefined ones.
///
/// The resolver receives the entity name without the surrounding `&` and
/// `;` and returns the replacement text, or `None` if the entity is unknown.
/// The replacement text is inserted verbatim and is not decoded again.
#[cfg(feature = "mt")]
pub type EntityResolver = dyn Fn(&str) -> Option<String> + Send + Sync;
/// Hook to expand entity names other than the five predefined ones.
///
/// The resolver receives the entity name without the surrounding `&` and
/// `;` and returns the replacement text, or `None` if the entity is unknown.
/// The replacement text is inserted verbatim and is not decoded again.
#[cfg(not(feature = "mt"))]
pub type EntityResolver = dyn Fn(&str) -> Option<String>;

const SPECIALS: &'static [u8] = &[b'&', b'<', b'>', b'\'', b'"'];

pub(crate) fn entity_for(b: u8) -> Option<&'static str> {
	match b {
		b'&' => Some("&amp;"),
		b'<' => Some("&lt;"),
		b'>' => Some("&gt;"),
		b'\'' => Some("&apos;"),
		b'"' => Some("&quot;"),
		_ => None,
	}
}

/// Call `out` with successive pieces of `s`, escaping the XML specials.
pub(crate) fn encode_with<F: FnMut(&str)>(s: &str, mut out: F) {
	let bytes = s.as_bytes();
	let mut last = 0;
	for (i, b) in bytes.iter().enumerate() {
		let entity = match entity_for(*b) {
			Some(v) => v,
			None => continue,
		};
		if i > last {
			// specials are ascii, so i and last are on char boundaries
			out(&s[last..i]);
		}
		out(entity);
		last = i + 1;
	}
	if last < s.len() {
		out(&s[last..]);
	}
}

/// Escape `&`, `<`, `>`, `'` and `"` with their predefined entities.
///
/// Borrows the input if nothing needs escaping.
pub fn encode(s: &str) -> Cow<'_, str> {
	if !s.bytes().any(|b| SPECIALS.contains(&b)) {
		return Cow::Borrowed(s);
	}
	let mut result = String::with_capacity(s.len() + 8);
	encode_with(s, |piece| result.push_str(piece));
	Cow::Owned(result)
}

/// Expand the predefined entities and numeric character references.
///
/// Borrows the input if it contains no references.
pub fn decode(s: &str) -> Result<Cow<'_, str>, DecodeError> {
	decode_with(s, None)
}

/// Like [`decode`], consulting `resolver` for unknown entity names.
pub fn decode_with<'a>(
	s: &'a str,
	resolver: Option<&EntityResolver>,
) -> Result<Cow<'a, str>, DecodeError> {
	if !s.contains('&') {
		return Ok(Cow::Borrowed(s));
	}
	let mut result = String::with_capacity(s.len());
	let mut rest = s;
	while let Some(amp) = rest.find('&') {
		result.push_str(&rest[..amp]);
		let tail = &rest[amp + 1..];
		let semi = match tail.find(';') {
			Some(v) => v,
			None => return Err(DecodeError::UnterminatedReference),
		};
		expand_reference(&tail[..semi], resolver, &mut result)?;
		rest = &tail[semi + 1..];
	}
	result.push_str(rest);
	Ok(Cow::Owned(result))
}

/// Expand a single reference (the text between `&` and `;`) into `out`.
pub(crate) fn expand_reference(
	name: &str,
	resolver: Option<&EntityResolver>,
	out: &mut String,
) -> Result<(), DecodeError> {
	match name {
		"amp" => out.push('&'),
		"lt" => out.push('<'),
		"gt" => out.push('>'),
		"apos" => out.push('\''),
		"quot" => out.push('"'),
		_ => match name.strip_prefix('#') {
			Some(num) => out.push(decode_charref(num)?),
			None => match resolver.and_then(|r| r(name)) {
				Some(text) => out.push_str(&text),
				None => return Err(DecodeError::UnknownEntity(name.to_string())),
			},
		},
	}
	Ok(())
}

fn is_xml_char(c: char) -> bool {
	match c {
		'\x09' | '\x0a' | '\x0d' => true,
		'\u{20}'..='\u{d7ff}' => true,
		'\u{e000}'..='\u{fffd}' => true,
		'\u{10000}'..='\u{10ffff}' => true,
		_ => false,
	}
}

fn decode_charref(num: &str) -> Result<char, DecodeError> {
	let invalid = || DecodeError::InvalidCharRef(format!("#{}", num));
	let (digits, radix) = match num.strip_prefix('x') {
		Some(hex) => (hex, 16),
		None => (num, 10),
	};
	if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
		return Err(invalid());
	}
	let cp = u32::from_str_radix(digits, radix).map_err(|_| invalid())?;
	match std::char::from_u32(cp) {
		Some(c) if is_xml_char(c) => Ok(c),
		_ => Err(invalid()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decode_predefined_entities() {
		assert_eq!(decode("a &lt;b&gt; &amp; c").unwrap(), "a <b> & c");
		assert_eq!(decode("&apos;&quot;").unwrap(), "'\"");
	}

	#[test]
	fn encode_inverts_decode() {
		let decoded = decode("a &lt;b&gt; &amp; c").unwrap();
		assert_eq!(encode(&decoded), "a &lt;b&gt; &amp; c");
	}

	#[test]
	fn encode_escapes_quotes() {
		assert_eq!(encode("it's \"x\""), "it&apos;s &quot;x&quot;");
	}

	#[test]
	fn plain_text_is_borrowed() {
		assert!(matches!(encode("hello"), Cow::Borrowed(_)));
		assert!(matches!(decode("hello").unwrap(), Cow::Borrowed(_)));
	}

	#[test]
	fn decode_numeric_references() {
		assert_eq!(decode("&#60;&#x3e;&#x1F600;").unwrap(), "<>\u{1f600}");
	}

	#[test]
	fn decode_rejects_bare_ampersand() {
		assert_eq!(decode("fish & chips"), Err(DecodeError::UnterminatedReference));
		assert_eq!(decode("trailing &"), Err(DecodeError::UnterminatedReference));
	}

	#[test]
	fn decode_rejects_unknown_entity() {
		assert_eq!(
			decode("&nbsp;"),
			Err(DecodeError::UnknownEntity("nbsp".to_string()))
		);
	}

	#[test]
	fn decode_rejects_invalid_charrefs() {
		assert!(matches!(decode("&#0;"), Err(DecodeError::InvalidCharRef(_))));
		assert!(matches!(decode("&#xd800;"), Err(DecodeError::InvalidCharRef(_))));
		assert!(matches!(decode("&#;"), Err(DecodeError::InvalidCharRef(_))));
		assert!(matches!(decode("&#x-1;"), Err(DecodeError::InvalidCharRef(_))));
	}

	#[test]
	fn decode_consults_resolver() {
		let resolver: &EntityResolver = &|name: &str| match name {
			"nbsp" => Some("\u{a0}".to_string()),
			_ => None,
		};
		assert_eq!(decode_with("a&nbsp;b", Some(resolver)).unwrap(), "a\u{a0}b");
		assert_eq!(
			decode_with("&copy;", Some(resolver)),
			Err(DecodeError::UnknownEntity("copy".to_string()))
		);
	}
}
