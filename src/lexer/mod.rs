/*!
# Byte-level tokenizer

The [`Lexer`] turns UTF-8 encoded bytes into [`Production`]s for the tree
builder. It is a resumable state machine: input may be handed to it in
arbitrary slices and partial tokens are kept until the rest arrives.

Restrictions:

* UTF-8 input only. The XML declaration is consumed and discarded (it may
  only appear at the very start of the input).
* DOCTYPE declarations are only skipped over; the internal subset is not
  interpreted.
* Attribute values and text are not normalized (line endings and whitespace
  are kept as written).
*/
use std::borrow::Cow;
use std::fmt;
use std::mem;

mod read;

use read::*;

use crate::codec::{self, EntityResolver};
use crate::error::*;
use crate::parser::{Production, RawAttributes, RawName, Tokenize};
use crate::tree::{NCName, RcPtr};

const UTF8_BOM: &'static [u8] = b"\xef\xbb\xbf";

const TEXT_DELIMITERS: NoneOf = NoneOf(b"<");
const SQ_DELIMITERS: NoneOf = NoneOf(b"'<");
const DQ_DELIMITERS: NoneOf = NoneOf(b"\"<");

const BANG_KEYWORDS: &'static [&'static [u8]] = &[b"--", b"[CDATA[", b"DOCTYPE"];

/// Configuration for a [`Lexer`].
#[derive(Clone)]
pub struct LexerOptions {
	/// Maximum number of bytes which can form a token.
	///
	/// This limits the memory the lexer uses for buffering text, names,
	/// attribute values, comments and similar. Exceeding it fails with
	/// [`Error::RestrictedXml`].
	pub max_token_length: usize,

	/// Hook for expanding entities other than the five predefined ones.
	pub entity_resolver: Option<RcPtr<EntityResolver>>,
}

impl LexerOptions {
	/// Set the [`LexerOptions::max_token_length`] value.
	///
	/// # Example
	///
	/// ```
	/// use rxtree::{Lexer, LexerOptions};
	/// let lexer = Lexer::with_options(LexerOptions::default().max_token_length(1024));
	/// ```
	pub fn max_token_length(mut self, v: usize) -> LexerOptions {
		self.max_token_length = v;
		self
	}

	/// Set the [`LexerOptions::entity_resolver`] hook.
	///
	/// # Example
	///
	/// ```
	/// use std::sync::Arc;
	/// use rxtree::{EntityResolver, LexerOptions};
	/// let resolver: Arc<EntityResolver> = Arc::new(|name: &str| match name {
	/// 	"nbsp" => Some("\u{a0}".to_string()),
	/// 	_ => None,
	/// });
	/// let opts = LexerOptions::default().entity_resolver(resolver);
	/// ```
	pub fn entity_resolver(mut self, resolver: RcPtr<EntityResolver>) -> LexerOptions {
		self.entity_resolver = Some(resolver);
		self
	}
}

impl Default for LexerOptions {
	/// Constructs default lexer options.
	///
	/// The defaults are implementation-defined and should not be relied upon.
	fn default() -> Self {
		Self {
			max_token_length: 8192,
			entity_resolver: None,
		}
	}
}

impl fmt::Debug for LexerOptions {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("LexerOptions")
			.field("max_token_length", &self.max_token_length)
			.field("entity_resolver", &self.entity_resolver.is_some())
			.finish()
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
	/// Character data, up to the next `<`
	Content,
	/// Encountered `<`
	Markup,
	/// Encountered `<!`, collecting the keyword
	Bang,
	/// Number of consecutive `-` seen
	Comment { dashes: u8 },
	/// Number of consecutive `]` seen
	Cdata { brackets: u8 },
	Doctype { subset: bool, quote: Option<u8> },
	PiTarget,
	/// `question` is set if the previous byte was `?`
	PiData { question: bool },
	StartName,
	/// Inside a start tag, after the name or an attribute
	TagBlank { spaced: bool },
	AttrName,
	/// After an attribute name, expecting `=`
	AttrEq,
	/// After `=`, expecting a quote
	AttrQuote,
	/// Delimiter
	AttrValue(u8),
	/// Encountered `/` in a start tag
	EmptyClose,
	EndName,
	/// After the name in an end tag, expecting `>`
	EndTail,
}

impl State {
	fn error_context(&self) -> &'static str {
		match self {
			Self::Content => ERRCTX_TEXT,
			Self::Markup | Self::StartName | Self::TagBlank { .. } | Self::EmptyClose => {
				ERRCTX_ELEMENT
			}
			Self::Bang => ERRCTX_MARKUP,
			Self::Comment { .. } => ERRCTX_COMMENT,
			Self::Cdata { .. } => ERRCTX_CDATA_SECTION,
			Self::Doctype { .. } => ERRCTX_DOCTYPE,
			Self::PiTarget | Self::PiData { .. } => ERRCTX_PI,
			Self::AttrName | Self::AttrEq => ERRCTX_ATTNAME,
			Self::AttrQuote | Self::AttrValue(_) => ERRCTX_ATTVAL,
			Self::EndName | Self::EndTail => ERRCTX_ELEMENT_FOOT,
		}
	}
}

fn next_byte(r: &mut &[u8]) -> Option<u8> {
	let src: &[u8] = *r;
	let (b, tail) = src.split_first()?;
	*r = tail;
	Some(*b)
}

/// Length of the longest prefix of `buf` which does not end inside a UTF-8
/// sequence.
fn utf8_boundary(buf: &[u8]) -> usize {
	match std::str::from_utf8(buf) {
		Err(e) if e.error_len().is_none() => e.valid_up_to(),
		_ => buf.len(),
	}
}

fn into_string(bytes: Vec<u8>) -> Result<String> {
	String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)
}

/**
# Resumable XML tokenizer

Implements [`Tokenize`] for UTF-8 encoded XML.

```
use rxtree::{Lexer, Production, Tokenize};
let mut lexer = Lexer::new();
let mut input = &b"<greeting>Hel"[..];
assert!(matches!(lexer.next_production(&mut input, false).unwrap(), Production::StartElement(..)));
assert!(matches!(lexer.next_production(&mut input, false).unwrap(), Production::EndOfBuffer));
let mut input = &b"lo!</greeting>"[..];
assert_eq!(lexer.next_production(&mut input, false).unwrap(), Production::Text("Hello!".to_string()));
```
*/
pub struct Lexer {
	state: State,
	scratchpad: Vec<u8>,
	name: Vec<u8>,
	attr_name: Vec<u8>,
	attrs: RawAttributes,
	at_start: bool,
	opts: LexerOptions,
	err: Option<Error>,
}

impl Lexer {
	/// Construct a new Lexer based on [`LexerOptions::default()`].
	pub fn new() -> Self {
		Self::with_options(LexerOptions::default())
	}

	/// Construct a new Lexer with the given options.
	pub fn with_options(opts: LexerOptions) -> Self {
		Self {
			state: State::Content,
			scratchpad: Vec::new(),
			name: Vec::new(),
			attr_name: Vec::new(),
			attrs: Vec::new(),
			at_start: true,
			opts,
			err: None,
		}
	}

	pub fn options(&self) -> &LexerOptions {
		&self.opts
	}

	fn token_length_error() -> Error {
		Error::RestrictedXml("token exceeds max_token_length")
	}

	fn read_into_scratchpad<B: ByteSelect>(&mut self, r: &mut &[u8], selector: &B) -> Result<Endbyte> {
		match read_selected(r, selector, self.opts.max_token_length, &mut self.scratchpad) {
			Endbyte::Limit => Err(Self::token_length_error()),
			other => Ok(other),
		}
	}

	fn read_name<B: ByteSelect>(&mut self, r: &mut &[u8], selector: &B, attr: bool) -> Result<Endbyte> {
		let into = if attr { &mut self.attr_name } else { &mut self.name };
		match read_selected(r, selector, self.opts.max_token_length, into) {
			Endbyte::Limit => Err(Self::token_length_error()),
			other => Ok(other),
		}
	}

	fn push_scratchpad(&mut self, bytes: &[u8]) -> Result<()> {
		if self.scratchpad.len() + bytes.len() > self.opts.max_token_length {
			return Err(Self::token_length_error());
		}
		self.scratchpad.extend_from_slice(bytes);
		Ok(())
	}

	fn take_scratchpad(&mut self) -> Result<String> {
		into_string(mem::take(&mut self.scratchpad))
	}

	fn take_name(buf: &mut Vec<u8>) -> Result<RawName> {
		match buf.first() {
			None => return Err(WFError::InvalidSyntax("empty name").into()),
			Some(b) if !CLASS_XML_NAMESTART_BYTE.select(*b) => {
				return Err(WFError::UnexpectedByte(ERRCTX_NAME, *b, None).into())
			}
			_ => (),
		}
		let name = std::str::from_utf8(buf).map_err(|_| Error::InvalidUtf8)?.into();
		buf.clear();
		Ok(name)
	}

	fn decode(&self, raw: String) -> Result<String> {
		let resolver: Option<&EntityResolver> = self.opts.entity_resolver.as_deref();
		let decoded = match codec::decode_with(&raw, resolver)? {
			Cow::Borrowed(_) => None,
			Cow::Owned(v) => Some(v),
		};
		Ok(decoded.unwrap_or(raw))
	}

	fn flush_text(&mut self) -> Result<Option<Production>> {
		if self.at_start && self.scratchpad.starts_with(UTF8_BOM) {
			self.scratchpad.drain(..UTF8_BOM.len());
		}
		if self.scratchpad.is_empty() {
			return Ok(None);
		}
		if self.scratchpad.windows(3).any(|w| w == b"]]>") {
			return Err(WFError::InvalidSyntax("']]>' not allowed in text").into());
		}
		let whitespace = self.scratchpad.iter().all(|b| is_space(*b));
		let raw = self.take_scratchpad()?;
		if whitespace {
			Ok(Some(Production::Whitespace(raw)))
		} else {
			Ok(Some(Production::Text(self.decode(raw)?)))
		}
	}

	/// Emit the text gathered so far when it hit the length limit.
	///
	/// An unterminated reference, up to two trailing `]` and an incomplete
	/// UTF-8 sequence stay in the scratchpad for the next piece.
	fn flush_partial_text(&mut self) -> Result<Option<Production>> {
		let mut cut = utf8_boundary(&self.scratchpad);
		if let Some(amp) = self.scratchpad[..cut].iter().rposition(|b| *b == b'&') {
			if !self.scratchpad[amp..cut].contains(&b';') {
				cut = amp;
			}
		}
		let mut brackets = 0;
		while brackets < 2 && cut > 0 && self.scratchpad[cut - 1] == b']' {
			cut -= 1;
			brackets += 1;
		}
		if cut == 0 {
			return Err(Self::token_length_error());
		}
		let tail = self.scratchpad.split_off(cut);
		let result = self.flush_text();
		self.scratchpad = tail;
		result
	}

	fn flush_partial_cdata(&mut self) -> Result<Option<Production>> {
		let cut = utf8_boundary(&self.scratchpad);
		if cut == 0 {
			return Err(Self::token_length_error());
		}
		let tail = self.scratchpad.split_off(cut);
		let data = self.take_scratchpad()?;
		self.scratchpad = tail;
		Ok(Some(Production::Cdata(data)))
	}

	fn push_cdata(&mut self, bytes: &[u8]) -> Result<Option<Production>> {
		self.scratchpad.extend_from_slice(bytes);
		if self.scratchpad.len() >= self.opts.max_token_length {
			return self.flush_partial_cdata();
		}
		Ok(None)
	}

	fn start_element(&mut self, empty: bool) -> Result<Option<Production>> {
		self.state = State::Content;
		let name = Self::take_name(&mut self.name)?;
		let attrs = mem::take(&mut self.attrs);
		if empty {
			Ok(Some(Production::EmptyElement(name, attrs)))
		} else {
			Ok(Some(Production::StartElement(name, attrs)))
		}
	}

	fn finish_attribute(&mut self) -> Result<()> {
		let name = add_context(Self::take_name(&mut self.attr_name), ERRCTX_ATTNAME)?;
		if self.attrs.iter().any(|(existing, _)| *existing == name) {
			return Err(WFError::DuplicateAttribute.into());
		}
		let raw = self.take_scratchpad()?;
		let value = self.decode(raw)?;
		self.attrs.push((name, value));
		Ok(())
	}

	fn finish_pi(&mut self) -> Result<Option<Production>> {
		self.state = State::Content;
		let target = Self::take_name(&mut self.name)?;
		let data = self.take_scratchpad()?;
		if target.eq_ignore_ascii_case("xml") {
			if target.as_str() != "xml" {
				return Err(WFError::InvalidSyntax("reserved processing instruction target").into());
			}
			if !self.at_start {
				return Err(WFError::InvalidSyntax("XML declaration not at start of document").into());
			}
			log::trace!("discarding XML declaration {:?}", data.trim_start());
			self.at_start = false;
			return Ok(None);
		}
		if target.contains(':') {
			return Err(NWFError::MultiColonName(ERRCTX_PI).into());
		}
		Ok(Some(Production::ProcessingInstruction(
			NCName::from(target.as_str()),
			data.trim_start().to_string(),
		)))
	}

	/// Advance by at least one byte of `r`, which must not be empty.
	fn lex_bytes(&mut self, r: &mut &[u8]) -> Result<Option<Production>> {
		match self.state {
			State::Content => {
				match read_selected(r, &TEXT_DELIMITERS, self.opts.max_token_length, &mut self.scratchpad) {
					Endbyte::Delimiter(_) => {
						self.state = State::Markup;
						self.flush_text()
					}
					Endbyte::Limit => self.flush_partial_text(),
					Endbyte::Eof => Ok(None),
				}
			}
			State::Markup => match next_byte(r) {
				Some(b'/') => {
					self.state = State::EndName;
					Ok(None)
				}
				Some(b'!') => {
					self.state = State::Bang;
					Ok(None)
				}
				Some(b'?') => {
					self.state = State::PiTarget;
					Ok(None)
				}
				Some(b) if CLASS_XML_NAMESTART_BYTE.select(b) => {
					self.name.push(b);
					self.state = State::StartName;
					Ok(None)
				}
				Some(b) => Err(WFError::UnexpectedByte(
					ERRCTX_ELEMENT,
					b,
					Some(&["name", "'/'", "'!'", "'?'"]),
				)
				.into()),
				None => Ok(None),
			},
			State::Bang => {
				let b = match next_byte(r) {
					Some(b) => b,
					None => return Ok(None),
				};
				self.scratchpad.push(b);
				let next = match &self.scratchpad[..] {
					b"--" => State::Comment { dashes: 0 },
					b"[CDATA[" => State::Cdata { brackets: 0 },
					b"DOCTYPE" => State::Doctype {
						subset: false,
						quote: None,
					},
					partial => {
						if BANG_KEYWORDS.iter().any(|kw| kw.starts_with(partial)) {
							return Ok(None);
						}
						return Err(WFError::UnexpectedByte(
							ERRCTX_MARKUP,
							b,
							Some(&["'--'", "'[CDATA['", "'DOCTYPE'"]),
						)
						.into());
					}
				};
				self.scratchpad.clear();
				self.state = next;
				Ok(None)
			}
			State::Comment { dashes: 0 } => {
				if let Endbyte::Delimiter(_) = self.read_into_scratchpad(r, &NoneOf(b"-"))? {
					self.state = State::Comment { dashes: 1 };
				}
				Ok(None)
			}
			State::Comment { dashes } => {
				let b = match next_byte(r) {
					Some(b) => b,
					None => return Ok(None),
				};
				match (dashes, b) {
					(1, b'-') => self.state = State::Comment { dashes: 2 },
					(1, other) => {
						self.push_scratchpad(&[b'-', other])?;
						self.state = State::Comment { dashes: 0 };
					}
					(_, b'>') => {
						self.state = State::Content;
						return Ok(Some(Production::Comment(self.take_scratchpad()?)));
					}
					_ => return Err(WFError::InvalidSyntax("'--' not allowed in comment").into()),
				}
				Ok(None)
			}
			State::Cdata { brackets: 0 } => {
				match read_selected(r, &NoneOf(b"]"), self.opts.max_token_length, &mut self.scratchpad) {
					Endbyte::Delimiter(_) => {
						self.state = State::Cdata { brackets: 1 };
						Ok(None)
					}
					Endbyte::Limit => self.flush_partial_cdata(),
					Endbyte::Eof => Ok(None),
				}
			}
			State::Cdata { brackets } => {
				let b = match next_byte(r) {
					Some(b) => b,
					None => return Ok(None),
				};
				match (brackets, b) {
					(1, b']') => {
						self.state = State::Cdata { brackets: 2 };
						Ok(None)
					}
					(_, b'>') if brackets >= 2 => {
						self.state = State::Content;
						Ok(Some(Production::Cdata(self.take_scratchpad()?)))
					}
					(_, b']') => self.push_cdata(b"]"),
					(n, other) => {
						let mut pending = vec![b']'; n as usize];
						pending.push(other);
						self.state = State::Cdata { brackets: 0 };
						self.push_cdata(&pending)
					}
				}
			}
			State::Doctype { subset, quote } => {
				let b = match next_byte(r) {
					Some(b) => b,
					None => return Ok(None),
				};
				let (subset, quote) = match (quote, b) {
					(Some(q), b) if q == b => (subset, None),
					(Some(q), _) => (subset, Some(q)),
					(None, b'\'') | (None, b'"') => (subset, Some(b)),
					(None, b'[') => (true, None),
					(None, b']') => (false, None),
					(None, b'>') if !subset => {
						self.state = State::Content;
						let decl = self.take_scratchpad()?;
						return Ok(Some(Production::Doctype(decl.trim().to_string())));
					}
					(None, _) => (subset, None),
				};
				self.push_scratchpad(&[b])?;
				self.state = State::Doctype { subset, quote };
				Ok(None)
			}
			State::PiTarget => match self.read_name(r, &CLASS_XML_NAME_BYTE, false)? {
				Endbyte::Delimiter(b) if is_space(b) && !self.name.is_empty() => {
					self.state = State::PiData { question: false };
					Ok(None)
				}
				Endbyte::Delimiter(b'?') if !self.name.is_empty() => {
					self.state = State::PiData { question: true };
					Ok(None)
				}
				Endbyte::Delimiter(b) => Err(WFError::UnexpectedByte(ERRCTX_PI, b, None).into()),
				_ => Ok(None),
			},
			State::PiData { question: false } => {
				if let Endbyte::Delimiter(_) = self.read_into_scratchpad(r, &NoneOf(b"?"))? {
					self.state = State::PiData { question: true };
				}
				Ok(None)
			}
			State::PiData { question: true } => match next_byte(r) {
				Some(b'>') => self.finish_pi(),
				Some(b'?') => {
					self.push_scratchpad(b"?")?;
					Ok(None)
				}
				Some(other) => {
					self.push_scratchpad(&[b'?', other])?;
					self.state = State::PiData { question: false };
					Ok(None)
				}
				None => Ok(None),
			},
			State::StartName => match self.read_name(r, &CLASS_XML_NAME_BYTE, false)? {
				Endbyte::Delimiter(b'>') => self.start_element(false),
				Endbyte::Delimiter(b'/') => {
					self.state = State::EmptyClose;
					Ok(None)
				}
				Endbyte::Delimiter(b) if is_space(b) => {
					self.state = State::TagBlank { spaced: true };
					Ok(None)
				}
				Endbyte::Delimiter(b) => {
					Err(WFError::UnexpectedByte(ERRCTX_NAME, b, None).into())
				}
				_ => Ok(None),
			},
			State::TagBlank { spaced } => {
				let before = r.len();
				if !skip_space(r) {
					self.state = State::TagBlank { spaced: true };
					return Ok(None);
				}
				let spaced = spaced || r.len() < before;
				match next_byte(r) {
					Some(b'>') => self.start_element(false),
					Some(b'/') => {
						self.state = State::EmptyClose;
						Ok(None)
					}
					Some(b) if spaced && CLASS_XML_NAMESTART_BYTE.select(b) => {
						self.attr_name.push(b);
						self.state = State::AttrName;
						Ok(None)
					}
					Some(b) if spaced => Err(WFError::UnexpectedByte(
						ERRCTX_ELEMENT,
						b,
						Some(&["name", "'>'", "'/>'"]),
					)
					.into()),
					Some(b) => Err(WFError::UnexpectedByte(
						ERRCTX_ELEMENT,
						b,
						Some(&["whitespace", "'>'", "'/>'"]),
					)
					.into()),
					None => Ok(None),
				}
			}
			State::AttrName => match self.read_name(r, &CLASS_XML_NAME_BYTE, true)? {
				Endbyte::Delimiter(b'=') => {
					self.state = State::AttrQuote;
					Ok(None)
				}
				Endbyte::Delimiter(b) if is_space(b) => {
					self.state = State::AttrEq;
					Ok(None)
				}
				Endbyte::Delimiter(b) => {
					Err(WFError::UnexpectedByte(ERRCTX_ATTNAME, b, Some(&["'='"])).into())
				}
				_ => Ok(None),
			},
			State::AttrEq => {
				if !skip_space(r) {
					return Ok(None);
				}
				match next_byte(r) {
					Some(b'=') => {
						self.state = State::AttrQuote;
						Ok(None)
					}
					Some(b) => {
						Err(WFError::UnexpectedByte(ERRCTX_ATTNAME, b, Some(&["'='"])).into())
					}
					None => Ok(None),
				}
			}
			State::AttrQuote => {
				if !skip_space(r) {
					return Ok(None);
				}
				match next_byte(r) {
					Some(d) if d == b'\'' || d == b'"' => {
						self.state = State::AttrValue(d);
						Ok(None)
					}
					Some(b) => Err(WFError::UnexpectedByte(
						ERRCTX_ATTVAL,
						b,
						Some(&["'\\''", "'\"'"]),
					)
					.into()),
					None => Ok(None),
				}
			}
			State::AttrValue(delim) => {
				let selector = if delim == b'\'' {
					SQ_DELIMITERS
				} else {
					DQ_DELIMITERS
				};
				match self.read_into_scratchpad(r, &selector)? {
					Endbyte::Delimiter(b'<') => {
						Err(WFError::UnexpectedByte(ERRCTX_ATTVAL, b'<', None).into())
					}
					Endbyte::Delimiter(_) => {
						self.finish_attribute()?;
						self.state = State::TagBlank { spaced: false };
						Ok(None)
					}
					_ => Ok(None),
				}
			}
			State::EmptyClose => match next_byte(r) {
				Some(b'>') => self.start_element(true),
				Some(b) => {
					Err(WFError::UnexpectedByte(ERRCTX_ELEMENT, b, Some(&["'>'"])).into())
				}
				None => Ok(None),
			},
			State::EndName => match self.read_name(r, &CLASS_XML_NAME_BYTE, false)? {
				Endbyte::Delimiter(b'>') => {
					self.state = State::Content;
					let name = Self::take_name(&mut self.name)?;
					Ok(Some(Production::EndElement(name)))
				}
				Endbyte::Delimiter(b) if is_space(b) => {
					self.state = State::EndTail;
					Ok(None)
				}
				Endbyte::Delimiter(b) => Err(WFError::UnexpectedByte(
					ERRCTX_ELEMENT_FOOT,
					b,
					Some(&["'>'"]),
				)
				.into()),
				_ => Ok(None),
			},
			State::EndTail => {
				if !skip_space(r) {
					return Ok(None);
				}
				match next_byte(r) {
					Some(b'>') => {
						self.state = State::Content;
						let name = Self::take_name(&mut self.name)?;
						Ok(Some(Production::EndElement(name)))
					}
					Some(b) => Err(WFError::UnexpectedByte(
						ERRCTX_ELEMENT_FOOT,
						b,
						Some(&["'>'"]),
					)
					.into()),
					None => Ok(None),
				}
			}
		}
	}

	fn end_of_input(&mut self, at_eof: bool) -> Result<Production> {
		if !at_eof {
			return Ok(Production::EndOfBuffer);
		}
		if self.state != State::Content {
			return Err(Error::wfeof(self.state.error_context()));
		}
		match self.flush_text()? {
			Some(text) => Ok(text),
			None => Ok(Production::EndOfData),
		}
	}

	/// Release all temporary buffers
	///
	/// This is sensible to call when it is expected that no more data will be
	/// processed by the lexer for a while and the memory is better used
	/// elsewhere.
	pub fn release_temporaries(&mut self) {
		self.scratchpad.shrink_to_fit();
		self.name.shrink_to_fit();
		self.attr_name.shrink_to_fit();
		self.attrs.shrink_to_fit();
	}
}

impl Default for Lexer {
	fn default() -> Self {
		Self::new()
	}
}

impl Tokenize for Lexer {
	/// Lex bytes from `input` until a production is complete.
	///
	/// Errors are fatal: once an error has been returned, it is returned
	/// again on every subsequent call.
	fn next_production(&mut self, input: &mut &[u8], at_eof: bool) -> Result<Production> {
		if let Some(e) = self.err.as_ref() {
			return Err(e.clone());
		}
		loop {
			let step = if input.is_empty() {
				self.end_of_input(at_eof).map(Some)
			} else {
				self.lex_bytes(input)
			};
			match step {
				Ok(Some(production)) => {
					if !matches!(production, Production::EndOfBuffer) {
						self.at_start = false;
					}
					return Ok(production);
				}
				Ok(None) => (),
				Err(e) => {
					self.err = Some(e.clone());
					return Err(e);
				}
			}
		}
	}
}

impl fmt::Debug for Lexer {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("Lexer")
			.field("state", &self.state)
			.field("buffered", &self.scratchpad.len())
			.finish()
	}
}
