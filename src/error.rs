/*!
# Error types

This module holds the error types returned by the various functions of this
crate.

All errors except [`Error::IO`] are terminal for the parse in which they
occur: the tree builder never recovers from a malformed document and never
hands out a partial tree.
*/
use std::error;
use std::fmt;
use std::io;
use std::ops::Deref;
use std::result::Result as StdResult;
use std::sync::Arc;

use crate::tree::QName;

pub const ERRCTX_UNKNOWN: &'static str = "in unknown context";
pub const ERRCTX_TEXT: &'static str = "in text node";
pub const ERRCTX_ATTVAL: &'static str = "in attribute value";
pub const ERRCTX_NAME: &'static str = "in name";
pub const ERRCTX_ATTNAME: &'static str = "in attribute name";
pub const ERRCTX_ELEMENT: &'static str = "in element";
pub const ERRCTX_ELEMENT_FOOT: &'static str = "in element footer";
pub const ERRCTX_COMMENT: &'static str = "in comment";
pub const ERRCTX_CDATA_SECTION: &'static str = "in CDATA section";
pub const ERRCTX_PI: &'static str = "in processing instruction";
pub const ERRCTX_DOCTYPE: &'static str = "in document type declaration";
pub const ERRCTX_MARKUP: &'static str = "in markup declaration";
pub const ERRCTX_REF: &'static str = "in entity or character reference";
pub const ERRCTX_PROLOG: &'static str = "before root element";

/// Violation of a well-formedness constraint or the XML 1.0 grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum WFError {
	/// End of input encountered while more data was required.
	///
	/// The contents describe where the input ended.
	InvalidEof(&'static str),

	/// Byte which was not expected at that point in the grammar.
	///
	/// The contents are implementation details.
	UnexpectedByte(&'static str, u8, Option<&'static [&'static str]>),

	/// Generalized invalid syntactic construct which does not fit into any
	/// of the other categories.
	InvalidSyntax(&'static str),

	/// Production was not expected at that point in the document.
	///
	/// Context, production encountered, expected productions.
	UnexpectedToken(&'static str, &'static str, Option<&'static [&'static str]>),

	/// Something other than a comment, processing instruction or
	/// whitespace was found after the root element was closed.
	ContentAfterRoot(&'static str),

	/// Attribute (or namespace declaration) specified more than once on the
	/// same element.
	DuplicateAttribute,

	/// Ending tag name does not match the opening tag.
	ElementMismatch {
		/// Name of the element which is currently open.
		expected: QName,
		/// Name found in the end tag.
		found: QName,
	},
}

impl error::Error for WFError {}

impl ErrorWithContext for WFError {
	fn with_context(self, ctx: &'static str) -> WFError {
		match self {
			WFError::InvalidEof(_) => WFError::InvalidEof(ctx),
			WFError::UnexpectedByte(_, b, alt) => WFError::UnexpectedByte(ctx, b, alt),
			WFError::UnexpectedToken(_, tok, alt) => WFError::UnexpectedToken(ctx, tok, alt),
			other => other,
		}
	}
}

fn write_options<'f>(f: &mut fmt::Formatter<'f>, opts: &[&str]) -> fmt::Result {
	if opts.len() == 1 {
		f.write_str(opts[0])?;
		return f.write_str(")");
	}
	f.write_str("one of: ")?;
	for (i, opt) in opts.iter().enumerate() {
		if i > 0 {
			f.write_str(", ")?;
		}
		f.write_str(opt)?;
	}
	f.write_str(")")
}

impl fmt::Display for WFError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			WFError::InvalidEof(ctx) => write!(f, "unexpected end of input {}", ctx),
			WFError::UnexpectedByte(ctx, b, Some(opts)) if opts.len() > 0 => {
				write!(f, "0x{:x} not allowed {} (expected ", *b, ctx)?;
				write_options(f, opts)
			}
			WFError::UnexpectedByte(ctx, b, _) => write!(f, "0x{:x} not allowed {}", *b, ctx),
			WFError::InvalidSyntax(msg) => write!(f, "invalid syntax: {}", msg),
			WFError::UnexpectedToken(ctx, tok, Some(opts)) if opts.len() > 0 => {
				write!(f, "unexpected {} {} (expected ", tok, ctx)?;
				write_options(f, opts)
			}
			WFError::UnexpectedToken(ctx, tok, _) => write!(f, "unexpected {} {}", tok, ctx),
			WFError::ContentAfterRoot(tok) => {
				write!(f, "content not allowed after root element (found {})", tok)
			}
			WFError::DuplicateAttribute => f.write_str("duplicate attribute"),
			WFError::ElementMismatch { expected, found } => write!(
				f,
				"start and end tag do not match (expected </{}>, found </{}>)",
				expected, found
			),
		}
	}
}

/// Violation of a namespace-well-formedness constraint or the Namespaces for
/// XML 1.0 grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum NWFError {
	/// More than one colon encountered in a name.
	MultiColonName(&'static str),

	/// One side of the colon in a name was empty.
	EmptyNamePart(&'static str),

	/// Use of an undeclared namespace prefix.
	///
	/// Only returned if the builder was configured with
	/// [`BuildOptions::strict_prefixes`](crate::BuildOptions::strict_prefixes).
	UndeclaredNamespacePrefix(&'static str),

	/// Attempt to redefine a reserved namespace prefix, or to bind one of the
	/// reserved namespace URIs to another prefix.
	ReservedNamespacePrefix,

	/// Prefixed namespace declaration with an empty URI (`xmlns:p=''`).
	EmptyNamespaceUri,
}

impl error::Error for NWFError {}

impl ErrorWithContext for NWFError {
	fn with_context(self, ctx: &'static str) -> NWFError {
		match self {
			Self::MultiColonName(_) => Self::MultiColonName(ctx),
			Self::EmptyNamePart(_) => Self::EmptyNamePart(ctx),
			Self::UndeclaredNamespacePrefix(_) => Self::UndeclaredNamespacePrefix(ctx),
			other => other,
		}
	}
}

impl fmt::Display for NWFError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::MultiColonName(ctx) => write!(f, "more than one colon {}", ctx),
			Self::EmptyNamePart(ctx) => {
				write!(f, "empty string on one side of the colon {}", ctx)
			}
			Self::UndeclaredNamespacePrefix(ctx) => {
				write!(f, "use of undeclared namespace prefix {}", ctx)
			}
			Self::ReservedNamespacePrefix => f.write_str("reserved namespace prefix"),
			Self::EmptyNamespaceUri => f.write_str("empty namespace URI for prefix"),
		}
	}
}

/// Malformed reference encountered while decoding text or attribute values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
	/// `&name;` where `name` is neither predefined nor known to the
	/// configured entity resolver.
	UnknownEntity(String),

	/// A `&` without a terminating `;`.
	UnterminatedReference,

	/// A character reference which does not denote a valid XML character.
	InvalidCharRef(String),
}

impl error::Error for DecodeError {}

impl fmt::Display for DecodeError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::UnknownEntity(name) => write!(f, "use of undeclared entity '{}'", name),
			Self::UnterminatedReference => f.write_str("unterminated reference"),
			Self::InvalidCharRef(text) => write!(f, "invalid character reference '{}'", text),
		}
	}
}

/// Misuse of the tree construction API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureError {
	/// A root node was passed as a child of another node.
	RootAsChild,

	/// A node which is already attached to a parent was passed as a child
	/// again.
	AlreadyOwned,

	/// A node was passed in a sequence which cannot hold its kind (for
	/// instance a text node in the attribute list of an element).
	MisplacedNode(&'static str),
}

impl error::Error for StructureError {}

impl fmt::Display for StructureError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::RootAsChild => f.write_str("a root node cannot be the child of another node"),
			Self::AlreadyOwned => f.write_str("node is already owned by another parent"),
			Self::MisplacedNode(kind) => write!(f, "{} node cannot be placed there", kind),
		}
	}
}

/// [`std::sync::Arc`]-based around [`std::io::Error`] to allow cloning.
#[derive(Clone)]
pub struct IOErrorWrapper(Arc<io::Error>);

impl IOErrorWrapper {
	fn wrap(e: io::Error) -> IOErrorWrapper {
		IOErrorWrapper(Arc::new(e))
	}
}

impl fmt::Debug for IOErrorWrapper {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		fmt::Debug::fmt(&**self, f)
	}
}

impl fmt::Display for IOErrorWrapper {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		fmt::Display::fmt(&**self, f)
	}
}

impl PartialEq for IOErrorWrapper {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl Deref for IOErrorWrapper {
	type Target = io::Error;

	fn deref(&self) -> &io::Error {
		&*self.0
	}
}

/// Error types which may be returned from the tree builder, the lexer or the
/// drivers.
///
/// With the exception of [`Error::IO`], all errors are fatal and will be
/// returned indefinitely from a driver after the first encounter.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
	/// An I/O error was encountered while reading from a byte source.
	///
	/// I/O errors are not fatal and may be retried. Drivers use
	/// [`std::io::ErrorKind::WouldBlock`] to signal that more input is
	/// needed.
	IO(IOErrorWrapper),

	/// The input bytes of a token were not valid UTF-8.
	InvalidUtf8,

	/// A violation of the XML 1.0 grammar or a well-formedness constraint.
	NotWellFormed(WFError),

	/// A violation of the Namespaces in XML 1.0 grammar or a
	/// namespace-well-formedness constraint.
	NotNamespaceWellFormed(NWFError),

	/// A malformed or unknown reference in text or an attribute value.
	Decode(DecodeError),

	/// Misuse of the node construction API.
	Structure(StructureError),

	/// A configured limit was exceeded.
	///
	/// The string indicates the context and should not be interpreted by user
	/// code.
	RestrictedXml(&'static str),
}

pub type Result<T> = StdResult<T, Error>;

pub(crate) trait ErrorWithContext {
	fn with_context(self, ctx: &'static str) -> Self;
}

pub(crate) fn add_context<T>(r: Result<T>, ctx: &'static str) -> Result<T> {
	r.map_err(|e| e.with_context(ctx))
}

impl Error {
	pub fn io(e: io::Error) -> Error {
		Error::IO(IOErrorWrapper::wrap(e))
	}

	pub(crate) fn wfeof(ctx: &'static str) -> Error {
		Error::NotWellFormed(WFError::InvalidEof(ctx))
	}

	pub(crate) fn would_block() -> Error {
		Error::io(io::Error::new(io::ErrorKind::WouldBlock, "more input required"))
	}

	/// Return true if this is an I/O error indicating that the source would
	/// have to block for more data.
	pub fn is_would_block(&self) -> bool {
		match self {
			Error::IO(e) => e.kind() == io::ErrorKind::WouldBlock,
			_ => false,
		}
	}
}

impl ErrorWithContext for Error {
	fn with_context(self, ctx: &'static str) -> Self {
		match self {
			Self::NotWellFormed(wf) => Self::NotWellFormed(wf.with_context(ctx)),
			Self::NotNamespaceWellFormed(nwf) => {
				Self::NotNamespaceWellFormed(nwf.with_context(ctx))
			}
			other => other,
		}
	}
}

impl From<io::Error> for Error {
	fn from(e: io::Error) -> Error {
		Error::io(e)
	}
}

impl From<WFError> for Error {
	fn from(e: WFError) -> Error {
		Error::NotWellFormed(e)
	}
}

impl From<NWFError> for Error {
	fn from(e: NWFError) -> Error {
		Error::NotNamespaceWellFormed(e)
	}
}

impl From<DecodeError> for Error {
	fn from(e: DecodeError) -> Error {
		Error::Decode(e)
	}
}

impl From<StructureError> for Error {
	fn from(e: StructureError) -> Error {
		Error::Structure(e)
	}
}

impl fmt::Display for Error {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Error::NotWellFormed(e) => write!(f, "not-well-formed: {}", e),
			Error::NotNamespaceWellFormed(e) => write!(f, "not namespace-well-formed: {}", e),
			Error::Decode(e) => write!(f, "decode error: {}", e),
			Error::Structure(e) => write!(f, "invalid tree structure: {}", e),
			Error::RestrictedXml(msg) => write!(f, "restricted xml: {}", msg),
			Error::InvalidUtf8 => f.write_str("invalid utf-8 in input"),
			Error::IO(e) => write!(f, "I/O error: {}", e),
		}
	}
}

impl error::Error for Error {
	fn source(&self) -> Option<&(dyn error::Error + 'static)> {
		match self {
			Error::IO(e) => Some(&**e),
			Error::NotWellFormed(e) => Some(e),
			Error::NotNamespaceWellFormed(e) => Some(e),
			Error::Decode(e) => Some(e),
			Error::Structure(e) => Some(e),
			Error::RestrictedXml(_) | Error::InvalidUtf8 => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn eof_error_mentions_unexpected_end_of_input() {
		let e = Error::wfeof(ERRCTX_PROLOG);
		assert_eq!(
			e.to_string(),
			"not-well-formed: unexpected end of input before root element"
		);
	}

	#[test]
	fn with_context_replaces_context_of_eof() {
		let e = Error::wfeof(ERRCTX_UNKNOWN).with_context(ERRCTX_COMMENT);
		assert_eq!(e, Error::NotWellFormed(WFError::InvalidEof(ERRCTX_COMMENT)));
	}

	#[test]
	fn with_context_leaves_decode_errors_alone() {
		let e = Error::Decode(DecodeError::UnterminatedReference).with_context(ERRCTX_TEXT);
		assert_eq!(e, Error::Decode(DecodeError::UnterminatedReference));
	}

	#[test]
	fn unexpected_byte_lists_options() {
		let e = WFError::UnexpectedByte(ERRCTX_ELEMENT, b'!', Some(&["'>'", "'/>'"]));
		assert_eq!(
			e.to_string(),
			"0x21 not allowed in element (expected one of: '>', '/>')"
		);
	}

	#[test]
	fn would_block_is_detected() {
		assert!(Error::would_block().is_would_block());
		assert!(!Error::InvalidUtf8.is_would_block());
	}
}
