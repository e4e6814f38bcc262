/*!
Drivers which connect a byte source with the [`Lexer`] and the
[`TreeBuilder`].

For non-blocking use, [`FeedParser`] accepts chunks of data as they arrive.
[`PullParser`] reads from a blocking [`io::BufRead`]. Both hand out complete
documents through the [`DocumentRead`] trait. For one-shot parsing of a
complete buffer, use [`parse`].
*/
use std::io;
use std::mem;

use bytes::Bytes;

use crate::bufq::BufferQueue;
use crate::context::Context;
use crate::error::{Error, Result, ERRCTX_PROLOG};
use crate::lexer::{Lexer, LexerOptions};
use crate::parser::{BuildOptions, Parsed, Suspended, TreeBuilder};
use crate::tree::{NodeRef, RcPtr};

/**
# Source of complete documents

This trait is implemented by the different parser frontends. It is analogous
to the [`std::io::Read`] trait, but for parsed documents instead of bytes.
*/
pub trait DocumentRead {
	/// Read the next document.
	///
	/// Returns the root node of the document once it is complete. `None` is
	/// returned when the data has ended and no further document will follow.
	///
	/// I/O errors may be retried, all other errors are fatal (and will be
	/// returned again by the parser on the next invocation without reading
	/// further data from the source).
	fn read(&mut self) -> Result<Option<NodeRef>>;

	/// Read all documents which can be produced from the data source (at
	/// this point in time).
	///
	/// The given `cb` is invoked for each document.
	fn read_all<F>(&mut self, mut cb: F) -> Result<()>
	where
		F: FnMut(NodeRef) -> (),
	{
		loop {
			match self.read()? {
				None => return Ok(()),
				Some(doc) => cb(doc),
			}
		}
	}

	/// Read all documents which can be produced from the data source (at
	/// this point in time).
	///
	/// If the data source indicates that it needs to block to read further
	/// data, `false` is returned. If the end of the data is reached
	/// successfully, `true` is returned.
	fn read_all_eof<F>(&mut self, cb: F) -> Result<bool>
	where
		F: FnMut(NodeRef) -> (),
	{
		as_eof_flag(self.read_all(cb))
	}
}

/// Convert end-of-file-ness of a result to a boolean flag.
///
/// If the result is ok, return true (EOF). If the result is not ok, but the
/// error is an I/O error indicating that the data source would have to block
/// to read further data, return false ("Ok, but not at eof yet").
///
/// All other errors are passed through.
pub fn as_eof_flag(r: Result<()>) -> Result<bool> {
	match r {
		Err(e) if e.is_would_block() => Ok(false),
		Err(e) => Err(e),
		Ok(()) => Ok(true),
	}
}

enum MachineState {
	Parsing(Suspended<Lexer>),
	Ended,
	Failed(Error),
}

/// Suspend/resume loop shared by all drivers.
///
/// A suspension is reported as a `WouldBlock` I/O error so that the driver
/// can fetch more input. In fragment mode, a finished document is followed
/// by a fresh builder which continues on the same lexer.
pub(crate) struct Machine {
	state: MachineState,
	opts: BuildOptions,
	ctx: RcPtr<Context>,
}

impl Machine {
	pub(crate) fn new(lexer_opts: LexerOptions, opts: BuildOptions, ctx: RcPtr<Context>) -> Self {
		let builder = TreeBuilder::with_context(opts, ctx.clone());
		Self {
			state: MachineState::Parsing(Suspended::new(builder, Lexer::with_options(lexer_opts))),
			opts,
			ctx,
		}
	}

	/// True if no further input will be accepted.
	pub(crate) fn is_terminal(&self) -> bool {
		!matches!(self.state, MachineState::Parsing(..))
	}

	pub(crate) fn step(&mut self, input: &mut &[u8], at_eof: bool) -> Result<Option<NodeRef>> {
		let parser = match mem::replace(&mut self.state, MachineState::Ended) {
			MachineState::Parsing(p) => p,
			MachineState::Ended => return Ok(None),
			MachineState::Failed(e) => {
				self.state = MachineState::Failed(e.clone());
				return Err(e);
			}
		};
		match parser.resume(input, at_eof) {
			Ok(Parsed::Suspended(p)) => {
				self.state = MachineState::Parsing(p);
				Err(Error::would_block())
			}
			Ok(Parsed::Finished(root, lexer)) => {
				if self.opts.stop_after_root {
					log::trace!("document finished, continuing with next fragment");
					let builder = TreeBuilder::with_context(self.opts, self.ctx.clone());
					self.state = MachineState::Parsing(Suspended::new(builder, lexer));
				} else {
					log::trace!("document finished");
				}
				Ok(Some(root))
			}
			Ok(Parsed::Ended(_)) => {
				log::trace!("stream ended between documents");
				Ok(None)
			}
			Err(e) => {
				self.state = MachineState::Failed(e.clone());
				Err(e)
			}
		}
	}

	/// Run the machine on a buffered source until a document is complete or
	/// the source cannot supply more data.
	pub(crate) fn read_from<R: io::BufRead + ?Sized>(&mut self, source: &mut R) -> Result<Option<NodeRef>> {
		loop {
			if self.is_terminal() {
				return self.step(&mut &b""[..], true);
			}
			let buf = source.fill_buf().map_err(Error::io)?;
			let at_eof = buf.is_empty();
			let mut input = buf;
			let result = self.step(&mut input, at_eof);
			let consumed = buf.len() - input.len();
			source.consume(consumed);
			match result {
				Err(e) if e.is_would_block() && !at_eof => continue,
				other => return other,
			}
		}
	}

	pub(crate) fn release_temporaries(&mut self) {
		self.state = match mem::replace(&mut self.state, MachineState::Ended) {
			MachineState::Parsing(p) => {
				let (mut builder, mut lexer) = p.into_parts();
				builder.release_temporaries();
				lexer.release_temporaries();
				MachineState::Parsing(Suspended::new(builder, lexer))
			}
			other => other,
		};
	}
}

/**
# Non-blocking parsing

The [`FeedParser`] allows parsing XML documents as they arrive in the
application, giving back control to the caller immediately when not enough
data is available for processing. This is especially useful when streaming
data from sockets.

To read documents from the `FeedParser` after feeding data, use its
[`DocumentRead`] trait. A `WouldBlock` I/O error means that more data needs
to be fed.

## Example

```
use rxtree::{FeedParser, DocumentRead};
let mut fp = FeedParser::new();
fp.feed(&b"<hello>Wor"[..]);
assert!(fp.read().err().unwrap().is_would_block());
fp.feed(&b"ld!</hello>"[..]);
fp.feed_eof();
let root = fp.read().unwrap().unwrap();
let hello = root.as_root().unwrap().root_element().unwrap().clone();
assert_eq!(hello.as_element().unwrap().text(), "World!");
```
*/
pub struct FeedParser {
	source: BufferQueue,
	machine: Machine,
}

impl FeedParser {
	/// Create a new parser with default options.
	pub fn new() -> Self {
		Self::with_options(LexerOptions::default(), BuildOptions::default())
	}

	pub fn with_options(lexer_opts: LexerOptions, opts: BuildOptions) -> Self {
		Self::with_context(lexer_opts, opts, RcPtr::new(Context::new()))
	}

	/// Create a new parser which interns namespace URIs in `ctx`.
	pub fn with_context(lexer_opts: LexerOptions, opts: BuildOptions, ctx: RcPtr<Context>) -> Self {
		Self {
			source: BufferQueue::new(),
			machine: Machine::new(lexer_opts, opts, ctx),
		}
	}

	/// Feed a chunk of data to the parser.
	///
	/// This enqueues the data for processing, but does not process it right
	/// away. To process data, call [`DocumentRead::read()`].
	///
	/// # Panics
	///
	/// If [`feed_eof()`](Self::feed_eof) has been called before.
	pub fn feed<T: Into<Bytes>>(&mut self, data: T) {
		self.source.push(data);
	}

	/// Feed the eof marker to the parser.
	///
	/// After the eof marker has been fed to the parser, no further data can
	/// be fed.
	pub fn feed_eof(&mut self) {
		self.source.push_eof();
	}

	/// Return the amount of bytes which have not been read from the buffer
	/// yet.
	pub fn buffered(&self) -> usize {
		self.source.len()
	}

	/// Return a reference to the internal buffer.
	///
	/// This can be used to force dropping of all memory in case of error
	/// conditions.
	pub fn get_buffer_mut(&mut self) -> &mut BufferQueue {
		&mut self.source
	}

	/// Release all temporary buffers
	pub fn release_temporaries(&mut self) {
		self.machine.release_temporaries();
	}
}

impl Default for FeedParser {
	fn default() -> Self {
		Self::new()
	}
}

impl DocumentRead for FeedParser {
	/// Read the next document.
	///
	/// If the buffered data is not sufficient to complete a document, an I/O
	/// error of [`std::io::ErrorKind::WouldBlock`] is returned. All buffered
	/// data has been processed in that case.
	fn read(&mut self) -> Result<Option<NodeRef>> {
		self.machine.read_from(&mut self.source)
	}
}

/**
# Blocking parsing

The [`PullParser`] reads XML documents from an [`io::BufRead`], blocking
until the source has supplied enough data (or returns an error).

## Example

```
use rxtree::{PullParser, DocumentRead};
let mut doc = &b"<hello>World!</hello>"[..];
let mut pp = PullParser::new(&mut doc);
let root = pp.read().unwrap().unwrap();
assert!(pp.read().unwrap().is_none());
```
*/
pub struct PullParser<R: io::BufRead> {
	inner: R,
	machine: Machine,
}

impl<R: io::BufRead> PullParser<R> {
	/// Create a new parser with default options, wrapping the given reader.
	pub fn new(inner: R) -> Self {
		Self::with_options(inner, LexerOptions::default(), BuildOptions::default())
	}

	pub fn with_options(inner: R, lexer_opts: LexerOptions, opts: BuildOptions) -> Self {
		Self::with_context(inner, lexer_opts, opts, RcPtr::new(Context::new()))
	}

	pub fn with_context(
		inner: R,
		lexer_opts: LexerOptions,
		opts: BuildOptions,
		ctx: RcPtr<Context>,
	) -> Self {
		Self {
			inner,
			machine: Machine::new(lexer_opts, opts, ctx),
		}
	}

	/// Access the inner BufRead
	pub fn get_inner(&self) -> &R {
		&self.inner
	}

	/// Access the inner BufRead, mutably
	pub fn get_inner_mut(&mut self) -> &mut R {
		&mut self.inner
	}

	pub fn into_inner(self) -> R {
		self.inner
	}

	/// Release all temporary buffers
	pub fn release_temporaries(&mut self) {
		self.machine.release_temporaries();
	}
}

impl<R: io::BufRead> DocumentRead for PullParser<R> {
	/// Read the next document.
	///
	/// All I/O errors from the source are passed on without modification.
	fn read(&mut self) -> Result<Option<NodeRef>> {
		self.machine.read_from(&mut self.inner)
	}
}

/// Parse a complete document held in memory.
///
/// ```
/// let root = rxtree::parse(b"<a><b/></a>").unwrap();
/// assert_eq!(rxtree::to_xml_string(&root), "<a><b/></a>");
/// ```
pub fn parse(data: &[u8]) -> Result<NodeRef> {
	parse_with_options(data, LexerOptions::default(), BuildOptions::default())
}

/// Parse a complete document held in memory with the given options.
///
/// In fragment mode, the first document is returned and the rest of the data
/// is ignored.
pub fn parse_with_options(data: &[u8], lexer_opts: LexerOptions, opts: BuildOptions) -> Result<NodeRef> {
	let mut machine = Machine::new(lexer_opts, opts, RcPtr::new(Context::new()));
	let mut input = data;
	match machine.step(&mut input, true)? {
		Some(root) => Ok(root),
		None => Err(Error::wfeof(ERRCTX_PROLOG)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::{WFError, ERRCTX_ELEMENT};

	fn element_name(root: &NodeRef) -> String {
		let el = root.as_root().unwrap().root_element().unwrap();
		el.as_element().unwrap().name().local_name.to_string()
	}

	#[test]
	fn feed_parser_blocks_until_document_complete() {
		let mut fp = FeedParser::new();
		fp.feed(&b"<a><b>"[..]);
		assert!(fp.read().err().unwrap().is_would_block());
		assert_eq!(fp.buffered(), 0);
		fp.feed(&b"</b></a>"[..]);
		// the epilogue only ends with the data
		assert!(fp.read().err().unwrap().is_would_block());
		fp.feed_eof();
		let root = fp.read().unwrap().unwrap();
		assert_eq!(element_name(&root), "a");
		assert!(fp.read().unwrap().is_none());
	}

	#[test]
	fn feed_parser_read_all_eof() {
		let mut fp = FeedParser::new();
		fp.feed(b"<a/>".to_vec());
		let mut docs = Vec::new();
		assert_eq!(fp.read_all_eof(|doc| docs.push(doc)).unwrap(), false);
		fp.feed_eof();
		assert_eq!(fp.read_all_eof(|doc| docs.push(doc)).unwrap(), true);
		assert_eq!(docs.len(), 1);
	}

	#[test]
	fn feed_parser_reads_fragments() {
		let mut fp = FeedParser::with_options(
			LexerOptions::default(),
			BuildOptions::default().stop_after_root(true),
		);
		fp.feed(&b"<a/>\n<b>x</b><c"[..]);
		let mut names = Vec::new();
		assert_eq!(fp.read_all_eof(|doc| names.push(element_name(&doc))).unwrap(), false);
		assert_eq!(names, vec!["a", "b"]);
		fp.feed(&b"/>"[..]);
		fp.feed_eof();
		assert_eq!(fp.read_all_eof(|doc| names.push(element_name(&doc))).unwrap(), true);
		assert_eq!(names, vec!["a", "b", "c"]);
	}

	#[test]
	fn feed_parser_errors_are_sticky() {
		let mut fp = FeedParser::new();
		fp.feed(&b"<a></b>"[..]);
		let e1 = fp.read().err().unwrap();
		assert!(matches!(e1, Error::NotWellFormed(WFError::ElementMismatch { .. })));
		fp.feed(&b"</a>"[..]);
		assert_eq!(fp.read().err().unwrap(), e1);
	}

	#[test]
	fn feed_parser_reports_eof_in_element() {
		let mut fp = FeedParser::new();
		fp.feed(&b"<a>"[..]);
		fp.feed_eof();
		match fp.read() {
			Err(Error::NotWellFormed(WFError::InvalidEof(ctx))) => assert_eq!(ctx, ERRCTX_ELEMENT),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn pull_parser_reads_through_small_buffer() {
		let doc = &b"<a xmlns='urn:x'><b>text</b><!-- c --></a>"[..];
		let mut pp = PullParser::new(io::BufReader::with_capacity(3, doc));
		let root = pp.read().unwrap().unwrap();
		assert_eq!(root, parse(doc).unwrap());
		assert!(pp.read().unwrap().is_none());
	}

	#[test]
	fn pull_parser_passes_io_errors() {
		struct Failing;

		impl io::Read for Failing {
			fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
				Err(io::Error::new(io::ErrorKind::Other, "nope"))
			}
		}

		let mut pp = PullParser::new(io::BufReader::new(Failing));
		match pp.read() {
			Err(Error::IO(e)) => assert_eq!(e.kind(), io::ErrorKind::Other),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn parse_rejects_empty_input() {
		match parse(b"") {
			Err(Error::NotWellFormed(WFError::InvalidEof(ctx))) => assert_eq!(ctx, ERRCTX_PROLOG),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn parse_in_fragment_mode_without_document_is_eof() {
		let opts = BuildOptions::default().stop_after_root(true);
		assert!(parse_with_options(b"  ", LexerOptions::default(), opts).is_err());
	}

	#[test]
	fn release_temporaries_keeps_state() {
		let mut fp = FeedParser::new();
		fp.feed(&b"<a>te"[..]);
		assert!(fp.read().err().unwrap().is_would_block());
		fp.release_temporaries();
		fp.feed(&b"xt</a>"[..]);
		fp.feed_eof();
		let root = fp.read().unwrap().unwrap();
		let a = root.as_root().unwrap().root_element().unwrap().clone();
		assert_eq!(a.as_element().unwrap().text(), "text");
	}
}
