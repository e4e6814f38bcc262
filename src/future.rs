use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use tokio::io::AsyncBufRead;

#[cfg(feature = "stream")]
use futures_core::stream::Stream;

use crate::context::Context;
use crate::driver::Machine;
use crate::error::{Error, Result};
use crate::lexer::LexerOptions;
use crate::parser::BuildOptions;
use crate::tree::{NodeRef, RcPtr};

use pin_project_lite::pin_project;

pin_project! {
	pub struct ReadDocument<T: ?Sized>{
		#[pin]
		inner: T,
	}
}

impl<T: AsyncDocumentRead + Unpin> Future for ReadDocument<T> {
	type Output = Result<Option<NodeRef>>;

	fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
		self.project().inner.poll_read(cx)
	}
}

pin_project! {
	pub struct ReadAll<T: ?Sized, F> {
		cb: F,
		#[pin]
		inner: T,
	}
}

impl<T: AsyncDocumentRead + Unpin, F: FnMut(NodeRef) -> () + Send> Future for ReadAll<T, F> {
	type Output = Result<()>;

	fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Result<()>> {
		let mut this = self.project();
		loop {
			match this.inner.as_mut().poll_read(cx) {
				Poll::Ready(Ok(Some(doc))) => {
					(this.cb)(doc);
				}
				Poll::Ready(Ok(None)) => return Poll::Ready(Ok(())),
				Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
				Poll::Pending => return Poll::Pending,
			}
		}
	}
}

/**
Asynchronous source of complete documents

It is analogous to the [`tokio::io::AsyncRead`] trait, but for parsed
documents instead of bytes.

Usually, one interacts with this trait through the helpers available in
[`AsyncDocumentReadExt`].
*/
pub trait AsyncDocumentRead {
	/// Poll for the next complete document.
	fn poll_read(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Result<Option<NodeRef>>>;
}

impl<T: AsyncDocumentRead + Unpin + ?Sized> AsyncDocumentRead for &mut T {
	fn poll_read(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Result<Option<NodeRef>>> {
		let this: &mut &mut T = Pin::into_inner(self);
		let this: &mut T = *this;
		Pin::new(this).poll_read(cx)
	}
}

/**
Helper trait for asynchronous sources of complete documents

This helper trait is automatically implemented for all [`AsyncDocumentRead`].
*/
pub trait AsyncDocumentReadExt: AsyncDocumentRead {
	/// Read the next document.
	///
	/// If the data has ended without further document, `None` is returned.
	///
	/// Equivalent to:
	///
	/// ```ignore
	/// async fn read(&mut self) -> Result<Option<NodeRef>>;
	/// ```
	fn read(&mut self) -> ReadDocument<&mut Self> {
		ReadDocument { inner: self }
	}

	/// Read all documents until the data ends, invoking `cb` for each.
	///
	/// Equivalent to:
	///
	/// ```ignore
	///     async fn read_all<F>(&mut self, mut cb: F) -> Result<()>
	///            where F: FnMut(NodeRef) -> () + Send
	/// ```
	fn read_all<F>(&mut self, cb: F) -> ReadAll<&mut Self, F> {
		ReadAll { inner: self, cb }
	}
}

impl<T: AsyncDocumentRead + ?Sized> AsyncDocumentReadExt for T {}

pin_project! {
	/**
	# Tokio-compatible asynchronous parser

	The [`AsyncParser`] reads XML documents from a
	[`tokio::io::AsyncBufRead`]. It operates like the
	[`PullParser`](crate::PullParser), but instead of blocking the task, it
	yields control to other tasks while the source has no data available.

	## Example

	```
	use rxtree::{AsyncParser, AsyncDocumentReadExt};
	# tokio_test::block_on(async {
	let mut doc = &b"<hello>World!</hello>"[..];
	let mut pp = AsyncParser::new(&mut doc);
	let root = pp.read().await.unwrap().unwrap();
	let hello = root.as_root().unwrap().root_element().unwrap().clone();
	assert_eq!(hello.as_element().unwrap().text(), "World!");
	# })
	```
	*/
	pub struct AsyncParser<R>{
		#[pin]
		inner: R,
		machine: Machine,
	}
}

impl<R: AsyncBufRead> AsyncParser<R> {
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

	/// Access the inner AsyncBufRead
	pub fn get_inner(&self) -> &R {
		&self.inner
	}

	/// Access the inner AsyncBufRead, mutably
	pub fn get_inner_mut(&mut self) -> &mut R {
		&mut self.inner
	}

	pub fn into_inner(self) -> R {
		self.inner
	}

	/// Release temporary buffers and other ephemeral allocations.
	#[inline(always)]
	pub fn release_temporaries(&mut self) {
		self.machine.release_temporaries();
	}
}

impl<R: AsyncBufRead> AsyncDocumentRead for AsyncParser<R> {
	fn poll_read(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Result<Option<NodeRef>>> {
		let mut this = self.project();
		loop {
			if this.machine.is_terminal() {
				return Poll::Ready(this.machine.step(&mut &b""[..], true));
			}
			let buf = match this.inner.as_mut().poll_fill_buf(cx) {
				// a.k.a. WouldBlock
				Poll::Pending => return Poll::Pending,
				Poll::Ready(Ok(buf)) => buf,
				Poll::Ready(Err(e)) => return Poll::Ready(Err(Error::io(e))),
			};
			let at_eof = buf.is_empty();
			let mut input = buf;
			let result = this.machine.step(&mut input, at_eof);
			let consumed = buf.len() - input.len();
			this.inner.as_mut().consume(consumed);
			match result {
				// the machine consumed everything; ask the source for more
				Err(e) if e.is_would_block() && !at_eof => continue,
				other => return Poll::Ready(other),
			}
		}
	}
}

#[cfg(feature = "stream")]
#[cfg_attr(docsrs, doc(cfg(all(feature = "stream", feature = "async"))))]
impl<R: AsyncBufRead> Stream for AsyncParser<R> {
	type Item = Result<NodeRef>;

	fn poll_next(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
		match self.poll_read(cx) {
			Poll::Pending => Poll::Pending,
			Poll::Ready(Ok(Some(v))) => Poll::Ready(Some(Ok(v))),
			Poll::Ready(Ok(None)) => Poll::Ready(None),
			Poll::Ready(Err(e)) => Poll::Ready(Some(Err(e))),
		}
	}
}
