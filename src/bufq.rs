/*!
# Queue of input chunks

[`BufferQueue`] collects the chunks handed to a [`FeedParser`] until the
lexer gets to them. It exposes them through [`std::io::BufRead`], signalling
[`std::io::ErrorKind::WouldBlock`] when all fed data has been consumed but
the end of the stream has not been announced yet.

   [`FeedParser`]: crate::FeedParser
*/
use std::collections::VecDeque;
use std::io;

use bytes::{Buf, Bytes};

pub const ERR_NODATA: &'static str = "no data in buffer";

/// FIFO of byte chunks with an end-of-stream marker.
#[derive(Debug, Default)]
pub struct BufferQueue {
	chunks: VecDeque<Bytes>,
	len: usize,
	eof: bool,
}

impl BufferQueue {
	pub fn new() -> BufferQueue {
		Self::default()
	}

	/// Enqueue a chunk.
	///
	/// Empty chunks are ignored.
	///
	/// # Panics
	///
	/// If [`push_eof()`](Self::push_eof) has been called before.
	pub fn push<T: Into<Bytes>>(&mut self, data: T) {
		if self.eof {
			panic!("cannot push behind eof");
		}
		let data = data.into();
		if data.is_empty() {
			return;
		}
		self.len = match self.len.checked_add(data.len()) {
			Some(v) => v,
			None => panic!("length overflow"),
		};
		self.chunks.push_back(data);
	}

	/// Mark the end of the stream.
	///
	/// Once the queue has been drained after this call, reads return zero
	/// bytes instead of failing with `WouldBlock`.
	pub fn push_eof(&mut self) {
		self.eof = true;
	}

	pub fn eof_pushed(&self) -> bool {
		self.eof
	}

	/// Number of bytes which have not been consumed yet.
	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Drop all buffered data.
	///
	/// The eof marker is kept.
	pub fn clear(&mut self) {
		self.chunks.clear();
		self.len = 0;
	}

	fn nodata(&self) -> io::Result<&[u8]> {
		if self.eof {
			Ok(&[])
		} else {
			Err(io::Error::new(io::ErrorKind::WouldBlock, ERR_NODATA))
		}
	}
}

impl io::Read for BufferQueue {
	fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
		let n = {
			let src = io::BufRead::fill_buf(self)?;
			let n = src.len().min(dst.len());
			dst[..n].copy_from_slice(&src[..n]);
			n
		};
		io::BufRead::consume(self, n);
		Ok(n)
	}
}

impl io::BufRead for BufferQueue {
	fn fill_buf(&mut self) -> io::Result<&[u8]> {
		match self.chunks.front() {
			Some(front) => Ok(&front[..]),
			None => self.nodata(),
		}
	}

	fn consume(&mut self, mut amt: usize) {
		if amt > self.len {
			panic!("attempt to consume beyond end of buffer");
		}
		self.len -= amt;
		while amt > 0 {
			let front = match self.chunks.front_mut() {
				Some(v) => v,
				None => panic!("attempt to consume beyond end of buffer"),
			};
			if amt < front.len() {
				front.advance(amt);
				return;
			}
			amt -= front.len();
			self.chunks.pop_front();
		}
	}
}
