use crate::error::Result;
use crate::tree::NCName;

/// Lexical name as it appears in the document, possibly containing a prefix
/// (`p:local`).
pub type RawName = smartstring::alias::String;

/// Attributes of a start tag in source order, with decoded values.
pub type RawAttributes = Vec<(RawName, String)>;

/**
# Tokenizer output

A single classified piece of the document as produced by a [`Tokenize`]
implementation. Names are not resolved against namespaces yet, but
references in text and attribute values have already been expanded.
*/
#[derive(Debug, Clone, PartialEq)]
pub enum Production {
	/// `<name attr='value'>`
	StartElement(RawName, RawAttributes),
	/// `<name attr='value'/>`
	EmptyElement(RawName, RawAttributes),
	/// `</name>`
	EndElement(RawName),
	/// Character data which contains at least one non-whitespace character.
	Text(String),
	/// Contents of a `<![CDATA[...]]>` section.
	Cdata(String),
	/// Character data consisting only of XML whitespace.
	Whitespace(String),
	/// Contents of a `<!--...-->` comment.
	Comment(String),
	/// `<?target data?>`
	ProcessingInstruction(NCName, String),
	/// Raw contents of a `<!DOCTYPE ...>` declaration.
	Doctype(String),
	/// All currently available input has been consumed.
	EndOfBuffer,
	/// The input has ended and no token is pending.
	EndOfData,
}

impl Production {
	/// Return a static string describing the production, for use in error
	/// messages.
	pub fn name(&self) -> &'static str {
		match self {
			Self::StartElement(..) => "start tag",
			Self::EmptyElement(..) => "empty element tag",
			Self::EndElement(..) => "end tag",
			Self::Text(..) => "text",
			Self::Cdata(..) => "CDATA section",
			Self::Whitespace(..) => "whitespace",
			Self::Comment(..) => "comment",
			Self::ProcessingInstruction(..) => "processing instruction",
			Self::Doctype(..) => "document type declaration",
			Self::EndOfBuffer => "end of buffer",
			Self::EndOfData => "end of data",
		}
	}
}

/**
# Source of productions

Implementors turn bytes into [`Production`]s. The implementor itself is the
resumable position of the tokenizer: the tree builder never inspects it and
only hands it the next input slice.

Contract:

* Bytes are consumed from the front of `input`. Any split of a byte stream
  into consecutive slices must produce the same sequence of productions
  (apart from [`Production::EndOfBuffer`]).
* When `input` is exhausted and `at_eof` is false,
  [`Production::EndOfBuffer`] is returned. Partial tokens are kept inside the
  tokenizer.
* When `at_eof` is true and `input` is empty, pending tokens are flushed and
  then [`Production::EndOfData`] is returned; `EndOfBuffer` is never returned
  in that case. A partial token at the end of the data is an error.
*/
pub trait Tokenize {
	fn next_production(&mut self, input: &mut &[u8], at_eof: bool) -> Result<Production>;
}

impl<T: Tokenize + ?Sized> Tokenize for &mut T {
	fn next_production(&mut self, input: &mut &[u8], at_eof: bool) -> Result<Production> {
		(**self).next_production(input, at_eof)
	}
}

impl<T: Tokenize + ?Sized> Tokenize for Box<T> {
	fn next_production(&mut self, input: &mut &[u8], at_eof: bool) -> Result<Production> {
		(**self).next_production(input, at_eof)
	}
}
