/*!
# Incremental XML tree building

This crate parses XML 1.0 documents into an in-memory tree and writes such
trees back out. Parsing is incremental and never blocks: data can be fed in
arbitrary chunks (for example as it arrives on a socket), and the parser
keeps all partially built elements and the namespace scope until more data
arrives.

## Features

* Namespace resolution, with shadowing of prefixes by nested elements
* Resumable parsing at any byte offset
* Fragment mode for reading a sequence of documents (protocol stanzas) from
  one stream
* Serialization through a pluggable [`Sink`]
* UTF-8 input only
* DOCTYPE declarations are skipped, not interpreted
* Can be driven push- and pull-based
* Tokio-based asynchronicity supported via the `async` feature and [`AsyncParser`].

## Example

```
use rxtree::DocumentRead;
let doc = b"<?xml version='1.0'?><hello xmlns='urn:example'>World!</hello>";
let mut fp = rxtree::FeedParser::new();
fp.feed(doc.to_vec());
fp.feed_eof();
let mut docs = Vec::new();
let result = fp.read_all_eof(|root| docs.push(root));
// true indicates eof
assert_eq!(result.unwrap(), true);
let hello = docs[0].as_root().unwrap().root_element().unwrap().clone();
assert!(hello.as_element().unwrap().name().matches(Some("urn:example"), "hello"));
assert_eq!(rxtree::to_xml_string(&docs[0]), "<hello xmlns='urn:example'>World!</hello>");
```

## High-level usage

### Push-based usage

The [`FeedParser`] allows to push bits of XML into the parser as they arrive
in the application and collect the documents once they are complete.

### Pull-based usage

If the parser should block while waiting for more data to arrive, a
[`PullParser`] can be used instead. The `PullParser` requires a source which
implements [`std::io::BufRead`].

### Usage with Tokio

Tokio is supported with the `async` feature. It offers the [`AsyncParser`]
and the [`AsyncDocumentRead`] trait, which work similar to the `PullParser`.
Instead of blocking, however, the async parser will yield control to other
tasks.

## Low-level usage

The [`TreeBuilder`] consumes one [`Production`] at a time from any
[`Tokenize`] implementation. [`Suspended`] pairs the two and is the value to
hold on to between chunks of input; see the [`parser`] module.
*/
pub mod codec;
mod bufq;
mod context;
pub mod driver;
pub mod error;
#[cfg(feature = "async")]
mod future;
pub mod lexer;
pub mod parser;
pub mod tree;
pub mod writer;


#[doc(inline)]
pub use bufq::BufferQueue;
#[doc(inline)]
pub use codec::{decode, decode_with, encode, EntityResolver};
pub use context::Context;
#[doc(inline)]
pub use driver::{as_eof_flag, parse, parse_with_options, DocumentRead, FeedParser, PullParser};
#[doc(inline)]
pub use error::{Error, Result};
#[cfg(feature = "async")]
#[doc(inline)]
pub use future::{AsyncDocumentRead, AsyncDocumentReadExt, AsyncParser, ReadAll, ReadDocument};
#[doc(inline)]
pub use lexer::{Lexer, LexerOptions};
#[doc(inline)]
pub use parser::{BuildOptions, Parsed, Production, Step, Suspended, Tokenize, TreeBuilder};
#[doc(inline)]
pub use tree::{
	Attribute, Element, NCName, NamespaceDecl, NamespaceName, Node, NodeKind, NodeRef,
	ProcessingInstruction, QName, RcPtr, Root, XMLNS_XML, XMLNS_XMLNS,
};
#[doc(inline)]
pub use writer::{serialize, to_xml_string, FnSink, Sink};

pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");
