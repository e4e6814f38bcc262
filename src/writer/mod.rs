/*!
# Serializer

Writes a tree back out as XML text. The output is produced in small
fragments which are handed to a [`Sink`]; the sink decides whether to
accumulate them or to pass them on immediately.

```
use rxtree::{parse, to_xml_string};
let root = parse(b"<a xmlns='urn:x' k='v'><b>1 &lt; 2</b><!--c--></a>").unwrap();
assert_eq!(to_xml_string(&root), "<a k='v' xmlns='urn:x'><b>1 &lt; 2</b><!--c--></a>");
```

No indentation or other formatting is added. Attributes are written before
namespace declarations, each group in source order. A default namespace
declaration without URI is written as `xmlns=''` so that the enclosing
default namespace stays undeclared when the output is parsed again. A
prefixed declaration without URI is not written.
*/
use bytes::{BufMut, BytesMut};

use crate::codec;
use crate::tree::{Element, Node, NodeKind, QName};

/// Consumer of serialized XML fragments.
pub trait Sink {
	fn put_str(&mut self, s: &str);
}

impl Sink for String {
	fn put_str(&mut self, s: &str) {
		self.push_str(s);
	}
}

impl Sink for Vec<u8> {
	fn put_str(&mut self, s: &str) {
		self.extend_from_slice(s.as_bytes());
	}
}

impl Sink for BytesMut {
	fn put_str(&mut self, s: &str) {
		self.put_slice(s.as_bytes());
	}
}

impl<S: Sink + ?Sized> Sink for &mut S {
	fn put_str(&mut self, s: &str) {
		(**self).put_str(s)
	}
}

/// Adapter turning a closure into a [`Sink`].
///
/// ```
/// use rxtree::{parse, serialize, FnSink};
/// let root = parse(b"<a/>").unwrap();
/// let mut pieces = Vec::new();
/// serialize(&mut FnSink(|s: &str| pieces.push(s.to_string())), &root);
/// assert_eq!(pieces.concat(), "<a/>");
/// ```
pub struct FnSink<F>(pub F);

impl<F: FnMut(&str)> Sink for FnSink<F> {
	fn put_str(&mut self, s: &str) {
		(self.0)(s)
	}
}

fn put_qname<S: Sink + ?Sized>(sink: &mut S, name: &QName) {
	if let Some(prefix) = name.prefix.as_ref() {
		sink.put_str(prefix);
		sink.put_str(":");
	}
	sink.put_str(&name.local_name);
}

fn put_encoded<S: Sink + ?Sized>(sink: &mut S, s: &str) {
	codec::encode_with(s, |piece| sink.put_str(piece));
}

fn serialize_element<S: Sink + ?Sized>(sink: &mut S, el: &Element) {
	sink.put_str("<");
	put_qname(sink, el.name());
	for attr in el.attributes() {
		sink.put_str(" ");
		put_qname(sink, &attr.name);
		sink.put_str("='");
		put_encoded(sink, &attr.value);
		sink.put_str("'");
	}
	for decl in el.namespaces() {
		match (decl.prefix.as_ref(), decl.uri.as_ref()) {
			(Some(prefix), Some(_)) => {
				sink.put_str(" xmlns:");
				sink.put_str(prefix);
			}
			(None, _) => sink.put_str(" xmlns"),
			// a prefix cannot be unbound
			(Some(_), None) => continue,
		}
		sink.put_str("='");
		if let Some(uri) = decl.uri.as_ref() {
			put_encoded(sink, uri);
		}
		sink.put_str("'");
	}
	if el.children().is_empty() {
		sink.put_str("/>");
		return;
	}
	sink.put_str(">");
	for child in el.children() {
		serialize(sink, child);
	}
	sink.put_str("</");
	put_qname(sink, el.name());
	sink.put_str(">");
}

/// Write `node` and everything it owns to `sink`.
///
/// Attribute and namespace declaration nodes produce no output on their
/// own; they are only written as part of their element.
pub fn serialize<S: Sink + ?Sized>(sink: &mut S, node: &Node) {
	match node.kind() {
		NodeKind::Root(root) => {
			for child in root.children() {
				serialize(sink, child);
			}
		}
		NodeKind::Element(el) => serialize_element(sink, el),
		NodeKind::Text(text) => put_encoded(sink, text),
		NodeKind::Comment(text) => {
			sink.put_str("<!--");
			sink.put_str(text);
			sink.put_str("-->");
		}
		NodeKind::ProcessingInstruction(pi) => {
			sink.put_str("<?");
			sink.put_str(&pi.target);
			if !pi.data.is_empty() {
				sink.put_str(" ");
				sink.put_str(&pi.data);
			}
			sink.put_str("?>");
		}
		NodeKind::Attribute(..) | NodeKind::NamespaceDecl(..) => (),
	}
}

/// Serialize `node` into a new string.
pub fn to_xml_string(node: &Node) -> String {
	let mut out = String::new();
	serialize(&mut out, node);
	out
}
