/*!
# Resumable tree builder

The [`TreeBuilder`] consumes [`Production`]s and assembles the document tree.
It never blocks: when the tokenizer runs out of input, the builder reports
[`Step::Suspend`] and keeps every partially built element, the namespace
scope and pending text until it is fed again.

[`Suspended`] couples a builder with its tokenizer. It is the value a caller
holds on to between two chunks of input:

```
use rxtree::{Lexer, Parsed, Suspended, TreeBuilder};
let parser = Suspended::new(TreeBuilder::new(), Lexer::new());
let parser = match parser.resume(&mut &b"<a><b>hello"[..], false).unwrap() {
	Parsed::Suspended(p) => p,
	other => panic!("unexpected result: {:?}", other),
};
let root = match parser.resume(&mut &b"</b></a>"[..], true).unwrap() {
	Parsed::Finished(root, _) => root,
	other => panic!("unexpected result: {:?}", other),
};
let a = root.as_root().unwrap().root_element().unwrap().as_element().unwrap();
assert_eq!(a.text(), "hello");
```
*/
use std::mem;

pub mod common;
pub mod namespaces;

pub use common::{Production, RawAttributes, RawName, Tokenize};
pub use namespaces::NamespaceScope;

use crate::context::Context;
use crate::error::*;
use crate::tree::{NCName, Node, NodeRef, QName, RcPtr, XMLNS_XML};

/// Configuration for a [`TreeBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BuildOptions {
	/// Keep whitespace-only text as [`Text`](crate::NodeKind::Text) nodes.
	///
	/// When unset, a run of text which consists only of whitespace is
	/// dropped. Text containing anything else, and CDATA sections, are always
	/// kept.
	pub whitespace_preserve: bool,

	/// Reject names using a prefix which is not bound.
	///
	/// By default, such names are resolved to names without namespace.
	pub strict_prefixes: bool,

	/// Finish as soon as the root element closes.
	///
	/// In this mode, the builder does not wait for the end of the data and
	/// does not collect the epilogue. This allows reading a sequence of
	/// documents (or protocol stanzas) from one stream.
	pub stop_after_root: bool,
}

impl BuildOptions {
	pub fn whitespace_preserve(mut self, v: bool) -> Self {
		self.whitespace_preserve = v;
		self
	}

	pub fn strict_prefixes(mut self, v: bool) -> Self {
		self.strict_prefixes = v;
		self
	}

	pub fn stop_after_root(mut self, v: bool) -> Self {
		self.stop_after_root = v;
		self
	}
}

/// Result of feeding a single production to a [`TreeBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
	/// Feed the next production.
	Continue,
	/// The tokenizer needs more input before it can continue.
	Suspend,
	/// The document is complete; this is its root node.
	Finished(NodeRef),
	/// The data ended between two documents (fragment mode only).
	Ended,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Region {
	Prolog,
	Content,
	Epilogue,
	Done,
}

#[derive(Debug)]
struct Frame {
	name: QName,
	declared: Vec<Option<NCName>>,
	namespaces: Vec<NodeRef>,
	attributes: Vec<NodeRef>,
	children: Vec<NodeRef>,
}

/**
# Incremental document tree builder

Each call to [`TreeBuilder::feed`] handles exactly one production. Open
elements are kept on an explicit stack of frames which collect namespace
declarations, attributes and children until the matching end tag arrives;
only then is the element node created, with the back-references of its
owned nodes bound to it.

Errors are fatal: after the first error, every call to `feed` returns it
again.
*/
#[derive(Debug)]
pub struct TreeBuilder {
	opts: BuildOptions,
	ctx: RcPtr<Context>,
	scope: NamespaceScope,
	region: Region,
	stack: Vec<Frame>,
	top: Vec<NodeRef>,
	text: String,
	text_significant: bool,
	err: Option<Error>,
}

impl TreeBuilder {
	/// Create a builder with default options and a private [`Context`].
	pub fn new() -> Self {
		Self::with_options(BuildOptions::default())
	}

	pub fn with_options(opts: BuildOptions) -> Self {
		Self::with_context(opts, RcPtr::new(Context::new()))
	}

	/// Create a builder which interns namespace URIs in `ctx`.
	pub fn with_context(opts: BuildOptions, ctx: RcPtr<Context>) -> Self {
		let scope = NamespaceScope::with_xml_namespace(ctx.intern_uri(XMLNS_XML));
		Self {
			opts,
			ctx,
			scope,
			region: Region::Prolog,
			stack: Vec::new(),
			top: Vec::new(),
			text: String::new(),
			text_significant: false,
			err: None,
		}
	}

	pub fn options(&self) -> &BuildOptions {
		&self.opts
	}

	pub fn context(&self) -> &RcPtr<Context> {
		&self.ctx
	}

	/// Number of currently open elements.
	pub fn depth(&self) -> usize {
		self.stack.len()
	}

	/// Create a fresh builder for the next document, sharing options and
	/// context with this one.
	pub fn successor(&self) -> Self {
		Self::with_context(self.opts, self.ctx.clone())
	}

	fn push_node(&mut self, node: NodeRef) {
		match self.stack.last_mut() {
			Some(frame) => frame.children.push(node),
			None => self.top.push(node),
		}
	}

	fn flush_text(&mut self) {
		if self.text.is_empty() {
			return;
		}
		let text = mem::take(&mut self.text);
		let keep = mem::replace(&mut self.text_significant, false) || self.opts.whitespace_preserve;
		if keep {
			self.push_node(Node::new_text(text));
		}
	}

	fn open_element(&mut self, name: RawName, raw_attrs: RawAttributes) -> Result<()> {
		let strict = self.opts.strict_prefixes;
		let (decls, raw_attrs) = add_context(namespaces::split_attributes(raw_attrs), ERRCTX_ELEMENT)?;
		let mut declared = Vec::with_capacity(decls.len());
		let mut namespace_nodes = Vec::with_capacity(decls.len());
		for (prefix, uri) in decls.into_iter() {
			let uri = if uri.is_empty() { None } else { Some(uri) };
			namespaces::check_declaration(prefix.as_deref(), uri.as_deref())?;
			let uri = uri.map(|v| self.ctx.intern_uri(&v));
			self.scope.declare(prefix.clone(), uri.clone());
			namespace_nodes.push(Node::new_namespace_decl(prefix.clone(), uri));
			declared.push(prefix);
		}
		let qname = namespaces::resolve_raw(&self.scope, &name, strict, false, ERRCTX_ELEMENT)?;
		let mut attributes: Vec<NodeRef> = Vec::with_capacity(raw_attrs.len());
		for (attr_name, value) in raw_attrs.into_iter() {
			let attr_qname =
				namespaces::resolve_raw(&self.scope, &attr_name, strict, true, ERRCTX_ATTNAME)?;
			let duplicate = attributes.iter().any(|existing| match existing.as_attribute() {
				Some(attr) => attr.name == attr_qname,
				None => false,
			});
			if duplicate {
				return Err(WFError::DuplicateAttribute.into());
			}
			attributes.push(Node::new_attribute(attr_qname, value));
		}
		log::trace!("open element {} at depth {}", qname, self.stack.len());
		self.stack.push(Frame {
			name: qname,
			declared,
			namespaces: namespace_nodes,
			attributes,
			children: Vec::new(),
		});
		self.region = Region::Content;
		Ok(())
	}

	fn close_element(&mut self) -> Result<Step> {
		let frame = match self.stack.pop() {
			Some(v) => v,
			None => return Err(WFError::UnexpectedToken(ERRCTX_PROLOG, "end tag", None).into()),
		};
		for prefix in frame.declared.iter().rev() {
			self.scope.undeclare(prefix);
		}
		log::trace!("close element {} at depth {}", frame.name, self.stack.len());
		let element = Node::new_element(frame.name, frame.namespaces, frame.attributes, frame.children)?;
		if !self.stack.is_empty() {
			self.push_node(element);
			return Ok(Step::Continue);
		}
		self.top.push(element);
		if self.opts.stop_after_root {
			return self.finish();
		}
		log::trace!("root element closed, entering epilogue");
		self.region = Region::Epilogue;
		Ok(Step::Continue)
	}

	fn finish(&mut self) -> Result<Step> {
		self.region = Region::Done;
		let root = Node::new_root(mem::take(&mut self.top))?;
		log::debug!("document complete");
		Ok(Step::Finished(root))
	}

	fn feed_inner(&mut self, production: Production) -> Result<Step> {
		let region = self.region;
		match production {
			Production::EndOfBuffer => {
				log::trace!("suspending in {:?} at depth {}", region, self.stack.len());
				return Ok(Step::Suspend);
			}
			Production::EndOfData => {
				self.flush_text();
				return match region {
					Region::Content => Err(Error::wfeof(ERRCTX_ELEMENT)),
					Region::Prolog if self.opts.stop_after_root => {
						if !self.top.is_empty() {
							log::debug!("discarding {} nodes without root element", self.top.len());
						}
						self.region = Region::Done;
						Ok(Step::Ended)
					}
					Region::Prolog => Err(Error::wfeof(ERRCTX_PROLOG)),
					Region::Epilogue => self.finish(),
					Region::Done => Ok(Step::Ended),
				};
			}
			_ => (),
		}

		if region == Region::Done || (region == Region::Epilogue && !production_allowed_in_epilogue(&production)) {
			return Err(WFError::ContentAfterRoot(production.name()).into());
		}

		match production {
			Production::Text(s) | Production::Cdata(s) => {
				if region == Region::Prolog {
					return Err(WFError::UnexpectedToken(ERRCTX_PROLOG, "text", None).into());
				}
				self.text.push_str(&s);
				self.text_significant = true;
			}
			Production::Whitespace(s) => {
				self.text.push_str(&s);
			}
			Production::Comment(s) => {
				self.flush_text();
				self.push_node(Node::new_comment(s));
			}
			Production::ProcessingInstruction(target, data) => {
				self.flush_text();
				self.push_node(Node::new_processing_instruction(target, data));
			}
			Production::Doctype(decl) => {
				if region != Region::Prolog {
					return Err(WFError::UnexpectedToken(
						ERRCTX_ELEMENT,
						"document type declaration",
						None,
					)
					.into());
				}
				self.flush_text();
				log::debug!("discarding document type declaration {:?}", decl);
			}
			Production::StartElement(name, attrs) => {
				self.flush_text();
				self.open_element(name, attrs)?;
			}
			Production::EmptyElement(name, attrs) => {
				self.flush_text();
				self.open_element(name, attrs)?;
				return self.close_element();
			}
			Production::EndElement(name) => {
				if region == Region::Prolog {
					return Err(WFError::UnexpectedToken(ERRCTX_PROLOG, "end tag", None).into());
				}
				self.flush_text();
				let found = namespaces::resolve_raw(
					&self.scope,
					&name,
					self.opts.strict_prefixes,
					false,
					ERRCTX_ELEMENT_FOOT,
				)?;
				if let Some(frame) = self.stack.last() {
					if frame.name != found {
						return Err(WFError::ElementMismatch {
							expected: frame.name.clone(),
							found,
						}
						.into());
					}
				}
				return self.close_element();
			}
			Production::EndOfBuffer | Production::EndOfData => (),
		}
		Ok(Step::Continue)
	}

	/// Process a single production.
	pub fn feed(&mut self, production: Production) -> Result<Step> {
		if let Some(e) = self.err.as_ref() {
			return Err(e.clone());
		}
		match self.feed_inner(production) {
			Ok(step) => Ok(step),
			Err(e) => {
				self.err = Some(e.clone());
				Err(e)
			}
		}
	}

	/// Release memory held by the builder which is not needed right now.
	pub fn release_temporaries(&mut self) {
		self.text.shrink_to_fit();
		self.ctx.release_temporaries();
	}
}

impl Default for TreeBuilder {
	fn default() -> Self {
		Self::new()
	}
}

fn production_allowed_in_epilogue(p: &Production) -> bool {
	matches!(
		p,
		Production::Whitespace(..) | Production::Comment(..) | Production::ProcessingInstruction(..)
	)
}

/**
# Parse in progress

Holds a [`TreeBuilder`] together with the tokenizer state it was driven
with. Dropping a `Suspended` abandons the parse.
*/
#[derive(Debug)]
pub struct Suspended<T> {
	builder: TreeBuilder,
	tokenizer: T,
}

/// Outcome of [`Suspended::resume`].
#[derive(Debug)]
pub enum Parsed<T> {
	/// All input was consumed; resume with more.
	Suspended(Suspended<T>),
	/// A document has been completed. The tokenizer is returned so that a
	/// following document can be read from the rest of the stream.
	Finished(NodeRef, T),
	/// The data ended cleanly between two documents (fragment mode only).
	Ended(T),
}

impl<T: Tokenize> Suspended<T> {
	pub fn new(builder: TreeBuilder, tokenizer: T) -> Self {
		Self { builder, tokenizer }
	}

	/// Continue parsing with more input.
	///
	/// Bytes are consumed from the front of `input`. When a document is
	/// finished, the remaining bytes are left in `input`. Set `at_eof` if
	/// `input` holds the last bytes of the stream.
	pub fn resume(mut self, input: &mut &[u8], at_eof: bool) -> Result<Parsed<T>> {
		loop {
			let production = self.tokenizer.next_production(input, at_eof)?;
			match self.builder.feed(production)? {
				Step::Continue => (),
				Step::Suspend => return Ok(Parsed::Suspended(self)),
				Step::Finished(root) => return Ok(Parsed::Finished(root, self.tokenizer)),
				Step::Ended => return Ok(Parsed::Ended(self.tokenizer)),
			}
		}
	}

	pub fn builder(&self) -> &TreeBuilder {
		&self.builder
	}

	pub fn tokenizer(&self) -> &T {
		&self.tokenizer
	}

	pub fn into_parts(self) -> (TreeBuilder, T) {
		(self.builder, self.tokenizer)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::VecDeque;

	/// Hands out a fixed list of productions, in slices separated by
	/// `EndOfBuffer`.
	#[derive(Debug)]
	struct Script {
		productions: VecDeque<Production>,
	}

	impl Script {
		fn new(productions: Vec<Production>) -> Self {
			Self {
				productions: productions.into(),
			}
		}
	}

	impl Tokenize for Script {
		fn next_production(&mut self, input: &mut &[u8], at_eof: bool) -> Result<Production> {
			match self.productions.pop_front() {
				Some(Production::EndOfBuffer) if at_eof => self.next_production(input, at_eof),
				Some(p) => Ok(p),
				None if at_eof => Ok(Production::EndOfData),
				None => Ok(Production::EndOfBuffer),
			}
		}
	}

	fn start(name: &str, attrs: &[(&str, &str)]) -> Production {
		Production::StartElement(
			name.into(),
			attrs
				.iter()
				.map(|(n, v)| (RawName::from(*n), v.to_string()))
				.collect(),
		)
	}

	fn empty(name: &str) -> Production {
		Production::EmptyElement(name.into(), Vec::new())
	}

	fn end(name: &str) -> Production {
		Production::EndElement(name.into())
	}

	fn text(s: &str) -> Production {
		Production::Text(s.to_string())
	}

	fn ws(s: &str) -> Production {
		Production::Whitespace(s.to_string())
	}

	fn build_with(opts: BuildOptions, prods: Vec<Production>) -> Result<NodeRef> {
		let mut builder = TreeBuilder::with_options(opts);
		for p in prods.into_iter().chain(std::iter::once(Production::EndOfData)) {
			match builder.feed(p)? {
				Step::Continue | Step::Suspend => (),
				Step::Finished(root) => return Ok(root),
				Step::Ended => panic!("unexpected end"),
			}
		}
		panic!("builder did not finish")
	}

	fn build(prods: Vec<Production>) -> Result<NodeRef> {
		build_with(BuildOptions::default(), prods)
	}

	fn root_element(root: &NodeRef) -> NodeRef {
		root.as_root().unwrap().root_element().unwrap().clone()
	}

	#[test]
	fn builds_nested_elements() {
		let root = build(vec![start("a", &[("x", "1")]), start("b", &[]), text("hi"), end("b"), empty("c"), end("a")]).unwrap();
		let a = root_element(&root);
		let a_el = a.as_element().unwrap();
		assert_eq!(a_el.name(), &QName::unqualified("a"));
		assert_eq!(a_el.attribute(None, "x"), Some("1"));
		assert_eq!(a_el.children().len(), 2);
		let b = &a_el.children()[0];
		assert_eq!(b.as_element().unwrap().text(), "hi");
		assert!(RcPtr::ptr_eq(&b.parent().unwrap(), &a));
		assert!(RcPtr::ptr_eq(&a.parent().unwrap(), &root));
	}

	#[test]
	fn suspend_keeps_partial_state() {
		let mut builder = TreeBuilder::new();
		assert_eq!(builder.feed(start("a", &[])).unwrap(), Step::Continue);
		assert_eq!(builder.feed(text("he")).unwrap(), Step::Continue);
		assert_eq!(builder.feed(Production::EndOfBuffer).unwrap(), Step::Suspend);
		assert_eq!(builder.depth(), 1);
		assert_eq!(builder.feed(text("llo")).unwrap(), Step::Continue);
		assert_eq!(builder.feed(end("a")).unwrap(), Step::Continue);
		let root = match builder.feed(Production::EndOfData).unwrap() {
			Step::Finished(root) => root,
			other => panic!("unexpected result: {:?}", other),
		};
		let a = root_element(&root);
		let a_el = a.as_element().unwrap();
		assert_eq!(a_el.children().len(), 1);
		assert_eq!(a_el.children()[0].as_text(), Some("hello"));
	}

	#[test]
	fn merges_text_and_cdata() {
		let root = build(vec![start("a", &[]), text("x"), Production::Cdata("<y>".to_string()), ws(" "), end("a")]).unwrap();
		let a = root_element(&root);
		let children = a.as_element().unwrap().children();
		assert_eq!(children.len(), 1);
		assert_eq!(children[0].as_text(), Some("x<y> "));
	}

	#[test]
	fn drops_whitespace_by_default() {
		let prods = vec![ws("\n"), start("a", &[]), ws("  "), empty("b"), ws("  "), end("a"), ws("\n")];
		let root = build(prods.clone()).unwrap();
		assert_eq!(root.as_root().unwrap().children().len(), 1);
		let a = root_element(&root);
		assert_eq!(a.as_element().unwrap().children().len(), 1);

		let root = build_with(BuildOptions::default().whitespace_preserve(true), prods).unwrap();
		assert_eq!(root.as_root().unwrap().children().len(), 3);
		let a = root_element(&root);
		let children = a.as_element().unwrap().children();
		assert_eq!(children.len(), 3);
		assert_eq!(children[0].as_text(), Some("  "));
		assert!(children[1].as_element().is_some());
		assert_eq!(children[2].as_text(), Some("  "));
	}

	#[test]
	fn collects_prolog_and_epilogue() {
		let root = build(vec![
			Production::Comment("c1".to_string()),
			Production::Doctype("a".to_string()),
			Production::ProcessingInstruction("pi".into(), "data".to_string()),
			empty("a"),
			Production::Comment("c2".to_string()),
		])
		.unwrap();
		let children = root.as_root().unwrap().children();
		assert_eq!(children.len(), 4);
		assert_eq!(children[0].as_comment(), Some("c1"));
		assert_eq!(children[1].as_processing_instruction().unwrap().target.as_str(), "pi");
		assert!(children[2].as_element().is_some());
		assert_eq!(children[3].as_comment(), Some("c2"));
	}

	#[test]
	fn resolves_namespaces() {
		let root = build(vec![
			start("a", &[("xmlns", "urn:default"), ("xmlns:p", "urn:p"), ("p:x", "1"), ("y", "2")]),
			empty("p:b"),
			empty("c"),
			end("a"),
		])
		.unwrap();
		let a = root_element(&root);
		let a_el = a.as_element().unwrap();
		assert!(a_el.name().matches(Some("urn:default"), "a"));
		assert_eq!(a_el.namespace_nodes().len(), 2);
		assert_eq!(a_el.attribute(Some("urn:p"), "x"), Some("1"));
		assert_eq!(a_el.attribute(None, "y"), Some("2"));
		assert!(a_el.find_child(Some("urn:p"), "b").is_some());
		assert!(a_el.find_child(Some("urn:default"), "c").is_some());
	}

	#[test]
	fn namespace_shadowing_is_undone() {
		let root = build(vec![
			start("a", &[("xmlns:p", "NS1")]),
			start("b", &[("xmlns:p", "NS2")]),
			empty("p:x"),
			end("b"),
			empty("p:y"),
			end("a"),
		])
		.unwrap();
		let a = root_element(&root);
		let a_el = a.as_element().unwrap();
		let b = a_el.find_child(None, "b").unwrap();
		assert!(b.as_element().unwrap().find_child(Some("NS2"), "x").is_some());
		assert!(a_el.find_child(Some("NS1"), "y").is_some());
	}

	#[test]
	fn default_namespace_can_be_undeclared() {
		let root = build(vec![start("a", &[("xmlns", "urn:x")]), start("b", &[("xmlns", "")]), empty("c"), end("b"), end("a")]).unwrap();
		let a = root_element(&root);
		let b = a.as_element().unwrap().find_child(None, "b").unwrap().clone();
		let b_el = b.as_element().unwrap();
		assert!(b_el.find_child(None, "c").is_some());
		assert_eq!(b_el.namespaces().next().unwrap().uri, None);
	}

	#[test]
	fn end_tag_with_other_prefix_matches() {
		let root = build(vec![start("p:a", &[("xmlns:p", "urn:x"), ("xmlns:q", "urn:x")]), end("q:a")]);
		assert!(root.is_ok());
	}

	#[test]
	fn rejects_mismatched_end_tag() {
		match build(vec![start("a", &[]), start("b", &[]), end("c"), end("a")]) {
			Err(Error::NotWellFormed(WFError::ElementMismatch { expected, found })) => {
				assert_eq!(expected, QName::unqualified("b"));
				assert_eq!(found, QName::unqualified("c"));
			}
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn rejects_missing_root() {
		match build(vec![Production::Comment("x".to_string())]) {
			Err(Error::NotWellFormed(WFError::InvalidEof(ctx))) => assert_eq!(ctx, ERRCTX_PROLOG),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn rejects_eof_in_element() {
		match build(vec![start("a", &[])]) {
			Err(Error::NotWellFormed(WFError::InvalidEof(ctx))) => assert_eq!(ctx, ERRCTX_ELEMENT),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn rejects_content_after_root() {
		match build(vec![empty("a"), empty("b")]) {
			Err(Error::NotWellFormed(WFError::ContentAfterRoot(_))) => (),
			other => panic!("unexpected result: {:?}", other),
		}
		match build(vec![empty("a"), text("x")]) {
			Err(Error::NotWellFormed(WFError::ContentAfterRoot(_))) => (),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn rejects_doctype_in_element() {
		match build(vec![start("a", &[]), Production::Doctype("a".to_string()), end("a")]) {
			Err(Error::NotWellFormed(WFError::UnexpectedToken(ERRCTX_ELEMENT, _, _))) => (),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn rejects_text_in_prolog() {
		match build(vec![text("x"), empty("a")]) {
			Err(Error::NotWellFormed(WFError::UnexpectedToken(ERRCTX_PROLOG, _, _))) => (),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn rejects_duplicate_attribute_after_resolution() {
		match build(vec![start("a", &[("xmlns:p", "urn:x"), ("xmlns:q", "urn:x"), ("p:x", "1"), ("q:x", "2")]), end("a")]) {
			Err(Error::NotWellFormed(WFError::DuplicateAttribute)) => (),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn rejects_reserved_prefix() {
		match build(vec![empty_with("a", &[("xmlns:xmlns", "urn:x")])]) {
			Err(Error::NotNamespaceWellFormed(NWFError::ReservedNamespacePrefix)) => (),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	fn empty_with(name: &str, attrs: &[(&str, &str)]) -> Production {
		match start(name, attrs) {
			Production::StartElement(n, a) => Production::EmptyElement(n, a),
			_ => unreachable!(),
		}
	}

	#[test]
	fn xml_prefix_is_prebound() {
		let root = build(vec![empty_with("a", &[("xml:lang", "en")])]).unwrap();
		let a = root_element(&root);
		assert_eq!(a.as_element().unwrap().attribute(Some(XMLNS_XML), "lang"), Some("en"));
	}

	#[test]
	fn unbound_prefix_is_lenient_unless_strict() {
		let root = build(vec![empty("p:a")]).unwrap();
		let a = root_element(&root);
		assert_eq!(a.as_element().unwrap().name().namespace, None);
		assert_eq!(a.as_element().unwrap().name().to_string(), "p:a");

		match build_with(BuildOptions::default().strict_prefixes(true), vec![empty("p:a")]) {
			Err(Error::NotNamespaceWellFormed(NWFError::UndeclaredNamespacePrefix(_))) => (),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn errors_are_sticky() {
		let mut builder = TreeBuilder::new();
		builder.feed(start("a", &[])).unwrap();
		let e1 = builder.feed(end("b")).err().unwrap();
		let e2 = builder.feed(end("a")).err().unwrap();
		assert_eq!(e1, e2);
	}

	#[test]
	fn fragment_mode_finishes_at_root_close() {
		let opts = BuildOptions::default().stop_after_root(true);
		let mut builder = TreeBuilder::with_options(opts);
		builder.feed(start("a", &[])).unwrap();
		let root = match builder.feed(end("a")).unwrap() {
			Step::Finished(root) => root,
			other => panic!("unexpected result: {:?}", other),
		};
		assert!(root.as_root().unwrap().root_element().is_some());

		let mut next = builder.successor();
		assert_eq!(next.feed(ws("\n")).unwrap(), Step::Continue);
		assert_eq!(next.feed(Production::EndOfData).unwrap(), Step::Ended);
	}

	#[test]
	fn suspended_drives_tokenizer() {
		let script = Script::new(vec![start("a", &[]), Production::EndOfBuffer, text("x"), end("a")]);
		let parser = Suspended::new(TreeBuilder::new(), script);
		let parser = match parser.resume(&mut &b""[..], false).unwrap() {
			Parsed::Suspended(p) => p,
			other => panic!("unexpected result: {:?}", other),
		};
		assert_eq!(parser.builder().depth(), 1);
		match parser.resume(&mut &b""[..], true).unwrap() {
			Parsed::Finished(root, _) => {
				assert_eq!(root_element(&root).as_element().unwrap().text(), "x");
			}
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn suspended_returns_error_without_tree() {
		let script = Script::new(vec![start("a", &[]), end("b")]);
		let parser = Suspended::new(TreeBuilder::new(), script);
		assert!(matches!(
			parser.resume(&mut &b""[..], true),
			Err(Error::NotWellFormed(WFError::ElementMismatch { .. }))
		));
	}
}
