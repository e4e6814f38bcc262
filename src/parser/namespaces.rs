/*!
# Namespace resolution

This module holds the scope of namespace bindings in effect while a document
is being built, the classification of raw attributes into namespace
declarations and ordinary attributes, and the resolution of lexical names to
[`QName`]s.
*/
use std::collections::HashMap;

use crate::error::{add_context, NWFError, Result, ERRCTX_UNKNOWN};
use crate::tree::{NCName, NamespaceName, QName, XMLNS_XML, XMLNS_XMLNS};

use super::common::{RawAttributes, RawName};

const PREFIX_XML: &'static str = "xml";
const PREFIX_XMLNS: &'static str = "xmlns";

/**
# Namespace scope stack

Maps each prefix (or `None` for the default namespace) to the stack of URIs
bound to it by the currently open elements. The most recent binding wins on
lookup; undeclaring restores the previous one.

A `None` URI in the default namespace stack represents `xmlns=''`, which
removes the default namespace for the element and its descendants.

The `xml` prefix is bound to [`XMLNS_XML`] in every fresh scope.
*/
#[derive(Debug, Clone)]
pub struct NamespaceScope {
	bindings: HashMap<Option<NCName>, Vec<Option<NamespaceName>>>,
}

impl NamespaceScope {
	pub fn new() -> Self {
		Self::with_xml_namespace(XMLNS_XML.into())
	}

	/// Create a scope, pre-binding the `xml` prefix to the given (usually
	/// interned) URI.
	pub fn with_xml_namespace(xml: NamespaceName) -> Self {
		let mut bindings = HashMap::new();
		bindings.insert(Some(NCName::from(PREFIX_XML)), vec![Some(xml)]);
		Self { bindings }
	}

	/// Push a binding for `prefix`, shadowing any previous one.
	pub fn declare(&mut self, prefix: Option<NCName>, uri: Option<NamespaceName>) {
		self.bindings.entry(prefix).or_insert_with(Vec::new).push(uri);
	}

	/// Pop the most recent binding of `prefix` and return it.
	///
	/// Returns `None` if the prefix was not bound.
	pub fn undeclare(&mut self, prefix: &Option<NCName>) -> Option<Option<NamespaceName>> {
		let stack = self.bindings.get_mut(prefix)?;
		let popped = stack.pop();
		if stack.is_empty() {
			self.bindings.remove(prefix);
		}
		popped
	}

	/// Return the URI currently bound to `prefix`.
	///
	/// `None` means that the prefix is unbound, or that the default namespace
	/// has been undeclared.
	pub fn resolve(&self, prefix: Option<&str>) -> Option<&NamespaceName> {
		let key = prefix.map(NCName::from);
		self.bindings
			.get(&key)
			.and_then(|stack| stack.last())
			.and_then(|uri| uri.as_ref())
	}

	/// Test whether `prefix` has a binding (which may be an undeclaration).
	pub fn is_bound(&self, prefix: Option<&str>) -> bool {
		let key = prefix.map(NCName::from);
		self.bindings.contains_key(&key)
	}
}

impl Default for NamespaceScope {
	fn default() -> Self {
		Self::new()
	}
}

/// Split a lexical name at its colon.
pub fn split_name(name: &str) -> Result<(Option<NCName>, NCName)> {
	let mut parts = name.splitn(3, ':');
	let first = parts.next().unwrap_or("");
	let second = parts.next();
	if parts.next().is_some() {
		return Err(NWFError::MultiColonName(ERRCTX_UNKNOWN).into());
	}
	match second {
		None if first.is_empty() => Err(NWFError::EmptyNamePart(ERRCTX_UNKNOWN).into()),
		None => Ok((None, first.into())),
		Some(local) if first.is_empty() || local.is_empty() => {
			Err(NWFError::EmptyNamePart(ERRCTX_UNKNOWN).into())
		}
		Some(local) => Ok((Some(first.into()), local.into())),
	}
}

/// Namespace declarations found on a start tag, as `(prefix, uri)` pairs.
pub type RawDeclarations = Vec<(Option<NCName>, String)>;

/// Separate namespace declarations from ordinary attributes.
///
/// `xmlns` declares the default namespace and `xmlns:p` declares the prefix
/// `p`. Everything else is an ordinary attribute. Both lists keep source
/// order.
pub fn split_attributes(raw: RawAttributes) -> Result<(RawDeclarations, RawAttributes)> {
	let mut decls = Vec::new();
	let mut attrs = Vec::with_capacity(raw.len());
	for (name, value) in raw.into_iter() {
		if name.as_str() == PREFIX_XMLNS {
			decls.push((None, value));
			continue;
		}
		match name.strip_prefix("xmlns:") {
			Some("") => return Err(NWFError::EmptyNamePart(ERRCTX_UNKNOWN).into()),
			Some(prefix) => decls.push((Some(prefix.into()), value)),
			None => attrs.push((name, value)),
		}
	}
	Ok((decls, attrs))
}

/// Enforce the constraints on the reserved `xml` and `xmlns` prefixes and
/// URIs for a single declaration.
pub fn check_declaration(prefix: Option<&str>, uri: Option<&str>) -> Result<()> {
	match (prefix, uri) {
		(Some(PREFIX_XMLNS), _) => Err(NWFError::ReservedNamespacePrefix.into()),
		(Some(PREFIX_XML), Some(XMLNS_XML)) => Ok(()),
		(Some(PREFIX_XML), _) => Err(NWFError::ReservedNamespacePrefix.into()),
		(_, Some(XMLNS_XML)) | (_, Some(XMLNS_XMLNS)) => {
			Err(NWFError::ReservedNamespacePrefix.into())
		}
		(Some(_), None) => Err(NWFError::EmptyNamespaceUri.into()),
		_ => Ok(()),
	}
}

/// Resolve a split name in the given scope.
///
/// Unprefixed element names take the default namespace; unprefixed
/// attribute names never have a namespace. An unbound prefix yields a name
/// without namespace, unless `strict` is set, in which case it is an error.
pub fn resolve_qname(
	scope: &NamespaceScope,
	prefix: Option<NCName>,
	local_name: NCName,
	strict: bool,
	attribute: bool,
) -> Result<QName> {
	let namespace = match prefix.as_deref() {
		None if attribute => None,
		None => scope.resolve(None).cloned(),
		Some(p) => match scope.resolve(Some(p)) {
			Some(uri) => Some(uri.clone()),
			None if strict => {
				return Err(NWFError::UndeclaredNamespacePrefix(ERRCTX_UNKNOWN).into())
			}
			None => {
				log::trace!("prefix {:?} is not bound, leaving {:?} without namespace", p, local_name);
				None
			}
		},
	};
	Ok(QName::new(prefix, namespace, local_name))
}

/// Split and resolve a raw name in one go, attaching `ctx` to errors.
pub fn resolve_raw(
	scope: &NamespaceScope,
	name: &RawName,
	strict: bool,
	attribute: bool,
	ctx: &'static str,
) -> Result<QName> {
	let resolved = split_name(name)
		.and_then(|(prefix, local)| resolve_qname(scope, prefix, local, strict, attribute));
	add_context(resolved, ctx)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::{Error, ERRCTX_NAME};

	fn uri(s: &str) -> Option<NamespaceName> {
		Some(s.into())
	}

	#[test]
	fn scope_shadows_and_restores() {
		let mut scope = NamespaceScope::new();
		let p = Some(NCName::from("p"));
		scope.declare(p.clone(), uri("NS1"));
		scope.declare(p.clone(), uri("NS2"));
		assert_eq!(scope.resolve(Some("p")).map(|u| &**u), Some("NS2"));
		assert_eq!(scope.undeclare(&p), Some(uri("NS2")));
		assert_eq!(scope.resolve(Some("p")).map(|u| &**u), Some("NS1"));
		scope.undeclare(&p);
		assert!(scope.resolve(Some("p")).is_none());
		assert!(!scope.is_bound(Some("p")));
	}

	#[test]
	fn scope_default_namespace_can_be_undeclared() {
		let mut scope = NamespaceScope::new();
		scope.declare(None, uri("urn:outer"));
		scope.declare(None, None);
		assert!(scope.resolve(None).is_none());
		assert!(scope.is_bound(None));
		scope.undeclare(&None);
		assert_eq!(scope.resolve(None).map(|u| &**u), Some("urn:outer"));
	}

	#[test]
	fn scope_binds_xml_prefix() {
		let scope = NamespaceScope::new();
		assert_eq!(scope.resolve(Some("xml")).map(|u| &**u), Some(XMLNS_XML));
	}

	#[test]
	fn undeclare_of_unbound_prefix_is_none() {
		let mut scope = NamespaceScope::new();
		assert_eq!(scope.undeclare(&Some("nope".into())), None);
	}

	#[test]
	fn split_name_variants() {
		assert_eq!(split_name("foo").unwrap(), (None, "foo".into()));
		assert_eq!(split_name("p:foo").unwrap(), (Some("p".into()), "foo".into()));
		assert!(matches!(
			split_name("a:b:c"),
			Err(Error::NotNamespaceWellFormed(NWFError::MultiColonName(_)))
		));
		assert!(matches!(
			split_name(":foo"),
			Err(Error::NotNamespaceWellFormed(NWFError::EmptyNamePart(_)))
		));
		assert!(matches!(
			split_name("foo:"),
			Err(Error::NotNamespaceWellFormed(NWFError::EmptyNamePart(_)))
		));
	}

	#[test]
	fn split_attributes_keeps_source_order() {
		let raw = vec![
			("b".into(), "1".to_string()),
			("xmlns:p".into(), "urn:p".to_string()),
			("a".into(), "2".to_string()),
			("xmlns".into(), "urn:d".to_string()),
			("p:c".into(), "3".to_string()),
			("xmlns:q".into(), "urn:q".to_string()),
		];
		let (decls, attrs) = split_attributes(raw).unwrap();
		assert_eq!(
			decls,
			vec![
				(Some("p".into()), "urn:p".to_string()),
				(None, "urn:d".to_string()),
				(Some("q".into()), "urn:q".to_string()),
			]
		);
		let names: Vec<&str> = attrs.iter().map(|(n, _)| n.as_str()).collect();
		assert_eq!(names, vec!["b", "a", "p:c"]);
	}

	#[test]
	fn split_attributes_rejects_empty_prefix() {
		assert!(split_attributes(vec![("xmlns:".into(), "urn:x".to_string())]).is_err());
	}

	#[test]
	fn reserved_declarations() {
		assert!(check_declaration(Some("xml"), Some(XMLNS_XML)).is_ok());
		assert!(check_declaration(Some("xml"), Some("urn:other")).is_err());
		assert!(check_declaration(Some("xmlns"), Some(XMLNS_XMLNS)).is_err());
		assert!(check_declaration(Some("p"), Some(XMLNS_XML)).is_err());
		assert!(check_declaration(None, Some(XMLNS_XMLNS)).is_err());
		assert_eq!(
			check_declaration(Some("p"), None),
			Err(Error::NotNamespaceWellFormed(NWFError::EmptyNamespaceUri))
		);
		assert!(check_declaration(None, None).is_ok());
	}

	#[test]
	fn resolve_uses_default_namespace_for_elements_only() {
		let mut scope = NamespaceScope::new();
		scope.declare(None, uri("urn:d"));
		let el = resolve_qname(&scope, None, "a".into(), false, false).unwrap();
		assert_eq!(el.namespace_str(), Some("urn:d"));
		let attr = resolve_qname(&scope, None, "a".into(), false, true).unwrap();
		assert_eq!(attr.namespace_str(), None);
	}

	#[test]
	fn resolve_unbound_prefix_is_lenient_by_default() {
		let scope = NamespaceScope::new();
		let qn = resolve_qname(&scope, Some("p".into()), "x".into(), false, false).unwrap();
		assert_eq!(qn.namespace_str(), None);
		assert_eq!(qn.prefix.as_deref(), Some("p"));
	}

	#[test]
	fn resolve_unbound_prefix_fails_when_strict() {
		let scope = NamespaceScope::new();
		match resolve_raw(&scope, &"p:x".into(), true, false, ERRCTX_NAME) {
			Err(Error::NotNamespaceWellFormed(NWFError::UndeclaredNamespacePrefix(ctx))) => {
				assert_eq!(ctx, ERRCTX_NAME)
			}
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn resolve_follows_shadowing() {
		let mut scope = NamespaceScope::new();
		let p = Some(NCName::from("p"));
		scope.declare(p.clone(), uri("NS1"));
		scope.declare(p.clone(), uri("NS2"));
		let inner = resolve_raw(&scope, &"p:x".into(), false, false, ERRCTX_NAME).unwrap();
		scope.undeclare(&p);
		let outer = resolve_raw(&scope, &"p:y".into(), false, false, ERRCTX_NAME).unwrap();
		assert_eq!(inner, QName::namespaced("NS2", "x"));
		assert_eq!(outer, QName::namespaced("NS1", "y"));
	}
}
