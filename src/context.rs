use std::fmt;

#[cfg(all(feature = "shared_ns", feature = "mt"))]
use std::sync::{Mutex, MutexGuard, Weak};
#[cfg(all(feature = "shared_ns", not(feature = "mt")))]
use std::rc::Weak;
#[cfg(all(feature = "shared_ns", not(feature = "mt")))]
use std::cell::{RefCell, RefMut};

use crate::tree::{NamespaceName, RcPtr};

#[cfg(feature = "shared_ns")]
type UriWeakSet = weak_table::WeakHashSet<Weak<str>>;

/**
# Shared context for multiple tree builders

This context allows tree builders to share data. This is useful in cases
where many documents are parsed in the same application, all of them using
the same handful of namespace URIs (think of a server handling many streams
with the same protocol).

As of writing, the context is only used to share namespace URIs encountered
in XML documents, and only if the `shared_ns` feature is used for building.
Without that feature, every lookup allocates a fresh URI.

Even though the context is internally mutable, it can safely be shared with
an immutable reference between builders. If the crate is built with the `mt`
feature, the Context is Send and Sync, otherwise it is neither.
*/
pub struct Context {
	#[cfg(all(feature = "shared_ns", feature = "mt"))]
	nss: Mutex<UriWeakSet>,
	#[cfg(all(feature = "shared_ns", not(feature = "mt")))]
	nss: RefCell<UriWeakSet>,
}

impl Context {
	#[cfg(all(feature = "shared_ns", feature = "mt"))]
	fn wrap_nss(nss: UriWeakSet) -> Mutex<UriWeakSet> {
		Mutex::new(nss)
	}

	#[cfg(all(feature = "shared_ns", not(feature = "mt")))]
	fn wrap_nss(nss: UriWeakSet) -> RefCell<UriWeakSet> {
		RefCell::new(nss)
	}

	/// Create a new context
	pub fn new() -> Context {
		Context {
			#[cfg(feature = "shared_ns")]
			nss: Self::wrap_nss(weak_table::WeakHashSet::new()),
		}
	}

	#[cfg(all(feature = "shared_ns", feature = "mt"))]
	fn lock_nss<'a>(&'a self) -> MutexGuard<'a, UriWeakSet> {
		// a poisoned lock only means another thread panicked while
		// interning; the set itself is still consistent.
		match self.nss.lock() {
			Ok(guard) => guard,
			Err(poisoned) => poisoned.into_inner(),
		}
	}

	#[cfg(all(feature = "shared_ns", not(feature = "mt")))]
	fn lock_nss<'a>(&'a self) -> RefMut<'a, UriWeakSet> {
		self.nss.borrow_mut()
	}

	/// Intern a namespace URI
	///
	/// The given URI is interned in the context and a refcounted pointer is
	/// returned. When the last reference to that pointer expires, the string
	/// will be lazily removed from the internal storage.
	///
	/// To force expiry, call [`Context::release_temporaries`], although that
	/// should only rarely be necessary.
	pub fn intern_uri(&self, uri: &str) -> NamespaceName {
		#[cfg(feature = "shared_ns")]
		{
			let mut nss = self.lock_nss();
			return match nss.get(uri) {
				Some(ptr) => ptr,
				None => {
					let ptr: NamespaceName = RcPtr::from(uri);
					nss.insert(ptr.clone());
					ptr
				}
			};
		}
		#[cfg(not(feature = "shared_ns"))]
		RcPtr::from(uri)
	}

	/// Remove all unreferenced strings from storage and shrink the storage to
	/// fit the requirements.
	pub fn release_temporaries(&self) {
		#[cfg(feature = "shared_ns")]
		{
			let mut nss = self.lock_nss();
			nss.remove_expired();
			nss.shrink_to_fit();
		}
	}

	/// Return the number of URIs interned.
	///
	/// Returns zero if built without `shared_ns`. This count includes strings
	/// which are unreferenced and which would be removed before the next
	/// reallocation.
	pub fn uris(&self) -> usize {
		#[cfg(feature = "shared_ns")]
		{
			let nss = self.lock_nss();
			nss.len()
		}
		#[cfg(not(feature = "shared_ns"))]
		0
	}
}

impl Default for Context {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for Context {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		let mut f = f.debug_struct("Context");
		f.field("instance", &(self as *const Context));
		#[cfg(feature = "shared_ns")]
		{
			let nss = self.lock_nss();
			f.field("nss.capacity()", &nss.capacity())
				.field("nss.length()", &nss.len());
		}
		f.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn intern_returns_equal_uris() {
		let ctx = Context::new();
		let a = ctx.intern_uri("urn:example");
		let b = ctx.intern_uri("urn:example");
		assert_eq!(&*a, "urn:example");
		assert_eq!(a, b);
	}

	#[cfg(feature = "shared_ns")]
	#[test]
	fn intern_shares_storage() {
		let ctx = Context::new();
		let a = ctx.intern_uri("urn:example");
		let b = ctx.intern_uri("urn:example");
		assert!(RcPtr::ptr_eq(&a, &b));
		assert_eq!(ctx.uris(), 1);
	}

	#[cfg(feature = "shared_ns")]
	#[test]
	fn release_temporaries_drops_unreferenced_uris() {
		let ctx = Context::new();
		drop(ctx.intern_uri("urn:gone"));
		let _kept = ctx.intern_uri("urn:kept");
		ctx.release_temporaries();
		assert_eq!(ctx.uris(), 1);
	}
}
