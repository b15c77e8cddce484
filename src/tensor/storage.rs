//! Storage: host byte buffers with Arc-based sharing and a pluggable release

use crate::error::{Error, Result};
use std::alloc::{Layout as AllocLayout, alloc_zeroed, dealloc};
use std::ptr::NonNull;
use std::sync::Arc;

/// Alignment of self-owned allocations, in bytes
pub const ALLOC_ALIGN: usize = 64;

/// Callback that frees foreign memory, given the pointer it was wrapped with
pub type ReleaseFn = Box<dyn FnOnce(NonNull<u8>) + Send + 'static>;

/// Release callback that leaves the memory alone
///
/// Pass this when the caller keeps ownership of wrapped bytes.
pub fn release_nothing(_: NonNull<u8>) {}

/// Reference-counted byte buffer backing one or more tensors
///
/// Storage is pure capacity: it knows its size but nothing about shape,
/// strides or dtype. Clones share the buffer; the release function runs
/// exactly once, when the last clone is dropped, on whichever thread drops it.
pub struct Storage {
    inner: Arc<StorageInner>,
}

enum Release {
    /// Allocated here with `ALLOC_ALIGN`
    Owned(AllocLayout),
    /// Wrapped from the caller with its own callback
    Foreign(ReleaseFn),
    /// Nothing to free (zero-sized)
    Nothing,
}

struct StorageInner {
    ptr: NonNull<u8>,
    size: usize,
    release: Option<Release>,
}

// SAFETY: the buffer is plain bytes and the release callback is `Send`; it is
// only touched from `Drop`, which has exclusive access. Synchronizing writes
// through aliasing views is the caller's responsibility.
unsafe impl Send for StorageInner {}
unsafe impl Sync for StorageInner {}

impl Storage {
    /// Allocate `size` zeroed bytes aligned to [`ALLOC_ALIGN`]
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            // Well-aligned dangling pointer, never dereferenced
            let ptr = NonNull::new(std::ptr::without_provenance_mut(ALLOC_ALIGN))
                .ok_or(Error::AllocationFailed { size })?;
            return Ok(Self::from_inner(ptr, 0, Release::Nothing));
        }

        let layout = AllocLayout::from_size_align(size, ALLOC_ALIGN)
            .map_err(|_| Error::AllocationFailed { size })?;
        // SAFETY: layout has a non-zero size
        let ptr = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(ptr).ok_or(Error::AllocationFailed { size })?;

        tracing::trace!(size, ptr = ?ptr, "allocated storage");
        Ok(Self::from_inner(ptr, size, Release::Owned(layout)))
    }

    /// Wrap `size` bytes of foreign memory starting at `ptr`
    ///
    /// `release` is called with `ptr` exactly once, when the last reference
    /// is dropped. Use [`release_nothing`] if the caller keeps ownership.
    ///
    /// # Safety
    /// - `ptr` must be valid for reads and writes of `size` bytes
    /// - The memory must remain valid until `release` is invoked
    pub unsafe fn from_raw_parts<F>(ptr: NonNull<u8>, size: usize, release: F) -> Self
    where
        F: FnOnce(NonNull<u8>) + Send + 'static,
    {
        tracing::trace!(size, ptr = ?ptr, "wrapped foreign storage");
        Self::from_inner(ptr, size, Release::Foreign(Box::new(release)))
    }

    fn from_inner(ptr: NonNull<u8>, size: usize, release: Release) -> Self {
        Self {
            inner: Arc::new(StorageInner {
                ptr,
                size,
                release: Some(release),
            }),
        }
    }

    /// Get the raw base pointer
    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.inner.ptr.as_ptr()
    }

    /// Get size in bytes
    #[inline]
    pub fn size(&self) -> usize {
        self.inner.size
    }

    /// Check if storage is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.size == 0
    }

    /// Whether this buffer was allocated by nope (rather than wrapped)
    #[inline]
    pub fn is_owned(&self) -> bool {
        !matches!(self.inner.release, Some(Release::Foreign(_)))
    }

    /// Get the reference count
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Check if this is the only reference
    #[inline]
    pub fn is_unique(&self) -> bool {
        Arc::strong_count(&self.inner) == 1
    }

    /// Whether two handles share one buffer
    #[inline]
    pub fn same_buffer(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Clone for Storage {
    /// Clone increments the reference count (zero-copy)
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Drop for StorageInner {
    fn drop(&mut self) {
        match self.release.take() {
            Some(Release::Owned(layout)) => {
                tracing::trace!(size = self.size, "releasing owned storage");
                // SAFETY: allocated in `Storage::new` with this exact layout
                unsafe { dealloc(self.ptr.as_ptr(), layout) };
            }
            Some(Release::Foreign(release)) => {
                tracing::trace!(size = self.size, "releasing foreign storage");
                release(self.ptr);
            }
            Some(Release::Nothing) | None => {}
        }
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("ptr", &self.inner.ptr)
            .field("size", &self.inner.size)
            .field("owned", &self.is_owned())
            .field("refs", &Arc::strong_count(&self.inner))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_new_is_zeroed_and_aligned() {
        let storage = Storage::new(100).unwrap();
        assert_eq!(storage.size(), 100);
        assert!(storage.is_owned());
        assert_eq!(storage.as_ptr() as usize % ALLOC_ALIGN, 0);

        let bytes = unsafe { std::slice::from_raw_parts(storage.as_ptr(), storage.size()) };
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_zero_sized() {
        let storage = Storage::new(0).unwrap();
        assert!(storage.is_empty());
        assert_eq!(storage.as_ptr() as usize % ALLOC_ALIGN, 0);
    }

    #[test]
    fn test_clone_shares_buffer() {
        let a = Storage::new(16).unwrap();
        assert!(a.is_unique());
        let b = a.clone();
        assert_eq!(a.ref_count(), 2);
        assert!(a.same_buffer(&b));
        assert_eq!(a.as_ptr(), b.as_ptr());
        drop(b);
        assert!(a.is_unique());
    }

    #[test]
    fn test_foreign_release_runs_once_on_last_drop() {
        static RELEASED: AtomicUsize = AtomicUsize::new(0);

        let mut bytes = vec![0u8; 32];
        let ptr = NonNull::new(bytes.as_mut_ptr()).unwrap();
        let addr = ptr.as_ptr() as usize;
        let storage = unsafe {
            Storage::from_raw_parts(ptr, bytes.len(), move |released| {
                assert_eq!(released.as_ptr() as usize, addr);
                RELEASED.fetch_add(1, Ordering::SeqCst);
            })
        };
        assert!(!storage.is_owned());

        let clone = storage.clone();
        drop(storage);
        assert_eq!(RELEASED.load(Ordering::SeqCst), 0);
        drop(clone);
        assert_eq!(RELEASED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_from_another_thread() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);

        let mut bytes = vec![1u8; 8];
        let ptr = NonNull::new(bytes.as_mut_ptr()).unwrap();
        let storage = unsafe {
            Storage::from_raw_parts(ptr, bytes.len(), move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        };

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let s = storage.clone();
                std::thread::spawn(move || {
                    assert_eq!(s.size(), 8);
                })
            })
            .collect();
        drop(storage);
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(released.load(Ordering::SeqCst), 1);
        drop(bytes);
    }
}
