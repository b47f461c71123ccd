//! Per-key request coalescing.
//!
//! [`SingleFlight::run`] lets the first caller for a key perform the work while every caller
//! that arrives before the work resolves attaches to the same pending slot and receives a clone
//! of the identical result. Slots are dropped as soon as the work resolves, whatever the
//! outcome, so failures are never remembered and the next caller starts a fresh attempt.
//!
//! The pending table lock is only held for map bookkeeping, never across an `.await`, so keys
//! never block each other.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::_prelude::*;

type Slot<T> = Arc<OnceCell<T>>;

/// Whether a caller performed the work or reused another caller's result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlightRole {
	/// The caller ran the work.
	Leader,
	/// The caller attached to an in-flight run.
	Follower,
}

/// Coordinator that collapses concurrent work for the same key into one execution.
pub struct SingleFlight<K, T> {
	pending: Mutex<HashMap<K, Slot<T>>>,
}
impl<K, T> SingleFlight<K, T>
where
	K: Clone + Eq + Hash,
	T: Clone,
{
	/// Runs `work` for `key` unless a run is already pending, in which case the caller waits for
	/// and returns that run's result instead.
	pub async fn run<F, Fut>(&self, key: &K, work: F) -> T
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = T>,
	{
		self.run_tracked(key, work).await.0
	}

	/// Same as [`run`](Self::run) but also reports whether this caller did the work.
	///
	/// If the leading caller is dropped mid-flight, one of the attached callers (or the next
	/// caller to arrive) runs its own `work` in its place.
	pub async fn run_tracked<F, Fut>(&self, key: &K, work: F) -> (T, FlightRole)
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = T>,
	{
		let slot = self.attach(key);
		let led = AtomicBool::new(false);
		let value = slot
			.get_or_init(|| {
				led.store(true, Ordering::Relaxed);

				async {
					let value = work().await;

					// Detach before publishing so late arrivals start a new run instead of
					// reading a resolved slot.
					self.release(key, &slot);

					value
				}
			})
			.await
			.clone();
		let role =
			if led.load(Ordering::Relaxed) { FlightRole::Leader } else { FlightRole::Follower };

		(value, role)
	}

	/// Number of keys with a run in flight.
	pub fn in_flight(&self) -> usize {
		self.pending.lock().len()
	}

	/// Returns `true` if a run is pending for `key`.
	pub fn is_in_flight(&self, key: &K) -> bool {
		self.pending.lock().contains_key(key)
	}

	fn attach(&self, key: &K) -> Slot<T> {
		let mut pending = self.pending.lock();

		pending.entry(key.clone()).or_insert_with(|| Arc::new(OnceCell::new())).clone()
	}

	fn release(&self, key: &K, slot: &Slot<T>) {
		let mut pending = self.pending.lock();

		if pending.get(key).is_some_and(|current| Arc::ptr_eq(current, slot)) {
			pending.remove(key);
		}
	}
}
impl<K, T> Default for SingleFlight<K, T> {
	fn default() -> Self {
		Self { pending: Mutex::new(HashMap::new()) }
	}
}
impl<K, T> Debug for SingleFlight<K, T> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SingleFlight").field("in_flight", &self.pending.lock().len()).finish()
	}
}
