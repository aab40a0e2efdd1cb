//! Full-empty release latch (spec §5, "full-empty word").
//!
//! Single-producer-broadcast-consumer edge trigger: one thread calls
//! `fill`, many may call `wait` (the spec's `readFF`) and block until full;
//! re-arming via `empty` is caller-serialized by the sinc (I2: re-arming
//! requires `C == 0` externally, so no `fill` ever races a concurrent
//! `empty`).
//!
//! Two backends, selected the same way the teacher's `allocator.rs` picks a
//! cache tier "fastest to slowest" with `cfg_if!`:
//! - `std` feature: a `Mutex`+`Condvar`, so waiters actually block instead
//!   of burning a core.
//! - no `std`: a spin-wait over an atomic state word, usable in `no_std`.

cfg_if::cfg_if! {
    if #[cfg(feature = "std")] {
        mod blocking {
            use std::sync::{Condvar, Mutex};

            pub struct Latch {
                full: Mutex<bool>,
                cond: Condvar,
            }

            impl Latch {
                pub const fn new(full: bool) -> Self {
                    Self {
                        full: Mutex::new(full),
                        cond: Condvar::new(),
                    }
                }

                pub fn empty(&self) {
                    let mut guard = self.full.lock().unwrap();
                    *guard = false;
                }

                pub fn fill(&self) {
                    let mut guard = self.full.lock().unwrap();
                    *guard = true;
                    self.cond.notify_all();
                }

                /// Blocks until full, then returns without consuming the
                /// latch (subsequent callers return immediately too).
                /// Returns whether the latch was already full (no blocking
                /// was needed), for instrumentation purposes only.
                pub fn wait(&self) -> bool {
                    let guard = self.full.lock().unwrap();
                    if *guard {
                        return true;
                    }
                    let _unused = self
                        .cond
                        .wait_while(guard, |full| !*full)
                        .unwrap();
                    false
                }

                pub fn is_full(&self) -> bool {
                    *self.full.lock().unwrap()
                }
            }
        }
        pub use blocking::Latch;
    } else {
        mod spin {
            use core::sync::atomic::{AtomicBool, Ordering};

            pub struct Latch {
                full: AtomicBool,
            }

            impl Latch {
                pub const fn new(full: bool) -> Self {
                    Self {
                        full: AtomicBool::new(full),
                    }
                }

                pub fn empty(&self) {
                    self.full.store(false, Ordering::Release);
                }

                pub fn fill(&self) {
                    self.full.store(true, Ordering::Release);
                }

                pub fn wait(&self) -> bool {
                    if self.full.load(Ordering::Acquire) {
                        return true;
                    }
                    loop {
                        core::hint::spin_loop();
                        if self.full.load(Ordering::Acquire) {
                            return false;
                        }
                    }
                }

                pub fn is_full(&self) -> bool {
                    self.full.load(Ordering::Acquire)
                }
            }
        }
        pub use spin::Latch;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_requested_state() {
        let full = Latch::new(true);
        assert!(full.is_full());
        let empty = Latch::new(false);
        assert!(!empty.is_full());
    }

    #[test]
    fn fill_then_wait_does_not_block() {
        let latch = Latch::new(false);
        latch.fill();
        assert!(latch.wait());
    }

    #[test]
    fn empty_after_fill_is_observable() {
        let latch = Latch::new(false);
        latch.fill();
        assert!(latch.is_full());
        latch.empty();
        assert!(!latch.is_full());
    }

    #[cfg(feature = "std")]
    #[test]
    fn wait_blocks_until_filled_from_another_thread() {
        use alloc::sync::Arc;
        use std::thread;
        use std::time::Duration;

        let latch = Arc::new(Latch::new(false));
        let filler = Arc::clone(&latch);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            filler.fill();
        });
        assert!(!latch.wait());
        handle.join().unwrap();
    }
}
