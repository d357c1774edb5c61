// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::{driver::Driver, va::VaDriver, Error};
use std::{
    fmt,
    ops::Deref,
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// Shared handle to a VA device.
///
/// A display owns the [`Driver`] and a lock around it. Cloning is cheap and
/// every clone refers to the same device; the driver is released once the
/// last clone is dropped. All driver calls go through [`Display::lock`], which
/// totally orders the calls made by every context and buffer of the device.
///
/// # Example
///
/// ```
/// use vabuffer::display::Display;
/// use vabuffer::mock::MockDriver;
///
/// let display = Display::new(MockDriver::new());
/// let other = display.clone();
/// assert!(display.same_device(&other));
/// ```
#[derive(Clone)]
pub struct Display {
    driver: Arc<Mutex<Box<dyn Driver>>>,
}

/// Exclusive access to the device driver, released when dropped.
pub struct DisplayGuard<'a> {
    guard: MutexGuard<'a, Box<dyn Driver>>,
}

impl Display {
    pub fn new<D: Driver + 'static>(driver: D) -> Self {
        Display {
            driver: Arc::new(Mutex::new(Box::new(driver))),
        }
    }

    /// Opens the DRM render node at `path` through libva.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LibraryNotLoaded`] if libva or libva-drm cannot be
    /// loaded, [`Error::Io`] if the node cannot be opened and [`Error::Va`]
    /// if the driver fails to initialize.
    pub fn open_drm<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Ok(Display::new(VaDriver::open_drm(path)?))
    }

    /// Acquires the device lock.
    ///
    /// Keep the guard for the duration of a single driver call; the same lock
    /// serializes all traffic to the device. A lock poisoned by a panicking
    /// holder is recovered since the driver keeps no state on our side.
    pub fn lock(&self) -> DisplayGuard<'_> {
        DisplayGuard {
            guard: self.driver.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Returns true if both handles refer to the same device.
    pub fn same_device(&self, other: &Display) -> bool {
        Arc::ptr_eq(&self.driver, &other.driver)
    }
}

impl fmt::Debug for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Display")
            .field("handles", &Arc::strong_count(&self.driver))
            .finish()
    }
}

impl Deref for DisplayGuard<'_> {
    type Target = dyn Driver;

    fn deref(&self) -> &Self::Target {
        &**self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        driver::{Entrypoint, Profile},
        mock::MockDriver,
    };
    use std::{sync::Arc, thread};

    #[test]
    fn test_clones_share_device() {
        let display = Display::new(MockDriver::new());
        let clone = display.clone();
        let other = Display::new(MockDriver::new());
        assert!(display.same_device(&clone));
        assert!(!display.same_device(&other));
    }

    #[test]
    fn test_lock_released_on_drop() {
        let display = Display::new(MockDriver::new());
        {
            let _guard = display.lock();
        }
        // Would deadlock if the first guard leaked
        let config = display
            .lock()
            .create_config(Profile::H264Main, Entrypoint::EncSlice);
        assert!(config.is_ok());
    }

    #[test]
    fn test_calls_serialized_across_threads() {
        let mock = Arc::new(MockDriver::new());
        let display = Display::new(Arc::clone(&mock));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let display = display.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        let config = display
                            .lock()
                            .create_config(Profile::HevcMain, Entrypoint::EncSlice)
                            .unwrap();
                        display.lock().destroy_config(config).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let calls = mock.calls();
        assert_eq!(calls.create_config, 100);
        assert_eq!(calls.destroy_config, 100);
        assert_eq!(mock.live_configs(), 0);
    }

    #[test]
    fn test_debug_counts_handles() {
        let display = Display::new(MockDriver::new());
        let _clone = display.clone();
        assert_eq!(format!("{:?}", display), "Display { handles: 2 }");
    }
}
