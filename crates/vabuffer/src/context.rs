// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::{
    display::Display,
    driver::{ConfigId, ContextId, Entrypoint, Profile},
    Error,
};

/// Encoding context that coded buffers are allocated against.
///
/// A context is either created here, in which case it owns its VA config and
/// context and destroys both when dropped, or wraps the ID of a context owned
/// by an encoder elsewhere ([`Context::wrap`]).
///
/// Coded buffers borrow their context, so a context always outlives the
/// buffers allocated from it.
#[derive(Debug)]
pub struct Context {
    display: Display,
    id: ContextId,
    config: Option<ConfigId>,
}

impl Context {
    /// Creates an encoding configuration and context on `display`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for zero dimensions or dimensions
    /// beyond `i32::MAX`, and [`Error::Va`] if the driver rejects the profile,
    /// entry point or resolution.
    ///
    /// # Example
    ///
    /// ```
    /// use vabuffer::context::Context;
    /// use vabuffer::display::Display;
    /// use vabuffer::driver::{Entrypoint, Profile};
    /// use vabuffer::mock::MockDriver;
    ///
    /// let display = Display::new(MockDriver::new());
    /// let context = Context::new(&display, Profile::HevcMain, Entrypoint::EncSlice, 1280, 720)?;
    /// assert!(context.config().is_some());
    /// # Ok::<(), vabuffer::Error>(())
    /// ```
    pub fn new(
        display: &Display,
        profile: Profile,
        entrypoint: Entrypoint,
        width: u32,
        height: u32,
    ) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidArgument("picture dimensions must be non-zero"));
        }
        if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
            return Err(Error::InvalidArgument("picture dimensions exceed i32::MAX"));
        }

        let config = display
            .lock()
            .create_config(profile, entrypoint)
            .map_err(Error::Va)?;

        let created = display.lock().create_context(config, width, height);
        let id = match created {
            Ok(id) => id,
            Err(status) => {
                if let Err(err) = display.lock().destroy_config(config) {
                    log::warn!("config {:#010x}: release failed: {}", config, err);
                }
                return Err(Error::Va(status));
            }
        };

        log::debug!(
            "encode context {:#010x} ({:?}/{:?} {}x{})",
            id,
            profile,
            entrypoint,
            width,
            height
        );

        Ok(Context {
            display: display.clone(),
            id,
            config: Some(config),
        })
    }

    /// Wraps a context created and owned elsewhere. Nothing is released when
    /// the wrapper is dropped.
    pub fn wrap(display: &Display, id: ContextId) -> Self {
        Context {
            display: display.clone(),
            id,
            config: None,
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    /// The configuration this context was created with, `None` for wrapped
    /// contexts.
    pub fn config(&self) -> Option<ConfigId> {
        self.config
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        let Some(config) = self.config else {
            return;
        };

        log::trace!("Context::drop() - releasing context {:#010x}", self.id);
        if let Err(err) = self.display.lock().destroy_context(self.id) {
            log::warn!("context {:#010x}: release failed: {}", self.id, err);
        }
        if let Err(err) = self.display.lock().destroy_config(config) {
            log::warn!("config {:#010x}: release failed: {}", config, err);
        }
    }
}
