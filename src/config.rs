//! Rendering context: the state every drawing call consults
//!
//! Stroke thickness, blend policy, anti-aliasing and surface-alpha each live
//! on a push/pop stack whose bottom is the configured default. Angle units,
//! error reporting, autolock and dirty tracking are plain flags. Everything
//! starts from a [`Settings`] value that can be stored as JSON.

use std::fs;
use std::ops::{Deref, DerefMut};
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::dirty::{DirtyTracker, DEFAULT_INSTANT_MERGE, DEFAULT_WORST_MERGE};
use crate::error::{ErrorQueue, RasterError, DEFAULT_ERROR_CAPACITY};
use crate::surface::BlendMode;

// ============================================================================
// Settings
// ============================================================================

/// Initial context state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub thickness: u16,
    pub blend: BlendMode,
    pub anti_alias: bool,
    /// Angles in degrees (false: radians)
    pub degrees: bool,
    pub surface_alpha: bool,
    pub errors_enabled: bool,
    pub error_capacity: usize,
    pub autolock: bool,
    pub dirty_enabled: bool,
    /// Slots per dirty table; 0 creates no tables
    pub dirty_capacity: usize,
    pub dirty_worst_merge: u16,
    pub dirty_instant_merge: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            thickness: 1,
            blend: BlendMode::CombineAlpha,
            anti_alias: false,
            degrees: true,
            surface_alpha: false,
            errors_enabled: true,
            error_capacity: DEFAULT_ERROR_CAPACITY,
            autolock: true,
            dirty_enabled: false,
            dirty_capacity: 0,
            dirty_worst_merge: DEFAULT_WORST_MERGE as u16,
            dirty_instant_merge: DEFAULT_INSTANT_MERGE as u16,
        }
    }
}

impl Settings {
    /// Save settings to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RasterError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load settings from a JSON file; missing fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RasterError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&json)?;
        info!("loaded raster settings from {}", path.display());
        Ok(settings)
    }
}

// ============================================================================
// Context
// ============================================================================

/// Which stack a scoped override pushed onto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Override {
    Thickness(u16),
    Blend(BlendMode),
    AntiAlias(bool),
    SurfaceAlpha(bool),
}

#[derive(Debug)]
pub struct Context {
    settings: Settings,
    thickness: Vec<u16>,
    blend: Vec<BlendMode>,
    anti_alias: Vec<bool>,
    surface_alpha: Vec<bool>,
    degrees: bool,
    errors_enabled: bool,
    autolock: bool,
    errors: ErrorQueue,
    pub(crate) dirty: DirtyTracker,
}

impl Context {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let mut dirty = DirtyTracker::new();
        dirty.init(settings.dirty_capacity);
        dirty.enable(settings.dirty_enabled);
        dirty.set_level(settings.dirty_worst_merge);
        dirty.set_instant_merge(settings.dirty_instant_merge);
        Self {
            thickness: Vec::new(),
            blend: Vec::new(),
            anti_alias: Vec::new(),
            surface_alpha: Vec::new(),
            degrees: settings.degrees,
            errors_enabled: settings.errors_enabled,
            autolock: settings.autolock,
            errors: ErrorQueue::new(settings.error_capacity),
            dirty,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ========================================================================
    // Stacks
    // ========================================================================

    pub fn thickness(&self) -> u16 {
        self.thickness.last().copied().unwrap_or(self.settings.thickness)
    }

    pub fn push_thickness(&mut self, thickness: u16) {
        self.thickness.push(thickness);
    }

    /// Remove the top thickness and return it; an empty stack reports an
    /// error and yields the configured default
    pub fn pop_thickness(&mut self) -> u16 {
        match self.thickness.pop() {
            Some(v) => v,
            None => {
                self.report(RasterError::EmptyStack("pop_thickness"));
                self.settings.thickness
            },
        }
    }

    pub fn blend(&self) -> BlendMode {
        self.blend.last().copied().unwrap_or(self.settings.blend)
    }

    pub fn push_blend(&mut self, mode: BlendMode) {
        self.blend.push(mode);
    }

    pub fn pop_blend(&mut self) -> BlendMode {
        match self.blend.pop() {
            Some(v) => v,
            None => {
                self.report(RasterError::EmptyStack("pop_blend"));
                self.settings.blend
            },
        }
    }

    pub fn anti_alias(&self) -> bool {
        self.anti_alias.last().copied().unwrap_or(self.settings.anti_alias)
    }

    pub fn push_anti_alias(&mut self, enabled: bool) {
        self.anti_alias.push(enabled);
    }

    pub fn pop_anti_alias(&mut self) -> bool {
        match self.anti_alias.pop() {
            Some(v) => v,
            None => {
                self.report(RasterError::EmptyStack("pop_anti_alias"));
                self.settings.anti_alias
            },
        }
    }

    pub fn surface_alpha(&self) -> bool {
        self.surface_alpha.last().copied().unwrap_or(self.settings.surface_alpha)
    }

    pub fn push_surface_alpha(&mut self, enabled: bool) {
        self.surface_alpha.push(enabled);
    }

    pub fn pop_surface_alpha(&mut self) -> bool {
        match self.surface_alpha.pop() {
            Some(v) => v,
            None => {
                self.report(RasterError::EmptyStack("pop_surface_alpha"));
                self.settings.surface_alpha
            },
        }
    }

    /// Push an override that is popped again when the guard drops
    pub fn scoped(&mut self, value: Override) -> Scoped<'_> {
        match value {
            Override::Thickness(v) => self.push_thickness(v),
            Override::Blend(v) => self.push_blend(v),
            Override::AntiAlias(v) => self.push_anti_alias(v),
            Override::SurfaceAlpha(v) => self.push_surface_alpha(v),
        }
        Scoped { ctx: self, value }
    }

    // ========================================================================
    // Flags
    // ========================================================================

    /// Switch angle arguments to radians (or back to degrees)
    pub fn use_radians(&mut self, radians: bool) {
        self.degrees = !radians;
    }

    pub fn radians(&self) -> bool {
        !self.degrees
    }

    /// Convert a user angle to radians
    #[inline]
    pub fn to_radians(&self, angle: f32) -> f32 {
        if self.degrees {
            angle.to_radians()
        } else {
            angle
        }
    }

    /// Convert a user angle to degrees
    #[inline]
    pub fn to_degrees(&self, angle: f32) -> f32 {
        if self.degrees {
            angle
        } else {
            angle.to_degrees()
        }
    }

    pub fn set_autolock(&mut self, enabled: bool) {
        self.autolock = enabled;
    }

    pub fn autolock(&self) -> bool {
        self.autolock
    }

    // ========================================================================
    // Errors
    // ========================================================================

    pub fn enable_errors(&mut self, enabled: bool) {
        self.errors_enabled = enabled;
    }

    pub fn errors_enabled(&self) -> bool {
        self.errors_enabled
    }

    /// Queue an error if reporting is on
    pub fn report(&mut self, err: RasterError) {
        if self.errors_enabled {
            self.errors.push(err.to_string());
        }
    }

    pub fn errors(&self) -> &ErrorQueue {
        &self.errors
    }

    /// Oldest queued error, rendered with its timestamp
    pub fn pop_error(&mut self) -> Option<String> {
        self.errors.pop()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    // ========================================================================
    // Dirty rects
    // ========================================================================

    pub fn dirty(&self) -> &DirtyTracker {
        &self.dirty
    }

    pub fn dirty_mut(&mut self) -> &mut DirtyTracker {
        &mut self.dirty
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Scoped override
// ============================================================================

/// Context borrowed with one stack value pushed; pops it on drop
#[derive(Debug)]
pub struct Scoped<'a> {
    ctx: &'a mut Context,
    value: Override,
}

impl Deref for Scoped<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        self.ctx
    }
}

impl DerefMut for Scoped<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        self.ctx
    }
}

impl Drop for Scoped<'_> {
    fn drop(&mut self) {
        // Our own push is still there unless the caller popped it
        match self.value {
            Override::Thickness(_) => {
                self.ctx.thickness.pop();
            },
            Override::Blend(_) => {
                self.ctx.blend.pop();
            },
            Override::AntiAlias(_) => {
                self.ctx.anti_alias.pop();
            },
            Override::SurfaceAlpha(_) => {
                self.ctx.surface_alpha.pop();
            },
        }
    }
}
