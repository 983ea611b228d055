// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cached coverage masks for the software path renderer.
//!
//! A mask is keyed by the identity of the path geometry, the linear part of the view matrix, the
//! fractional part of its translation (in 1/256 pixel steps), the style and the anti-aliasing
//! mode. Integer translations move a cached mask instead of invalidating it, so every mask is
//! stored relative to the integer part of the translation it was rendered with.
//!
//! The table is guarded by a mutex that is never held while rasterising. Geometry that goes away
//! reports its identifier through a channel, and the entries rendered from it are dropped the
//! next time the cache is used.

use crate::config::MaskCacheConfig;
use crate::error::DrawError;
use crate::stroke;
use crossbeam_channel::{Receiver, Sender};
use futures_intrusive::sync::ManualResetEvent;
use log::{debug, trace};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tessel_common::chop;
use tessel_common::error::PathError;
use tessel_common::flatten::FlattenParams;
use tessel_common::geometry::IntRect;
use tessel_common::matrix::Matrix;
use tessel_common::path::{FillType, Path};
use tessel_common::path_data::PathData;
use tessel_common::pixmap::AlphaMask;
use tessel_common::style::{Style, StyleKey};

struct MaskTextureInner {
    width: u16,
    height: u16,
    mask: OnceLock<AlphaMask>,
    ready: ManualResetEvent,
}

/// A mask texture that may still be being rasterised.
///
/// Clones share the texture. The command layer must call [`MaskTexture::wait`] before reading
/// it; [`crate::DrawList::wait_for_uploads`] does this for every texture a frame samples.
#[derive(Clone)]
pub struct MaskTexture(Arc<MaskTextureInner>);

impl core::fmt::Debug for MaskTexture {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MaskTexture")
            .field("width", &self.0.width)
            .field("height", &self.0.height)
            .field("ready", &self.is_ready())
            .finish()
    }
}

impl MaskTexture {
    fn pending(width: u16, height: u16) -> Self {
        Self(Arc::new(MaskTextureInner {
            width,
            height,
            mask: OnceLock::new(),
            ready: ManualResetEvent::new(false),
        }))
    }

    /// A texture holding `mask`.
    pub fn from_mask(mask: AlphaMask) -> Self {
        let texture = Self::pending(mask.width(), mask.height());
        texture.fulfill(mask);
        texture
    }

    fn fulfill(&self, mask: AlphaMask) {
        let _ = self.0.mask.set(mask);
        self.0.ready.set();
    }

    /// The width in pixels.
    pub fn width(&self) -> u16 {
        self.0.width
    }

    /// The height in pixels.
    pub fn height(&self) -> u16 {
        self.0.height
    }

    /// Whether the mask has been written.
    pub fn is_ready(&self) -> bool {
        self.0.mask.get().is_some()
    }

    /// Block until the mask has been written.
    pub fn wait(&self) {
        if !self.is_ready() {
            pollster::block_on(self.0.ready.wait());
        }
    }

    /// The mask, once it has been written.
    pub fn mask(&self) -> Option<&AlphaMask> {
        self.0.mask.get()
    }

    /// Whether both handles refer to the same texture.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn byte_size(&self) -> usize {
        usize::from(self.0.width) * usize::from(self.0.height)
    }
}

/// What identifies a cached mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaskKey {
    data_id: u32,
    fill_type: FillType,
    linear: [u32; 4],
    frac_x: u8,
    frac_y: u8,
    style: StyleKey,
    anti_alias: bool,
}

fn frac_bucket(t: f32) -> u8 {
    ((t - t.floor()) * 256.).floor().clamp(0., 255.) as u8
}

impl MaskKey {
    /// The key of `request`.
    pub fn new(request: &MaskRequest<'_>) -> Self {
        let m = request.matrix;
        // Adding zero folds -0 into 0.
        let bits = |v: f32| (v + 0.).to_bits();
        Self {
            data_id: request.path.data().unique_id(),
            fill_type: request.path.fill_type(),
            linear: [
                bits(m.scale_x()),
                bits(m.skew_x()),
                bits(m.skew_y()),
                bits(m.scale_y()),
            ],
            frac_x: frac_bucket(m.translate_x()),
            frac_y: frac_bucket(m.translate_y()),
            style: request.style.key(),
            anti_alias: request.anti_alias,
        }
    }
}

/// A request for the coverage of one draw.
#[derive(Clone, Copy, Debug)]
pub struct MaskRequest<'a> {
    /// The path.
    pub path: &'a Path,
    /// Fill or stroke.
    pub style: &'a Style,
    /// The view matrix.
    pub matrix: &'a Matrix,
    /// The device space clip.
    pub clip: IntRect,
    /// Whether edges are anti-aliased.
    pub anti_alias: bool,
    /// Flattening parameters.
    pub params: FlattenParams,
}

/// A mask ready to be drawn.
#[derive(Clone, Debug)]
pub struct MaskLookup {
    /// The texture.
    pub texture: MaskTexture,
    /// The device position of the texture's upper left pixel.
    pub origin: (i32, i32),
    /// The device rectangle the texture covers.
    pub bounds: IntRect,
    /// The part of `bounds` inside the clip.
    pub rect: IntRect,
    /// Whether the mask came from the cache.
    pub cache_hit: bool,
}

/// Counters for tests and diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MaskCacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Masks rasterised and cached.
    pub misses: u64,
    /// Masks rasterised without caching.
    pub uncached: u64,
    /// Entries dropped to stay within the byte budget.
    pub evictions: u64,
    /// Entries dropped because their geometry went away.
    pub invalidations: u64,
    /// Entries held.
    pub entries: usize,
    /// Bytes of mask data held.
    pub bytes: usize,
}

#[derive(Debug)]
struct Entry {
    texture: MaskTexture,
    /// Relative to the integer part of the translation.
    rect: IntRect,
    last_used: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<MaskKey, Entry>,
    listened: HashSet<u32>,
    tick: u64,
    stats: MaskCacheStats,
}

impl CacheState {
    fn evict_to(&mut self, max_bytes: usize) {
        while self.stats.bytes > max_bytes {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| *k)
            else {
                break;
            };
            if let Some(entry) = self.entries.remove(&oldest) {
                self.stats.bytes -= entry.texture.byte_size();
                self.stats.evictions += 1;
            }
        }
        self.stats.entries = self.entries.len();
    }
}

/// Masks shared by all draws of a device.
#[derive(Debug)]
pub struct MaskCache {
    config: MaskCacheConfig,
    max_texture_size: u32,
    state: Mutex<CacheState>,
    invalidated_tx: Sender<u32>,
    invalidated_rx: Receiver<u32>,
}

fn to_pixel(v: f32) -> Result<i32, PathError> {
    const LIMIT: f32 = (1 << 30) as f32;
    if v.is_finite() && v.abs() < LIMIT {
        Ok(v as i32)
    } else {
        Err(PathError::NonFinite)
    }
}

/// The geometry a mask is rasterised from, in device space.
///
/// The result never shares its buffer with the source path. A deferred job owns it until the
/// mask is written, and the source's listeners only fire once its last handle is gone.
fn device_path(request: &MaskRequest<'_>, matrix: &Matrix) -> Result<Path, PathError> {
    let device = transformed_path(request, matrix)?;
    if device.data().ptr_eq(request.path.data()) {
        let data = device.data();
        let copy = PathData::try_make(data.points(), data.verbs(), data.conic_weights())?;
        return Ok(Path::new(copy, device.fill_type()));
    }
    Ok(device)
}

/// The coverage path of a request in the space of `matrix`.
fn transformed_path(request: &MaskRequest<'_>, matrix: &Matrix) -> Result<Path, PathError> {
    let path = request.path;
    match request.style {
        Style::Fill => {
            let data = if matrix.has_perspective() {
                let viewport = request.clip.to_rect();
                chop::pre_chop(path.data(), matrix, &viewport, &request.params)?
            } else {
                path.data().try_make_transform(matrix)?
            };
            Ok(Path::new(data, path.fill_type()))
        }
        Style::Stroke(style) => {
            let fill = stroke::stroke_to_fill(path.data(), style, matrix, &request.params)?;
            Ok(if path.is_inverse_fill() {
                fill.with_fill_type(FillType::InverseWinding)
            } else {
                fill
            })
        }
    }
}

impl MaskCache {
    /// Create a cache for a device whose textures are at most `max_texture_size` pixels wide
    /// and high.
    pub fn new(config: MaskCacheConfig, max_texture_size: u32) -> Self {
        let (invalidated_tx, invalidated_rx) = crossbeam_channel::unbounded();
        Self {
            config,
            max_texture_size: max_texture_size.min(u32::from(u16::MAX)),
            state: Mutex::new(CacheState::default()),
            invalidated_tx,
            invalidated_rx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop the entries of geometry that has gone away.
    pub fn purge_invalidated(&self) {
        let ids: HashSet<u32> = self.invalidated_rx.try_iter().collect();
        if ids.is_empty() {
            return;
        }
        let mut state = self.lock();
        let before = state.entries.len();
        let mut freed = 0;
        state.entries.retain(|key, entry| {
            let keep = !ids.contains(&key.data_id);
            if !keep {
                freed += entry.texture.byte_size();
            }
            keep
        });
        let dropped = before - state.entries.len();
        state.stats.bytes -= freed;
        state.stats.invalidations += dropped as u64;
        state.stats.entries = state.entries.len();
        for id in &ids {
            state.listened.remove(id);
        }
        trace!("Dropped {dropped} masks of {} invalidated paths", ids.len());
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.stats.bytes = 0;
        state.stats.entries = 0;
    }

    /// The counters.
    pub fn stats(&self) -> MaskCacheStats {
        self.lock().stats
    }

    /// Find or rasterise the mask of `request`. Returns `None` when nothing of it is visible.
    pub fn get_or_create(
        &self,
        request: &MaskRequest<'_>,
    ) -> Result<Option<MaskLookup>, DrawError> {
        self.purge_invalidated();
        if request.clip.is_empty() {
            return Ok(None);
        }
        let matrix = request.matrix;
        if matrix.has_perspective() {
            return self.one_off(request);
        }
        let dx = to_pixel(matrix.translate_x().floor())?;
        let dy = to_pixel(matrix.translate_y().floor())?;
        let key = MaskKey::new(request);

        if let Some((texture, rect)) = self.lookup(&key) {
            debug!("Mask cache hit for path {}", key.data_id);
            let bounds = rect.checked_offset(dx, dy).ok_or(DrawError::OutOfRange)?;
            return Ok(bounds.intersect(&request.clip).map(|visible| MaskLookup {
                texture,
                origin: (bounds.left, bounds.top),
                bounds,
                rect: visible,
                cache_hit: true,
            }));
        }

        let mask_matrix = Matrix::from_row(
            matrix.scale_x(),
            matrix.skew_x(),
            f32::from(key.frac_x) / 256.,
            matrix.skew_y(),
            matrix.scale_y(),
            f32::from(key.frac_y) / 256.,
        );
        let device = device_path(request, &mask_matrix)?;
        let rect = device.bounds().round_out();
        let bounds = rect.checked_offset(dx, dy).ok_or(DrawError::OutOfRange)?;
        let Some(visible) = bounds.intersect(&request.clip) else {
            return Ok(None);
        };
        let max = self.max_texture_size;
        let fits = rect.width() <= max && rect.height() <= max;
        let compact =
            rect.area() as f64 <= f64::from(self.config.oversize_factor) * visible.area() as f64;
        if !(fits && compact) {
            debug!(
                "Not caching a {}x{} mask with {}x{} visible",
                rect.width(),
                rect.height(),
                visible.width(),
                visible.height()
            );
            return self.one_off(request);
        }

        debug!("Mask cache miss for path {}", key.data_id);
        let texture = self.rasterize(device, rect, request.anti_alias, request.params);
        self.insert(request.path, key, texture.clone(), rect);
        Ok(Some(MaskLookup {
            texture,
            origin: (bounds.left, bounds.top),
            bounds,
            rect: visible,
            cache_hit: false,
        }))
    }

    fn lookup(&self, key: &MaskKey) -> Option<(MaskTexture, IntRect)> {
        let mut state = self.lock();
        state.tick += 1;
        let tick = state.tick;
        let found = state.entries.get_mut(key).map(|entry| {
            entry.last_used = tick;
            (entry.texture.clone(), entry.rect)
        });
        if found.is_some() {
            state.stats.hits += 1;
        }
        found
    }

    fn insert(&self, path: &Path, key: MaskKey, texture: MaskTexture, rect: IntRect) {
        let listen = {
            let mut state = self.lock();
            state.tick += 1;
            let entry = Entry {
                texture,
                rect,
                last_used: state.tick,
            };
            state.stats.misses += 1;
            state.stats.bytes += entry.texture.byte_size();
            if let Some(old) = state.entries.insert(key, entry) {
                state.stats.bytes -= old.texture.byte_size();
            }
            state.evict_to(self.config.max_bytes);
            state.listened.insert(key.data_id)
        };
        if listen {
            let tx = self.invalidated_tx.clone();
            path.data().add_id_change_listener(move |id: u32| {
                // The cache may be gone already.
                let _ = tx.send(id);
            });
        }
    }

    /// A mask over the visible part of the request only, not cached.
    fn one_off(&self, request: &MaskRequest<'_>) -> Result<Option<MaskLookup>, DrawError> {
        let device = device_path(request, request.matrix)?;
        let bounds = device.bounds().round_out();
        let Some(visible) = bounds.intersect(&request.clip) else {
            return Ok(None);
        };
        let max = self.max_texture_size;
        if visible.width() > max || visible.height() > max {
            return Err(DrawError::MaskTooLarge {
                width: visible.width(),
                height: visible.height(),
                max,
            });
        }
        self.lock().stats.uncached += 1;
        let texture = self.rasterize(device, visible, request.anti_alias, request.params);
        Ok(Some(MaskLookup {
            texture,
            origin: (visible.left, visible.top),
            bounds,
            rect: visible,
            cache_hit: false,
        }))
    }

    fn rasterize(
        &self,
        path: Path,
        rect: IntRect,
        anti_alias: bool,
        params: FlattenParams,
    ) -> MaskTexture {
        // Both sides are at most the maximum texture size, which fits in 16 bits.
        let texture = MaskTexture::pending(rect.width() as u16, rect.height() as u16);
        let job = {
            let texture = texture.clone();
            move || {
                let mask = tessel_cpu::rasterize_mask(&path, rect, anti_alias, params);
                texture.fulfill(mask);
            }
        };
        self.spawn(job);
        texture
    }

    #[cfg(feature = "multithreading")]
    fn spawn(&self, job: impl FnOnce() + Send + 'static) {
        if self.config.deferred {
            rayon::spawn(job);
        } else {
            job();
        }
    }

    #[cfg(not(feature = "multithreading"))]
    fn spawn(&self, job: impl FnOnce() + Send + 'static) {
        job();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_common::geometry::{PathDirection, Rect};

    fn square(size: f32) -> Path {
        let data =
            PathData::rect(&Rect::from_ltrb(0., 0., size, size), PathDirection::Cw, 0).unwrap();
        Path::new(data, FillType::Winding)
    }

    fn request<'a>(path: &'a Path, style: &'a Style, matrix: &'a Matrix) -> MaskRequest<'a> {
        MaskRequest {
            path,
            style,
            matrix,
            clip: IntRect::from_ltrb(0, 0, 256, 256),
            anti_alias: false,
            params: FlattenParams::default(),
        }
    }

    fn cache() -> MaskCache {
        MaskCache::new(MaskCacheConfig::default(), 8192)
    }

    #[test]
    fn integer_translations_hit() {
        let cache = cache();
        let path = square(10.);
        let a = Matrix::translate(5., 5.);
        let b = Matrix::translate(40., 17.);
        let first = cache.get_or_create(&request(&path, &Style::Fill, &a)).unwrap().unwrap();
        let second = cache.get_or_create(&request(&path, &Style::Fill, &b)).unwrap().unwrap();
        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert!(first.texture.ptr_eq(&second.texture));
        assert_eq!(first.origin, (5, 5));
        assert_eq!(second.origin, (40, 17));
        assert_eq!(second.rect, IntRect::from_ltrb(40, 17, 50, 27));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn linear_changes_and_subpixel_buckets_miss() {
        let cache = cache();
        let path = square(10.);
        let base = Matrix::translate(5.25, 5.);
        cache.get_or_create(&request(&path, &Style::Fill, &base)).unwrap();
        // Same bucket of 1/256 pixel.
        let near = Matrix::translate(9.2501, 5.);
        assert!(cache
            .get_or_create(&request(&path, &Style::Fill, &near))
            .unwrap()
            .unwrap()
            .cache_hit);
        let far = Matrix::translate(5.5, 5.);
        assert!(!cache
            .get_or_create(&request(&path, &Style::Fill, &far))
            .unwrap()
            .unwrap()
            .cache_hit);
        let scaled = Matrix::translate(5., 5.).concat(&Matrix::scale(2., 1.));
        assert!(!cache
            .get_or_create(&request(&path, &Style::Fill, &scaled))
            .unwrap()
            .unwrap()
            .cache_hit);
        assert_eq!(cache.stats().misses, 3);
    }

    #[test]
    fn dropped_geometry_is_purged() {
        let cache = cache();
        let path = square(10.);
        cache
            .get_or_create(&request(&path, &Style::Fill, &Matrix::IDENTITY))
            .unwrap();
        assert_eq!(cache.stats().entries, 1);
        drop(path);
        cache.purge_invalidated();
        let stats = cache.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.bytes, 0);
        assert_eq!(stats.invalidations, 1);
    }

    #[test]
    fn translations_past_the_coordinate_range_fail() {
        let cache = cache();
        let far = Path::new(
            PathData::rect(
                &Rect::from_ltrb(2.1e9, 0., 2.1e9 + 1000., 10.),
                PathDirection::Cw,
                0,
            )
            .unwrap(),
            FillType::Winding,
        );
        let matrix = Matrix::translate(5e8, 0.);
        assert_eq!(
            cache
                .get_or_create(&request(&far, &Style::Fill, &matrix))
                .unwrap_err(),
            DrawError::OutOfRange
        );
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn device_geometry_never_shares_the_source_buffer() {
        let path = square(10.);
        let device = device_path(
            &request(&path, &Style::Fill, &Matrix::IDENTITY),
            &Matrix::IDENTITY,
        )
        .unwrap();
        assert!(!device.data().ptr_eq(path.data()));
        assert_eq!(device.data(), path.data());
    }

    #[test]
    fn deferred_masks_do_not_keep_dropped_geometry_alive() {
        let cache = MaskCache::new(
            MaskCacheConfig {
                deferred: true,
                ..MaskCacheConfig::default()
            },
            8192,
        );
        let path = square(10.);
        let lookup = cache
            .get_or_create(&request(&path, &Style::Fill, &Matrix::IDENTITY))
            .unwrap()
            .unwrap();
        drop(path);
        lookup.texture.wait();
        assert!(lookup.texture.is_ready());
        assert_eq!(lookup.texture.mask().map(|m| m.data()[0]), Some(255));

        cache.purge_invalidated();
        let stats = cache.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.invalidations, 1);
        // The texture outlives its entry.
        assert_eq!(lookup.texture.width(), 10);
    }

    #[test]
    fn byte_budget_evicts_least_recently_used() {
        let cache = MaskCache::new(
            MaskCacheConfig {
                max_bytes: 150,
                ..MaskCacheConfig::default()
            },
            8192,
        );
        let a = square(10.);
        let b = square(10.);
        cache
            .get_or_create(&request(&a, &Style::Fill, &Matrix::IDENTITY))
            .unwrap();
        cache
            .get_or_create(&request(&b, &Style::Fill, &Matrix::IDENTITY))
            .unwrap();
        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.bytes, 100);
        // `b` survived.
        assert!(cache
            .get_or_create(&request(&b, &Style::Fill, &Matrix::IDENTITY))
            .unwrap()
            .unwrap()
            .cache_hit);
    }

    #[test]
    fn mostly_clipped_masks_are_not_cached() {
        let cache = cache();
        let path = square(1000.);
        let lookup = cache
            .get_or_create(&request(&path, &Style::Fill, &Matrix::IDENTITY))
            .unwrap()
            .unwrap();
        assert_eq!(lookup.rect, IntRect::from_ltrb(0, 0, 256, 256));
        assert_eq!(
            (lookup.texture.width(), lookup.texture.height()),
            (256, 256)
        );
        let stats = cache.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.uncached, 1);
    }

    #[test]
    fn oversized_visible_masks_fail() {
        let cache = MaskCache::new(MaskCacheConfig::default(), 64);
        let path = square(100.);
        let err = cache
            .get_or_create(&request(&path, &Style::Fill, &Matrix::IDENTITY))
            .unwrap_err();
        assert_eq!(
            err,
            DrawError::MaskTooLarge {
                width: 100,
                height: 100,
                max: 64
            }
        );
    }

    #[test]
    fn masks_are_ready_after_waiting() {
        let cache = cache();
        let path = square(12.);
        let lookup = cache
            .get_or_create(&request(&path, &Style::Fill, &Matrix::translate(2., 3.)))
            .unwrap()
            .unwrap();
        lookup.texture.wait();
        let mask = lookup.texture.mask().unwrap();
        assert_eq!((mask.width(), mask.height()), (12, 12));
        assert!(mask.data().iter().all(|&c| c == 255));
    }

    #[test]
    fn invisible_requests_draw_nothing() {
        let cache = cache();
        let path = square(10.);
        let away = Matrix::translate(500., 500.);
        assert!(cache
            .get_or_create(&request(&path, &Style::Fill, &away))
            .unwrap()
            .is_none());
    }
}
