use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::{
    DEFAULT_ALIGN_TOLERANCE, DEFAULT_DT, DEFAULT_PIXEL_PITCH_M, DEFAULT_POOL_CAPACITY,
    DEFAULT_WAVELENGTH_NM, SCHEMA_VERSION, SOLVER_ID,
};
use crate::error::{CoreError, CoreResult};

use super::buffer::{FieldBuffer, Resolution};
use super::metadata::{
    FrameMetadata, PhaseOrigin, PhaseReference, SpaceDomain, StampOptions,
};
use super::wrap_angle;

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Request to bring the phase at an anchor sample to a reference value.
#[derive(Clone, Copy, Debug)]
pub struct PhaseAlignRequest {
    pub anchor_index: usize,
    pub reference_phase: f32,
    pub tolerance: f32,
}

impl PhaseAlignRequest {
    pub fn new(anchor_index: usize, reference_phase: f32) -> Self {
        Self {
            anchor_index,
            reference_phase,
            tolerance: DEFAULT_ALIGN_TOLERANCE,
        }
    }
}

/// Synchronous listener for phase-alignment events. Invoked while the
/// pool is mutably borrowed, so a listener cannot re-enter the pool.
pub type AlignObserver = Box<dyn FnMut(&FieldFrame, &PhaseAlignRequest, f32)>;

/// A live frame: field buffer plus its current metadata. Obtained from
/// [`FramePool::acquire`] and handed back through [`FramePool::release`];
/// single ownership is the move itself.
#[derive(Debug)]
pub struct FieldFrame {
    buffer: FieldBuffer,
    metadata: FrameMetadata,
    pool_id: u64,
}

impl FieldFrame {
    pub fn buffer(&self) -> &FieldBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut FieldBuffer {
        &mut self.buffer
    }

    pub fn metadata(&self) -> &FrameMetadata {
        &self.metadata
    }
}

/// Single authority for buffer lifecycle, frame-id allocation, and
/// metadata continuity across acquire/release cycles.
pub struct FramePool {
    resolution: Resolution,
    component_count: usize,
    capacity: usize,
    pool_id: u64,
    next_frame_id: i64,
    free: Vec<FieldBuffer>,
    observers: Vec<AlignObserver>,
}

impl FramePool {
    pub fn new(resolution: Resolution, component_count: usize) -> Self {
        Self::with_capacity(resolution, component_count, DEFAULT_POOL_CAPACITY)
    }

    pub fn with_capacity(
        resolution: Resolution,
        component_count: usize,
        capacity: usize,
    ) -> Self {
        let pool_id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "frame pool {}: {}x{} grid, {} component(s), capacity {}",
            pool_id,
            resolution.width,
            resolution.height,
            component_count,
            capacity
        );
        Self {
            resolution,
            component_count,
            capacity,
            pool_id,
            next_frame_id: 0,
            free: Vec::new(),
            observers: Vec::new(),
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn component_count(&self) -> usize {
        self.component_count
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of free buffers currently pooled.
    pub fn pooled(&self) -> usize {
        self.free.len()
    }

    /// Register a phase-alignment listener.
    pub fn add_align_observer(&mut self, observer: AlignObserver) {
        self.observers.push(observer);
    }

    /// Check out a frame. A requested component count that differs from
    /// the pool's configured count is a configuration error, never
    /// silently reconciled.
    pub fn acquire(&mut self, component_count: Option<usize>) -> CoreResult<FieldFrame> {
        if let Some(requested) = component_count {
            if requested != self.component_count {
                return Err(CoreError::ComponentCountMismatch {
                    configured: self.component_count,
                    requested,
                });
            }
        }
        let buffer = match self.free.pop() {
            Some(buffer) => buffer,
            None => FieldBuffer::new(self.resolution, self.component_count)?,
        };
        let mut frame = FieldFrame {
            buffer,
            metadata: self.unstamped_metadata(),
            pool_id: self.pool_id,
        };
        self.stamp(&mut frame, StampOptions::default())?;
        Ok(frame)
    }

    /// Check a frame back in. The buffer is kept for reuse only while the
    /// pool is under capacity; surplus buffers are dropped.
    pub fn release(&mut self, frame: FieldFrame) -> CoreResult<()> {
        if frame.pool_id != self.pool_id {
            return Err(CoreError::UnmanagedFrame);
        }
        if self.free.len() < self.capacity {
            self.free.push(frame.buffer);
        } else {
            log::debug!("frame pool {}: at capacity, dropping released buffer", self.pool_id);
        }
        Ok(())
    }

    /// Replace the frame's metadata. Fields absent from `options` carry
    /// forward from the previous stamp (`dt`, `wavelength_nm`,
    /// `pixel_pitch_m`, `space`, `timestamp`); `phase_reference` resets to
    /// `Wrapped` unless supplied and `phase_origin` always clears, so a
    /// plain stamp returns the frame to the unaligned reference state.
    pub fn stamp(&mut self, frame: &mut FieldFrame, options: StampOptions) -> CoreResult<()> {
        if frame.pool_id != self.pool_id {
            return Err(CoreError::UnmanagedFrame);
        }
        let frame_id = self.allocate_frame_id(options.frame_id);
        let prev = &frame.metadata;
        frame.metadata = FrameMetadata {
            schema_version: SCHEMA_VERSION,
            solver: SOLVER_ID,
            solver_instance_id: self.pool_id,
            frame_id,
            component_count: self.component_count,
            timestamp: options.timestamp.unwrap_or(prev.timestamp),
            dt: options.dt.unwrap_or(prev.dt),
            wavelength_nm: options.wavelength_nm.unwrap_or(prev.wavelength_nm),
            pixel_pitch_m: options.pixel_pitch_m.unwrap_or(prev.pixel_pitch_m),
            space: options.space.unwrap_or(prev.space),
            phase_reference: options.phase_reference.unwrap_or(PhaseReference::Wrapped),
            phase_origin: None,
            notes: options.notes,
            user_tags: options.user_tags.unwrap_or_default(),
        };
        Ok(())
    }

    /// Bring the phase at the anchor sample of the primary component to
    /// the requested reference by rotating the whole frame.
    ///
    /// A non-finite anchor phase (e.g. a freshly zeroed field) yields a
    /// zero delta and leaves the buffer untouched. The rotation is
    /// applied only when `|delta| > tolerance`; the metadata becomes
    /// `Aligned` with a recorded origin either way. Returns the delta.
    pub fn align_phase(
        &mut self,
        frame: &mut FieldFrame,
        request: &PhaseAlignRequest,
    ) -> CoreResult<f32> {
        if frame.pool_id != self.pool_id {
            return Err(CoreError::UnmanagedFrame);
        }
        let texels = self.resolution.texels();
        if request.anchor_index >= texels {
            return Err(CoreError::AnchorOutOfBounds {
                index: request.anchor_index,
                texels,
            });
        }
        // A zero sample has no usable phase; treat it like a non-finite
        // read and skip the correction entirely.
        let (re, im) = frame.buffer.sample_at(request.anchor_index, 0);
        let current = im.atan2(re);
        let delta = if (re == 0.0 && im == 0.0) || !current.is_finite() {
            0.0
        } else {
            wrap_angle(request.reference_phase - current)
        };
        if delta.abs() > request.tolerance {
            frame.buffer.rotate_phase(delta, None)?;
        }
        frame.metadata = FrameMetadata {
            phase_reference: PhaseReference::Aligned,
            phase_origin: Some(PhaseOrigin {
                anchor_index: request.anchor_index,
                reference_phase: request.reference_phase,
                applied_delta: delta,
            }),
            ..frame.metadata.clone()
        };
        for observer in self.observers.iter_mut() {
            observer(&*frame, request, delta);
        }
        Ok(delta)
    }

    /// Frame-id ratchet: an explicit id at or past the next expected id
    /// advances the counter to `id + 1`; a lower explicit id is overridden
    /// to the next expected id so stamped ids never move backward.
    fn allocate_frame_id(&mut self, requested: Option<i64>) -> i64 {
        let id = match requested {
            Some(id) if id >= self.next_frame_id => id,
            _ => self.next_frame_id,
        };
        self.next_frame_id = id + 1;
        id
    }

    fn unstamped_metadata(&self) -> FrameMetadata {
        FrameMetadata {
            schema_version: SCHEMA_VERSION,
            solver: SOLVER_ID,
            solver_instance_id: self.pool_id,
            frame_id: -1,
            component_count: self.component_count,
            timestamp: 0.0,
            dt: DEFAULT_DT,
            wavelength_nm: DEFAULT_WAVELENGTH_NM,
            pixel_pitch_m: DEFAULT_PIXEL_PITCH_M,
            space: SpaceDomain::Screen,
            phase_reference: PhaseReference::Wrapped,
            phase_origin: None,
            notes: None,
            user_tags: Vec::new(),
        }
    }
}
