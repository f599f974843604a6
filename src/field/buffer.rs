use crate::error::{CoreError, CoreResult};

/// Grid resolution for a field buffer. Immutable once the buffer exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub width: usize,
    pub height: usize,
}

impl Resolution {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Number of grid sites.
    pub fn texels(&self) -> usize {
        self.width * self.height
    }
}

/// Borrowed real/imag views of one component. Both slices alias the
/// buffer's shared store; length is exactly `width * height`.
pub struct ComponentView<'a> {
    pub real: &'a [f32],
    pub imag: &'a [f32],
}

/// Mutable counterpart of [`ComponentView`].
pub struct ComponentViewMut<'a> {
    pub real: &'a mut [f32],
    pub imag: &'a mut [f32],
}

/// Flat complex-valued field over a fixed grid.
///
/// Layout: one contiguous `f32` store of
/// `width * height * component_count * 2` samples. Each component owns a
/// contiguous segment of `2 * texels` floats, real half followed by imag
/// half, so per-component views are plain subslices of the shared store.
#[derive(Clone, Debug)]
pub struct FieldBuffer {
    resolution: Resolution,
    component_count: usize,
    store: Vec<f32>,
}

impl FieldBuffer {
    /// Create a zero-filled buffer.
    pub fn new(resolution: Resolution, component_count: usize) -> CoreResult<Self> {
        if component_count == 0 {
            return Err(CoreError::ZeroComponents);
        }
        let len = resolution.texels() * component_count * 2;
        Ok(Self {
            resolution,
            component_count,
            store: vec![0.0; len],
        })
    }

    /// Wrap an externally supplied store. The store length must exactly
    /// equal `width * height * component_count * 2`.
    pub fn from_store(
        resolution: Resolution,
        component_count: usize,
        store: Vec<f32>,
    ) -> CoreResult<Self> {
        if component_count == 0 {
            return Err(CoreError::ZeroComponents);
        }
        let expected = resolution.texels() * component_count * 2;
        if store.len() != expected {
            return Err(CoreError::StoreSizeMismatch {
                expected,
                actual: store.len(),
            });
        }
        Ok(Self {
            resolution,
            component_count,
            store,
        })
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn component_count(&self) -> usize {
        self.component_count
    }

    pub fn texels(&self) -> usize {
        self.resolution.texels()
    }

    /// Full interleaved store.
    pub fn store(&self) -> &[f32] {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut [f32] {
        &mut self.store
    }

    /// Store as raw bytes, for hand-off across an execution-context
    /// boundary as a single block.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.store)
    }

    fn segment_base(&self, component: usize) -> CoreResult<usize> {
        if component >= self.component_count {
            return Err(CoreError::ComponentOutOfRange {
                index: component,
                count: self.component_count,
            });
        }
        Ok(component * self.texels() * 2)
    }

    /// Bounds-checked read view of one component.
    pub fn component(&self, component: usize) -> CoreResult<ComponentView<'_>> {
        let base = self.segment_base(component)?;
        let texels = self.texels();
        Ok(ComponentView {
            real: &self.store[base..base + texels],
            imag: &self.store[base + texels..base + 2 * texels],
        })
    }

    /// Bounds-checked write view of one component.
    pub fn component_mut(&mut self, component: usize) -> CoreResult<ComponentViewMut<'_>> {
        let base = self.segment_base(component)?;
        let texels = self.texels();
        let segment = &mut self.store[base..base + 2 * texels];
        let (real, imag) = segment.split_at_mut(texels);
        Ok(ComponentViewMut { real, imag })
    }

    /// Raw `(real, imag)` pair of one sample.
    ///
    /// # Panics
    ///
    /// Panics if `index >= texels()` or `component >= component_count()`,
    /// like slice indexing.
    pub fn sample_at(&self, index: usize, component: usize) -> (f32, f32) {
        assert!(
            component < self.component_count,
            "component {} out of range ({})",
            component,
            self.component_count
        );
        let texels = self.texels();
        let base = component * texels * 2;
        assert!(index < texels, "sample index {} out of range ({})", index, texels);
        (self.store[base + index], self.store[base + texels + index])
    }

    /// Phase of one sample: `atan2(imag, real)`. Non-finite samples
    /// propagate as NaN; they are not special-cased here.
    ///
    /// # Panics
    ///
    /// Panics if `index >= texels()` or `component >= component_count()`,
    /// like slice indexing.
    pub fn phase_at(&self, index: usize, component: usize) -> f32 {
        let (re, im) = self.sample_at(index, component);
        im.atan2(re)
    }

    /// Rotate every sample of one component (or all components when
    /// `component` is `None`) by `delta` radians. Exact no-op for a zero
    /// delta.
    pub fn rotate_phase(&mut self, delta: f32, component: Option<usize>) -> CoreResult<()> {
        if delta == 0.0 {
            return Ok(());
        }
        let (cos_d, sin_d) = (delta.cos(), delta.sin());
        match component {
            Some(c) => self.rotate_component(c, cos_d, sin_d),
            None => {
                for c in 0..self.component_count {
                    self.rotate_component(c, cos_d, sin_d)?;
                }
                Ok(())
            }
        }
    }

    fn rotate_component(&mut self, component: usize, cos_d: f32, sin_d: f32) -> CoreResult<()> {
        let view = self.component_mut(component)?;
        for (re, im) in view.real.iter_mut().zip(view.imag.iter_mut()) {
            let (r, i) = (*re, *im);
            *re = r * cos_d - i * sin_d;
            *im = r * sin_d + i * cos_d;
        }
        Ok(())
    }
}
