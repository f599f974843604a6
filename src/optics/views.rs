/// Derived per-site views produced by the post-step operator schedule:
/// phase gradient (x, y), vorticity, coherence, and amplitude.
///
/// All five segments live in one contiguous block laid out
/// `gradX | gradY | vort | coh | amp` so consumers can move the whole
/// thing across an execution-context boundary as a single transfer.
#[derive(Clone, Debug)]
pub struct DerivedViews {
    texels: usize,
    store: Vec<f32>,
}

/// Mutable slices of all five segments at once, for operator passes that
/// write more than one view in a single sweep.
pub struct ViewSegmentsMut<'a> {
    pub grad_x: &'a mut [f32],
    pub grad_y: &'a mut [f32],
    pub vort: &'a mut [f32],
    pub coh: &'a mut [f32],
    pub amp: &'a mut [f32],
}

impl DerivedViews {
    pub fn new(texels: usize) -> Self {
        Self {
            texels,
            store: vec![0.0; texels * 5],
        }
    }

    pub fn texels(&self) -> usize {
        self.texels
    }

    pub fn grad_x(&self) -> &[f32] {
        &self.store[..self.texels]
    }

    pub fn grad_y(&self) -> &[f32] {
        &self.store[self.texels..2 * self.texels]
    }

    pub fn vort(&self) -> &[f32] {
        &self.store[2 * self.texels..3 * self.texels]
    }

    pub fn coh(&self) -> &[f32] {
        &self.store[3 * self.texels..4 * self.texels]
    }

    pub fn amp(&self) -> &[f32] {
        &self.store[4 * self.texels..]
    }

    pub fn segments_mut(&mut self) -> ViewSegmentsMut<'_> {
        let (grad_x, rest) = self.store.split_at_mut(self.texels);
        let (grad_y, rest) = rest.split_at_mut(self.texels);
        let (vort, rest) = rest.split_at_mut(self.texels);
        let (coh, amp) = rest.split_at_mut(self.texels);
        ViewSegmentsMut {
            grad_x,
            grad_y,
            vort,
            coh,
            amp,
        }
    }

    /// The whole block as one slice, segment order as documented.
    pub fn as_slice(&self) -> &[f32] {
        &self.store
    }

    /// The whole block as raw bytes for a single-copy hand-off.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.store)
    }
}
