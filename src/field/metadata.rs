/// Spatial domain a frame's samples live in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpaceDomain {
    Screen,
    Pupil,
    VolumeSlice,
}

/// Phase reference state of a frame. A plain stamp always returns the
/// frame to `Wrapped`; `Aligned` is only set by an explicit alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseReference {
    Wrapped,
    Aligned,
}

/// Record of an applied phase alignment: which sample anchored it, the
/// phase it was brought to, and the global delta that was applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseOrigin {
    pub anchor_index: usize,
    pub reference_phase: f32,
    pub applied_delta: f32,
}

/// Metadata stamped onto a frame. Replaced wholesale on every stamp,
/// never mutated field-by-field.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameMetadata {
    pub schema_version: u32,
    pub solver: &'static str,
    pub solver_instance_id: u64,
    /// Monotonically increasing per pool; -1 means "never stamped".
    pub frame_id: i64,
    pub component_count: usize,
    pub timestamp: f64,
    pub dt: f32,
    pub wavelength_nm: f32,
    pub pixel_pitch_m: f32,
    pub space: SpaceDomain,
    pub phase_reference: PhaseReference,
    /// Present only after an explicit alignment; cleared by plain stamps.
    pub phase_origin: Option<PhaseOrigin>,
    pub notes: Option<String>,
    pub user_tags: Vec<String>,
}

/// Optional overrides for a stamp. Fields left `None` carry forward from
/// the frame's previous metadata (`dt`, `wavelength_nm`, `pixel_pitch_m`,
/// `space`) or take their documented reset value (`phase_reference`
/// becomes `Wrapped`, `notes`/`user_tags` clear).
#[derive(Clone, Debug, Default)]
pub struct StampOptions {
    pub frame_id: Option<i64>,
    pub timestamp: Option<f64>,
    pub dt: Option<f32>,
    pub wavelength_nm: Option<f32>,
    pub pixel_pitch_m: Option<f32>,
    pub space: Option<SpaceDomain>,
    pub phase_reference: Option<PhaseReference>,
    pub notes: Option<String>,
    pub user_tags: Option<Vec<String>>,
}

impl StampOptions {
    /// Overrides carrying only a timestamp and dt, the shape the
    /// integrator uses after each step.
    pub fn timing(timestamp: f64, dt: f32) -> Self {
        Self {
            timestamp: Some(timestamp),
            dt: Some(dt),
            ..Self::default()
        }
    }
}
