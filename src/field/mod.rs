mod buffer;
mod metadata;
mod pool;

pub use buffer::{ComponentView, ComponentViewMut, FieldBuffer, Resolution};
pub use metadata::{
    FrameMetadata, PhaseOrigin, PhaseReference, SpaceDomain, StampOptions,
};
pub use pool::{AlignObserver, FieldFrame, FramePool, PhaseAlignRequest};

/// Wrap an angle into (-pi, pi].
pub fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let mut wrapped = angle % TAU;
    if wrapped > PI {
        wrapped -= TAU;
    } else if wrapped <= -PI {
        wrapped += TAU;
    }
    wrapped
}
