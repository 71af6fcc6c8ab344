//! Per-frame pass ordering.
//!
//! A frame always runs `Start → DepthPass(0) → DepthPass(1) → Lighting → Skybox → [Overlay] →
//! Present`. [`FrameOrchestrator`] drives any [`FrameBackend`] through that sequence and
//! [`FrameSequence`] rejects every other transition.

use crate::error::RenderError;
use crate::renderer::lights::{
    CubeFaceTransforms, FaceTransformCache, PointLight, POINT_LIGHT_COUNT,
};
use crate::renderer::passes::LightingInputs;
use crate::scene::SceneObject;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramePhase {
    Start,
    DepthPass(usize),
    Lighting,
    Skybox,
    Overlay,
    Present,
}

impl FramePhase {
    fn may_follow(self, from: FramePhase) -> bool {
        use FramePhase::*;

        match (from, self) {
            (Start, DepthPass(0)) => true,
            (DepthPass(light), DepthPass(next)) => next == light + 1 && next < POINT_LIGHT_COUNT,
            (DepthPass(light), Lighting) => light + 1 == POINT_LIGHT_COUNT,
            (Lighting, Skybox) => true,
            (Skybox, Overlay) | (Skybox, Present) | (Overlay, Present) => true,
            _ => false,
        }
    }
}

/// Tracks the phase of the frame being recorded.
#[derive(Debug)]
pub struct FrameSequence {
    phase: FramePhase,
}

impl Default for FrameSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSequence {
    pub fn new() -> Self {
        Self {
            phase: FramePhase::Start,
        }
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn advance(&mut self, next: FramePhase) -> Result<(), RenderError> {
        if !next.may_follow(self.phase) {
            return Err(RenderError::OutOfOrder {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }
}

/// Everything a frame draws, gathered before the first pass.
#[derive(Clone, Copy, Debug)]
pub struct FrameInputs<'a> {
    pub objects: &'a [SceneObject],
    pub lighting: LightingInputs,
    pub overlay: bool,
}

/// The passes of one frame, in the order the orchestrator calls them.
pub trait FrameBackend {
    fn begin_frame(&mut self, frame_index: u64, inputs: &FrameInputs<'_>) -> Result<(), RenderError>;

    fn depth_pass(
        &mut self,
        light_index: usize,
        light: &PointLight,
        transforms: &CubeFaceTransforms,
        inputs: &FrameInputs<'_>,
    ) -> Result<(), RenderError>;

    fn lighting_pass(
        &mut self,
        lights: &[PointLight; POINT_LIGHT_COUNT],
        inputs: &FrameInputs<'_>,
    ) -> Result<(), RenderError>;

    fn skybox_pass(&mut self) -> Result<(), RenderError>;

    fn overlay_pass(&mut self) -> Result<(), RenderError>;

    fn present(&mut self) -> Result<(), RenderError>;

    /// Drops a partially recorded frame after an error.
    fn abort_frame(&mut self) {}
}

/// Owns the point lights and runs one frame at a time against a backend.
#[derive(Debug)]
pub struct FrameOrchestrator {
    lights: [PointLight; POINT_LIGHT_COUNT],
    cache: FaceTransformCache,
    frame_index: u64,
}

impl Default for FrameOrchestrator {
    fn default() -> Self {
        Self::new(PointLight::lamp_pair())
    }
}

impl FrameOrchestrator {
    pub fn new(lights: [PointLight; POINT_LIGHT_COUNT]) -> Self {
        Self {
            lights,
            cache: FaceTransformCache::default(),
            frame_index: 0,
        }
    }

    pub fn lights(&self) -> &[PointLight; POINT_LIGHT_COUNT] {
        &self.lights
    }

    /// Index the next frame will run with.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn run_frame<B: FrameBackend>(
        &mut self,
        backend: &mut B,
        inputs: &FrameInputs<'_>,
    ) -> Result<(), RenderError> {
        let frame_index = self.frame_index;
        // Every attempt gets a fresh index so a failed frame never leaves maps looking current.
        self.frame_index += 1;

        let result = self.record(backend, frame_index, inputs);
        if result.is_err() {
            backend.abort_frame();
        }
        result
    }

    fn record<B: FrameBackend>(
        &mut self,
        backend: &mut B,
        frame_index: u64,
        inputs: &FrameInputs<'_>,
    ) -> Result<(), RenderError> {
        let mut sequence = FrameSequence::new();
        backend.begin_frame(frame_index, inputs)?;

        for (index, light) in self.lights.iter().enumerate() {
            sequence.advance(FramePhase::DepthPass(index))?;
            let transforms = self.cache.get(index, light);
            backend.depth_pass(index, light, &transforms, inputs)?;
        }

        sequence.advance(FramePhase::Lighting)?;
        backend.lighting_pass(&self.lights, inputs)?;

        sequence.advance(FramePhase::Skybox)?;
        backend.skybox_pass()?;

        if inputs.overlay {
            sequence.advance(FramePhase::Overlay)?;
            backend.overlay_pass()?;
        }

        sequence.advance(FramePhase::Present)?;
        backend.present()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::lights::DirectionalLight;
    use crate::renderer::shadows::ShadowFreshness;
    use glam::{Mat4, Vec3};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Begin(u64),
        Depth(usize),
        Lighting,
        Skybox,
        Overlay,
        Present,
        Abort,
    }

    struct RecordingBackend {
        calls: Vec<Call>,
        freshness: ShadowFreshness,
        skip_write: Option<usize>,
        transforms: Vec<CubeFaceTransforms>,
    }

    impl RecordingBackend {
        fn new() -> Self {
            Self {
                calls: Vec::new(),
                freshness: ShadowFreshness::new(POINT_LIGHT_COUNT),
                skip_write: None,
                transforms: Vec::new(),
            }
        }
    }

    impl FrameBackend for RecordingBackend {
        fn begin_frame(&mut self, frame_index: u64, _: &FrameInputs<'_>) -> Result<(), RenderError> {
            self.calls.push(Call::Begin(frame_index));
            self.freshness.begin_frame(frame_index);
            Ok(())
        }

        fn depth_pass(
            &mut self,
            light_index: usize,
            _: &PointLight,
            transforms: &CubeFaceTransforms,
            _: &FrameInputs<'_>,
        ) -> Result<(), RenderError> {
            self.calls.push(Call::Depth(light_index));
            self.transforms.push(*transforms);
            if self.skip_write != Some(light_index) {
                self.freshness.mark_written(light_index);
            }
            Ok(())
        }

        fn lighting_pass(
            &mut self,
            _: &[PointLight; POINT_LIGHT_COUNT],
            _: &FrameInputs<'_>,
        ) -> Result<(), RenderError> {
            for light in 0..POINT_LIGHT_COUNT {
                self.freshness.ensure_current(light)?;
            }
            self.calls.push(Call::Lighting);
            Ok(())
        }

        fn skybox_pass(&mut self) -> Result<(), RenderError> {
            self.calls.push(Call::Skybox);
            Ok(())
        }

        fn overlay_pass(&mut self) -> Result<(), RenderError> {
            self.calls.push(Call::Overlay);
            Ok(())
        }

        fn present(&mut self) -> Result<(), RenderError> {
            self.calls.push(Call::Present);
            Ok(())
        }

        fn abort_frame(&mut self) {
            self.calls.push(Call::Abort);
        }
    }

    fn inputs(overlay: bool) -> FrameInputs<'static> {
        FrameInputs {
            objects: &[],
            lighting: LightingInputs {
                view: Mat4::IDENTITY,
                projection: Mat4::IDENTITY,
                camera_position: Vec3::new(0.0, 0.0, 3.0),
                camera_front: Vec3::NEG_Z,
                directional: DirectionalLight::default(),
                spotlight_enabled: false,
                shadows_enabled: true,
            },
            overlay,
        }
    }

    #[test]
    fn depth_passes_precede_lighting_every_frame() {
        let mut orchestrator = FrameOrchestrator::default();
        let mut backend = RecordingBackend::new();

        for _ in 0..3 {
            orchestrator
                .run_frame(&mut backend, &inputs(false))
                .expect("frame runs");
        }

        let frames: Vec<&[Call]> = backend.calls.chunks(6).collect();
        assert_eq!(frames.len(), 3);
        for (index, frame) in frames.iter().enumerate() {
            assert_eq!(
                *frame,
                &[
                    Call::Begin(index as u64),
                    Call::Depth(0),
                    Call::Depth(1),
                    Call::Lighting,
                    Call::Skybox,
                    Call::Present,
                ][..]
            );
        }
    }

    #[test]
    fn overlay_runs_between_skybox_and_present() {
        let mut orchestrator = FrameOrchestrator::default();
        let mut backend = RecordingBackend::new();
        orchestrator
            .run_frame(&mut backend, &inputs(true))
            .expect("frame runs");

        assert_eq!(
            &backend.calls[4..],
            &[Call::Skybox, Call::Overlay, Call::Present]
        );
    }

    #[test]
    fn out_of_order_transitions_are_rejected() {
        let mut sequence = FrameSequence::new();
        assert!(matches!(
            sequence.advance(FramePhase::Lighting),
            Err(RenderError::OutOfOrder {
                from: FramePhase::Start,
                to: FramePhase::Lighting
            })
        ));

        sequence.advance(FramePhase::DepthPass(0)).expect("first light");
        assert!(sequence.advance(FramePhase::Lighting).is_err());
        assert!(sequence.advance(FramePhase::DepthPass(0)).is_err());
        sequence.advance(FramePhase::DepthPass(1)).expect("second light");
        assert!(sequence.advance(FramePhase::DepthPass(2)).is_err());
        sequence.advance(FramePhase::Lighting).expect("lighting");
        assert!(sequence.advance(FramePhase::Present).is_err());
        sequence.advance(FramePhase::Skybox).expect("skybox");
        sequence.advance(FramePhase::Present).expect("present");
        assert_eq!(sequence.phase(), FramePhase::Present);
        assert!(sequence.advance(FramePhase::Overlay).is_err());
    }

    #[test]
    fn stale_cube_map_aborts_the_frame() {
        let mut orchestrator = FrameOrchestrator::default();
        let mut backend = RecordingBackend::new();
        backend.skip_write = Some(1);

        let result = orchestrator.run_frame(&mut backend, &inputs(false));
        assert!(matches!(
            result,
            Err(RenderError::StaleShadowMap { light: 1, frame: 0 })
        ));
        assert_eq!(backend.calls.last(), Some(&Call::Abort));
        assert!(!backend.calls.contains(&Call::Present));
    }

    #[test]
    fn failed_frame_still_advances_the_index() {
        let mut orchestrator = FrameOrchestrator::default();
        let mut backend = RecordingBackend::new();
        backend.skip_write = Some(0);
        assert!(orchestrator.run_frame(&mut backend, &inputs(false)).is_err());

        backend.skip_write = None;
        orchestrator
            .run_frame(&mut backend, &inputs(false))
            .expect("second frame runs");
        assert!(backend.calls.contains(&Call::Begin(1)));
        assert_eq!(orchestrator.frame_index(), 2);
    }

    #[test]
    fn cached_transforms_match_fresh_ones() {
        let mut orchestrator = FrameOrchestrator::default();
        let mut backend = RecordingBackend::new();
        orchestrator
            .run_frame(&mut backend, &inputs(false))
            .expect("frame 0");
        orchestrator
            .run_frame(&mut backend, &inputs(false))
            .expect("frame 1");

        let lights = PointLight::lamp_pair();
        for (call, transforms) in backend.transforms.iter().enumerate() {
            assert_eq!(*transforms, lights[call % POINT_LIGHT_COUNT].face_transforms());
        }
    }
}
