use std::cell::Cell;
use std::rc::Rc;

use super::FrameError;

/// Per-frame protocol state of a graphics context.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameState {
    /// No frame outstanding; resize/release are allowed.
    Idle,
    /// Frame `index` has been handed out and not yet returned.
    Prepared { index: u64 },
}

/// Enforces `Idle -> Prepared -> Idle`.
///
/// The state cell is shared with the [`FrameGuard`] of the outstanding frame so
/// that dropping a frame returns the tracker to `Idle`.
#[derive(Debug)]
pub(crate) struct FrameTracker {
    state: Rc<Cell<FrameState>>,
    next_index: u64,
}

impl FrameTracker {
    pub(crate) fn new() -> Self {
        Self {
            state: Rc::new(Cell::new(FrameState::Idle)),
            next_index: 0,
        }
    }

    pub(crate) fn state(&self) -> FrameState {
        self.state.get()
    }

    /// Index the next successful `begin` will hand out.
    #[cfg(test)]
    pub(crate) fn next_index(&self) -> u64 {
        self.next_index
    }

    pub(crate) fn ensure_idle(&self) -> Result<(), FrameError> {
        match self.state.get() {
            FrameState::Idle => Ok(()),
            FrameState::Prepared { .. } => Err(FrameError::FrameInFlight),
        }
    }

    /// Checks that a frame may be prepared, without changing state.
    pub(crate) fn check_begin(&self) -> Result<(), FrameError> {
        match self.state.get() {
            FrameState::Idle => Ok(()),
            FrameState::Prepared { index } => Err(FrameError::AlreadyPrepared { index }),
        }
    }

    pub(crate) fn begin(&mut self) -> Result<u64, FrameError> {
        self.check_begin()?;
        let index = self.next_index;
        self.next_index = self.next_index.wrapping_add(1);
        self.state.set(FrameState::Prepared { index });
        Ok(index)
    }

    pub(crate) fn end(&mut self, index: u64) -> Result<(), FrameError> {
        match self.state.get() {
            FrameState::Idle => Err(FrameError::NotPrepared),
            FrameState::Prepared { index: expected } if expected != index => {
                Err(FrameError::StaleFrame {
                    expected,
                    actual: index,
                })
            }
            FrameState::Prepared { .. } => {
                self.state.set(FrameState::Idle);
                Ok(())
            }
        }
    }

    /// Guard for frame `index`, to be owned by the frame.
    pub(crate) fn guard(&self, index: u64) -> FrameGuard {
        FrameGuard {
            state: Rc::clone(&self.state),
            index,
        }
    }
}

/// Abandons its frame on drop if the frame is still the outstanding one.
///
/// After `present_frame`/`discard_frame` the tracker is already `Idle` and the
/// guard does nothing; a stale guard never touches a newer frame.
#[derive(Debug)]
pub(crate) struct FrameGuard {
    state: Rc<Cell<FrameState>>,
    index: u64,
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        if self.state.get() == (FrameState::Prepared { index: self.index }) {
            log::warn!(
                "frame {} dropped without present_frame/discard_frame; abandoned",
                self.index
            );
            self.state.set(FrameState::Idle);
        }
    }
}

pub(crate) enum FrameTarget {
    Surface(wgpu::SurfaceTexture),
    Offscreen,
}

/// Represents a single acquired frame.
///
/// Owns the backbuffer, the command encoder and the open render pass. All draw
/// calls for the frame are recorded through [`Frame::pass`]; handing the frame
/// back to `present_frame` ends the pass, submits and presents. Because the
/// frame is moved into `present_frame`, nothing can be recorded into it
/// afterwards. Dropping a frame instead abandons it: nothing is submitted and
/// the context can prepare the next one.
pub struct Frame {
    pub(crate) index: u64,
    pub(crate) pass: wgpu::RenderPass<'static>,
    pub(crate) encoder: wgpu::CommandEncoder,
    pub(crate) view: wgpu::TextureView,
    pub(crate) target: FrameTarget,
    pub(crate) color_size: (u32, u32),
    pub(crate) depth_size: (u32, u32),
    /// Dropped last, after the pass and the encoder.
    pub(crate) guard: FrameGuard,
}

impl Frame {
    /// Render pass recording into the backbuffer and the depth buffer.
    pub fn pass(&mut self) -> &mut wgpu::RenderPass<'static> {
        &mut self.pass
    }

    /// Monotonic index of this frame within its context.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Color attachment size in physical pixels.
    pub fn color_size(&self) -> (u32, u32) {
        self.color_size
    }

    /// Depth attachment size in physical pixels.
    pub fn depth_size(&self) -> (u32, u32) {
        self.depth_size
    }

    /// Backbuffer view of this frame.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_then_end_returns_to_idle() {
        let mut t = FrameTracker::new();
        let index = t.begin().expect("idle tracker accepts a frame");
        assert_eq!(t.state(), FrameState::Prepared { index });
        t.end(index).expect("matching index is accepted");
        assert_eq!(t.state(), FrameState::Idle);
    }

    #[test]
    fn double_begin_is_rejected() {
        let mut t = FrameTracker::new();
        let index = t.begin().unwrap();
        match t.begin() {
            Err(FrameError::AlreadyPrepared { index: i }) => assert_eq!(i, index),
            other => panic!("expected AlreadyPrepared, got {other:?}"),
        }
        // The outstanding frame is untouched.
        assert_eq!(t.state(), FrameState::Prepared { index });
    }

    #[test]
    fn end_without_begin_is_rejected() {
        let mut t = FrameTracker::new();
        assert!(matches!(t.end(0), Err(FrameError::NotPrepared)));
    }

    #[test]
    fn stale_index_is_rejected() {
        let mut t = FrameTracker::new();
        let first = t.begin().unwrap();
        t.end(first).unwrap();
        let second = t.begin().unwrap();
        assert!(matches!(
            t.end(first),
            Err(FrameError::StaleFrame { expected, actual })
                if expected == second && actual == first
        ));
    }

    #[test]
    fn indices_increase_per_frame() {
        let mut t = FrameTracker::new();
        for expected in 0..5 {
            let index = t.begin().unwrap();
            assert_eq!(index, expected);
            t.end(index).unwrap();
        }
        assert_eq!(t.next_index(), 5);
    }

    #[test]
    fn dropped_guard_abandons_outstanding_frame() {
        let mut t = FrameTracker::new();
        let index = t.begin().unwrap();
        drop(t.guard(index));
        assert_eq!(t.state(), FrameState::Idle);
        assert_eq!(t.begin().unwrap(), index + 1);
    }

    #[test]
    fn guard_after_end_is_inert() {
        let mut t = FrameTracker::new();
        let first = t.begin().unwrap();
        let guard = t.guard(first);
        t.end(first).unwrap();
        let second = t.begin().unwrap();

        // The first frame's guard must not release the second frame.
        drop(guard);
        assert_eq!(t.state(), FrameState::Prepared { index: second });
    }

    #[test]
    fn in_flight_blocks_idle_only_operations() {
        let mut t = FrameTracker::new();
        assert!(t.ensure_idle().is_ok());
        let index = t.begin().unwrap();
        assert!(matches!(t.ensure_idle(), Err(FrameError::FrameInFlight)));
        t.end(index).unwrap();
        assert!(t.ensure_idle().is_ok());
    }
}
