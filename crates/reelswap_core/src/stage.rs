//! 分段播放
//!
//! 播放起始帧到结束帧之间的一段，可循环。起始帧为 1 时直接回到开头播放，
//! 否则先跳帧，跳帧完成后才开始监视结束帧。起始帧等于结束帧时为定帧，
//! 跳帧完成即暂停。

use log::debug;

use crate::{DualPlayer, PlaybackEngine, PlayerEvent, SlotId};

/// 一段播放的描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSpec {
    pub start: i32,
    pub end: i32,
    pub looping: bool,
    /// 目标播放器，None 为当前播放器
    pub slot: Option<SlotId>,
}

impl StageSpec {
    pub fn new(start: i32, end: i32) -> Self {
        Self {
            start,
            end,
            looping: false,
            slot: None,
        }
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn on(mut self, slot: SlotId) -> Self {
        self.slot = Some(slot);
        self
    }

    /// 定帧：起始帧等于结束帧
    pub fn is_locked(&self) -> bool {
        self.start == self.end
    }
}

/// 分段播放所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagePhase {
    /// 等待跳到起始帧
    AwaitingSeek,
    /// 监视结束帧
    Watching,
    /// 定帧已暂停
    Locked,
}

/// 到达结束帧时的回调，循环播放时每轮调用一次
pub type SegmentHandler<E> = dyn FnMut(&mut DualPlayer<E>);

pub(crate) struct Stage<E> {
    spec: StageSpec,
    slot: SlotId,
    phase: StagePhase,
    on_end: Option<Box<SegmentHandler<E>>>,
}

impl<E: PlaybackEngine + 'static> DualPlayer<E> {
    /// 播放一段，替换正在进行的分段播放
    ///
    /// 结束帧按当前播放器的帧号判断；`StageSpec::on` 指向后台播放器时，
    /// 跳帧和播放作用于后台播放器，但结束帧仍以正在显示的视频为准。
    /// 目标播放器在切换中被关闭时，分段播放随之结束。
    pub fn play_stage(&mut self, spec: StageSpec) {
        self.begin_stage(spec, None);
    }

    /// 播放一段，到达结束帧时调用 `on_segment_end`
    pub fn play_stage_with<F>(&mut self, spec: StageSpec, on_segment_end: F)
    where
        F: FnMut(&mut Self) + 'static,
    {
        self.begin_stage(spec, Some(Box::new(on_segment_end)));
    }

    pub fn stage_phase(&self) -> Option<StagePhase> {
        self.stage.as_ref().map(|stage| stage.phase)
    }

    fn begin_stage(&mut self, spec: StageSpec, on_end: Option<Box<SegmentHandler<E>>>) {
        self.stage = None;
        self.stage_generation += 1;

        let Some(slot) = spec.slot.or_else(|| self.current_slot()) else {
            return;
        };
        let Some(engine) = self.engine_mut(slot) else {
            return;
        };

        if spec.start == 1 {
            engine.rewind();
            engine.play();
            self.on_seek_finished.clear();
            self.stage = Some(Stage {
                spec,
                slot,
                phase: StagePhase::Watching,
                on_end,
            });
            return;
        }

        self.stage = Some(Stage {
            spec,
            slot,
            phase: StagePhase::AwaitingSeek,
            on_end,
        });
        self.arm_stage_seek();
        self.seek_to_frame(spec.start, Some(slot));
        if let Some(engine) = self.engine_mut(slot) {
            engine.play();
        }
    }

    fn arm_stage_seek(&mut self) {
        self.on_seek_finished
            .register(Box::new(|player: &mut Self, landed: SlotId| {
                player.stage_seek_landed(landed)
            }));
    }

    fn stage_seek_landed(&mut self, slot: SlotId) {
        let Some(stage) = self.stage.as_mut() else {
            return;
        };
        if stage.phase != StagePhase::AwaitingSeek {
            return;
        }
        // 另一个播放器的跳帧，继续等待
        if slot != stage.slot {
            debug!("Stage on {} ignoring seek from {}", stage.slot, slot);
            self.arm_stage_seek();
            return;
        }

        let locked = stage.spec.is_locked();
        stage.phase = if locked {
            StagePhase::Locked
        } else {
            StagePhase::Watching
        };
        if locked {
            if let Some(engine) = self.engine_mut(slot) {
                engine.pause();
            }
        }
    }

    /// 播放器被关闭时结束绑定在它上面的分段播放
    pub(crate) fn end_stage_on(&mut self, slot: SlotId) {
        if self.stage.as_ref().is_some_and(|stage| stage.slot == slot) {
            debug!("Ending stage on closed {}", slot);
            self.stage = None;
            self.stage_generation += 1;
        }
    }

    /// 每帧检查是否到达结束帧（帧号可能跳过结束帧，按 >= 判断）
    pub(crate) fn watch_stage(&mut self, frame: i32) {
        let reached = matches!(
            &self.stage,
            Some(stage) if stage.phase == StagePhase::Watching && frame >= stage.spec.end
        );
        if !reached {
            return;
        }
        let Some(mut stage) = self.stage.take() else {
            return;
        };

        debug!("Stage {}..{} reached frame {}", stage.spec.start, stage.spec.end, frame);
        self.emit(PlayerEvent::StageEnded {
            end_frame: stage.spec.end,
        });

        let generation = self.stage_generation;
        if let Some(handler) = stage.on_end.as_mut() {
            handler(self);
        }

        // 回调里开始了新的分段或关闭了视频时不再循环
        if stage.spec.looping && self.stage_generation == generation {
            debug!("Re-arming stage {}..{}", stage.spec.start, stage.spec.end);
            let spec = stage.spec.on(stage.slot);
            self.begin_stage(spec, stage.on_end.take());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockEngine;
    use crate::{EngineEventKind, PlayerConfig};
    use std::cell::Cell;
    use std::rc::Rc;

    fn loaded_player() -> (DualPlayer<MockEngine>, MockEngine) {
        let first = MockEngine::new(10_000.0);
        let mut player =
            DualPlayer::with_engines(PlayerConfig::default(), first.clone(), MockEngine::new(10_000.0))
                .unwrap();
        player.open_video("a.mp4", |_, _| {}, false).unwrap();
        assert!(first.fire(EngineEventKind::FirstFrameReady));
        player.pump_events();
        (player, first)
    }

    fn at_frame(player: &mut DualPlayer<MockEngine>, engine: &MockEngine, frame: i32) {
        engine.set_time(player.frame_clock().time_of(frame) + 1.0);
        player.tick();
    }

    fn counter() -> (Rc<Cell<u32>>, impl FnMut(&mut DualPlayer<MockEngine>) + 'static) {
        let count = Rc::new(Cell::new(0));
        let inner = count.clone();
        (count, move |_: &mut DualPlayer<MockEngine>| inner.set(inner.get() + 1))
    }

    #[test]
    fn test_stage_from_first_frame_fires_once() {
        let (mut player, first) = loaded_player();
        first.set_time(5000.0);
        let (count, handler) = counter();

        player.play_stage_with(StageSpec::new(1, 10), handler);
        assert_eq!(first.state().rewinds, 1);
        assert!(first.state().playing);
        assert_eq!(player.stage_phase(), Some(StagePhase::Watching));

        at_frame(&mut player, &first, 9);
        assert_eq!(count.get(), 0);

        at_frame(&mut player, &first, 10);
        assert_eq!(count.get(), 1);
        assert_eq!(player.stage_phase(), None);

        at_frame(&mut player, &first, 11);
        at_frame(&mut player, &first, 30);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_end_frame_skipped_by_tick_still_fires() {
        let (mut player, first) = loaded_player();
        let (count, handler) = counter();

        player.play_stage_with(StageSpec::new(1, 10), handler);
        at_frame(&mut player, &first, 8);
        at_frame(&mut player, &first, 12);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_looping_stage_rearms_each_pass() {
        let (mut player, first) = loaded_player();
        let (count, handler) = counter();

        player.play_stage_with(StageSpec::new(1, 10).looping(true), handler);
        for pass in 1..=50 {
            at_frame(&mut player, &first, 10);
            assert_eq!(count.get(), pass);
            // 回到开头
            assert_eq!(first.state().time_ms, 0.0);
        }
        assert_eq!(first.state().rewinds, 51);
        assert_eq!(player.stage_phase(), Some(StagePhase::Watching));
    }

    #[test]
    fn test_stage_waits_for_seek_before_watching() {
        let (mut player, first) = loaded_player();
        let (count, handler) = counter();

        player.play_stage_with(StageSpec::new(5, 10).looping(true), handler);
        assert_eq!(first.state().seeks.len(), 1);
        assert!(first.state().playing);
        assert_eq!(player.stage_phase(), Some(StagePhase::AwaitingSeek));

        // 跳帧完成前不判断结束帧
        at_frame(&mut player, &first, 12);
        assert_eq!(count.get(), 0);

        at_frame(&mut player, &first, 5);
        assert_eq!(player.stage_phase(), Some(StagePhase::Watching));

        at_frame(&mut player, &first, 10);
        assert_eq!(count.get(), 1);
        assert_eq!(first.state().seeks.len(), 2);
        assert_eq!(player.stage_phase(), Some(StagePhase::AwaitingSeek));

        at_frame(&mut player, &first, 11);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_locked_stage_pauses_on_seek() {
        let (mut player, first) = loaded_player();
        let (count, handler) = counter();

        player.play_stage_with(StageSpec::new(5, 5), handler);
        assert!(first.state().playing);

        assert!(first.fire(EngineEventKind::FinishedSeeking));
        player.tick();
        assert!(!first.state().playing);
        assert_eq!(player.stage_phase(), Some(StagePhase::Locked));

        at_frame(&mut player, &first, 5);
        at_frame(&mut player, &first, 6);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_new_stage_replaces_running_one() {
        let (mut player, first) = loaded_player();
        let (old_count, old_handler) = counter();
        let (new_count, new_handler) = counter();

        player.play_stage_with(StageSpec::new(1, 10).looping(true), old_handler);
        player.play_stage_with(StageSpec::new(1, 20), new_handler);

        at_frame(&mut player, &first, 15);
        assert_eq!(old_count.get(), 0);
        at_frame(&mut player, &first, 20);
        assert_eq!(new_count.get(), 1);
    }

    #[test]
    fn test_segment_handler_can_stop_loop() {
        let (mut player, first) = loaded_player();
        let count = Rc::new(Cell::new(0));
        let inner = count.clone();

        player.play_stage_with(StageSpec::new(1, 10).looping(true), move |player| {
            inner.set(inner.get() + 1);
            player.pause();
            player.play_stage(StageSpec::new(5, 5));
        });

        at_frame(&mut player, &first, 10);
        assert_eq!(count.get(), 1);
        assert_eq!(player.stage_phase(), Some(StagePhase::AwaitingSeek));
        assert_eq!(first.state().rewinds, 1);
    }

    fn dual_player() -> (DualPlayer<MockEngine>, MockEngine, MockEngine) {
        let first = MockEngine::new(10_000.0);
        let second = MockEngine::new(10_000.0);
        let mut player =
            DualPlayer::with_engines(PlayerConfig::default(), first.clone(), second.clone())
                .unwrap();
        player.open_video("a.mp4", |_, _| {}, false).unwrap();
        assert!(first.fire(EngineEventKind::FirstFrameReady));
        player.pump_events();
        (player, first, second)
    }

    #[test]
    fn test_swap_ends_stage_on_closed_player() {
        let (mut player, first, second) = dual_player();
        let (count, handler) = counter();

        player.play_stage_with(StageSpec::new(1, 10).looping(true), handler);
        player.open_video("b.mp4", |_, _| {}, false).unwrap();
        assert!(second.fire(EngineEventKind::FirstFrameReady));
        player.pump_events();
        assert_eq!(player.current_slot(), Some(SlotId::SECOND));
        assert_eq!(player.stage_phase(), None);

        player.play(false);
        for _ in 0..5 {
            at_frame(&mut player, &second, 12);
        }
        assert_eq!(count.get(), 0);
        assert_eq!(first.state().rewinds, 1);
        assert_eq!(second.state().rewinds, 0);
    }

    #[test]
    fn test_stage_ignores_seek_from_other_player() {
        let (mut player, first, second) = dual_player();
        player.seek_to_frame(3, Some(SlotId::SECOND));
        player.play_stage(StageSpec::new(5, 5));

        assert!(second.fire(EngineEventKind::FinishedSeeking));
        player.pump_events();
        assert_eq!(player.stage_phase(), Some(StagePhase::AwaitingSeek));
        assert!(first.state().playing);

        assert!(first.fire(EngineEventKind::FinishedSeeking));
        player.pump_events();
        assert_eq!(player.stage_phase(), Some(StagePhase::Locked));
        assert!(!first.state().playing);
    }

    #[test]
    fn test_close_stops_stage() {
        let (mut player, first) = loaded_player();
        let (count, handler) = counter();

        player.play_stage_with(StageSpec::new(1, 10).looping(true), handler);
        player.close_video(false);
        assert_eq!(player.stage_phase(), None);

        at_frame(&mut player, &first, 10);
        assert_eq!(count.get(), 0);
    }
}
